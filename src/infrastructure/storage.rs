// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use async_trait::async_trait;
use chrono::NaiveDate;
use serde_json::Value;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};

use crate::domain::models::date_range::{compact, DATE_FORMAT};
use crate::domain::models::record::{ScrapeOutcome, ScrapedRecord};
use crate::domain::repositories::storage_repository::{
    StorageError, StorageRepository, WrittenFiles,
};

/// UTF-8 BOM，表格软件据此识别编码
const BOM: &[u8] = b"\xEF\xBB\xBF";

/// 追加在每行末尾的日期列
pub const EVENT_DATE_COLUMN: &str = "event_dt";

/// 本地文件系统的结果写出器
///
/// 每个 (模块, 日期) 写出 `<root>/<module>/<module>__<YYYYMMDD>_<YYYYMMDD>.{csv,json}`，
/// 同名文件直接覆盖。
pub struct LocalResultWriter {
    root: PathBuf,
}

impl LocalResultWriter {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// 不带扩展名的文件路径
    fn stem(&self, module: &str, day: NaiveDate) -> PathBuf {
        let day = compact(day);
        self.root
            .join(module)
            .join(format!("{}__{}_{}", module, day, day))
    }

    pub fn csv_path(&self, module: &str, day: NaiveDate) -> PathBuf {
        self.stem(module, day).with_extension("csv")
    }

    pub fn json_path(&self, module: &str, day: NaiveDate) -> PathBuf {
        self.stem(module, day).with_extension("json")
    }

    async fn write_file(path: &Path, data: &[u8]) -> Result<(), StorageError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }
        let mut file = fs::File::create(path).await?;
        file.write_all(data).await?;
        file.flush().await?;
        Ok(())
    }

    async fn write_pair(
        &self,
        module: &str,
        day: NaiveDate,
        outcome: &ScrapeOutcome,
    ) -> Result<WrittenFiles, StorageError> {
        let csv_path = self.csv_path(module, day);
        let json_path = self.json_path(module, day);

        Self::write_file(&csv_path, &render_csv(&outcome.records, day)?).await?;
        let json = serde_json::to_vec_pretty(outcome)?;
        Self::write_file(&json_path, &json).await?;

        debug!(module, rows = outcome.records.len(), path = %csv_path.display(), "Wrote result files");
        Ok(WrittenFiles {
            module: module.to_string(),
            csv: csv_path,
            json: json_path,
            rows: outcome.records.len(),
        })
    }
}

/// 渲染 CSV：表头是各记录字段的并集（按首次出现顺序）加上 `event_dt`
///
/// 记录自带的 `event_dt` 字段被任务日期覆盖，表头中只出现一次。
pub fn render_csv(records: &[ScrapedRecord], day: NaiveDate) -> Result<Vec<u8>, StorageError> {
    let mut columns: Vec<&str> = Vec::new();
    for record in records {
        for field in record.fields() {
            if field != EVENT_DATE_COLUMN && !columns.contains(&field.as_str()) {
                columns.push(field.as_str());
            }
        }
    }

    let mut writer = csv::Writer::from_writer(BOM.to_vec());
    writer.write_record(columns.iter().copied().chain([EVENT_DATE_COLUMN]))?;

    let event_dt = day.format(DATE_FORMAT).to_string();
    for record in records {
        let row: Vec<String> = columns
            .iter()
            .map(|column| record.get(column).map(cell).unwrap_or_default())
            .chain([event_dt.clone()])
            .collect();
        writer.write_record(&row)?;
    }

    writer
        .into_inner()
        .map_err(|e| StorageError::Other(e.to_string()))
}

/// null 为空单元格，嵌套值写成紧凑 JSON
fn cell(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        nested => nested.to_string(),
    }
}

#[async_trait]
impl StorageRepository for LocalResultWriter {
    async fn save(
        &self,
        module: &str,
        day: NaiveDate,
        outcome: &ScrapeOutcome,
    ) -> Result<Vec<WrittenFiles>, StorageError> {
        let mut written = vec![self.write_pair(module, day, outcome).await?];

        for derived in &outcome.derived {
            let mut metadata = outcome.metadata.clone();
            metadata.set_extra("derived_from", module);
            let derived_outcome = ScrapeOutcome::new(derived.records.clone(), metadata);
            written.push(self.write_pair(&derived.module, day, &derived_outcome).await?);
        }

        for files in &written {
            info!(
                module = %files.module,
                rows = files.rows,
                "Saved {}",
                files.csv.display()
            );
        }
        Ok(written)
    }

    async fn load(&self, module: &str, day: NaiveDate) -> Result<Option<ScrapeOutcome>, StorageError> {
        match fs::read(self.json_path(module, day)).await {
            Ok(data) => Ok(Some(serde_json::from_slice(&data)?)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StorageError::Io(e)),
        }
    }

    async fn exists(&self, module: &str, day: NaiveDate) -> Result<bool, StorageError> {
        Ok(fs::try_exists(self.json_path(module, day)).await?)
    }
}

#[cfg(test)]
#[path = "storage_test.rs"]
mod tests;
