// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use async_trait::async_trait;
use chrono::NaiveDate;
use std::path::PathBuf;
use thiserror::Error;

use crate::domain::models::record::ScrapeOutcome;

/// 存储错误类型
#[derive(Error, Debug)]
pub enum StorageError {
    /// IO错误
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    /// JSON 序列化错误
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    /// CSV 写出错误
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    /// 存储错误
    #[error("Storage error: {0}")]
    Other(String),
}

/// 一次写出产生的文件
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WrittenFiles {
    pub module: String,
    pub csv: PathBuf,
    pub json: PathBuf,
    pub rows: usize,
}

/// 结果存储仓库特质
///
/// 定义 (模块, 日期) 结果的写出与读回接口
#[async_trait]
pub trait StorageRepository: Send + Sync {
    /// 写出结果（含派生输出），覆盖同名旧文件
    async fn save(
        &self,
        module: &str,
        day: NaiveDate,
        outcome: &ScrapeOutcome,
    ) -> Result<Vec<WrittenFiles>, StorageError>;

    /// 读回已写出的 JSON 结果
    async fn load(&self, module: &str, day: NaiveDate) -> Result<Option<ScrapeOutcome>, StorageError>;

    /// 检查结果是否已存在
    async fn exists(&self, module: &str, day: NaiveDate) -> Result<bool, StorageError>;
}
