// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::extraction_state::ExtractionState;

/// 抓取记录
///
/// 一行提取出的数据：字段名到值的有序映射。字段插入顺序决定 CSV 列顺序。
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ScrapedRecord(Map<String, Value>);

impl ScrapedRecord {
    pub fn new() -> Self {
        Self(Map::new())
    }

    /// 链式插入字段
    pub fn with(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(field.into(), value.into());
        self
    }

    pub fn insert(&mut self, field: impl Into<String>, value: impl Into<Value>) {
        self.0.insert(field.into(), value.into());
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field)
    }

    /// 字段名（按插入顺序）
    pub fn fields(&self) -> impl Iterator<Item = &String> {
        self.0.keys()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// 除给定字段外是否所有值都为 null
    pub fn is_null_except(&self, ignored: &[&str]) -> bool {
        self.0
            .iter()
            .filter(|(k, _)| !ignored.contains(&k.as_str()))
            .all(|(_, v)| v.is_null())
    }

    pub fn into_inner(self) -> Map<String, Value> {
        self.0
    }
}

impl From<Map<String, Value>> for ScrapedRecord {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

/// 抓取元数据
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScrapeMetadata {
    /// 目标URL
    pub url: String,
    /// 页面标题
    pub page_title: Option<String>,
    /// 抓取时间
    pub scraped_at: DateTime<Local>,
    /// 成功的提取策略名称
    pub strategy: Option<String>,
    /// 非致命错误说明
    #[serde(default)]
    pub errors: Vec<String>,
    /// 状态机轨迹
    #[serde(default)]
    pub states: Vec<ExtractionState>,
    /// 其他自由格式信息
    #[serde(default)]
    pub extra: Map<String, Value>,
}

impl ScrapeMetadata {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            page_title: None,
            scraped_at: Local::now(),
            strategy: None,
            errors: Vec::new(),
            states: Vec::new(),
            extra: Map::new(),
        }
    }

    pub fn note_error(&mut self, message: impl Into<String>) {
        self.errors.push(message.into());
    }

    pub fn set_extra(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.extra.insert(key.into(), value.into());
    }
}

/// 派生输出：以另一个模块名写出的记录
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DerivedOutput {
    pub module: String,
    pub records: Vec<ScrapedRecord>,
}

/// 单日提取结果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScrapeOutcome {
    pub records: Vec<ScrapedRecord>,
    pub metadata: ScrapeMetadata,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub derived: Vec<DerivedOutput>,
}

impl ScrapeOutcome {
    pub fn new(records: Vec<ScrapedRecord>, metadata: ScrapeMetadata) -> Self {
        Self {
            records,
            metadata,
            derived: Vec::new(),
        }
    }

    /// 空结果，附带错误说明
    pub fn empty(metadata: ScrapeMetadata) -> Self {
        Self::new(Vec::new(), metadata)
    }

    /// 提取过程是否产生过错误说明
    pub fn has_errors(&self) -> bool {
        !self.metadata.errors.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_record_keeps_insertion_order() {
        let record = ScrapedRecord::new()
            .with("hour", 3)
            .with("count", 27)
            .with("label", "3시");
        let fields: Vec<_> = record.fields().cloned().collect();
        assert_eq!(fields, vec!["hour", "count", "label"]);
    }

    #[test]
    fn test_record_serializes_as_plain_object() {
        let record = ScrapedRecord::new().with("channel", "네이버검색").with("ratio", "41.2");
        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value, json!({"channel": "네이버검색", "ratio": "41.2"}));
    }

    #[test]
    fn test_is_null_except() {
        let record = ScrapedRecord::new()
            .with("hour", 5)
            .with("count", Value::Null)
            .with("tooltip_text", Value::Null);
        assert!(record.is_null_except(&["hour"]));
        assert!(!record.is_null_except(&[]));
    }
}
