// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// 被动捕获的 JSON 接口响应
///
/// 捕获后只读，由提取器在导航稳定后查阅。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CapturedResponse {
    /// 响应URL
    pub url: String,
    /// HTTP状态码
    pub status: u16,
    /// 解析后的 JSON 响应体
    pub body: Value,
    /// 捕获时间
    pub captured_at: DateTime<Local>,
}

impl CapturedResponse {
    pub fn new(url: impl Into<String>, status: u16, body: Value) -> Self {
        Self {
            url: url.into(),
            status,
            body,
            captured_at: Local::now(),
        }
    }

    /// 摘要（写入元数据时不带响应体）
    pub fn summary(&self) -> Value {
        serde_json::json!({
            "url": self.url,
            "status": self.status,
            "has_data": !self.body.is_null(),
        })
    }
}

/// URL 关键字过滤器
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseFilter {
    keywords: Vec<String>,
}

impl ResponseFilter {
    pub fn new<I, S>(keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            keywords: keywords
                .into_iter()
                .map(|k| k.into().to_lowercase())
                .collect(),
        }
    }

    /// URL（忽略大小写）包含任一关键字即匹配
    pub fn matches(&self, url: &str) -> bool {
        let url = url.to_lowercase();
        self.keywords.iter().any(|k| url.contains(k.as_str()))
    }

    pub fn keywords(&self) -> &[String] {
        &self.keywords
    }
}
