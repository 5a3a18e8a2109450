// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::models::record::ScrapedRecord;

/// 图表布局
///
/// 决定各恢复策略统一输出的记录形状
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChartLayout {
    /// 24 小时柱状图：`{hour, count, label, tooltip_text}`
    Hourly,
    /// 按点序列：`{point_index, label, value, dataset_label, tooltip_text}`
    Series,
}

impl ChartLayout {
    /// 悬停探测时的采样点数
    pub fn sample_count(self) -> usize {
        match self {
            ChartLayout::Hourly => 24,
            ChartLayout::Series => 30,
        }
    }

    /// 把数据点规范化为记录
    pub fn records(self, points: Vec<SeriesPoint>) -> Vec<ScrapedRecord> {
        match self {
            ChartLayout::Hourly => {
                let mut rows: Vec<(i64, ScrapedRecord)> =
                    points.into_iter().map(hourly_row).collect();
                rows.sort_by_key(|(hour, _)| *hour);
                rows.into_iter().map(|(_, row)| row).collect()
            }
            ChartLayout::Series => points.into_iter().map(series_row).collect(),
        }
    }
}

/// 任一策略恢复出的单个数据点
#[derive(Debug, Clone, PartialEq)]
pub struct SeriesPoint {
    pub index: usize,
    pub label: Value,
    pub value: Value,
    pub dataset_label: Option<String>,
    pub tooltip_text: Option<String>,
}

impl SeriesPoint {
    pub fn new(index: usize, label: Value, value: Value) -> Self {
        Self {
            index,
            label,
            value,
            dataset_label: None,
            tooltip_text: None,
        }
    }

    pub fn with_dataset(mut self, dataset_label: Option<String>) -> Self {
        self.dataset_label = dataset_label;
        self
    }

    pub fn with_tooltip(mut self, tooltip_text: Option<String>) -> Self {
        self.tooltip_text = tooltip_text;
        self
    }

    /// 没有读到任何值的占位点
    pub fn placeholder(index: usize) -> Self {
        Self::new(index, Value::Null, Value::Null)
    }
}

/// 标签里的小时数：`13`、`"13"`、`"13시"`
fn label_hour(label: &Value) -> Option<i64> {
    match label {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => {
            let digits: String = s.trim().chars().take_while(|c| c.is_ascii_digit()).collect();
            digits.parse().ok()
        }
        _ => None,
    }
}

fn display(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn hourly_row(point: SeriesPoint) -> (i64, ScrapedRecord) {
    let hour = label_hour(&point.label).unwrap_or(point.index as i64);
    let label = match &point.label {
        Value::Null => format!("{}시", hour),
        other => display(other),
    };
    let tooltip = point.tooltip_text.clone().or_else(|| {
        Some(if point.value.is_null() {
            format!("{}시", hour)
        } else {
            format!("{}시 {}회", hour, display(&point.value))
        })
    });
    let row = ScrapedRecord::new()
        .with("hour", hour)
        .with("count", point.value)
        .with("label", label)
        .with("tooltip_text", tooltip.map(Value::String).unwrap_or(Value::Null));
    (hour, row)
}

fn series_row(point: SeriesPoint) -> ScrapedRecord {
    let tooltip = point.tooltip_text.clone().or_else(|| {
        match (&point.label, &point.value) {
            (_, Value::Null) => None,
            (Value::Null, value) => Some(display(value)),
            (label, value) => Some(format!("{} {}", display(label), display(value))),
        }
    });
    ScrapedRecord::new()
        .with("point_index", point.index)
        .with("label", point.label)
        .with("value", point.value)
        .with(
            "dataset_label",
            point.dataset_label.map(Value::String).unwrap_or(Value::Null),
        )
        .with("tooltip_text", tooltip.map(Value::String).unwrap_or(Value::Null))
}
