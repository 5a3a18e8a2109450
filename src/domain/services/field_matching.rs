// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use serde_json::{Map, Number, Value};

/// 标签字段的规范名称，按优先级排列
pub const LABEL_FIELDS: &[&str] = &["label", "date", "name", "hour", "time", "x", "key"];

/// 数值字段的规范名称，按优先级排列
pub const VALUE_FIELDS: &[&str] = &["value", "count", "cnt", "total", "y", "amount"];

/// 不能当作指标的数值字段
pub const NON_METRIC_FIELDS: &[&str] = &[
    "id",
    "index",
    "rank",
    "seq",
    "hour",
    "year",
    "month",
    "day",
    "timestamp",
    "point_index",
    "order",
];

fn lookup<'a>(row: &'a Map<String, Value>, canonical: &str) -> Option<(&'a str, &'a Value)> {
    row.iter()
        .find(|(k, _)| k.eq_ignore_ascii_case(canonical))
        .map(|(k, v)| (k.as_str(), v))
}

/// 选择标签字段：第一个存在且非空的规范名称
pub fn pick_label_field(row: &Map<String, Value>) -> Option<&str> {
    LABEL_FIELDS.iter().find_map(|name| match lookup(row, name) {
        Some((key, value)) if !value.is_null() => Some(key),
        _ => None,
    })
}

/// 选择数值字段
///
/// 先找规范名称中值可解析为数字的字段，再退回到第一个不在非指标列表中的数值字段。
/// `exclude` 通常是已选中的标签字段。
pub fn pick_value_field<'a>(row: &'a Map<String, Value>, exclude: Option<&str>) -> Option<&'a str> {
    let canonical = VALUE_FIELDS.iter().find_map(|name| match lookup(row, name) {
        Some((key, value)) if Some(key) != exclude && as_number(value).is_some() => Some(key),
        _ => None,
    });
    if canonical.is_some() {
        return canonical;
    }

    row.iter()
        .filter(|(key, _)| Some(key.as_str()) != exclude)
        .filter(|(key, _)| {
            !NON_METRIC_FIELDS
                .iter()
                .any(|skip| key.eq_ignore_ascii_case(skip))
        })
        .find(|(_, value)| value.is_number())
        .map(|(key, _)| key.as_str())
}

/// 把数字或数字字符串（允许千分位逗号、百分号）转成 JSON 数字
pub fn as_number(value: &Value) -> Option<Value> {
    match value {
        Value::Number(_) => Some(value.clone()),
        Value::String(s) => parse_number(s),
        _ => None,
    }
}

/// 解析 `"1,234"`、`"12.5"`、`"41%"` 这类文本
pub fn parse_number(text: &str) -> Option<Value> {
    let cleaned: String = text
        .trim()
        .trim_end_matches('%')
        .chars()
        .filter(|c| *c != ',')
        .collect();
    if cleaned.is_empty() {
        return None;
    }
    if let Ok(i) = cleaned.parse::<i64>() {
        return Some(Value::Number(i.into()));
    }
    cleaned
        .parse::<f64>()
        .ok()
        .and_then(Number::from_f64)
        .map(Value::Number)
}

/// 从数据点中取出数值
///
/// 图表数据点可能是裸数字、数字字符串，或 `{x, y}` 这样的对象。
pub fn point_value(point: &Value) -> Value {
    match point {
        Value::Object(map) => pick_value_field(map, pick_label_field(map))
            .and_then(|field| map.get(field))
            .and_then(as_number)
            .unwrap_or(Value::Null),
        other => as_number(other).unwrap_or(Value::Null),
    }
}
