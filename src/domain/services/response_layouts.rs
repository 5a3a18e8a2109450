// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use serde_json::{Map, Value};

use super::chart_layout::SeriesPoint;
use super::field_matching::{as_number, pick_label_field, pick_value_field, point_value};

/// 可能承载列表的键
pub const LIST_KEYS: &[&str] = &["data", "result", "results", "items", "list", "rows", "content"];

/// 标签/数值并列数组中数值数组的键
const PARALLEL_VALUE_KEYS: &[&str] = &["values", "data", "counts"];

/// 嵌套搜索的最大深度
pub const MAX_NESTING: usize = 4;

/// 在接口响应体中寻找可识别的表格布局
///
/// 依次识别：标签/数值并列数组、对象列表（顶层数组或位于 [`LIST_KEYS`] 之下）、
/// 以及最多 [`MAX_NESTING`] 层的嵌套结果数组。
pub fn find_points(body: &Value) -> Option<Vec<SeriesPoint>> {
    search(body, 0)
}

fn search(value: &Value, depth: usize) -> Option<Vec<SeriesPoint>> {
    if depth > MAX_NESTING {
        return None;
    }
    match value {
        Value::Array(items) => object_list(items),
        Value::Object(map) => {
            if let Some(points) = parallel_arrays(map) {
                return Some(points);
            }
            LIST_KEYS
                .iter()
                .filter_map(|key| map.get(*key))
                .find_map(|child| search(child, depth + 1))
        }
        _ => None,
    }
}

/// `{labels: [...], values|data|counts: [...]}`
fn parallel_arrays(map: &Map<String, Value>) -> Option<Vec<SeriesPoint>> {
    let labels = map.get("labels")?.as_array()?;
    let values = PARALLEL_VALUE_KEYS
        .iter()
        .filter_map(|key| map.get(*key).and_then(Value::as_array))
        .find(|values| values.iter().any(|v| !v.is_object()))?;

    let points: Vec<SeriesPoint> = labels
        .iter()
        .zip(values.iter())
        .enumerate()
        .map(|(i, (label, value))| SeriesPoint::new(i, label.clone(), point_value(value)))
        .collect();
    non_empty(points)
}

/// 对象列表：每个对象经字段匹配取标签与数值
fn object_list(items: &[Value]) -> Option<Vec<SeriesPoint>> {
    let rows: Vec<&Map<String, Value>> = items.iter().filter_map(Value::as_object).collect();
    if rows.is_empty() {
        return None;
    }

    let points: Vec<SeriesPoint> = rows
        .iter()
        .enumerate()
        .filter_map(|(i, row)| {
            let label_field = pick_label_field(row);
            let value_field = pick_value_field(row, label_field)?;
            let value = row.get(value_field).and_then(as_number)?;
            let label = label_field
                .and_then(|field| row.get(field))
                .cloned()
                .unwrap_or(Value::Null);
            Some(SeriesPoint::new(i, label, value))
        })
        .collect();
    non_empty(points)
}

fn non_empty(points: Vec<SeriesPoint>) -> Option<Vec<SeriesPoint>> {
    if points.is_empty() {
        None
    } else {
        Some(points)
    }
}
