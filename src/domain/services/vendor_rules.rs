// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

//! 控制台数值的换算规则
//!
//! 这些规则来自对页面展示的观察，供应商没有给出文档，属于未经确认的规则。
//! 集中放在这里，便于规则变化时只改一处。

use serde_json::{Number, Value};
use std::collections::HashMap;

/// 解析百分比文本，去掉 `%`/`％`
pub fn parse_ratio(text: &str) -> Option<f64> {
    text.trim()
        .trim_end_matches(['%', '％'])
        .trim()
        .parse::<f64>()
        .ok()
}

/// 大于等于 1 的比例视为整数百分比，乘以 0.01
pub fn scale_percent(ratio: f64) -> f64 {
    if ratio >= 1.0 {
        ratio * 0.01
    } else {
        ratio
    }
}

/// 性别整体占比；无法解析的记为 0
pub fn gender_totals<'a, I>(items: I) -> HashMap<String, f64>
where
    I: IntoIterator<Item = (&'a str, &'a str)>,
{
    items
        .into_iter()
        .map(|(gender, ratio)| {
            let value = parse_ratio(ratio).map(scale_percent).unwrap_or(0.0);
            (gender.to_string(), value)
        })
        .collect()
}

/// 年龄段占比乘以该性别的整体占比（缺失时按 1.0）
///
/// 文本无法解析时原样保留。
pub fn segment_ratio(totals: &HashMap<String, f64>, gender: &str, age_ratio: &str) -> Value {
    match parse_ratio(age_ratio) {
        Some(ratio) => {
            let total = totals.get(gender).copied().unwrap_or(1.0);
            Number::from_f64(total * scale_percent(ratio))
                .map(Value::Number)
                .unwrap_or(Value::Null)
        }
        None => Value::String(age_ratio.to_string()),
    }
}

/// 排名列表中的次数：第一个与排名不同的纯数字词
///
/// 找不到时退回到子元素文本中第一个与排名不同的数字。
pub fn ranked_count(rank: Option<&str>, text: &str, fragments: &[String]) -> Option<i64> {
    let rank = rank.map(str::trim);
    let from_tokens = text
        .split_whitespace()
        .filter(|token| Some(*token) != rank)
        .find(|token| token.chars().all(|c| c.is_ascii_digit()))
        .and_then(|token| token.parse().ok());
    if from_tokens.is_some() {
        return from_tokens;
    }

    fragments
        .iter()
        .map(|f| f.trim())
        .filter(|f| Some(*f) != rank)
        .find_map(|f| {
            let digits: String = f
                .chars()
                .skip_while(|c| !c.is_ascii_digit())
                .take_while(|c| c.is_ascii_digit())
                .collect();
            digits.parse().ok()
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_scale_percent() {
        assert!((scale_percent(37.0) - 0.37).abs() < 1e-9);
        assert_eq!(scale_percent(0.4), 0.4);
        assert!((scale_percent(1.0) - 0.01).abs() < 1e-9);
    }

    #[test]
    fn test_parse_ratio() {
        assert_eq!(parse_ratio(" 41.2% "), Some(41.2));
        assert_eq!(parse_ratio("9％"), Some(9.0));
        assert_eq!(parse_ratio("-"), None);
    }

    #[test]
    fn test_segment_ratio_uses_gender_total() {
        let totals = gender_totals([("남성", "40"), ("여성", "60%")]);
        assert!((totals["여성"] - 0.6).abs() < 1e-9);

        let value = segment_ratio(&totals, "남성", "50");
        assert!((value.as_f64().unwrap() - 0.2).abs() < 1e-9);

        // no total for the gender: ratio is kept as is
        let value = segment_ratio(&totals, "기타", "0.3");
        assert!((value.as_f64().unwrap() - 0.3).abs() < 1e-9);

        assert_eq!(segment_ratio(&totals, "남성", "n/a"), json!("n/a"));
    }

    #[test]
    fn test_unparseable_gender_total_is_zero() {
        let totals = gender_totals([("남성", "")]);
        assert_eq!(totals["남성"], 0.0);
        assert_eq!(segment_ratio(&totals, "남성", "10").as_f64(), Some(0.0));
    }

    #[test]
    fn test_ranked_count() {
        assert_eq!(ranked_count(Some("1"), "1 네이버지도 42 건", &[]), Some(42));
        // a count equal to the rank is skipped
        assert_eq!(ranked_count(Some("2"), "2 블로그 2 7", &[]), Some(7));
        assert_eq!(
            ranked_count(Some("3"), "3 카페", &["3".into(), "총 15건".into()]),
            Some(15)
        );
        assert_eq!(ranked_count(None, "검색", &[]), None);
    }
}
