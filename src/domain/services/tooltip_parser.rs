// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use once_cell::sync::Lazy;
use regex::Regex;

static HOUR_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(\d+)시").expect("Failed to compile hour regex"));
static COUNT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d+)회").expect("Failed to compile count regex"));
static DATE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\d{4}-\d{2}-\d{2}|\d{1,2}/\d{1,2}|\d{1,2}일").expect("Failed to compile date regex")
});
static NUMBER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d+(?:,\d+)*)").expect("Failed to compile number regex"));
static HANGUL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"([가-힣]+)").expect("Failed to compile hangul regex"));

/// 不能当作系列名的单位词
const UNIT_WORDS: &[&str] = &["일", "건", "개"];

/// 小时图提示框读数，例如 `"0시 27회"`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HourlyReading {
    pub hour: Option<i64>,
    pub count: Option<i64>,
}

/// 解析小时图提示框；既无小时也无次数时返回 `None`
pub fn parse_hourly(text: &str) -> Option<HourlyReading> {
    let hour = HOUR_RE
        .captures(text)
        .and_then(|c| c[1].parse().ok());
    let count = COUNT_RE
        .captures(text)
        .and_then(|c| c[1].parse().ok());
    if hour.is_none() && count.is_none() {
        return None;
    }
    Some(HourlyReading { hour, count })
}

/// 序列图提示框读数，例如 `"2025-12-15\n신청: 10"`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SeriesReading {
    /// 含日期的那一行
    pub label: Option<String>,
    /// 第一个数字（去掉千分位）
    pub value: Option<i64>,
    /// 第一个不是单位词的韩文词
    pub feature: Option<String>,
}

/// 逐行解析序列图提示框
pub fn parse_series(text: &str) -> SeriesReading {
    let mut reading = SeriesReading::default();
    for line in text.lines().map(str::trim) {
        if reading.label.is_none() && DATE_RE.is_match(line) {
            reading.label = Some(line.to_string());
        }
        if reading.value.is_none() {
            reading.value = NUMBER_RE
                .captures(line)
                .and_then(|c| c[1].replace(',', "").parse().ok());
        }
        if reading.feature.is_none() {
            if let Some(word) = HANGUL_RE.captures(line).map(|c| c[1].to_string()) {
                if !UNIT_WORDS.contains(&word.as_str()) {
                    reading.feature = Some(word);
                }
            }
        }
    }
    reading
}
