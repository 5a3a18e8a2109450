// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// 日期格式（YYYY-MM-DD）
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// 日期范围错误
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InvalidRange {
    /// 起始日期晚于结束日期
    #[error("invalid range: start {start} is after end {end}")]
    StartAfterEnd { start: NaiveDate, end: NaiveDate },
    /// 日期无法解析
    #[error("invalid range: cannot parse date '{input}': {reason}")]
    Unparseable { input: String, reason: String },
}

/// 闭区间日期范围
///
/// 构造时保证 `start <= end`，`days()` 按升序逐日产出，每天恰好一次。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    start: NaiveDate,
    end: NaiveDate,
}

impl DateRange {
    /// 由两个日期创建范围
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, InvalidRange> {
        if start > end {
            return Err(InvalidRange::StartAfterEnd { start, end });
        }
        Ok(Self { start, end })
    }

    /// 由 `YYYY-MM-DD` 字符串创建范围
    pub fn parse(start: &str, end: &str) -> Result<Self, InvalidRange> {
        Self::new(parse_day(start)?, parse_day(end)?)
    }

    /// 单日范围（start == end）
    pub fn single(day: NaiveDate) -> Self {
        Self {
            start: day,
            end: day,
        }
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    /// 范围内的天数
    pub fn len(&self) -> usize {
        (self.end - self.start).num_days() as usize + 1
    }

    /// 闭区间永远不为空
    pub fn is_empty(&self) -> bool {
        false
    }

    /// 升序遍历范围内的每一天
    pub fn days(&self) -> Days {
        Days {
            next: Some(self.start),
            end: self.end,
        }
    }
}

impl fmt::Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} to {}",
            self.start.format(DATE_FORMAT),
            self.end.format(DATE_FORMAT)
        )
    }
}

impl IntoIterator for DateRange {
    type Item = NaiveDate;
    type IntoIter = Days;

    fn into_iter(self) -> Self::IntoIter {
        self.days()
    }
}

/// 日期迭代器
#[derive(Debug, Clone)]
pub struct Days {
    next: Option<NaiveDate>,
    end: NaiveDate,
}

impl Iterator for Days {
    type Item = NaiveDate;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next?;
        self.next = if current < self.end {
            current.succ_opt()
        } else {
            None
        };
        Some(current)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self
            .next
            .map(|d| (self.end - d).num_days() as usize + 1)
            .unwrap_or(0);
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for Days {}

/// 解析 `YYYY-MM-DD`
pub fn parse_day(input: &str) -> Result<NaiveDate, InvalidRange> {
    NaiveDate::parse_from_str(input.trim(), DATE_FORMAT).map_err(|e| InvalidRange::Unparseable {
        input: input.to_string(),
        reason: e.to_string(),
    })
}

/// 文件名使用的紧凑日期格式（YYYYMMDD）
pub fn compact(day: NaiveDate) -> String {
    day.format("%Y%m%d").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(s: &str) -> NaiveDate {
        parse_day(s).unwrap()
    }

    #[test]
    fn test_four_day_range_in_order() {
        let range = DateRange::parse("2025-11-15", "2025-11-18").unwrap();
        let days: Vec<_> = range.days().collect();
        assert_eq!(
            days,
            vec![
                d("2025-11-15"),
                d("2025-11-16"),
                d("2025-11-17"),
                d("2025-11-18")
            ]
        );
        assert_eq!(range.len(), 4);
    }

    #[test]
    fn test_single_day_range() {
        let range = DateRange::parse("2025-12-13", "2025-12-13").unwrap();
        assert_eq!(range.days().count(), 1);
        assert_eq!(DateRange::single(d("2025-12-13")), range);
    }

    #[test]
    fn test_start_after_end_is_rejected() {
        let err = DateRange::parse("2025-11-18", "2025-11-15").unwrap_err();
        assert!(matches!(err, InvalidRange::StartAfterEnd { .. }));
    }

    #[test]
    fn test_unparseable_date_is_rejected() {
        let err = DateRange::parse("2025-13-01", "2025-12-01").unwrap_err();
        assert!(matches!(err, InvalidRange::Unparseable { .. }));
        assert!(DateRange::parse("yesterday", "2025-12-01").is_err());
    }

    #[test]
    fn test_count_matches_day_difference_across_boundaries() {
        // month, year and leap-day boundaries
        let cases = [
            ("2024-02-27", "2024-03-02"),
            ("2025-12-30", "2026-01-02"),
            ("2025-01-01", "2025-12-31"),
        ];
        for (start, end) in cases {
            let range = DateRange::parse(start, end).unwrap();
            let days: Vec<_> = range.days().collect();
            let expected = (d(end) - d(start)).num_days() as usize + 1;
            assert_eq!(days.len(), expected);
            assert!(days.windows(2).all(|w| w[1] == w[0].succ_opt().unwrap()));
            assert_eq!(range.days().len(), expected);
        }
    }

    #[test]
    fn test_compact_format() {
        assert_eq!(compact(d("2025-11-05")), "20251105");
    }
}
