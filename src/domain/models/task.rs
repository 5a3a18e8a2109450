// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use uuid::Uuid;

use super::date_range::DATE_FORMAT;

/// 提取任务
///
/// 编排器为每个 (模块, 日期) 创建一个，只被一个页面提取器实例消费，
/// 结果写出后即丢弃。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionTask {
    /// 任务唯一标识符（仅用于日志关联）
    pub id: Uuid,
    /// 目标模块名
    pub module: String,
    /// 目标日期
    pub day: NaiveDate,
    /// 输出根目录
    pub output_root: PathBuf,
}

impl ExtractionTask {
    pub fn new(module: impl Into<String>, day: NaiveDate, output_root: impl Into<PathBuf>) -> Self {
        Self {
            id: Uuid::new_v4(),
            module: module.into(),
            day,
            output_root: output_root.into(),
        }
    }
}

/// 单日执行状态
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum DayStatus {
    /// 提取完成（可能为零行）
    Success { rows: usize },
    /// 导航失败或超时，已记录但没有数据
    NoData { reason: String },
    /// 写出失败
    WriteFailed { reason: String },
}

impl DayStatus {
    pub fn is_success(&self) -> bool {
        matches!(self, DayStatus::Success { .. })
    }
}

impl fmt::Display for DayStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DayStatus::Success { rows } => write!(f, "✓ Success ({} rows)", rows),
            DayStatus::NoData { reason } => write!(f, "⚠ No data: {}", reason),
            DayStatus::WriteFailed { reason } => write!(f, "✗ Write failed: {}", reason),
        }
    }
}

/// 模块汇总状态
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ModuleStatus {
    /// 所有日期成功
    Success { total: usize },
    /// 部分日期成功
    Partial { succeeded: usize, total: usize },
    /// 模块无法运行（例如日期范围非法）
    Error { message: String },
}

impl ModuleStatus {
    /// 由逐日状态汇总
    pub fn from_days<'a>(days: impl IntoIterator<Item = &'a DayResult>) -> Self {
        let (succeeded, total) = days.into_iter().fold((0, 0), |(ok, all), d| {
            (ok + usize::from(d.status.is_success()), all + 1)
        });
        if succeeded == total {
            ModuleStatus::Success { total }
        } else {
            ModuleStatus::Partial { succeeded, total }
        }
    }
}

impl fmt::Display for ModuleStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModuleStatus::Success { total } => write!(f, "✓ Success ({}/{} dates)", total, total),
            ModuleStatus::Partial { succeeded, total } => {
                write!(f, "⚠ Partial ({}/{} dates)", succeeded, total)
            }
            ModuleStatus::Error { message } => write!(f, "✗ Error: {}", message),
        }
    }
}

/// 单日结果
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayResult {
    pub day: NaiveDate,
    pub status: DayStatus,
}

impl fmt::Display for DayResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.day.format(DATE_FORMAT), self.status)
    }
}
