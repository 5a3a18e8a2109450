// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 工作器模块
///
/// 按 模块 × 日期 顺序调度提取任务并汇总结果
pub mod orchestrator;

pub use orchestrator::{ModuleReport, Orchestrator, RunSummary};
