// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

//! 页面提取器
//!
//! 每个目标页面一个模块。公共部分：
//! - `traits`: 提取器与模板特质
//! - `page_visit`: 导航、等待和状态机记录
//! - `urls`: 各页面的URL参数
//! - `registry`: 从配置构建模块注册表

pub mod booking_trend_chart;
pub mod page_visit;
pub mod place_hourly_inflow_graph;
pub mod place_inflow_channel;
pub mod place_inflow_segment;
pub mod ranked_list;
pub mod registry;
pub mod smartcall_call_statistics;
pub mod smartcall_top_keyword;
pub mod smartcall_top_media;
pub mod smlog_ad_statistics;
pub mod smlog_conversion_summary;
pub mod traits;
pub mod urls;

#[cfg(test)]
pub mod test_support;
