// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 领域服务模块
///
/// 该模块包含从页面中恢复数据的核心逻辑，与具体页面无关：
/// - 图表布局（chart_layout）：各策略统一输出的记录形状
/// - 图表状态（chart_state）：页面内图表框架状态的探测脚本与结果解析
/// - 字段匹配（field_matching）：在未知 JSON 对象中挑选标签与数值字段
/// - 响应布局（response_layouts）：识别接口响应体中的表格形状
/// - 提示框解析（tooltip_parser）：解析悬停提示框文本
/// - 值恢复（value_recovery）：按优先级排列的恢复策略链
/// - HTML 表格（html_table）：解析服务端渲染的表格
/// - 供应商规则（vendor_rules）：控制台数值的换算规则
pub mod chart_layout;
pub mod chart_state;
pub mod field_matching;
pub mod html_table;
pub mod response_layouts;
pub mod tooltip_parser;
pub mod value_recovery;
pub mod vendor_rules;
