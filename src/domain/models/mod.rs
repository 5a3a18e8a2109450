// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 领域模型模块
///
/// 该模块定义了系统的核心业务实体，包括：
/// - 凭据（credential）：登录控制台所需的账户信息
/// - 日期范围（date_range）：逐日驱动抓取的闭区间
/// - 提取任务（task）：单个 (模块, 日期) 执行单元及其状态
/// - 抓取记录（record）：提取出的行数据与元数据
/// - 捕获响应（captured_response）：页面自身发出的接口响应
/// - 提取状态（extraction_state）：单次页面访问的状态机
pub mod captured_response;
pub mod credential;
pub mod date_range;
pub mod extraction_state;
pub mod record;
pub mod task;
