// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 配置模块
///
/// 处理应用程序的配置设置和环境变量
pub mod config;

/// 领域模块
///
/// 包含核心数据模型、仓库接口和纯计算服务
pub mod domain;

/// 引擎模块
///
/// 浏览器会话抽象及其 Chromium 实现、登录流程
pub mod engines;

/// 提取器模块
///
/// 每个仪表盘页面一个提取器，以及模块注册表
pub mod extractors;

/// 基础设施模块
///
/// 凭据文件读取和结果文件写出
pub mod infrastructure;

/// 工具模块
pub mod utils;

/// 工作器模块
///
/// 顺序调度提取任务的编排器
pub mod workers;
