// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 基础设施层模块
///
/// 领域层仓库接口的具体实现：
/// - 凭据（credentials）：从本地 CSV 表读取登录凭据
/// - 存储（storage）：把每个 (模块, 日期) 的结果写成 CSV 和 JSON
pub mod credentials;
pub mod storage;
