// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

pub mod chromium_session;
pub mod response_collector;
#[cfg(test)]
pub mod scripted_session;
pub mod session_driver;
pub mod traits;
