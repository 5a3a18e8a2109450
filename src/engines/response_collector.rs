// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use parking_lot::Mutex;
use std::sync::Arc;
use tokio::task::JoinHandle;

use crate::domain::models::captured_response::CapturedResponse;

/// 网络响应收集器
///
/// 单次页面访问范围内的资源：任务开始时获取，结束时取出并丢弃。
/// 后台监听任务与此值同生共死，`Drop` 时中止。
#[derive(Debug)]
pub struct ResponseCollector {
    captured: Arc<Mutex<Vec<CapturedResponse>>>,
    listener: Option<JoinHandle<()>>,
}

impl ResponseCollector {
    /// 绑定到后台监听任务
    pub fn attached(captured: Arc<Mutex<Vec<CapturedResponse>>>, listener: JoinHandle<()>) -> Self {
        Self {
            captured,
            listener: Some(listener),
        }
    }

    /// 无后台任务的收集器（用于不支持捕获的会话或测试）
    pub fn detached() -> Self {
        Self {
            captured: Arc::new(Mutex::new(Vec::new())),
            listener: None,
        }
    }

    /// 预先填充响应的收集器
    pub fn with_responses(responses: Vec<CapturedResponse>) -> Self {
        Self {
            captured: Arc::new(Mutex::new(responses)),
            listener: None,
        }
    }

    pub fn push(&self, response: CapturedResponse) {
        self.captured.lock().push(response);
    }

    pub fn len(&self) -> usize {
        self.captured.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.captured.lock().is_empty()
    }

    /// 当前已捕获响应的快照
    pub fn snapshot(&self) -> Vec<CapturedResponse> {
        self.captured.lock().clone()
    }

    /// 停止监听并取出全部响应
    pub fn drain(mut self) -> Vec<CapturedResponse> {
        if let Some(listener) = self.listener.take() {
            listener.abort();
        }
        std::mem::take(&mut *self.captured.lock())
    }
}

impl Drop for ResponseCollector {
    fn drop(&mut self) {
        if let Some(listener) = self.listener.take() {
            listener.abort();
        }
    }
}
