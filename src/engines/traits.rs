// Copyright 2025 Kirky.X
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use tokio::time::Instant;
use thiserror::Error;

use crate::domain::models::captured_response::ResponseFilter;
use crate::engines::response_collector::ResponseCollector;

/// 引擎错误类型
#[derive(Error, Debug)]
pub enum EngineError {
    /// 浏览器启动或连接失败
    #[error("Browser launch failed: {0}")]
    Launch(String),
    /// 协议调用失败
    #[error("Browser protocol error: {0}")]
    Protocol(String),
    /// 元素未找到
    #[error("Element not found: {0}")]
    NotFound(String),
    /// 超时
    #[error("Timeout")]
    Timeout,
    /// 其他错误
    #[error("Other error: {0}")]
    Other(String),
}

impl EngineError {
    /// 判断错误是否只是"没有找到"（结构不匹配，不是故障）
    pub fn is_absence(&self) -> bool {
        matches!(self, EngineError::NotFound(_))
    }
}

/// 元素在视口中的位置
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

/// 浏览器会话特质
///
/// 一次运行中所有提取任务顺序共享同一个已登录页面。
/// 导航会替换之前的页面状态。
#[async_trait]
pub trait BrowserSession: Send + Sync {
    /// 导航到URL并等待加载事件
    async fn goto(&self, url: &str) -> Result<(), EngineError>;

    /// 在页面中执行脚本，返回 JSON 结果（Promise 会被等待）
    async fn evaluate(&self, script: &str) -> Result<Value, EngineError>;

    /// 点击选择器匹配的第一个元素
    async fn click(&self, selector: &str) -> Result<(), EngineError>;

    /// 清空并输入文本；元素不存在时返回 `Ok(false)`
    async fn fill(&self, selector: &str, value: &str) -> Result<bool, EngineError>;

    /// 元素边界框；元素不存在时返回 `Ok(None)`
    async fn bounding_box(&self, selector: &str) -> Result<Option<BoundingBox>, EngineError>;

    /// 将指针移动到视口坐标
    async fn move_mouse(&self, x: f64, y: f64) -> Result<(), EngineError>;

    /// 页面完整 HTML
    async fn content(&self) -> Result<String, EngineError>;

    /// 页面标题
    async fn title(&self) -> Result<Option<String>, EngineError>;

    /// 当前URL
    async fn current_url(&self) -> Result<Option<String>, EngineError>;

    /// 开始被动捕获匹配过滤器的 JSON 响应
    ///
    /// 返回值的生命周期即捕获的生命周期，丢弃即停止。
    async fn capture_responses(&self, filter: ResponseFilter)
        -> Result<ResponseCollector, EngineError>;

    /// 选择器是否存在且可见
    async fn is_visible(&self, selector: &str) -> Result<bool, EngineError> {
        let script = format!(
            r#"(() => {{
                const el = document.querySelector({sel});
                if (!el) return false;
                const style = window.getComputedStyle(el);
                const rect = el.getBoundingClientRect();
                return style.display !== 'none' && style.visibility !== 'hidden' && rect.width > 0 && rect.height > 0;
            }})()"#,
            sel = js_string(selector)
        );
        Ok(self.evaluate(&script).await?.as_bool().unwrap_or(false))
    }

    /// 轮询等待选择器出现，超时返回 `Ok(false)`
    async fn wait_for_selector(
        &self,
        selector: &str,
        timeout: Duration,
    ) -> Result<bool, EngineError> {
        let script = format!("document.querySelector({}) !== null", js_string(selector));
        let deadline = Instant::now() + timeout;
        loop {
            if self.evaluate(&script).await?.as_bool().unwrap_or(false) {
                return Ok(true);
            }
            if Instant::now() >= deadline {
                return Ok(false);
            }
            tokio::time::sleep(Duration::from_millis(250)).await;
        }
    }

    /// 滚动到指定纵坐标
    async fn scroll_to(&self, y: u32) -> Result<(), EngineError> {
        self.evaluate(&format!("window.scrollTo(0, {})", y)).await?;
        Ok(())
    }

    /// 关闭会话
    async fn close(&self) -> Result<(), EngineError> {
        Ok(())
    }
}

/// 把 Rust 字符串转成安全的 JS 字符串字面量
pub fn js_string(value: &str) -> String {
    Value::String(value.to_string()).to_string()
}
