// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use async_trait::async_trait;
use dashcrawl::config::settings::{ModuleSettings, Settings};
use dashcrawl::domain::models::captured_response::{CapturedResponse, ResponseFilter};
use dashcrawl::engines::response_collector::ResponseCollector;
use dashcrawl::engines::traits::{BoundingBox, BrowserSession, EngineError};
use parking_lot::Mutex;
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::time::Duration;

/// 内存中的仪表盘页面
///
/// 脚本按子串匹配，先注册的优先；未匹配的脚本返回 `null`。
#[derive(Default)]
pub struct FakeDashboard {
    visited: Mutex<Vec<String>>,
    elements: Mutex<HashSet<String>>,
    scripts: Mutex<Vec<(String, Value)>>,
    responses: Mutex<Vec<CapturedResponse>>,
    failing_urls: Mutex<Vec<String>>,
    removals: Mutex<HashMap<String, Vec<String>>>,
    html: Mutex<String>,
    closed: Mutex<bool>,
}

#[allow(dead_code)]
impl FakeDashboard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn element(self, selector: &str) -> Self {
        self.elements.lock().insert(selector.to_string());
        self
    }

    pub fn script(self, needle: &str, value: Value) -> Self {
        self.scripts.lock().push((needle.to_string(), value));
        self
    }

    pub fn response(self, url: &str, body: Value) -> Self {
        self.responses
            .lock()
            .push(CapturedResponse::new(url, 200, body));
        self
    }

    /// 导航到包含该子串的 URL 时失败
    pub fn fail_navigation(self, needle: &str) -> Self {
        self.failing_urls.lock().push(needle.to_string());
        self
    }

    /// 点击 `selector` 后这些元素从页面上消失
    pub fn click_removes(self, selector: &str, removed: &[&str]) -> Self {
        self.removals.lock().insert(
            selector.to_string(),
            removed.iter().map(|s| s.to_string()).collect(),
        );
        self
    }

    pub fn html(self, html: &str) -> Self {
        *self.html.lock() = html.to_string();
        self
    }

    pub fn visited(&self) -> Vec<String> {
        self.visited.lock().clone()
    }

    pub fn is_closed(&self) -> bool {
        *self.closed.lock()
    }
}

#[async_trait]
impl BrowserSession for FakeDashboard {
    async fn goto(&self, url: &str) -> Result<(), EngineError> {
        self.visited.lock().push(url.to_string());
        if self.failing_urls.lock().iter().any(|n| url.contains(n.as_str())) {
            return Err(EngineError::Protocol(format!("net::ERR_CONNECTION_RESET {}", url)));
        }
        Ok(())
    }

    async fn evaluate(&self, script: &str) -> Result<Value, EngineError> {
        Ok(self
            .scripts
            .lock()
            .iter()
            .find(|(needle, _)| script.contains(needle.as_str()))
            .map(|(_, value)| value.clone())
            .unwrap_or(Value::Null))
    }

    async fn click(&self, selector: &str) -> Result<(), EngineError> {
        let mut elements = self.elements.lock();
        if !elements.contains(selector) {
            return Err(EngineError::NotFound(selector.to_string()));
        }
        if let Some(removed) = self.removals.lock().get(selector) {
            for r in removed {
                elements.remove(r);
            }
        }
        Ok(())
    }

    async fn fill(&self, selector: &str, _value: &str) -> Result<bool, EngineError> {
        Ok(self.elements.lock().contains(selector))
    }

    async fn bounding_box(&self, _selector: &str) -> Result<Option<BoundingBox>, EngineError> {
        Ok(None)
    }

    async fn move_mouse(&self, _x: f64, _y: f64) -> Result<(), EngineError> {
        Ok(())
    }

    async fn content(&self) -> Result<String, EngineError> {
        Ok(self.html.lock().clone())
    }

    async fn title(&self) -> Result<Option<String>, EngineError> {
        Ok(Some("Dashboard".to_string()))
    }

    async fn current_url(&self) -> Result<Option<String>, EngineError> {
        Ok(self.visited.lock().last().cloned())
    }

    async fn capture_responses(
        &self,
        filter: ResponseFilter,
    ) -> Result<ResponseCollector, EngineError> {
        let matching = self
            .responses
            .lock()
            .iter()
            .filter(|r| filter.matches(&r.url))
            .cloned()
            .collect();
        Ok(ResponseCollector::with_responses(matching))
    }

    async fn is_visible(&self, selector: &str) -> Result<bool, EngineError> {
        Ok(self.elements.lock().contains(selector))
    }

    async fn wait_for_selector(
        &self,
        selector: &str,
        _timeout: Duration,
    ) -> Result<bool, EngineError> {
        Ok(self.elements.lock().contains(selector))
    }

    async fn close(&self) -> Result<(), EngineError> {
        *self.closed.lock() = true;
        Ok(())
    }
}

/// 从默认配置出发，输出到 `root`，只启用给定模块
pub fn settings(root: &Path, modules: Vec<ModuleSettings>) -> Settings {
    let mut settings = Settings::from_file("config/default").expect("default config loads");
    settings.output.root = root.display().to_string();
    settings.pacing.day_delay_ms = 10;
    settings.pacing.module_delay_ms = 20;
    settings.pacing.settle_ms = 10;
    settings.pacing.hourly_hover_delay_ms = 1;
    settings.pacing.booking_hover_delay_ms = 1;
    settings.modules = modules;
    settings
}

pub fn module(name: &str, start: &str, end: &str) -> ModuleSettings {
    ModuleSettings {
        name: name.to_string(),
        start_date: start.to_string(),
        end_date: end.to_string(),
        enabled: true,
    }
}
