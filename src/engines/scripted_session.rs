// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

//! 内存中的脚本化浏览器会话，供单元测试使用

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use crate::domain::models::captured_response::{CapturedResponse, ResponseFilter};
use crate::engines::response_collector::ResponseCollector;
use crate::engines::traits::{BoundingBox, BrowserSession, EngineError};

type ClickHook = Arc<dyn Fn(&ScriptedSession) + Send + Sync>;
type TooltipFn = Arc<dyn Fn(f64, f64) -> Option<String> + Send + Sync>;

/// Marker every tooltip finder script carries.
pub const TOOLTIP_MARKER: &str = "findTooltip";

#[derive(Default)]
pub struct ScriptedSession {
    elements: Mutex<HashSet<String>>,
    hidden: Mutex<HashSet<String>>,
    boxes: Mutex<HashMap<String, BoundingBox>>,
    scripts: Mutex<Vec<(String, Value)>>,
    click_hooks: Mutex<HashMap<String, ClickHook>>,
    tooltip: Mutex<Option<TooltipFn>>,
    html: Mutex<String>,
    title: Mutex<Option<String>>,
    responses: Mutex<Vec<CapturedResponse>>,
    failing_urls: Mutex<Vec<String>>,
    hanging_urls: Mutex<Vec<String>>,
    pointer: Mutex<(f64, f64)>,
    visited: Mutex<Vec<String>>,
    clicks: Mutex<Vec<String>>,
    filled: Mutex<Vec<(String, String)>>,
    moves: Mutex<Vec<(f64, f64)>>,
}

impl ScriptedSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_element(self, selector: &str) -> Self {
        self.elements.lock().insert(selector.to_string());
        self
    }

    pub fn with_box(self, selector: &str, bbox: BoundingBox) -> Self {
        self.elements.lock().insert(selector.to_string());
        self.boxes.lock().insert(selector.to_string(), bbox);
        self
    }

    /// Scripts containing `needle` evaluate to `value`; earlier rules win.
    pub fn with_script(self, needle: &str, value: Value) -> Self {
        self.on_script(needle, value);
        self
    }

    pub fn on_script(&self, needle: &str, value: Value) {
        self.scripts.lock().push((needle.to_string(), value));
    }

    pub fn with_tooltip<F>(self, f: F) -> Self
    where
        F: Fn(f64, f64) -> Option<String> + Send + Sync + 'static,
    {
        *self.tooltip.lock() = Some(Arc::new(f));
        self
    }

    pub fn with_html(self, html: &str) -> Self {
        *self.html.lock() = html.to_string();
        self
    }

    pub fn with_title(self, title: &str) -> Self {
        *self.title.lock() = Some(title.to_string());
        self
    }

    pub fn with_responses(self, responses: Vec<CapturedResponse>) -> Self {
        *self.responses.lock() = responses;
        self
    }

    /// Navigation to URLs containing `needle` fails.
    pub fn failing_on(self, needle: &str) -> Self {
        self.failing_urls.lock().push(needle.to_string());
        self
    }

    /// Navigation to URLs containing `needle` never completes.
    pub fn hanging_on(self, needle: &str) -> Self {
        self.hanging_urls.lock().push(needle.to_string());
        self
    }

    pub fn on_click<F>(&self, selector: &str, hook: F)
    where
        F: Fn(&ScriptedSession) + Send + Sync + 'static,
    {
        self.click_hooks
            .lock()
            .insert(selector.to_string(), Arc::new(hook));
    }

    pub fn on_submit<F>(&self, selector: &str, hook: F)
    where
        F: Fn(&ScriptedSession) + Send + Sync + 'static,
    {
        self.on_click(selector, hook);
    }

    pub fn hide(&self, selector: &str) {
        self.hidden.lock().insert(selector.to_string());
    }

    pub fn visited(&self) -> Vec<String> {
        self.visited.lock().clone()
    }

    pub fn clicks(&self) -> Vec<String> {
        self.clicks.lock().clone()
    }

    pub fn filled(&self) -> Vec<(String, String)> {
        self.filled.lock().clone()
    }

    pub fn moves(&self) -> Vec<(f64, f64)> {
        self.moves.lock().clone()
    }

    fn exists(&self, selector: &str) -> bool {
        self.elements.lock().contains(selector)
    }
}

#[async_trait]
impl BrowserSession for ScriptedSession {
    async fn goto(&self, url: &str) -> Result<(), EngineError> {
        self.visited.lock().push(url.to_string());
        let hangs = self.hanging_urls.lock().iter().any(|n| url.contains(n.as_str()));
        if hangs {
            tokio::time::sleep(Duration::from_secs(24 * 3600)).await;
        }
        if self.failing_urls.lock().iter().any(|n| url.contains(n.as_str())) {
            return Err(EngineError::Protocol(format!("net::ERR_FAILED {}", url)));
        }
        Ok(())
    }

    async fn evaluate(&self, script: &str) -> Result<Value, EngineError> {
        if script.contains(TOOLTIP_MARKER) {
            let tooltip = self.tooltip.lock().clone();
            if let Some(tooltip) = tooltip {
                let (x, y) = *self.pointer.lock();
                return Ok(tooltip(x, y).map(Value::String).unwrap_or(Value::Null));
            }
        }
        let scripts = self.scripts.lock();
        Ok(scripts
            .iter()
            .find(|(needle, _)| script.contains(needle.as_str()))
            .map(|(_, value)| value.clone())
            .unwrap_or(Value::Null))
    }

    async fn click(&self, selector: &str) -> Result<(), EngineError> {
        if !self.exists(selector) {
            return Err(EngineError::NotFound(selector.to_string()));
        }
        self.clicks.lock().push(selector.to_string());
        let hook = self.click_hooks.lock().get(selector).cloned();
        if let Some(hook) = hook {
            hook(self);
        }
        Ok(())
    }

    async fn fill(&self, selector: &str, value: &str) -> Result<bool, EngineError> {
        if !self.exists(selector) {
            return Ok(false);
        }
        self.filled
            .lock()
            .push((selector.to_string(), value.to_string()));
        Ok(true)
    }

    async fn bounding_box(&self, selector: &str) -> Result<Option<BoundingBox>, EngineError> {
        Ok(self.boxes.lock().get(selector).copied())
    }

    async fn move_mouse(&self, x: f64, y: f64) -> Result<(), EngineError> {
        *self.pointer.lock() = (x, y);
        self.moves.lock().push((x, y));
        Ok(())
    }

    async fn content(&self) -> Result<String, EngineError> {
        Ok(self.html.lock().clone())
    }

    async fn title(&self) -> Result<Option<String>, EngineError> {
        Ok(self.title.lock().clone())
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
        Ok(self.exists(selector) && !self.hidden.lock().contains(selector))
    }

    async fn wait_for_selector(
        &self,
        selector: &str,
        timeout: Duration,
    ) -> Result<bool, EngineError> {
        if self.exists(selector) {
            return Ok(true);
        }
        tokio::time::sleep(timeout).await;
        Ok(false)
    }
}
