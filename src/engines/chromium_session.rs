// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use chromiumoxide::cdp::browser_protocol::network::{
    EventLoadingFinished, EventResponseReceived, GetResponseBodyParams, RequestId,
};
use chromiumoxide::layout::Point;
use chromiumoxide::{Browser, BrowserConfig, Page};
use futures::StreamExt;
use parking_lot::Mutex;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

use crate::config::settings::BrowserSettings;
use crate::domain::models::captured_response::{CapturedResponse, ResponseFilter};
use crate::engines::response_collector::ResponseCollector;
use crate::engines::traits::{BoundingBox, BrowserSession, EngineError};

/// Chromium 浏览器会话
///
/// 基于chromiumoxide实现，整个运行期间只持有一个页面。
pub struct ChromiumSession {
    browser: tokio::sync::Mutex<Browser>,
    page: Page,
    handler: JoinHandle<()>,
    remote: bool,
}

impl ChromiumSession {
    /// 启动本地 Chrome，或在配置了远程调试地址时连接已有实例
    pub async fn launch(settings: &BrowserSettings) -> Result<Self, EngineError> {
        let remote_debugging_url = settings
            .remote_debugging_url
            .clone()
            .or_else(|| std::env::var("CHROMIUM_REMOTE_DEBUGGING_URL").ok());

        let (browser, mut handler) = if let Some(ref url) = remote_debugging_url {
            tracing::info!("Connecting to remote Chrome instance at: {}", url);
            Browser::connect(url)
                .await
                .map_err(|e| EngineError::Launch(format!("Failed to connect to remote Chrome: {}", e)))?
        } else {
            let mut builder = BrowserConfig::builder()
                .no_sandbox()
                .request_timeout(Duration::from_secs(settings.request_timeout_secs))
                .window_size(settings.window_width, settings.window_height);

            if !settings.headless {
                builder = builder.with_head();
            }

            builder = builder
                .arg("--disable-gpu")
                .arg("--disable-dev-shm-usage")
                .arg("--lang=ko-KR");

            Browser::launch(builder.build().map_err(EngineError::Launch)?)
                .await
                .map_err(|e| EngineError::Launch(e.to_string()))?
        };

        // Spawn a handler to process browser events
        let handler = tokio::spawn(async move {
            while let Some(h) = handler.next().await {
                if h.is_err() {
                    break;
                }
            }
        });

        let page = browser
            .new_page("about:blank")
            .await
            .map_err(|e| EngineError::Launch(e.to_string()))?;

        tracing::debug!(
            "Browser page ready (headless={}, remote={})",
            settings.headless,
            remote_debugging_url.is_some()
        );

        Ok(Self {
            browser: tokio::sync::Mutex::new(browser),
            page,
            handler,
            remote: remote_debugging_url.is_some(),
        })
    }
}

impl Drop for ChromiumSession {
    fn drop(&mut self) {
        self.handler.abort();
    }
}

fn protocol<E: std::fmt::Display>(e: E) -> EngineError {
    EngineError::Protocol(e.to_string())
}

#[async_trait]
impl BrowserSession for ChromiumSession {
    async fn goto(&self, url: &str) -> Result<(), EngineError> {
        self.page.goto(url).await.map_err(protocol)?;
        Ok(())
    }

    async fn evaluate(&self, script: &str) -> Result<Value, EngineError> {
        let result = self.page.evaluate(script).await.map_err(protocol)?;
        Ok(result.value().cloned().unwrap_or(Value::Null))
    }

    async fn click(&self, selector: &str) -> Result<(), EngineError> {
        self.page
            .find_element(selector)
            .await
            .map_err(|_| EngineError::NotFound(selector.to_string()))?
            .click()
            .await
            .map_err(|e| EngineError::Protocol(format!("Click failed: {}", e)))?;
        Ok(())
    }

    async fn fill(&self, selector: &str, value: &str) -> Result<bool, EngineError> {
        let element = match self.page.find_element(selector).await {
            Ok(element) => element,
            Err(_) => return Ok(false),
        };

        // clear any prefilled value before typing
        let clear = format!(
            "(() => {{ const el = document.querySelector({}); if (el) {{ el.value = ''; el.focus(); }} return !!el; }})()",
            crate::engines::traits::js_string(selector)
        );
        self.evaluate(&clear).await?;

        element
            .click()
            .await
            .map_err(|e| EngineError::Protocol(format!("Input focus failed: {}", e)))?
            .type_str(value)
            .await
            .map_err(|e| EngineError::Protocol(format!("Input failed: {}", e)))?;
        Ok(true)
    }

    async fn bounding_box(&self, selector: &str) -> Result<Option<BoundingBox>, EngineError> {
        let element = match self.page.find_element(selector).await {
            Ok(element) => element,
            Err(_) => return Ok(None),
        };
        match element.bounding_box().await {
            Ok(b) => Ok(Some(BoundingBox {
                x: b.x,
                y: b.y,
                width: b.width,
                height: b.height,
            })),
            Err(e) => {
                tracing::debug!("No bounding box for {}: {}", selector, e);
                Ok(None)
            }
        }
    }

    async fn move_mouse(&self, x: f64, y: f64) -> Result<(), EngineError> {
        self.page
            .move_mouse(Point { x, y })
            .await
            .map_err(protocol)?;
        Ok(())
    }

    async fn content(&self) -> Result<String, EngineError> {
        self.page.content().await.map_err(protocol)
    }

    async fn title(&self) -> Result<Option<String>, EngineError> {
        self.page.get_title().await.map_err(protocol)
    }

    async fn current_url(&self) -> Result<Option<String>, EngineError> {
        self.page.url().await.map_err(protocol)
    }

    async fn capture_responses(
        &self,
        filter: ResponseFilter,
    ) -> Result<ResponseCollector, EngineError> {
        let mut received = self
            .page
            .event_listener::<EventResponseReceived>()
            .await
            .map_err(protocol)?;
        let mut finished = self
            .page
            .event_listener::<EventLoadingFinished>()
            .await
            .map_err(protocol)?;

        let captured = Arc::new(Mutex::new(Vec::new()));
        let sink = captured.clone();
        let page = self.page.clone();

        let listener = tokio::spawn(async move {
            let mut pending: HashMap<RequestId, (String, u16)> = HashMap::new();
            loop {
                tokio::select! {
                    Some(event) = received.next() => {
                        let url = &event.response.url;
                        if filter.matches(url) {
                            pending.insert(
                                event.request_id.clone(),
                                (url.clone(), event.response.status as u16),
                            );
                        }
                    }
                    Some(event) = finished.next() => {
                        let Some((url, status)) = pending.remove(&event.request_id) else {
                            continue;
                        };
                        match fetch_json_body(&page, event.request_id.clone()).await {
                            Some(body) => {
                                tracing::debug!("Captured API response: {}", url);
                                sink.lock().push(CapturedResponse::new(url, status, body));
                            }
                            None => tracing::trace!("Skipping non-JSON response: {}", url),
                        }
                    }
                    else => break,
                }
            }
        });

        Ok(ResponseCollector::attached(captured, listener))
    }

    async fn close(&self) -> Result<(), EngineError> {
        if self.remote {
            self.page.clone().close().await.map_err(protocol)?;
            return Ok(());
        }
        let mut browser = self.browser.lock().await;
        browser.close().await.map_err(protocol)?;
        browser.wait().await.map_err(protocol)?;
        Ok(())
    }
}

/// 读取响应体并解析为 JSON；不是 JSON 时返回 `None`
async fn fetch_json_body(page: &Page, request_id: RequestId) -> Option<Value> {
    let response = page
        .execute(GetResponseBodyParams::new(request_id))
        .await
        .ok()?;
    let text = if response.result.base64_encoded {
        let bytes = BASE64.decode(response.result.body.as_bytes()).ok()?;
        String::from_utf8(bytes).ok()?
    } else {
        response.result.body.clone()
    };
    serde_json::from_str(&text).ok()
}
