// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use serde_json::{Map, Value};
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::config::settings::PacingSettings;
use crate::domain::models::captured_response::ResponseFilter;
use crate::domain::models::extraction_state::{ExtractionState, StateTrace};
use crate::domain::models::record::{ScrapeMetadata, ScrapeOutcome, ScrapedRecord};
use crate::engines::response_collector::ResponseCollector;
use crate::engines::traits::BrowserSession;

/// 单次页面访问的超时设置
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VisitTimeouts {
    pub navigation: Duration,
    pub content: Duration,
    pub settle: Duration,
}

impl From<&PacingSettings> for VisitTimeouts {
    fn from(pacing: &PacingSettings) -> Self {
        Self {
            navigation: pacing.navigation_timeout(),
            content: pacing.content_timeout(),
            settle: pacing.settle(),
        }
    }
}

/// 一次页面访问
///
/// 负责导航、等待内容和状态机记录，保证访问结束时总是处于 `Done`。
pub struct PageVisit<'a> {
    session: &'a dyn BrowserSession,
    timeouts: VisitTimeouts,
    trace: StateTrace,
    metadata: ScrapeMetadata,
    content_timed_out: bool,
}

impl<'a> PageVisit<'a> {
    pub fn new(session: &'a dyn BrowserSession, url: impl Into<String>, timeouts: VisitTimeouts) -> Self {
        Self {
            session,
            timeouts,
            trace: StateTrace::new(),
            metadata: ScrapeMetadata::new(url),
            content_timed_out: false,
        }
    }

    pub fn session(&self) -> &'a dyn BrowserSession {
        self.session
    }

    pub fn timeouts(&self) -> VisitTimeouts {
        self.timeouts
    }

    pub fn metadata_mut(&mut self) -> &mut ScrapeMetadata {
        &mut self.metadata
    }

    fn step(&mut self, next: ExtractionState) {
        if let Err(e) = self.trace.advance(next) {
            warn!("{}", e);
        }
    }

    /// 导航到目标URL
    ///
    /// 失败或超时时记录错误并直接进入 `Done`，返回 `false`。
    pub async fn navigate(&mut self) -> bool {
        self.step(ExtractionState::Navigating);
        let url = self.metadata.url.clone();
        info!("Navigating to {}", url);

        let failure = match tokio::time::timeout(self.timeouts.navigation, self.session.goto(&url)).await
        {
            Ok(Ok(())) => None,
            Ok(Err(e)) => Some(format!("navigation failed: {}", e)),
            Err(_) => Some(format!(
                "navigation timed out after {}s",
                self.timeouts.navigation.as_secs()
            )),
        };

        match failure {
            Some(message) => {
                warn!(url = %url, "{}", message);
                self.metadata.note_error(message);
                self.step(ExtractionState::Done);
                false
            }
            None => {
                self.step(ExtractionState::WaitingForContent);
                true
            }
        }
    }

    /// 等待内容选择器出现，然后进入 `Extracting`
    ///
    /// 超时不会中止访问：经过 `ContentTimedOut` 后仍尽力提取。
    pub async fn await_content(&mut self, selector: &str) -> bool {
        let wait = self.session.wait_for_selector(selector, self.timeouts.content);
        let appeared = matches!(
            tokio::time::timeout(self.timeouts.content + Duration::from_secs(1), wait).await,
            Ok(Ok(true))
        );

        if !appeared {
            warn!(selector, "Content did not appear in time, extracting best-effort");
            self.content_timed_out = true;
            self.metadata.set_extra("content_timed_out", true);
            self.step(ExtractionState::ContentTimedOut);
        }
        self.step(ExtractionState::Extracting);
        appeared
    }

    /// 滚动并等待页面渲染
    pub async fn scroll_and_settle(&self, y: u32) {
        if let Err(e) = self.session.scroll_to(y).await {
            debug!("Scroll failed: {}", e);
        }
        self.settle().await;
    }

    pub async fn settle(&self) {
        tokio::time::sleep(self.timeouts.settle).await;
    }

    pub fn note_error(&mut self, message: impl Into<String>) {
        self.metadata.note_error(message);
    }

    pub fn set_extra(&mut self, key: &str, value: impl Into<Value>) {
        self.metadata.set_extra(key, value);
    }

    /// 合并恢复策略留下的诊断信息
    pub fn absorb_notes(&mut self, notes: Map<String, Value>) {
        self.metadata.extra.extend(notes);
    }

    pub fn set_strategy(&mut self, strategy: impl Into<String>) {
        self.metadata.strategy = Some(strategy.into());
    }

    /// 结束访问，组装结果
    pub async fn finish(mut self, records: Vec<ScrapedRecord>) -> ScrapeOutcome {
        if self.trace.current() != ExtractionState::Done {
            if let Ok(Some(title)) = self.session.title().await {
                self.metadata.page_title = Some(title);
            }
            if self.content_timed_out && records.is_empty() {
                let message = format!(
                    "content did not appear within {}s",
                    self.timeouts.content.as_secs()
                );
                self.metadata.note_error(message);
            }
            self.step(ExtractionState::Done);
        }

        info!(
            url = %self.metadata.url,
            rows = records.len(),
            errors = self.metadata.errors.len(),
            "Page visit finished"
        );
        self.metadata.states = self.trace.into_states();
        ScrapeOutcome::new(records, self.metadata)
    }
}

/// 在导航之前开始捕获响应；捕获不可用时返回空的收集器
pub async fn start_capture(session: &dyn BrowserSession, filter: ResponseFilter) -> ResponseCollector {
    match session.capture_responses(filter).await {
        Ok(collector) => collector,
        Err(e) => {
            warn!("Network capture unavailable: {}", e);
            ResponseCollector::detached()
        }
    }
}
