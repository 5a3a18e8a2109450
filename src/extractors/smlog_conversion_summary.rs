// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use async_trait::async_trait;
use chrono::{Local, NaiveDate};
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::page_visit::{PageVisit, VisitTimeouts};
use super::traits::{ExtractorSettings, PageExtractor};
use super::urls;
use crate::domain::models::date_range::DATE_FORMAT;
use crate::domain::models::record::{ScrapeOutcome, ScrapedRecord};
use crate::domain::services::html_table::parse_table;
use crate::engines::traits::{js_string, BrowserSession};

pub const MODULE: &str = "smlog_conversion_summary";

/// 要打开的页内标签
pub const TAB_TEXT: &str = "유입유형(전체)";

pub(crate) const PAGE_TAB: &str = "div.page-tab";

const APPLY_BUTTONS: &[&str] = &[".applyBtn.btn.btn-sm.btn-primary", "button.applyBtn"];

const SEARCH_BUTTONS: &[&str] = &[
    ".btn-container-search",
    "button.btn-container-search",
    ".btn-search",
    "button[type=\"submit\"]",
    "button.btn-primary",
    "button.btn-search",
];

const TABLE_SELECTORS: &[&str] = &[
    "table.table.table-centered.table-nowrap.table-hover.mb-0.data",
    "table.data",
    "table.table-centered",
    "table",
];

const TAB_TEMPLATE: &str = r#"(() => {
    const wanted = __TEXT__;
    for (const tab of document.querySelectorAll('div.page-tab')) {
        if ((tab.innerText || tab.textContent || '').includes(wanted)) {
            tab.click();
            return true;
        }
    }
    return false;
})()"#;

/// 依次点击候选按钮，返回命中的选择器
pub(crate) async fn click_first(
    session: &dyn BrowserSession,
    candidates: &[&'static str],
) -> Option<&'static str> {
    for &selector in candidates {
        match session.click(selector).await {
            Ok(()) => return Some(selector),
            Err(e) => debug!(selector, "Button not clickable: {}", e),
        }
    }
    None
}

/// 点击文本包含 `text` 的页内标签
pub(crate) async fn open_page_tab(session: &dyn BrowserSession, text: &str) -> bool {
    let script = TAB_TEMPLATE.replace("__TEXT__", &js_string(text));
    matches!(session.evaluate(&script).await, Ok(Value::Bool(true)))
}

/// 返回成功设置的日期输入框个数
const DATE_TEMPLATE: &str = r#"(() => {
    const value = __DATE__;
    const inputs = Array.from(document.querySelectorAll('input.form-control[type="date"], input.form-control[type="text"]')).slice(0, 2);
    for (const input of inputs) {
        input.value = value;
        input.dispatchEvent(new Event('input', { bubbles: true }));
        input.dispatchEvent(new Event('change', { bubbles: true }));
    }
    return inputs.length;
})()"#;

/// 网站分析的转化汇总（按流入类型）
///
/// 页面URL不带日期：打开标签后在页面内填写起止日期并点击查询，
/// 再解析服务端渲染的表格，每行追加 `date` 列。
#[derive(Clone)]
pub struct SmlogConversionSummary {
    settings: Arc<ExtractorSettings>,
    day: NaiveDate,
}

impl SmlogConversionSummary {
    pub fn new(settings: Arc<ExtractorSettings>) -> Self {
        Self {
            settings,
            day: Local::now().date_naive(),
        }
    }

    async fn set_dates(&self, visit: &mut PageVisit<'_>) -> bool {
        let session = visit.session();
        let day = self.day.format(DATE_FORMAT).to_string();
        let script = DATE_TEMPLATE.replace("__DATE__", &js_string(&day));
        let filled = match session.evaluate(&script).await {
            Ok(value) => value.as_u64().unwrap_or(0),
            Err(e) => {
                warn!("Date inputs could not be set: {}", e);
                0
            }
        };
        if filled == 0 {
            visit.note_error("date inputs not found");
            return false;
        }
        debug!(inputs = filled, "Set date inputs to {}", day);

        match click_first(session, APPLY_BUTTONS).await {
            Some(selector) => debug!(selector, "Applied date range"),
            None => debug!("No apply button, relying on search"),
        }
        visit.settle().await;

        match click_first(session, SEARCH_BUTTONS).await {
            Some(selector) => {
                visit.set_extra("search_button", selector);
                true
            }
            None => {
                warn!("No search button found");
                visit.note_error("search button not found");
                false
            }
        }
    }
}

#[async_trait]
impl PageExtractor for SmlogConversionSummary {
    fn module_name(&self) -> &'static str {
        MODULE
    }

    fn configure(&mut self, day: NaiveDate) {
        self.day = day;
    }

    fn target_url(&self) -> String {
        urls::smlog_conversion_summary(&self.settings.site)
    }

    async fn extract(&self, session: &dyn BrowserSession) -> ScrapeOutcome {
        let mut visit = PageVisit::new(
            session,
            self.target_url(),
            VisitTimeouts::from(&self.settings.pacing),
        );
        if !visit.navigate().await {
            return visit.finish(Vec::new()).await;
        }
        visit.await_content(PAGE_TAB).await;

        if !open_page_tab(session, TAB_TEXT).await {
            warn!("Tab {} not found", TAB_TEXT);
            visit.note_error(format!("tab {} not found", TAB_TEXT));
            return visit.finish(Vec::new()).await;
        }
        visit.settle().await;

        if !self.set_dates(&mut visit).await {
            return visit.finish(Vec::new()).await;
        }
        visit.settle().await;

        let html = session.content().await.unwrap_or_default();
        let date = self.day.format(DATE_FORMAT).to_string();
        let records: Vec<ScrapedRecord> = match parse_table(&html, TABLE_SELECTORS) {
            Some(grid) => {
                visit.set_strategy("html_parse");
                visit.set_extra("headers", grid.column_names());
                grid.records()
                    .into_iter()
                    .map(|record| record.with("date", date.clone()))
                    .collect()
            }
            None => {
                info!("No conversion table for {}", date);
                Vec::new()
            }
        };
        info!("Extracted {} conversion rows for {}", records.len(), date);
        visit.finish(records).await
    }
}
