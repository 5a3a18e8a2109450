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
use crate::domain::models::record::ScrapeOutcome;
use crate::domain::services::html_table::{parse_split_table, SplitTable};
use crate::engines::traits::BrowserSession;

pub const MODULE: &str = "smartcall_call_statistics";

const DAILY_TAB: &str = "#__next > div > div:nth-child(3) > div > div.call_section > div.styles_call_info__qa5Bn > div.styles_info_tab__E4QqY > ul > li:nth-child(2) > a";
const SCROLL_TABLE: &str = "#call-daily > div > div.styles_table_scroll__or3Yy > table";
const FIXED_TABLE: &str = "#call-daily > div > div.styles_table_fixed__L7rWc table";

const DAILY_TAB_FALLBACK: &str = r#"(() => {
    const tabs = document.querySelectorAll('div.styles_info_tab__E4QqY ul li a');
    if (tabs.length < 2) return false;
    tabs[1].click();
    return true;
})()"#;

/// 与 [`parse_split_table`] 相同的规则，在页面内执行
const SPLIT_TABLE_SCRIPT: &str = r#"(() => {
    const texts = (row, sel) => Array.from(row.querySelectorAll(sel)).map((c) => (c.innerText || c.textContent || '').trim());
    const headerCells = (row) => {
        const th = texts(row, 'th');
        return th.length ? th : texts(row, 'td');
    };
    const result = { headers: [], indexRows: [], dataRows: [] };

    const fixed = document.querySelector('#call-daily > div > div.styles_table_fixed__L7rWc table');
    if (fixed) {
        const headerRows = Array.from(fixed.querySelectorAll('thead tr'));
        if (headerRows.length) {
            result.headers = headerCells(headerRows[0]);
            if (headerRows.length > 1) {
                result.headers = result.headers.concat(headerCells(headerRows[headerRows.length - 1]));
            }
            result.indexRows = headerRows.slice(1).map((tr) => texts(tr, 'td')).filter((r) => r.length);
        }
    }

    const scroll = document.querySelector('#call-daily > div > div.styles_table_scroll__or3Yy > table');
    if (scroll) {
        if (!result.headers.length) {
            const headerRows = scroll.querySelectorAll('thead tr');
            if (headerRows.length) result.headers = headerCells(headerRows[headerRows.length - 1]);
        }
        let rows = Array.from(scroll.querySelectorAll('tbody tr'));
        if (!rows.length) rows = Array.from(scroll.querySelectorAll('tr')).slice(1);
        result.dataRows = rows
            .map((tr) => texts(tr, 'td'))
            .filter((r) => r.length && r.some((c) => c !== ''));
    }
    return result;
})()"#;

/// 智能电话的按日通话统计
///
/// 表格分为左侧固定列（日期）和右侧滚动列（各项计数），两部分逐行拼接。
#[derive(Clone)]
pub struct SmartcallCallStatistics {
    settings: Arc<ExtractorSettings>,
    day: NaiveDate,
}

impl SmartcallCallStatistics {
    pub fn new(settings: Arc<ExtractorSettings>) -> Self {
        Self {
            settings,
            day: Local::now().date_naive(),
        }
    }

    async fn open_daily_tab(session: &dyn BrowserSession) -> bool {
        match session.click(DAILY_TAB).await {
            Ok(()) => true,
            Err(e) => {
                debug!("Daily tab click failed ({}), trying tab list", e);
                matches!(session.evaluate(DAILY_TAB_FALLBACK).await, Ok(Value::Bool(true)))
            }
        }
    }

    async fn read_table(visit: &mut PageVisit<'_>) -> SplitTable {
        let session = visit.session();
        let from_script = match session.evaluate(SPLIT_TABLE_SCRIPT).await {
            Ok(raw) => serde_json::from_value::<SplitTable>(raw).unwrap_or_default(),
            Err(e) => {
                debug!("Split table script failed: {}", e);
                SplitTable::default()
            }
        };
        if !from_script.is_empty() {
            visit.set_strategy("page_script");
            return from_script;
        }

        let html = match session.content().await {
            Ok(html) => html,
            Err(e) => {
                warn!("Page content unavailable: {}", e);
                return SplitTable::default();
            }
        };
        let parsed = parse_split_table(&html, FIXED_TABLE, SCROLL_TABLE);
        if !parsed.is_empty() {
            visit.set_strategy("html_parse");
        }
        parsed
    }
}

#[async_trait]
impl PageExtractor for SmartcallCallStatistics {
    fn module_name(&self) -> &'static str {
        MODULE
    }

    fn configure(&mut self, day: NaiveDate) {
        self.day = day;
    }

    fn target_url(&self) -> String {
        urls::smartcall_statistics(&self.settings.site, self.day)
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
        visit.settle().await;

        let tab_opened = Self::open_daily_tab(session).await;
        if !tab_opened {
            warn!("Daily tab not found, reading the default table");
        }
        visit.set_extra("daily_tab_opened", tab_opened);
        visit.await_content(SCROLL_TABLE).await;
        visit.settle().await;

        let table = Self::read_table(&mut visit).await;
        let records = table.merge();
        info!(
            headers = table.headers.len(),
            "Merged {} call statistics rows",
            records.len()
        );
        visit.set_extra("headers", table.headers.clone());
        visit.finish(records).await
    }
}
