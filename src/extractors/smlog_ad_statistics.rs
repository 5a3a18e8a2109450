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
use super::smlog_conversion_summary::{click_first, open_page_tab, PAGE_TAB};
use super::traits::{ExtractorSettings, PageExtractor};
use super::urls;
use crate::domain::models::date_range::DATE_FORMAT;
use crate::domain::models::record::{ScrapeOutcome, ScrapedRecord};
use crate::domain::services::html_table::{parse_table, TableGrid};
use crate::engines::traits::BrowserSession;

pub const NETWORK_MODULE: &str = "smlog_ad_network";
pub const KEYWORD_MODULE: &str = "smlog_ad_keyword";
pub const SITE_MODULE: &str = "smlog_ad_site";
pub const MEDIA_MODULE: &str = "smlog_ad_media";

/// 日期区间输入框，内容形如 `2025.11.15 - 2025.11.15`
const DATERANGE_INPUT: &str = "input[name=\"daterange\"]";

const DATERANGE_FORMAT: &str = "%Y.%m.%d";

const APPLY_BUTTONS: &[&str] = &[
    "button.applyBtn",
    ".applyBtn",
    "button.btn-primary.applyBtn",
    "button[class*=\"applyBtn\"]",
];

const SEARCH_BUTTONS: &[&str] = &[
    "#search_btn",
    ".btn-container-search",
    "div.btn-container-search",
];

const TABLE_SELECTORS: &[&str] = &["table.card-table", "table.table-centered", "table.table", "table"];

const READ_DATERANGE: &str = r#"(() => {
    const el = document.querySelector('input[name="daterange"]');
    return el ? el.value : null;
})()"#;

/// 重新输入日期的次数上限
const DATE_ATTEMPTS: usize = 3;

/// 等待表格出现数据行的次数上限
const TABLE_ATTEMPTS: usize = 3;

/// 广告统计页中的一个标签
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AdStatisticsPage {
    pub module: &'static str,
    pub tab_text: &'static str,
}

pub const NETWORK: AdStatisticsPage = AdStatisticsPage {
    module: NETWORK_MODULE,
    tab_text: "네트워크",
};

pub const KEYWORD: AdStatisticsPage = AdStatisticsPage {
    module: KEYWORD_MODULE,
    tab_text: "키워드",
};

pub const SITE: AdStatisticsPage = AdStatisticsPage {
    module: SITE_MODULE,
    tab_text: "사이트",
};

pub const MEDIA: AdStatisticsPage = AdStatisticsPage {
    module: MEDIA_MODULE,
    tab_text: "미디어",
};

/// 按模块名查找标签
pub fn page_for(module: &str) -> Option<AdStatisticsPage> {
    [NETWORK, KEYWORD, SITE, MEDIA]
        .into_iter()
        .find(|page| page.module == module)
}

/// 网站分析的广告统计（网络、关键词、站点、媒体四个标签）
///
/// 每天打开标签，在日期区间输入框里输入同一天作为起止，点击应用和查询，
/// 确认输入框的值后解析表格，每行追加 `date` 列。
#[derive(Clone)]
pub struct SmlogAdStatistics {
    page: AdStatisticsPage,
    settings: Arc<ExtractorSettings>,
    day: NaiveDate,
}

impl SmlogAdStatistics {
    pub fn new(page: AdStatisticsPage, settings: Arc<ExtractorSettings>) -> Self {
        Self {
            page,
            settings,
            day: Local::now().date_naive(),
        }
    }

    fn daterange_text(&self) -> String {
        let d = self.day.format(DATERANGE_FORMAT).to_string();
        format!("{} - {}", d, d)
    }

    /// 输入日期区间并刷新；返回 `false` 表示找不到输入框
    async fn enter_daterange(&self, visit: &mut PageVisit<'_>) -> bool {
        let session = visit.session();
        let wanted = self.daterange_text();

        if !matches!(session.fill(DATERANGE_INPUT, &wanted).await, Ok(true)) {
            visit.note_error("daterange input not found");
            return false;
        }
        self.apply_and_search(visit).await;

        let mut confirmed = false;
        for attempt in 1..=DATE_ATTEMPTS {
            let current = match session.evaluate(READ_DATERANGE).await {
                Ok(Value::String(value)) => value,
                _ => String::new(),
            };
            if current.trim() == wanted {
                confirmed = true;
                break;
            }
            debug!(attempt, current = %current, "Date range mismatch, re-entering {}", wanted);
            if let Err(e) = session.fill(DATERANGE_INPUT, &wanted).await {
                debug!("Re-entering date range failed: {}", e);
            }
            self.apply_and_search(visit).await;
        }

        if !confirmed {
            warn!("Unable to confirm date range {}", wanted);
        }
        visit.set_extra("date_confirmed", confirmed);
        true
    }

    async fn apply_and_search(&self, visit: &mut PageVisit<'_>) {
        let session = visit.session();
        if click_first(session, APPLY_BUTTONS).await.is_none() {
            debug!("Apply button not visible, continuing");
        }
        visit.settle().await;

        match click_first(session, SEARCH_BUTTONS).await {
            Some(selector) => visit.set_extra("search_button", selector),
            None => {
                warn!("Search button not found, data may not refresh");
                visit.set_extra("search_button", Value::Null);
            }
        }
        visit.settle().await;
    }

    /// 等待表格出现数据行，全空的行被丢弃
    async fn read_table(&self, visit: &PageVisit<'_>) -> Option<TableGrid> {
        let mut last = None;
        for attempt in 1..=TABLE_ATTEMPTS {
            visit.settle().await;
            let html = visit.session().content().await.unwrap_or_default();
            let grid = parse_table(&html, TABLE_SELECTORS).map(|mut grid| {
                grid.rows
                    .retain(|row| row.iter().any(|cell| !cell.trim().is_empty()));
                grid
            });
            if grid.as_ref().is_some_and(|g| !g.rows.is_empty()) {
                return grid;
            }
            debug!(attempt, "Table has no data rows yet");
            last = grid;
        }
        last
    }
}

#[async_trait]
impl PageExtractor for SmlogAdStatistics {
    fn module_name(&self) -> &'static str {
        self.page.module
    }

    fn configure(&mut self, day: NaiveDate) {
        self.day = day;
    }

    fn target_url(&self) -> String {
        urls::smlog_ad_statistics(&self.settings.site)
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

        if !open_page_tab(session, self.page.tab_text).await {
            warn!("Tab {} not found", self.page.tab_text);
            visit.note_error(format!("tab {} not found", self.page.tab_text));
            return visit.finish(Vec::new()).await;
        }
        visit.set_extra("tab", self.page.tab_text);
        visit.settle().await;

        if !self.enter_daterange(&mut visit).await {
            return visit.finish(Vec::new()).await;
        }

        let date = self.day.format(DATE_FORMAT).to_string();
        let records: Vec<ScrapedRecord> = match self.read_table(&visit).await {
            Some(grid) => {
                visit.set_strategy("html_parse");
                visit.set_extra("headers", grid.column_names());
                grid.records()
                    .into_iter()
                    .map(|record| record.with("date", date.clone()))
                    .collect()
            }
            None => {
                info!("No {} table for {}", self.page.tab_text, date);
                Vec::new()
            }
        };
        info!(
            "Extracted {} {} rows for {}",
            records.len(),
            self.page.tab_text,
            date
        );
        visit.finish(records).await
    }
}
