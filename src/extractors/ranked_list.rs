// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use async_trait::async_trait;
use chrono::{Local, NaiveDate};
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info};

use super::page_visit::{PageVisit, VisitTimeouts};
use super::traits::{ExtractorSettings, PageExtractor};
use super::urls;
use crate::domain::models::record::{ScrapeOutcome, ScrapedRecord};
use crate::domain::services::vendor_rules::ranked_count;
use crate::engines::traits::{js_string, BrowserSession};

const LIST_TEMPLATE: &str = r#"(() => {
    const list = document.querySelector(__LIST__);
    if (!list) return [];
    const textOf = (el) => (el ? (el.innerText || el.textContent || '').trim() : null);
    return Array.from(list.querySelectorAll('li')).map((li) => ({
        rank: textOf(li.querySelector('strong.styles_rank_num__Pkqpj')),
        name: textOf(li.querySelector('strong.styles_rank_name__usvhI')),
        text: textOf(li) || '',
        fragments: Array.from(li.querySelectorAll('span')).map((s) => textOf(s))
    }));
})()"#;

/// 智能电话统计页上的一个排名列表
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RankedListPage {
    pub module: &'static str,
    /// 名称列的字段名，如 `media`、`keyword`
    pub name_field: &'static str,
    /// 等待出现的元素
    pub wait_selector: &'static str,
    /// 列表 `ul` 的选择器
    pub list_selector: &'static str,
}

#[derive(Debug, Deserialize)]
struct RankedItem {
    rank: Option<String>,
    name: Option<String>,
    #[serde(default)]
    text: String,
    #[serde(default)]
    fragments: Vec<Option<String>>,
}

impl RankedItem {
    fn record(&self, name_field: &str) -> Option<ScrapedRecord> {
        let name = self.name.as_deref().filter(|n| !n.is_empty())?;
        let rank = self.rank.as_deref();
        let fragments: Vec<String> = self.fragments.iter().flatten().cloned().collect();
        let count = ranked_count(rank, &self.text, &fragments);
        Some(
            ScrapedRecord::new()
                .with("rank", rank_value(rank))
                .with(name_field, name)
                .with("count", count),
        )
    }
}

/// 排名能解析成整数时输出数字，否则保留原文
fn rank_value(rank: Option<&str>) -> Value {
    match rank.map(str::trim) {
        Some(text) => text
            .parse::<i64>()
            .map(Value::from)
            .unwrap_or_else(|_| Value::String(text.to_string())),
        None => Value::Null,
    }
}

/// 排名列表提取器：`{rank, <name_field>, count}`
#[derive(Clone)]
pub struct RankedList {
    page: RankedListPage,
    settings: Arc<ExtractorSettings>,
    day: NaiveDate,
}

impl RankedList {
    pub fn new(page: RankedListPage, settings: Arc<ExtractorSettings>) -> Self {
        Self {
            page,
            settings,
            day: Local::now().date_naive(),
        }
    }

    pub fn page(&self) -> &RankedListPage {
        &self.page
    }

    fn list_script(&self) -> String {
        LIST_TEMPLATE.replace("__LIST__", &js_string(self.page.list_selector))
    }
}

#[async_trait]
impl PageExtractor for RankedList {
    fn module_name(&self) -> &'static str {
        self.page.module
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
        visit.scroll_and_settle(800).await;
        visit.await_content(self.page.wait_selector).await;

        let items = match session.evaluate(&self.list_script()).await {
            Ok(raw) => serde_json::from_value::<Vec<RankedItem>>(raw).unwrap_or_default(),
            Err(e) => {
                debug!(module = self.page.module, "Ranked list script failed: {}", e);
                Vec::new()
            }
        };
        let records: Vec<ScrapedRecord> = items
            .iter()
            .filter_map(|item| item.record(self.page.name_field))
            .collect();

        info!(
            module = self.page.module,
            "Found {} list items, {} ranked rows",
            items.len(),
            records.len()
        );
        visit.set_strategy("page_script");
        visit.set_extra("items_found", items.len());
        visit.finish(records).await
    }
}
