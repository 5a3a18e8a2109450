// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use async_trait::async_trait;
use chrono::{Local, NaiveDate};
use scraper::{Html, Selector};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{debug, info};

use super::page_visit::{PageVisit, VisitTimeouts};
use super::traits::{ExtractorSettings, PageExtractor};
use super::urls;
use crate::domain::models::record::{DerivedOutput, ScrapeOutcome, ScrapedRecord};
use crate::engines::traits::BrowserSession;

pub const MODULE: &str = "place_inflow_channel";
/// 第 6~10 行写到这个模块下
pub const KEYWORD_MODULE: &str = "place_inflow_keyword";

const LIST_ITEM: &str = "li.Statistics_inflow_list_item__EjiuR";
const NAME_SELECTOR: &str = "span.Statistics_name__M29yR";
const RATIO_SELECTOR: &str = "span.Statistics_percent__5Tb06";

const TOP_ROWS: usize = 5;
const KEYWORD_ROWS: usize = 5;

const CHANNEL_SCRIPT: &str = r#"(() => {
    const rows = [];
    for (const item of document.querySelectorAll('li.Statistics_inflow_list_item__EjiuR')) {
        const nameEl = item.querySelector('span.Statistics_name__M29yR');
        const name = nameEl ? (nameEl.innerText || nameEl.textContent || '').trim() : '';
        if (!name) continue;
        const ratioEl = item.querySelector('span.Statistics_percent__5Tb06');
        const ratio = ratioEl ? (ratioEl.innerText || ratioEl.textContent || '').trim() : null;
        rows.push({ name, ratio });
    }
    return rows;
})()"#;

#[derive(Debug, Clone, PartialEq, Deserialize)]
struct InflowEntry {
    name: String,
    ratio: Option<String>,
}

impl InflowEntry {
    fn record(&self, name_field: &str) -> ScrapedRecord {
        let ratio = self.ratio.as_deref().map(strip_percent);
        ScrapedRecord::new()
            .with(name_field, self.name.clone())
            .with("ratio", ratio)
    }
}

fn strip_percent(text: &str) -> String {
    text.replace(['%', '％'], "").trim().to_string()
}

/// 从页面 HTML 读取列表项，脚本没有结果时使用
fn entries_from_html(html: &str) -> Vec<InflowEntry> {
    let (Ok(item_sel), Ok(name_sel), Ok(ratio_sel)) = (
        Selector::parse(LIST_ITEM),
        Selector::parse(NAME_SELECTOR),
        Selector::parse(RATIO_SELECTOR),
    ) else {
        return Vec::new();
    };
    let document = Html::parse_document(html);
    document
        .select(&item_sel)
        .filter_map(|li| {
            let text = |sel: &Selector| {
                li.select(sel)
                    .next()
                    .map(|el| el.text().collect::<String>().trim().to_string())
            };
            let name = text(&name_sel).filter(|n| !n.is_empty())?;
            Some(InflowEntry {
                name,
                ratio: text(&ratio_sel),
            })
        })
        .collect()
}

/// 流入渠道列表
///
/// 列表前 5 行是渠道，写到本模块；紧接着的 5 行是关键字，作为派生输出写到
/// `place_inflow_keyword`。
#[derive(Clone)]
pub struct PlaceInflowChannel {
    settings: Arc<ExtractorSettings>,
    day: NaiveDate,
}

impl PlaceInflowChannel {
    pub fn new(settings: Arc<ExtractorSettings>) -> Self {
        Self {
            settings,
            day: Local::now().date_naive(),
        }
    }

    async fn entries(visit: &mut PageVisit<'_>) -> Vec<InflowEntry> {
        let from_script = match visit.session().evaluate(CHANNEL_SCRIPT).await {
            Ok(raw) => serde_json::from_value::<Vec<InflowEntry>>(raw).unwrap_or_default(),
            Err(e) => {
                debug!("Channel script failed: {}", e);
                Vec::new()
            }
        };
        if !from_script.is_empty() {
            visit.set_strategy("page_script");
            return from_script;
        }

        let html = visit.session().content().await.unwrap_or_default();
        let from_html = entries_from_html(&html);
        if !from_html.is_empty() {
            visit.set_strategy("html_parse");
        }
        from_html
    }
}

#[async_trait]
impl PageExtractor for PlaceInflowChannel {
    fn module_name(&self) -> &'static str {
        MODULE
    }

    fn configure(&mut self, day: NaiveDate) {
        self.day = day;
    }

    fn target_url(&self) -> String {
        urls::place_statistics(&self.settings.site, self.day)
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
        visit.await_content(LIST_ITEM).await;

        let entries = Self::entries(&mut visit).await;
        info!("Found {} inflow list items", entries.len());
        visit.set_extra("items_found", entries.len());

        let channels: Vec<ScrapedRecord> = entries
            .iter()
            .take(TOP_ROWS)
            .map(|e| e.record("channel"))
            .collect();
        let keywords: Vec<ScrapedRecord> = entries
            .iter()
            .skip(TOP_ROWS)
            .take(KEYWORD_ROWS)
            .map(|e| e.record("keyword"))
            .collect();

        let mut outcome = visit.finish(channels).await;
        outcome.derived.push(DerivedOutput {
            module: KEYWORD_MODULE.to_string(),
            records: keywords,
        });
        outcome
    }
}
