// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use async_trait::async_trait;
use chrono::{Local, NaiveDate};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{debug, info};

use super::page_visit::{PageVisit, VisitTimeouts};
use super::traits::{ExtractorSettings, PageExtractor};
use super::urls;
use crate::domain::models::record::{ScrapeOutcome, ScrapedRecord};
use crate::domain::services::vendor_rules::{gender_totals, segment_ratio};
use crate::engines::traits::BrowserSession;

pub const MODULE: &str = "place_inflow_segment";

const AGE_AREA: &str = ".Statistics_bargraph_area__BEo44";

/// 年龄段柱状图在 `AGE_AREA` 内；区域外的 `div` 百分比依次是男性、女性的整体占比。
/// 百分号位于 `<em>` 中，读取时跳过。
const SEGMENT_SCRIPT: &str = r#"(() => {
    const ratioText = (el) => {
        let text = '';
        for (const node of el.childNodes) {
            if (node.nodeType === 3) text += node.textContent;
            else if (node.nodeType === 1 && node.tagName !== 'EM') text += node.textContent;
        }
        if (!text) text = el.innerText || el.textContent || '';
        return text.replace('%', '').replace('％', '').trim();
    };

    const result = { genderData: [], ageData: [], ageAreaFound: false, ageItemCount: 0 };
    const ageArea = document.querySelector('.Statistics_bargraph_area__BEo44');
    if (ageArea) {
        result.ageAreaFound = true;
        const items = Array.from(ageArea.children).filter((c) => c.tagName === 'DIV');
        result.ageItemCount = items.length;
        for (const item of items) {
            const ageEl = item.querySelector('.Statistics_age__HHOgN');
            const age = ageEl ? (ageEl.innerText || ageEl.textContent || '').trim() : '';
            if (!age) continue;
            let male = null;
            let female = null;
            for (const strong of item.querySelectorAll('strong.Statistics_percent__5Tb06')) {
                if (strong.classList.contains('Statistics_woman__xHyvR')) female = ratioText(strong);
                else if (male === null) male = ratioText(strong);
            }
            if (male !== null) result.ageData.push({ gender: '남성', age, ratio: male });
            if (female !== null) result.ageData.push({ gender: '여성', age, ratio: female });
        }
    }

    const genderDivs = Array.from(document.querySelectorAll('div.Statistics_percent__5Tb06'))
        .filter((div) => !div.closest('.Statistics_bargraph_area__BEo44'));
    ['남성', '여성'].forEach((gender, i) => {
        if (genderDivs.length > i) {
            const ratio = ratioText(genderDivs[i]);
            if (ratio) result.genderData.push({ gender, ratio });
        }
    });
    return result;
})()"#;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SegmentProbe {
    #[serde(default)]
    gender_data: Vec<GenderShare>,
    #[serde(default)]
    age_data: Vec<AgeShare>,
    #[serde(default)]
    age_area_found: bool,
    #[serde(default)]
    age_item_count: usize,
}

#[derive(Debug, Deserialize)]
struct GenderShare {
    gender: String,
    ratio: String,
}

#[derive(Debug, Deserialize)]
struct AgeShare {
    gender: String,
    age: String,
    ratio: String,
}

impl SegmentProbe {
    /// 每个年龄段的占比乘以对应性别的整体占比
    fn records(&self) -> Vec<ScrapedRecord> {
        let totals = gender_totals(
            self.gender_data
                .iter()
                .map(|g| (g.gender.as_str(), g.ratio.as_str())),
        );
        self.age_data
            .iter()
            .map(|a| {
                ScrapedRecord::new()
                    .with("gender", a.gender.clone())
                    .with("age", a.age.clone())
                    .with("ratio", segment_ratio(&totals, &a.gender, &a.ratio))
            })
            .collect()
    }
}

/// 流入用户的性别/年龄分布
#[derive(Clone)]
pub struct PlaceInflowSegment {
    settings: Arc<ExtractorSettings>,
    day: NaiveDate,
}

impl PlaceInflowSegment {
    pub fn new(settings: Arc<ExtractorSettings>) -> Self {
        Self {
            settings,
            day: Local::now().date_naive(),
        }
    }
}

#[async_trait]
impl PageExtractor for PlaceInflowSegment {
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
        visit.scroll_and_settle(1000).await;
        visit.await_content(AGE_AREA).await;

        let probe = match session.evaluate(SEGMENT_SCRIPT).await {
            Ok(raw) => serde_json::from_value::<SegmentProbe>(raw).unwrap_or_default(),
            Err(e) => {
                debug!("Segment script failed: {}", e);
                SegmentProbe::default()
            }
        };
        debug!(
            age_area_found = probe.age_area_found,
            age_items = probe.age_item_count,
            "Segment probe finished"
        );

        let records = probe.records();
        info!(
            "Extracted {} gender totals and {} age segments",
            probe.gender_data.len(),
            records.len()
        );
        visit.set_strategy("page_script");
        visit.set_extra("age_area_found", probe.age_area_found);
        visit.set_extra("gender_totals", probe.gender_data.len());
        visit.finish(records).await
    }
}
