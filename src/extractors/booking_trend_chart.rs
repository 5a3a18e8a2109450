// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use async_trait::async_trait;
use chrono::{Local, NaiveDate};
use serde::Deserialize;
use serde_json::{Map, Value};
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::page_visit::{start_capture, PageVisit, VisitTimeouts};
use super::traits::{ExtractorSettings, PageExtractor};
use super::urls;
use crate::domain::models::captured_response::CapturedResponse;
use crate::domain::models::record::{ScrapeOutcome, ScrapedRecord};
use crate::domain::services::chart_layout::ChartLayout;
use crate::domain::services::value_recovery::{Recovered, RecoveryChain, RecoveryContext};
use crate::engines::traits::{js_string, BrowserSession};

pub const MODULE: &str = "booking_trend_chart";

const PANEL: &str = "#app > div > div.BaseLayout__container__L0brn > div.BaseLayout__contents__k3cMt > div > div > div.StatisticsIndicators__statistic-contents-out-scroll__MoPQ5 > div.StatisticsIndicators__statistic-contents-in__sFa1a > div:nth-child(3)";

/// 图表容器
pub fn chart_container() -> String {
    format!(
        "{} > div.panel-body > div > div > div.StatisticsIndicators__chart-wrap__4UCu\\+.StatisticsIndicators__chart-wrap-m__b8qFo",
        PANEL
    )
}

/// 图表下方的指标复选框组
pub fn checkbox_group() -> String {
    format!(
        "{} > div.panel-footer.StatisticsIndicators__statistics-footer-group__nyT3T > div",
        PANEL
    )
}

const FEATURE_TEMPLATE: &str = r#"(() => {
    const group = document.querySelector(__GROUP__);
    if (!group) return [];
    const features = [];
    for (const label of group.querySelectorAll('label')) {
        const input = label.querySelector('input.check-radio');
        const span = label.querySelector('span > span');
        if (!input || !span) continue;
        features.push({
            feature: (span.innerText || span.textContent || '').trim(),
            checked: !!input.checked
        });
    }
    return features;
})()"#;

const TOGGLE_TEMPLATE: &str = r#"(() => {
    const target = document.querySelector(__LABEL__);
    if (!target) return false;
    const input = target.querySelector('input.check-radio');
    if (!input) return false;
    target.click();
    if (!input.disabled) input.click();
    return true;
})()"#;

fn feature_script() -> String {
    FEATURE_TEMPLATE.replace("__GROUP__", &js_string(&checkbox_group()))
}

/// 点击第 `index` 个复选框的 label（从 0 开始）
fn toggle_script(index: usize) -> String {
    let label = format!("{} > label:nth-child({})", checkbox_group(), index + 1);
    TOGGLE_TEMPLATE.replace("__LABEL__", &js_string(&label))
}

#[derive(Debug, Clone, Deserialize)]
struct Feature {
    feature: String,
    #[serde(default)]
    checked: bool,
}

/// 按点序号横向拼接各指标的序列
///
/// 每个指标贡献 `{f}_value`、`{f}_label`、`{f}_tooltip` 三列，
/// 点数不足的指标在多出的行上为 null。
fn wide_join(series: &[(String, Vec<ScrapedRecord>)]) -> Vec<ScrapedRecord> {
    let max_points = series.iter().map(|(_, rows)| rows.len()).max().unwrap_or(0);
    (0..max_points)
        .map(|index| {
            let mut row = ScrapedRecord::new().with("point_index", index);
            for (feature, rows) in series {
                let point = rows.get(index);
                let field = |name: &str| {
                    point
                        .and_then(|p| p.get(name))
                        .cloned()
                        .unwrap_or(Value::Null)
                };
                row.insert(format!("{}_value", feature), field("value"));
                row.insert(format!("{}_label", feature), field("label"));
                row.insert(format!("{}_tooltip", feature), field("tooltip_text"));
            }
            row
        })
        .collect()
}

/// 预约趋势图
///
/// 逐个勾选图表下方的指标复选框，每个指标单独跑一次恢复链，
/// 最后按点序号拼成宽表。没有复选框时直接恢复当前图表。
#[derive(Clone)]
pub struct BookingTrendChart {
    settings: Arc<ExtractorSettings>,
    chain: Arc<RecoveryChain>,
    day: NaiveDate,
}

impl BookingTrendChart {
    pub fn new(settings: Arc<ExtractorSettings>) -> Self {
        Self {
            settings,
            chain: Arc::new(RecoveryChain::standard()),
            day: Local::now().date_naive(),
        }
    }

    pub fn with_chain(mut self, chain: RecoveryChain) -> Self {
        self.chain = Arc::new(chain);
        self
    }

    async fn recover(
        &self,
        session: &dyn BrowserSession,
        container: &str,
        canvas: &str,
        responses: &[CapturedResponse],
    ) -> (Option<Recovered>, Map<String, Value>) {
        let ctx = RecoveryContext::new(session, ChartLayout::Series, canvas, container)
            .with_responses(responses)
            .with_hover_delay(self.settings.booking_hover_delay());
        let recovered = self.chain.run(&ctx).await;
        (recovered, ctx.into_notes())
    }

    async fn features(session: &dyn BrowserSession) -> Vec<Feature> {
        match session.evaluate(&feature_script()).await {
            Ok(raw) => serde_json::from_value::<Vec<Feature>>(raw)
                .unwrap_or_default()
                .into_iter()
                .filter(|f| !f.feature.is_empty())
                .collect(),
            Err(e) => {
                debug!("Feature checkbox script failed: {}", e);
                Vec::new()
            }
        }
    }
}

#[async_trait]
impl PageExtractor for BookingTrendChart {
    fn module_name(&self) -> &'static str {
        MODULE
    }

    fn configure(&mut self, day: NaiveDate) {
        self.day = day;
    }

    fn target_url(&self) -> String {
        urls::booking_statistics(&self.settings.site, self.day)
    }

    async fn extract(&self, session: &dyn BrowserSession) -> ScrapeOutcome {
        let collector = start_capture(session, self.settings.response_filter(&["booking"])).await;
        let mut visit = PageVisit::new(
            session,
            self.target_url(),
            VisitTimeouts::from(&self.settings.pacing),
        );
        if !visit.navigate().await {
            return visit.finish(Vec::new()).await;
        }

        let container = chart_container();
        let canvas = format!("{} canvas", container);
        visit.scroll_and_settle(500).await;
        visit.await_content(&container).await;
        visit.settle().await;

        let features = Self::features(session).await;
        visit.set_extra(
            "features",
            features.iter().map(|f| f.feature.clone()).collect::<Vec<_>>(),
        );

        if features.is_empty() {
            warn!("No feature checkboxes found, recovering the default chart");
            let responses = collector.drain();
            let (recovered, notes) = self.recover(session, &container, &canvas, &responses).await;
            visit.absorb_notes(notes);
            return match recovered {
                Some(recovered) => {
                    visit.set_strategy(recovered.strategy);
                    visit.finish(recovered.records).await
                }
                None => {
                    visit.note_error("no chart data recovered by any strategy");
                    visit.finish(Vec::new()).await
                }
            };
        }

        let mut series: Vec<(String, Vec<ScrapedRecord>)> = Vec::with_capacity(features.len());
        let mut strategies = Map::new();
        let mut feature_notes = Map::new();
        for (index, feature) in features.iter().enumerate() {
            info!(
                "[Feature {}/{}] {} (checked: {})",
                index + 1,
                features.len(),
                feature.feature,
                feature.checked
            );
            let seen = collector.len();
            let toggled = matches!(session.evaluate(&toggle_script(index)).await, Ok(Value::Bool(true)));
            if !toggled {
                warn!(feature = %feature.feature, "Checkbox toggle failed, skipping feature");
                visit.note_error(format!("checkbox toggle failed for {}", feature.feature));
                strategies.insert(feature.feature.clone(), Value::Null);
                series.push((feature.feature.clone(), Vec::new()));
                continue;
            }
            visit.settle().await;

            let fresh: Vec<CapturedResponse> = collector.snapshot().into_iter().skip(seen).collect();
            let (recovered, notes) = self.recover(session, &container, &canvas, &fresh).await;
            feature_notes.insert(feature.feature.clone(), Value::Object(notes));
            match recovered {
                Some(recovered) => {
                    strategies.insert(feature.feature.clone(), recovered.strategy.into());
                    series.push((feature.feature.clone(), recovered.records));
                }
                None => {
                    strategies.insert(feature.feature.clone(), Value::Null);
                    series.push((feature.feature.clone(), Vec::new()));
                }
            }
        }

        let records = wide_join(&series);
        if records.is_empty() {
            visit.note_error("no chart data recovered by any strategy");
        }

        let mut used: Vec<&str> = Vec::new();
        for strategy in strategies.values().filter_map(Value::as_str) {
            if !used.contains(&strategy) {
                used.push(strategy);
            }
        }
        if !used.is_empty() {
            visit.set_strategy(used.join(","));
        }
        visit.set_extra("feature_strategies", strategies);
        visit.set_extra("feature_notes", feature_notes);
        visit.set_extra("network_response_count", collector.len());
        visit.finish(records).await
    }
}
