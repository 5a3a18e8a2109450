// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use async_trait::async_trait;
use chrono::{Local, NaiveDate};
use std::sync::Arc;
use tracing::info;

use super::page_visit::{start_capture, PageVisit, VisitTimeouts};
use super::traits::{ExtractorSettings, PageExtractor};
use super::urls;
use crate::domain::models::record::ScrapeOutcome;
use crate::domain::services::chart_layout::ChartLayout;
use crate::domain::services::value_recovery::{RecoveryChain, RecoveryContext};
use crate::engines::traits::BrowserSession;

pub const MODULE: &str = "place_hourly_inflow_graph";

const CHART_CONTAINER: &str = ".Statistics_chart__A_V_H";
const CHART_CANVAS: &str = ".Statistics_chart__A_V_H canvas";

/// 地点流入统计页的 24 小时柱状图
#[derive(Clone)]
pub struct PlaceHourlyInflowGraph {
    settings: Arc<ExtractorSettings>,
    chain: Arc<RecoveryChain>,
    day: NaiveDate,
}

impl PlaceHourlyInflowGraph {
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
}

#[async_trait]
impl PageExtractor for PlaceHourlyInflowGraph {
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
        let collector = start_capture(session, self.settings.response_filter(&[])).await;
        let mut visit = PageVisit::new(
            session,
            self.target_url(),
            VisitTimeouts::from(&self.settings.pacing),
        );
        if !visit.navigate().await {
            return visit.finish(Vec::new()).await;
        }

        visit.scroll_and_settle(500).await;
        visit.await_content(CHART_CONTAINER).await;
        visit.settle().await;

        let responses = collector.drain();
        visit.set_extra("network_response_count", responses.len());

        let ctx = RecoveryContext::new(session, ChartLayout::Hourly, CHART_CANVAS, CHART_CONTAINER)
            .with_responses(&responses)
            .with_hover_delay(self.settings.hourly_hover_delay());
        let recovered = self.chain.run(&ctx).await;
        visit.absorb_notes(ctx.into_notes());

        match recovered {
            Some(recovered) => {
                info!(
                    strategy = recovered.strategy,
                    "Hourly inflow graph recovered {} points",
                    recovered.records.len()
                );
                visit.set_strategy(recovered.strategy);
                visit.finish(recovered.records).await
            }
            None => {
                visit.note_error("no chart data recovered by any strategy");
                visit.finish(Vec::new()).await
            }
        }
    }
}
