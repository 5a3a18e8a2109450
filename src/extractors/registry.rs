// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use std::sync::Arc;
use tracing::{info, warn};

use super::booking_trend_chart::BookingTrendChart;
use super::place_hourly_inflow_graph::PlaceHourlyInflowGraph;
use super::place_inflow_channel::PlaceInflowChannel;
use super::place_inflow_segment::PlaceInflowSegment;
use super::smartcall_call_statistics::SmartcallCallStatistics;
use super::smlog_conversion_summary::SmlogConversionSummary;
use super::traits::{ExtractorSettings, ExtractorTemplate};
use super::{
    booking_trend_chart, place_hourly_inflow_graph, place_inflow_channel, place_inflow_segment,
    smartcall_call_statistics, smartcall_top_keyword, smartcall_top_media,
    smlog_ad_statistics, smlog_conversion_summary,
};
use crate::config::settings::{ModuleSettings, Settings};

/// 一个已注册的模块：提取器模板及其日期范围
pub struct Registration {
    pub template: Box<dyn ExtractorTemplate>,
    pub start_date: String,
    pub end_date: String,
}

impl Registration {
    pub fn new(
        template: Box<dyn ExtractorTemplate>,
        start_date: impl Into<String>,
        end_date: impl Into<String>,
    ) -> Self {
        Self {
            template,
            start_date: start_date.into(),
            end_date: end_date.into(),
        }
    }

    pub fn name(&self) -> &'static str {
        self.template.name()
    }
}

/// 所有已知的模块名
pub const KNOWN_MODULES: &[&str] = &[
    place_hourly_inflow_graph::MODULE,
    place_inflow_channel::MODULE,
    place_inflow_segment::MODULE,
    booking_trend_chart::MODULE,
    smartcall_call_statistics::MODULE,
    smartcall_top_media::MODULE,
    smartcall_top_keyword::MODULE,
    smlog_conversion_summary::MODULE,
    smlog_ad_statistics::NETWORK_MODULE,
    smlog_ad_statistics::KEYWORD_MODULE,
    smlog_ad_statistics::SITE_MODULE,
    smlog_ad_statistics::MEDIA_MODULE,
];

/// 按模块名创建提取器模板
pub fn template_for(name: &str, settings: Arc<ExtractorSettings>) -> Option<Box<dyn ExtractorTemplate>> {
    let template: Box<dyn ExtractorTemplate> = match name {
        place_hourly_inflow_graph::MODULE => Box::new(PlaceHourlyInflowGraph::new(settings)),
        place_inflow_channel::MODULE => Box::new(PlaceInflowChannel::new(settings)),
        place_inflow_segment::MODULE => Box::new(PlaceInflowSegment::new(settings)),
        booking_trend_chart::MODULE => Box::new(BookingTrendChart::new(settings)),
        smartcall_call_statistics::MODULE => Box::new(SmartcallCallStatistics::new(settings)),
        smartcall_top_media::MODULE => Box::new(smartcall_top_media::extractor(settings)),
        smartcall_top_keyword::MODULE => Box::new(smartcall_top_keyword::extractor(settings)),
        smlog_conversion_summary::MODULE => Box::new(SmlogConversionSummary::new(settings)),
        other => {
            let page = smlog_ad_statistics::page_for(other)?;
            Box::new(smlog_ad_statistics::SmlogAdStatistics::new(page, settings))
        }
    };
    Some(template)
}

/// 按配置顺序构建注册表
///
/// 只包含启用的模块；未知的模块名记录警告后跳过。
pub fn build_registrations(settings: &Settings) -> Vec<Registration> {
    let shared = ExtractorSettings::from_settings(settings);
    let registrations: Vec<Registration> = settings
        .modules
        .iter()
        .filter(|m| m.enabled)
        .filter_map(|m| register(m, shared.clone()))
        .collect();
    info!(
        "Registered {} of {} configured modules",
        registrations.len(),
        settings.modules.len()
    );
    registrations
}

fn register(module: &ModuleSettings, settings: Arc<ExtractorSettings>) -> Option<Registration> {
    match template_for(&module.name, settings) {
        Some(template) => Some(Registration::new(
            template,
            module.start_date.clone(),
            module.end_date.clone(),
        )),
        None => {
            warn!(module = %module.name, "Unknown module, skipping");
            None
        }
    }
}
