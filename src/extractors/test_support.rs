// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

//! 提取器单元测试共用的配置

use chrono::NaiveDate;
use std::sync::Arc;

use crate::config::settings::{PacingSettings, SiteSettings};
use crate::extractors::traits::ExtractorSettings;

pub fn site() -> SiteSettings {
    SiteSettings {
        place_base_url: "https://new.smartplace.naver.com".into(),
        place_id: "5921383".into(),
        booking_base_url: "https://partner.booking.naver.com".into(),
        booking_business_id: "603738".into(),
        smartcall_base_url: "https://smartcall.smartplace.naver.com".into(),
        smartcall_id: "1191881927".into(),
        smlog_base_url: "https://smlog.co.kr/".into(),
        smlog_svid: "33138".into(),
    }
}

pub fn pacing() -> PacingSettings {
    PacingSettings {
        day_delay_ms: 0,
        module_delay_ms: 0,
        task_timeout_secs: 300,
        navigation_timeout_secs: 30,
        content_timeout_secs: 15,
        settle_ms: 100,
        hourly_hover_delay_ms: 10,
        booking_hover_delay_ms: 10,
    }
}

pub fn settings() -> Arc<ExtractorSettings> {
    Arc::new(ExtractorSettings {
        site: site(),
        pacing: pacing(),
        keywords: vec!["statistics".into(), "chart".into()],
    })
}

pub fn day() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 11, 15).unwrap()
}
