// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use chrono::NaiveDate;
use url::Url;

use crate::config::settings::SiteSettings;
use crate::domain::models::date_range::DATE_FORMAT;

fn with_query(base: &str, path: &str, params: &[(&str, String)]) -> String {
    let joined = format!("{}{}", base.trim_end_matches('/'), path);
    match Url::parse(&joined) {
        Ok(mut url) => {
            url.query_pairs_mut()
                .extend_pairs(params.iter().map(|(k, v)| (*k, v.as_str())));
            url.to_string()
        }
        // unparseable base, build the query by hand
        Err(_) => {
            let query: Vec<String> = params.iter().map(|(k, v)| format!("{}={}", k, v)).collect();
            format!("{}?{}", joined, query.join("&"))
        }
    }
}

fn day_str(day: NaiveDate) -> String {
    day.format(DATE_FORMAT).to_string()
}

/// 地点统计页（流入标签页，按日）
pub fn place_statistics(site: &SiteSettings, day: NaiveDate) -> String {
    let d = day_str(day);
    with_query(
        &site.place_base_url,
        &format!("/bizes/place/{}/statistics", site.place_id),
        &[
            ("bookingBusinessId", site.booking_business_id.clone()),
            ("endDate", d.clone()),
            ("menu", "place".to_string()),
            ("placeTab", "inflow".to_string()),
            ("startDate", d),
            ("term", "daily".to_string()),
        ],
    )
}

/// 预约统计页（单日）
pub fn booking_statistics(site: &SiteSettings, day: NaiveDate) -> String {
    let d = day_str(day);
    with_query(
        &site.booking_base_url,
        &format!("/bizes/{}/statistics/booking", site.booking_business_id),
        &[
            ("endDate", d.clone()),
            ("period", "1".to_string()),
            ("startDate", d),
        ],
    )
}

/// 智能电话统计页
pub fn smartcall_statistics(site: &SiteSettings, day: NaiveDate) -> String {
    let d = day_str(day);
    with_query(
        &site.smartcall_base_url,
        &format!("/statistics/{}", site.smartcall_id),
        &[
            ("startDate", d.clone()),
            ("endDate", d),
            ("bookingBusinessId", site.booking_business_id.clone()),
        ],
    )
}

/// 网站分析的转化汇总页，日期在页面内设置
pub fn smlog_conversion_summary(site: &SiteSettings) -> String {
    with_query(
        &site.smlog_base_url,
        "/hmisNew/conversion_summary.html",
        &[("svid", site.smlog_svid.clone())],
    )
}

/// 网站分析的广告统计页，标签和日期在页面内切换
pub fn smlog_ad_statistics(site: &SiteSettings) -> String {
    with_query(
        &site.smlog_base_url,
        "/hmisNew/ad_statistics.html",
        &[("svid", site.smlog_svid.clone())],
    )
}
