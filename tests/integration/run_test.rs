// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use super::helpers::{module, settings, FakeDashboard};
use chrono::NaiveDate;
use dashcrawl::domain::models::task::{DayStatus, ModuleStatus};
use dashcrawl::domain::repositories::storage_repository::StorageRepository;
use dashcrawl::extractors::registry::build_registrations;
use dashcrawl::extractors::smartcall_top_media;
use dashcrawl::infrastructure::storage::LocalResultWriter;
use dashcrawl::workers::{Orchestrator, RunSummary};
use serde_json::{json, Value};
use std::sync::Arc;
use tempfile::TempDir;

const MEDIA_LIST: &str = "div.call_section > div:nth-child(3) div > ul";
const CHANNEL_ITEM: &str = "li.Statistics_inflow_list_item__EjiuR";

fn date(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 11, d).unwrap()
}

fn media_rows() -> Value {
    json!([
        {"rank": "1", "name": "네이버 검색", "text": "1 네이버 검색 14", "fragments": ["14건"]},
        {"rank": "2", "name": "네이버 지도", "text": "2 네이버 지도 6", "fragments": ["6건"]}
    ])
}

fn channel_rows(n: usize) -> Value {
    Value::Array(
        (0..n)
            .map(|i| json!({"name": format!("채널{}", i), "ratio": format!("{}%", 40 - i * 5)}))
            .collect(),
    )
}

async fn run(dashboard: Arc<FakeDashboard>, dir: &TempDir, modules: Vec<(&str, &str, &str)>) -> RunSummary {
    let settings = settings(
        dir.path(),
        modules
            .into_iter()
            .map(|(name, start, end)| module(name, start, end))
            .collect(),
    );
    let orchestrator = Orchestrator::new(
        dashboard,
        Arc::new(LocalResultWriter::new(dir.path())),
        build_registrations(&settings),
        settings.pacing.clone(),
        dir.path(),
    );
    orchestrator.run().await
}

#[tokio::test(start_paused = true)]
async fn test_full_run_writes_every_day() {
    let dir = TempDir::new().unwrap();
    let dashboard = Arc::new(
        FakeDashboard::new()
            .element(smartcall_top_media::PAGE.wait_selector)
            .element(CHANNEL_ITEM)
            .script(MEDIA_LIST, media_rows())
            .script("Statistics_inflow_list_item__EjiuR", channel_rows(7)),
    );

    let summary = run(
        dashboard.clone(),
        &dir,
        vec![
            ("smartcall_top_media", "2025-11-15", "2025-11-16"),
            ("place_inflow_channel", "2025-11-15", "2025-11-15"),
        ],
    )
    .await;

    assert_eq!(summary.modules.len(), 2);
    assert_eq!(summary.modules[0].module, "smartcall_top_media");
    assert_eq!(summary.modules[0].status, ModuleStatus::Success { total: 2 });
    assert_eq!(summary.modules[1].status, ModuleStatus::Success { total: 1 });
    assert!(summary.all_succeeded());

    let visited = dashboard.visited();
    assert!(visited[0].contains("startDate=2025-11-15"));
    assert!(visited[1].contains("startDate=2025-11-16"));

    let csv = std::fs::read_to_string(
        dir.path()
            .join("smartcall_top_media")
            .join("smartcall_top_media__20251115_20251115.csv"),
    )
    .unwrap();
    let mut lines = csv.trim_start_matches('\u{feff}').lines();
    assert_eq!(lines.next(), Some("rank,media,count,event_dt"));
    assert_eq!(lines.next(), Some("1,네이버 검색,14,2025-11-15"));

    let writer = LocalResultWriter::new(dir.path());
    let keywords = writer
        .load("place_inflow_keyword", date(15))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(keywords.records.len(), 2);
    assert_eq!(keywords.records[0].get("keyword"), Some(&json!("채널5")));
}

#[tokio::test(start_paused = true)]
async fn test_invalid_range_and_unknown_module_are_isolated() {
    let dir = TempDir::new().unwrap();
    let dashboard = Arc::new(
        FakeDashboard::new()
            .element(smartcall_top_media::PAGE.wait_selector)
            .script(MEDIA_LIST, media_rows()),
    );

    let summary = run(
        dashboard,
        &dir,
        vec![
            ("smartcall_top_keyword", "2025-12-15", "2025-12-09"),
            ("place_unknown_page", "2025-11-15", "2025-11-15"),
            ("smartcall_top_media", "2025-11-15", "2025-11-15"),
        ],
    )
    .await;

    assert_eq!(summary.modules.len(), 2);
    match &summary.modules[0].status {
        ModuleStatus::Error { message } => assert!(message.contains("2025-12-15")),
        other => panic!("expected an error status, got {:?}", other),
    }
    assert!(summary.modules[0].status.to_string().starts_with("✗ Error"));
    assert_eq!(summary.modules[1].status, ModuleStatus::Success { total: 1 });
    assert!(!dir.path().join("smartcall_top_keyword").exists());
}

#[tokio::test(start_paused = true)]
async fn test_navigation_failure_only_affects_that_day() {
    let dir = TempDir::new().unwrap();
    let dashboard = Arc::new(
        FakeDashboard::new()
            .element(smartcall_top_media::PAGE.wait_selector)
            .script(MEDIA_LIST, media_rows())
            .fail_navigation("startDate=2025-11-16"),
    );

    let summary = run(
        dashboard.clone(),
        &dir,
        vec![("smartcall_top_media", "2025-11-15", "2025-11-17")],
    )
    .await;

    let report = &summary.modules[0];
    assert_eq!(dashboard.visited().len(), 3);
    assert_eq!(
        report.status,
        ModuleStatus::Partial {
            succeeded: 2,
            total: 3
        }
    );
    assert_eq!(report.status.to_string(), "⚠ Partial (2/3 dates)");
    assert!(matches!(
        &report.days[1].status,
        DayStatus::NoData { reason } if reason.starts_with("navigation failed")
    ));
    assert_eq!(report.days[2].status, DayStatus::Success { rows: 2 });

    let writer = LocalResultWriter::new(dir.path());
    let failed = writer
        .load("smartcall_top_media", date(16))
        .await
        .unwrap()
        .unwrap();
    assert!(failed.records.is_empty());
    assert_eq!(failed.metadata.errors.len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_empty_day_is_still_recorded() {
    let dir = TempDir::new().unwrap();
    let dashboard = Arc::new(FakeDashboard::new().element(smartcall_top_media::PAGE.wait_selector));

    let summary = run(
        dashboard,
        &dir,
        vec![("smartcall_top_media", "2025-11-15", "2025-11-15")],
    )
    .await;

    assert_eq!(
        summary.modules[0].days[0].status,
        DayStatus::Success { rows: 0 }
    );
    let csv = std::fs::read_to_string(
        dir.path()
            .join("smartcall_top_media")
            .join("smartcall_top_media__20251115_20251115.csv"),
    )
    .unwrap();
    assert_eq!(csv.trim_start_matches('\u{feff}'), "event_dt\n");

    let json: Value = serde_json::from_str(
        &std::fs::read_to_string(
            dir.path()
                .join("smartcall_top_media")
                .join("smartcall_top_media__20251115_20251115.json"),
        )
        .unwrap(),
    )
    .unwrap();
    assert_eq!(json["records"], json!([]));
}

#[tokio::test(start_paused = true)]
async fn test_hourly_graph_from_captured_response() {
    let dir = TempDir::new().unwrap();
    let dashboard = Arc::new(
        FakeDashboard::new()
            .element(".Statistics_chart__A_V_H")
            .response(
                "https://new.smartplace.naver.com/api/statistics/hourly?date=2025-11-15",
                json!({"labels": ["0시", "1시", "2시"], "values": [27, 4, 0]}),
            ),
    );

    let summary = run(
        dashboard,
        &dir,
        vec![("place_hourly_inflow_graph", "2025-11-15", "2025-11-15")],
    )
    .await;

    assert_eq!(
        summary.modules[0].days[0].status,
        DayStatus::Success { rows: 3 }
    );
    let outcome = LocalResultWriter::new(dir.path())
        .load("place_hourly_inflow_graph", date(15))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(outcome.metadata.strategy.as_deref(), Some("network_capture"));
    assert_eq!(outcome.records[0].get("count"), Some(&json!(27)));
}

#[tokio::test(start_paused = true)]
async fn test_summary_lists_modules_in_registration_order() {
    let dir = TempDir::new().unwrap();
    let dashboard = Arc::new(FakeDashboard::new());

    let summary = run(
        dashboard,
        &dir,
        vec![
            ("smartcall_top_keyword", "2025-11-15", "2025-11-15"),
            ("smartcall_top_media", "2025-11-15", "2025-11-15"),
        ],
    )
    .await;

    let table = summary.to_string();
    let keyword = table.find("smartcall_top_keyword").unwrap();
    let media = table.find("smartcall_top_media").unwrap();
    assert!(keyword < media);
}
