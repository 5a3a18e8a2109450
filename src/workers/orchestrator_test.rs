// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use super::*;
use async_trait::async_trait;
use parking_lot::Mutex;
use tempfile::TempDir;

use crate::domain::models::record::ScrapedRecord;
use crate::domain::repositories::storage_repository::{StorageError, WrittenFiles};
use crate::engines::scripted_session::ScriptedSession;
use crate::extractors::test_support::pacing;
use crate::extractors::traits::PageExtractor;
use crate::infrastructure::storage::LocalResultWriter;

fn date(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 11, d).unwrap()
}

/// 按日期返回预设结果的提取器
#[derive(Clone)]
struct StubExtractor {
    module: &'static str,
    day: NaiveDate,
    calls: Arc<Mutex<Vec<NaiveDate>>>,
    failing: Vec<NaiveDate>,
    hanging: Vec<NaiveDate>,
}

impl StubExtractor {
    fn new(module: &'static str, calls: Arc<Mutex<Vec<NaiveDate>>>) -> Self {
        Self {
            module,
            day: date(1),
            calls,
            failing: Vec::new(),
            hanging: Vec::new(),
        }
    }
}

#[async_trait]
impl PageExtractor for StubExtractor {
    fn module_name(&self) -> &'static str {
        self.module
    }

    fn configure(&mut self, day: NaiveDate) {
        self.day = day;
    }

    fn target_url(&self) -> String {
        format!("https://dashboard.test/{}?date={}", self.module, self.day)
    }

    async fn extract(&self, _session: &dyn BrowserSession) -> ScrapeOutcome {
        self.calls.lock().push(self.day);
        let mut metadata = ScrapeMetadata::new(self.target_url());
        if self.hanging.contains(&self.day) {
            tokio::time::sleep(std::time::Duration::from_secs(24 * 3600)).await;
        }
        if self.failing.contains(&self.day) {
            metadata.note_error("navigation timed out after 30s");
            return ScrapeOutcome::empty(metadata);
        }
        let records = vec![
            ScrapedRecord::new().with("hour", 0).with("count", 3),
            ScrapedRecord::new().with("hour", 1).with("count", 5),
        ];
        ScrapeOutcome::new(records, metadata)
    }
}

struct BrokenStorage;

#[async_trait]
impl StorageRepository for BrokenStorage {
    async fn save(
        &self,
        _module: &str,
        _day: NaiveDate,
        _outcome: &ScrapeOutcome,
    ) -> Result<Vec<WrittenFiles>, StorageError> {
        Err(StorageError::Other("disk full".into()))
    }

    async fn load(&self, _module: &str, _day: NaiveDate) -> Result<Option<ScrapeOutcome>, StorageError> {
        Ok(None)
    }

    async fn exists(&self, _module: &str, _day: NaiveDate) -> Result<bool, StorageError> {
        Ok(false)
    }
}

fn registration(extractor: StubExtractor, start: &str, end: &str) -> Registration {
    Registration::new(Box::new(extractor), start, end)
}

fn orchestrator<S: StorageRepository>(
    storage: Arc<S>,
    registrations: Vec<Registration>,
    root: &std::path::Path,
) -> Orchestrator<S> {
    Orchestrator::new(
        Arc::new(ScriptedSession::new()),
        storage,
        registrations,
        pacing(),
        root,
    )
}

#[tokio::test(start_paused = true)]
async fn test_days_run_in_order_and_are_written() {
    let dir = TempDir::new().unwrap();
    let writer = Arc::new(LocalResultWriter::new(dir.path()));
    let calls = Arc::new(Mutex::new(Vec::new()));
    let stub = StubExtractor::new("place_hourly_inflow_graph", calls.clone());

    let summary = orchestrator(
        writer.clone(),
        vec![registration(stub, "2025-11-15", "2025-11-18")],
        dir.path(),
    )
    .run()
    .await;

    assert_eq!(*calls.lock(), vec![date(15), date(16), date(17), date(18)]);
    let report = summary.get("place_hourly_inflow_graph").unwrap();
    assert_eq!(report.status, ModuleStatus::Success { total: 4 });
    assert!(report
        .days
        .iter()
        .all(|d| d.status == DayStatus::Success { rows: 2 }));
    for d in 15..=18 {
        assert!(writer
            .exists("place_hourly_inflow_graph", date(d))
            .await
            .unwrap());
    }
    assert!(summary.all_succeeded());
}

#[tokio::test(start_paused = true)]
async fn test_failed_day_does_not_stop_module() {
    let dir = TempDir::new().unwrap();
    let writer = Arc::new(LocalResultWriter::new(dir.path()));
    let calls = Arc::new(Mutex::new(Vec::new()));
    let mut stub = StubExtractor::new("place_inflow_channel", calls.clone());
    stub.failing = vec![date(16)];

    let summary = orchestrator(
        writer.clone(),
        vec![registration(stub, "2025-11-15", "2025-11-17")],
        dir.path(),
    )
    .run()
    .await;

    assert_eq!(calls.lock().len(), 3);
    let report = &summary.modules[0];
    assert_eq!(
        report.status,
        ModuleStatus::Partial {
            succeeded: 2,
            total: 3
        }
    );
    assert_eq!(
        report.days[1].status,
        DayStatus::NoData {
            reason: "navigation timed out after 30s".into()
        }
    );

    let failed = writer
        .load("place_inflow_channel", date(16))
        .await
        .unwrap()
        .unwrap();
    assert!(failed.records.is_empty());
    assert_eq!(failed.metadata.errors.len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_task_timeout_is_no_data() {
    let dir = TempDir::new().unwrap();
    let writer = Arc::new(LocalResultWriter::new(dir.path()));
    let calls = Arc::new(Mutex::new(Vec::new()));
    let mut stub = StubExtractor::new("booking_trend_chart", calls.clone());
    stub.hanging = vec![date(15)];

    let summary = orchestrator(
        writer.clone(),
        vec![registration(stub, "2025-11-15", "2025-11-16")],
        dir.path(),
    )
    .run()
    .await;

    let report = &summary.modules[0];
    assert_eq!(
        report.days[0].status,
        DayStatus::NoData {
            reason: "task timed out after 300s".into()
        }
    );
    assert!(report.days[1].status.is_success());

    let timed_out = writer
        .load("booking_trend_chart", date(15))
        .await
        .unwrap()
        .unwrap();
    assert!(timed_out.metadata.url.contains("date=2025-11-15"));
}

#[tokio::test(start_paused = true)]
async fn test_invalid_range_skips_to_next_module() {
    let dir = TempDir::new().unwrap();
    let writer = Arc::new(LocalResultWriter::new(dir.path()));
    let calls = Arc::new(Mutex::new(Vec::new()));

    let summary = orchestrator(
        writer,
        vec![
            registration(
                StubExtractor::new("smartcall_top_media", calls.clone()),
                "2025-12-15",
                "2025-12-09",
            ),
            registration(
                StubExtractor::new("smartcall_top_keyword", calls.clone()),
                "2025-11-15",
                "2025-11-15",
            ),
        ],
        dir.path(),
    )
    .run()
    .await;

    assert_eq!(*calls.lock(), vec![date(15)]);
    assert!(matches!(
        summary.modules[0].status,
        ModuleStatus::Error { .. }
    ));
    assert!(summary.modules[0].days.is_empty());
    assert_eq!(
        summary.modules[1].status,
        ModuleStatus::Success { total: 1 }
    );
    assert!(!summary.all_succeeded());
}

#[tokio::test(start_paused = true)]
async fn test_write_failure_is_reported_per_day() {
    let dir = TempDir::new().unwrap();
    let calls = Arc::new(Mutex::new(Vec::new()));
    let summary = orchestrator(
        Arc::new(BrokenStorage),
        vec![registration(
            StubExtractor::new("smlog_conversion_summary", calls.clone()),
            "2025-11-15",
            "2025-11-16",
        )],
        dir.path(),
    )
    .run()
    .await;

    assert_eq!(calls.lock().len(), 2);
    let report = &summary.modules[0];
    assert_eq!(
        report.days[0].status,
        DayStatus::WriteFailed {
            reason: "Storage error: disk full".into()
        }
    );
    assert_eq!(
        report.status,
        ModuleStatus::Partial {
            succeeded: 0,
            total: 2
        }
    );
}

#[tokio::test(start_paused = true)]
async fn test_delays_between_days_and_modules() {
    let dir = TempDir::new().unwrap();
    let writer = Arc::new(LocalResultWriter::new(dir.path()));
    let calls = Arc::new(Mutex::new(Vec::new()));
    let mut pacing = pacing();
    pacing.day_delay_ms = 1000;
    pacing.module_delay_ms = 2000;

    let orchestrator = Orchestrator::new(
        Arc::new(ScriptedSession::new()),
        writer,
        vec![
            registration(StubExtractor::new("a", calls.clone()), "2025-11-15", "2025-11-16"),
            registration(StubExtractor::new("b", calls.clone()), "2025-11-15", "2025-11-15"),
        ],
        pacing,
        dir.path(),
    );

    let started = tokio::time::Instant::now();
    orchestrator.run().await;
    let elapsed = started.elapsed();
    assert!(elapsed >= std::time::Duration::from_millis(3000));
    assert!(elapsed < std::time::Duration::from_millis(3100));
}

#[test]
fn test_summary_table() {
    let summary = RunSummary {
        modules: vec![
            ModuleReport {
                module: "place_inflow_segment".into(),
                status: ModuleStatus::Success { total: 2 },
                days: vec![DayResult {
                    day: date(15),
                    status: DayStatus::Success { rows: 14 },
                }],
            },
            ModuleReport {
                module: "booking_trend_chart".into(),
                status: ModuleStatus::Partial {
                    succeeded: 1,
                    total: 2,
                },
                days: vec![DayResult {
                    day: date(16),
                    status: DayStatus::NoData {
                        reason: "no chart data recovered by any strategy".into(),
                    },
                }],
            },
        ],
    };

    let table = summary.to_string();
    let lines: Vec<&str> = table.lines().collect();
    assert!(lines[3].starts_with("place_inflow_segment"));
    assert!(lines[3].ends_with("✓ Success (2/2 dates)"));
    assert!(lines[4].ends_with("⚠ Partial (1/2 dates)"));
    assert_eq!(
        lines[5],
        "    2025-11-16: ⚠ No data: no chart data recovered by any strategy"
    );
    assert_eq!(lines.len(), 7);
}
