// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use chrono::NaiveDate;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::time::{sleep, timeout};
use tracing::{error, info, warn};

use crate::config::settings::PacingSettings;
use crate::domain::models::date_range::DateRange;
use crate::domain::models::record::{ScrapeMetadata, ScrapeOutcome};
use crate::domain::models::task::{DayResult, DayStatus, ExtractionTask, ModuleStatus};
use crate::domain::repositories::storage_repository::StorageRepository;
use crate::engines::traits::BrowserSession;
use crate::extractors::registry::Registration;
use crate::extractors::traits::ExtractorTemplate;

/// 单个模块的运行报告
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleReport {
    pub module: String,
    pub status: ModuleStatus,
    pub days: Vec<DayResult>,
}

/// 一次运行的汇总，按注册顺序排列
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub modules: Vec<ModuleReport>,
}

impl RunSummary {
    pub fn get(&self, module: &str) -> Option<&ModuleReport> {
        self.modules.iter().find(|m| m.module == module)
    }

    pub fn all_succeeded(&self) -> bool {
        self.modules
            .iter()
            .all(|m| matches!(m.status, ModuleStatus::Success { .. }))
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", "=".repeat(64))?;
        writeln!(f, "Run summary")?;
        writeln!(f, "{}", "=".repeat(64))?;
        for report in &self.modules {
            writeln!(f, "{:<28} {}", report.module, report.status)?;
            for day in &report.days {
                if !day.status.is_success() {
                    writeln!(f, "    {}", day)?;
                }
            }
        }
        write!(f, "{}", "=".repeat(64))
    }
}

/// 编排器
///
/// 顺序执行 模块 × 日期 矩阵：所有任务共享同一个已登录的浏览器会话，
/// 天与天之间、模块与模块之间按配置节流。
pub struct Orchestrator<S>
where
    S: StorageRepository,
{
    session: Arc<dyn BrowserSession>,
    storage: Arc<S>,
    registrations: Vec<Registration>,
    pacing: PacingSettings,
    output_root: PathBuf,
}

impl<S> Orchestrator<S>
where
    S: StorageRepository,
{
    pub fn new(
        session: Arc<dyn BrowserSession>,
        storage: Arc<S>,
        registrations: Vec<Registration>,
        pacing: PacingSettings,
        output_root: impl Into<PathBuf>,
    ) -> Self {
        Self {
            session,
            storage,
            registrations,
            pacing,
            output_root: output_root.into(),
        }
    }

    /// 执行全部已注册模块
    pub async fn run(&self) -> RunSummary {
        info!("Orchestrator started with {} modules", self.registrations.len());
        let mut summary = RunSummary::default();

        for (index, registration) in self.registrations.iter().enumerate() {
            if index > 0 {
                sleep(self.pacing.module_delay()).await;
            }
            let report = self.run_module(registration).await;
            info!(module = %report.module, "Module finished: {}", report.status);
            summary.modules.push(report);
        }

        info!("Orchestrator finished");
        summary
    }

    async fn run_module(&self, registration: &Registration) -> ModuleReport {
        let module = registration.name();
        let range = match DateRange::parse(&registration.start_date, &registration.end_date) {
            Ok(range) => range,
            Err(e) => {
                error!(module, "Failed to build date range: {}", e);
                return ModuleReport {
                    module: module.to_string(),
                    status: ModuleStatus::Error {
                        message: e.to_string(),
                    },
                    days: Vec::new(),
                };
            }
        };
        info!(
            module,
            "Processing {} days ({} to {})",
            range.len(),
            range.start(),
            range.end()
        );

        let mut days = Vec::with_capacity(range.len());
        for (index, day) in range.days().enumerate() {
            if index > 0 {
                sleep(self.pacing.day_delay()).await;
            }
            let status = self.run_day(registration.template.as_ref(), day).await;
            info!(module, "{}: {}", day, status);
            days.push(DayResult { day, status });
        }

        ModuleReport {
            module: module.to_string(),
            status: ModuleStatus::from_days(&days),
            days,
        }
    }

    /// 执行一个 (模块, 日期) 任务
    ///
    /// 无论是否有数据都会写出结果文件，让每一天都留下一次记录。
    async fn run_day(&self, template: &dyn ExtractorTemplate, day: NaiveDate) -> DayStatus {
        let task = ExtractionTask::new(template.name(), day, &self.output_root);
        let extractor = template.instantiate(day);
        info!(task_id = %task.id, module = %task.module, "Extracting {}", day);

        let limit = self.pacing.task_timeout();
        let outcome = match timeout(limit, extractor.extract(self.session.as_ref())).await {
            Ok(outcome) => outcome,
            Err(_) => {
                warn!(task_id = %task.id, "Task timed out after {:?}", limit);
                let mut metadata = ScrapeMetadata::new(extractor.target_url());
                metadata.note_error(format!("task timed out after {}s", limit.as_secs()));
                ScrapeOutcome::empty(metadata)
            }
        };

        if let Err(e) = self.storage.save(&task.module, day, &outcome).await {
            error!(task_id = %task.id, "Failed to write results: {}", e);
            return DayStatus::WriteFailed {
                reason: e.to_string(),
            };
        }

        if outcome.has_errors() {
            DayStatus::NoData {
                reason: outcome.metadata.errors.join("; "),
            }
        } else {
            DayStatus::Success {
                rows: outcome.records.len(),
            }
        }
    }
}

#[cfg(test)]
#[path = "orchestrator_test.rs"]
mod tests;
