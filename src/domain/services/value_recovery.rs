// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::{Map, Value};
use std::time::Duration;
use tracing::{debug, info, warn};

use super::chart_layout::{ChartLayout, SeriesPoint};
use super::chart_state::{probe_script, ChartProbe};
use super::response_layouts::find_points;
use super::tooltip_parser::{parse_hourly, parse_series};
use crate::domain::models::captured_response::CapturedResponse;
use crate::domain::models::record::ScrapedRecord;
use crate::engines::traits::{BoundingBox, BrowserSession};

/// 单次恢复的上下文
///
/// 策略本身不保存状态，所有输入都经由上下文传入；
/// 策略可以通过 [`RecoveryContext::note`] 留下诊断信息，由提取器写入元数据。
pub struct RecoveryContext<'a> {
    pub session: &'a dyn BrowserSession,
    pub layout: ChartLayout,
    pub canvas_selector: &'a str,
    pub container_selector: &'a str,
    pub responses: &'a [CapturedResponse],
    pub hover_delay: Duration,
    notes: Mutex<Map<String, Value>>,
}

impl<'a> RecoveryContext<'a> {
    pub fn new(
        session: &'a dyn BrowserSession,
        layout: ChartLayout,
        canvas_selector: &'a str,
        container_selector: &'a str,
    ) -> Self {
        Self {
            session,
            layout,
            canvas_selector,
            container_selector,
            responses: &[],
            hover_delay: Duration::from_millis(600),
            notes: Mutex::new(Map::new()),
        }
    }

    pub fn with_responses(mut self, responses: &'a [CapturedResponse]) -> Self {
        self.responses = responses;
        self
    }

    pub fn with_hover_delay(mut self, hover_delay: Duration) -> Self {
        self.hover_delay = hover_delay;
        self
    }

    /// 记录一条诊断信息
    pub fn note(&self, key: &str, value: impl Into<Value>) {
        self.notes.lock().insert(key.to_string(), value.into());
    }

    pub fn into_notes(self) -> Map<String, Value> {
        self.notes.into_inner()
    }
}

/// 值恢复策略
#[async_trait]
pub trait RecoveryStrategy: Send + Sync {
    /// 策略名称，写入元数据的 `strategy` 字段
    fn name(&self) -> &'static str;

    /// 尝试恢复记录；没有数据时返回 `None`
    async fn attempt(&self, ctx: &RecoveryContext<'_>) -> Option<Vec<ScrapedRecord>>;
}

/// 恢复成功的结果
#[derive(Debug, Clone, PartialEq)]
pub struct Recovered {
    pub strategy: &'static str,
    pub records: Vec<ScrapedRecord>,
}

/// 按优先级排列的策略链
pub struct RecoveryChain {
    strategies: Vec<Box<dyn RecoveryStrategy>>,
}

impl RecoveryChain {
    pub fn new(strategies: Vec<Box<dyn RecoveryStrategy>>) -> Self {
        Self { strategies }
    }

    /// 框架状态 → 网络响应 → 提示框探测
    pub fn standard() -> Self {
        Self::new(vec![
            Box::new(FrameworkStateStrategy),
            Box::new(NetworkCaptureStrategy),
            Box::new(TooltipProbeStrategy),
        ])
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.strategies.iter().map(|s| s.name()).collect()
    }

    /// 依次执行，第一个非空结果即返回
    pub async fn run(&self, ctx: &RecoveryContext<'_>) -> Option<Recovered> {
        for strategy in &self.strategies {
            debug!(strategy = strategy.name(), "Attempting value recovery");
            match strategy.attempt(ctx).await {
                Some(records) if !records.is_empty() => {
                    info!(
                        strategy = strategy.name(),
                        rows = records.len(),
                        "Recovered chart values"
                    );
                    return Some(Recovered {
                        strategy: strategy.name(),
                        records,
                    });
                }
                _ => debug!(strategy = strategy.name(), "No data from strategy"),
            }
        }
        warn!("All recovery strategies came back empty");
        None
    }
}

/// 读取页面内图表框架的状态
pub struct FrameworkStateStrategy;

#[async_trait]
impl RecoveryStrategy for FrameworkStateStrategy {
    fn name(&self) -> &'static str {
        "framework_state"
    }

    async fn attempt(&self, ctx: &RecoveryContext<'_>) -> Option<Vec<ScrapedRecord>> {
        let script = probe_script(ctx.canvas_selector, ctx.container_selector);
        let raw = match ctx.session.evaluate(&script).await {
            Ok(raw) => raw,
            Err(e) => {
                debug!("Chart state probe failed: {}", e);
                return None;
            }
        };

        let probe = ChartProbe::from_value(raw.clone());
        if !probe.found() {
            debug!(reason = ?probe.error, "No chart state found");
            return None;
        }

        if let Some(source) = &probe.source {
            ctx.note("chart_library", source.clone());
        }
        ctx.note("chart_state", raw);

        let points = probe.points(ctx.layout);
        if points.is_empty() {
            return None;
        }
        Some(ctx.layout.records(points))
    }
}

/// 从页面自身发出的接口响应中识别数据
pub struct NetworkCaptureStrategy;

#[async_trait]
impl RecoveryStrategy for NetworkCaptureStrategy {
    fn name(&self) -> &'static str {
        "network_capture"
    }

    async fn attempt(&self, ctx: &RecoveryContext<'_>) -> Option<Vec<ScrapedRecord>> {
        if ctx.responses.is_empty() {
            return None;
        }
        ctx.note(
            "network_responses",
            Value::Array(ctx.responses.iter().map(CapturedResponse::summary).collect()),
        );

        let (response, points) = ctx
            .responses
            .iter()
            .find_map(|r| find_points(&r.body).map(|points| (r, points)))?;
        debug!(url = %response.url, points = points.len(), "Recognised response layout");
        ctx.note("network_source", response.url.clone());
        Some(ctx.layout.records(points))
    }
}

/// 悬停画布读取提示框
pub struct TooltipProbeStrategy;

/// 采样点周围的纵向偏移
const VERTICAL_OFFSETS: [f64; 5] = [-40.0, -20.0, 0.0, 20.0, 40.0];

impl TooltipProbeStrategy {
    /// 采样坐标：横向在宽度 10%..90% 之间均匀分布，纵向取去掉边距后的中线
    pub fn sample_positions(bbox: &BoundingBox, samples: usize) -> (Vec<f64>, f64) {
        let start_x = bbox.x + bbox.width * 0.1;
        let end_x = bbox.x + bbox.width * 0.9;
        let step = if samples > 1 {
            (end_x - start_x) / (samples - 1) as f64
        } else {
            0.0
        };
        let xs = (0..samples).map(|i| start_x + step * i as f64).collect();

        let start_y = bbox.y + 20.0;
        let end_y = bbox.y + bbox.height - 40.0;
        (xs, (start_y + end_y) / 2.0)
    }

    async fn tooltip_at(&self, ctx: &RecoveryContext<'_>, x: f64, center_y: f64) -> Option<String> {
        let script = tooltip_script(ctx.layout);
        for offset in VERTICAL_OFFSETS {
            if ctx.session.move_mouse(x, center_y + offset).await.is_err() {
                continue;
            }
            tokio::time::sleep(ctx.hover_delay).await;

            let text = match ctx.session.evaluate(script).await {
                Ok(Value::String(text)) if !text.trim().is_empty() => text,
                _ => continue,
            };
            if ctx.layout == ChartLayout::Hourly && parse_hourly(&text).is_none() {
                continue;
            }
            return Some(text);
        }
        None
    }

    fn point_from(layout: ChartLayout, index: usize, text: String) -> SeriesPoint {
        match layout {
            ChartLayout::Hourly => {
                let reading = parse_hourly(&text);
                let hour = reading
                    .as_ref()
                    .and_then(|r| r.hour)
                    .unwrap_or(index as i64);
                let count = reading
                    .and_then(|r| r.count)
                    .map(Value::from)
                    .unwrap_or(Value::Null);
                SeriesPoint::new(index, Value::String(format!("{}시", hour)), count)
                    .with_tooltip(Some(text))
            }
            ChartLayout::Series => {
                let reading = parse_series(&text);
                SeriesPoint::new(
                    index,
                    reading.label.map(Value::String).unwrap_or(Value::Null),
                    reading.value.map(Value::from).unwrap_or(Value::Null),
                )
                .with_dataset(reading.feature)
                .with_tooltip(Some(text))
            }
        }
    }
}

#[async_trait]
impl RecoveryStrategy for TooltipProbeStrategy {
    fn name(&self) -> &'static str {
        "tooltip_probe"
    }

    async fn attempt(&self, ctx: &RecoveryContext<'_>) -> Option<Vec<ScrapedRecord>> {
        let bbox = match ctx.session.bounding_box(ctx.canvas_selector).await {
            Ok(Some(bbox)) => bbox,
            Ok(None) => {
                debug!(selector = ctx.canvas_selector, "Canvas not found for hover probing");
                return None;
            }
            Err(e) => {
                debug!("Canvas bounding box unavailable: {}", e);
                return None;
            }
        };

        let (xs, center_y) = Self::sample_positions(&bbox, ctx.layout.sample_count());
        let mut points = Vec::with_capacity(xs.len());
        let mut found = 0usize;
        for (index, x) in xs.into_iter().enumerate() {
            match self.tooltip_at(ctx, x, center_y).await {
                Some(text) => {
                    found += 1;
                    points.push(Self::point_from(ctx.layout, index, text));
                }
                None => points.push(SeriesPoint::placeholder(index)),
            }
        }

        ctx.note("tooltip_points_found", found);
        if found == 0 {
            debug!("No tooltip appeared at any sample point");
            return None;
        }
        Some(ctx.layout.records(points))
    }
}

fn tooltip_script(layout: ChartLayout) -> &'static str {
    match layout {
        ChartLayout::Hourly => HOURLY_TOOLTIP,
        ChartLayout::Series => SERIES_TOOLTIP,
    }
}

const HOURLY_TOOLTIP: &str = r#"(() => {
    function findTooltip() {
        const excluded = ['도움말', '시간별', '요일별', '조회 기간에 수집된 데이터가 없습니다'];
        const found = [];
        for (const el of document.querySelectorAll('div, span')) {
            const style = window.getComputedStyle(el);
            if (style.position !== 'absolute' && style.position !== 'fixed') continue;
            const z = parseInt(style.zIndex) || 0;
            if (z <= 1000) continue;
            const text = (el.innerText || el.textContent || '').trim();
            if (!text || !(text.includes('시') || text.includes('회'))) continue;
            if (excluded.some(word => text.includes(word))) continue;
            const rect = el.getBoundingClientRect();
            if (rect.width <= 0 || rect.height <= 0 || rect.height >= 100) continue;
            found.push({ text: text, z: z, y: rect.y });
        }
        found.sort((a, b) => (b.z - a.z) || (a.y - b.y));
        return found.length ? found[0].text : null;
    }
    return findTooltip();
})()"#;

const SERIES_TOOLTIP: &str = r#"(() => {
    function findTooltip() {
        const excluded = [
            '도움말', '조회 기간에 수집된 데이터가 없습니다',
            'StatisticsIndicators', 'BaseLayout', 'panel-body', 'chart-wrap',
            '신청', '확정', '취소', '완료', '변경', '노쇼'
        ];
        const datePattern = /\d{4}-\d{2}-\d{2}|\d{1,2}\/\d{1,2}|\d{1,2}일/;
        const found = [];
        for (const el of document.querySelectorAll('div')) {
            const style = window.getComputedStyle(el);
            const text = (el.innerText || el.textContent || '').trim();
            if (!text || text.length >= 1000) continue;
            if (style.position !== 'absolute' && style.position !== 'fixed') continue;
            if (style.display === 'none' || style.visibility === 'hidden') continue;
            if ((parseInt(style.zIndex) || 0) <= 50 || !(parseFloat(style.opacity) > 0)) continue;
            if (excluded.some(word => text.includes(word))) continue;
            const rect = el.getBoundingClientRect();
            if (rect.width <= 0 || rect.height <= 0 || rect.height >= 200) continue;
            if (rect.top < 0 || rect.left < 0 || rect.top >= window.innerHeight || rect.left >= window.innerWidth) continue;
            const hasDate = datePattern.test(text);
            const hasNumber = /\d/.test(text);
            if (!hasDate && !hasNumber) continue;
            found.push({ text: text, z: parseInt(style.zIndex) || 0, y: rect.y, hasDate: hasDate, hasNumber: hasNumber });
        }
        found.sort((a, b) => {
            if (a.hasDate !== b.hasDate) return b.hasDate - a.hasDate;
            if (a.hasNumber !== b.hasNumber) return b.hasNumber - a.hasNumber;
            if (a.z !== b.z) return b.z - a.z;
            return a.y - b.y;
        });
        return found.length ? found[0].text : null;
    }
    return findTooltip();
})()"#;

#[cfg(test)]
#[path = "value_recovery_test.rs"]
mod tests;
