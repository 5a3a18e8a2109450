// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::chart_layout::{ChartLayout, SeriesPoint};
use super::field_matching::point_value;
use crate::engines::traits::js_string;

/// 页面内探测脚本的结果
///
/// 脚本依次检查 Chart.js 实例、Vue、Angular、ECharts、React fiber 以及容器上的框架状态，
/// 返回第一个找到的 `{labels, datasets}` 或 `{data: []}` 形状。
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChartProbe {
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub labels: Option<Vec<Value>>,
    #[serde(default)]
    pub datasets: Option<Vec<ProbeDataset>>,
    #[serde(default)]
    pub data: Option<Vec<Value>>,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProbeDataset {
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub data: Vec<Value>,
}

impl ChartProbe {
    /// 解析脚本返回值；形状不符时视为未找到
    pub fn from_value(value: Value) -> Self {
        serde_json::from_value(value).unwrap_or_else(|e| ChartProbe {
            error: Some(format!("unexpected probe result: {}", e)),
            ..Default::default()
        })
    }

    pub fn found(&self) -> bool {
        self.error.is_none() && self.source.is_some()
    }

    /// 转成数据点
    ///
    /// 小时图只取第一个数据集；序列图展开所有数据集。
    pub fn points(&self, layout: ChartLayout) -> Vec<SeriesPoint> {
        if !self.found() {
            return Vec::new();
        }

        let labels = self.labels.as_deref().unwrap_or_default();
        let datasets = self.datasets.as_deref().unwrap_or_default();

        if !labels.is_empty() && !datasets.is_empty() {
            let selected = match layout {
                ChartLayout::Hourly => &datasets[..1],
                ChartLayout::Series => datasets,
            };
            return selected
                .iter()
                .flat_map(|dataset| {
                    labels
                        .iter()
                        .zip(dataset.data.iter())
                        .enumerate()
                        .map(move |(i, (label, value))| {
                            let dataset_label = match layout {
                                ChartLayout::Hourly => None,
                                ChartLayout::Series => Some(
                                    dataset.label.clone().unwrap_or_else(|| "default".to_string()),
                                ),
                            };
                            SeriesPoint::new(i, label.clone(), point_value(value))
                                .with_dataset(dataset_label)
                        })
                })
                .collect();
        }

        // datasets without labels, or a bare data array
        let bare = self
            .data
            .as_deref()
            .filter(|d| !d.is_empty())
            .or_else(|| datasets.first().map(|d| d.data.as_slice()))
            .unwrap_or_default();
        bare.iter()
            .enumerate()
            .map(|(i, value)| SeriesPoint::new(i, Value::Null, point_value(value)))
            .collect()
    }
}

/// 生成探测脚本
///
/// `canvas_selector` 指向图表画布，`container_selector` 指向其容器。
pub fn probe_script(canvas_selector: &str, container_selector: &str) -> String {
    PROBE_TEMPLATE
        .replace("__CANVAS__", &js_string(canvas_selector))
        .replace("__CONTAINER__", &js_string(container_selector))
}

const PROBE_TEMPLATE: &str = r#"(() => {
    const container = document.querySelector(__CONTAINER__);
    const canvas = document.querySelector(__CANVAS__) || (container && container.querySelector('canvas'));
    if (!canvas) return { error: 'Canvas not found' };

    const plain = (v) => {
        try { return JSON.parse(JSON.stringify(v === undefined ? null : v)); } catch (e) { return null; }
    };
    const mapDatasets = (list) => Array.from(list || []).map(ds => ({
        label: ds && (ds.label != null ? String(ds.label) : (ds.name != null ? String(ds.name) : null)),
        data: ds && ds.data ? plain(Array.from(ds.data)) : []
    }));
    const chartShape = (obj) => (obj && obj.labels && obj.datasets) ? obj : null;
    const pack = (source, labels, datasets, data) => ({
        source: source,
        labels: labels ? plain(Array.from(labels)) : null,
        datasets: datasets || null,
        data: data ? plain(Array.from(data)) : null,
        error: null
    });

    // Chart.js
    if (window.Chart && window.Chart.instances) {
        const charts = Object.values(window.Chart.instances);
        const chart = charts.find(c => c && c.canvas === canvas) || charts[0];
        if (chart && chart.data && chart.data.labels && chart.data.datasets) {
            return pack('Chart.js (window.Chart.instances)', chart.data.labels, mapDatasets(chart.data.datasets));
        }
    }

    // Vue
    const vueKey = Object.keys(canvas).find(k => k.startsWith('__vue'));
    if (vueKey) {
        const vue = canvas[vueKey];
        const shape = vue && vue.config && chartShape(vue.config.data);
        if (shape) return pack('Vue.js (__vue__.config.data)', shape.labels, mapDatasets(shape.datasets));
    }

    // Angular
    const ngKey = Object.keys(canvas).find(k => k.startsWith('__ngContext'));
    if (ngKey && Array.isArray(canvas[ngKey])) {
        const hit = canvas[ngKey].find(item => item && item.config && item.basicData);
        const shape = hit && chartShape(hit.basicData);
        if (shape) return pack('Angular (__ngContext__)', shape.labels, mapDatasets(shape.datasets));
    }

    // ECharts
    const ec = canvas.__ec__;
    if (ec && typeof ec.getOption === 'function') {
        const option = ec.getOption();
        if (option && option.xAxis && option.series) {
            const axis = Array.isArray(option.xAxis) ? option.xAxis[0] : option.xAxis;
            return pack('ECharts (__ec__)', (axis && axis.data) || [], mapDatasets(option.series));
        }
    }

    // React fiber
    const fromProps = (props, where) => {
        if (!props) return null;
        if (chartShape(props.data)) {
            return pack('React (' + where + '.props.data)', props.data.labels, mapDatasets(props.data.datasets));
        }
        if (Array.isArray(props.data)) return pack('React (' + where + '.props.data array)', null, null, props.data);
        if (Array.isArray(props.dataset)) return pack('React (' + where + '.props.dataset)', null, mapDatasets(props.dataset));
        if (props.options && props.options.data) {
            const d = props.options.data;
            if (chartShape(d)) return pack('React (' + where + '.props.options.data)', d.labels, mapDatasets(d.datasets));
            if (Array.isArray(d)) return pack('React (' + where + '.props.options.data)', null, null, d);
        }
        if (props.chartData) {
            const d = props.chartData;
            if (chartShape(d)) return pack('React (' + where + '.props.chartData)', d.labels, mapDatasets(d.datasets));
            if (Array.isArray(d)) return pack('React (' + where + '.props.chartData)', null, null, d);
        }
        return null;
    };
    const fromState = (fiber) => {
        let state = fiber.memoizedState;
        for (let i = 0; state && i < 50; i++) {
            const s = state.memoizedState;
            if (s && typeof s === 'object') {
                if (Array.isArray(s.data)) return pack('React (memoizedState)', null, null, s.data);
                if (chartShape(s)) return pack('React (memoizedState chart)', s.labels, mapDatasets(s.datasets));
            }
            state = state.next;
        }
        return null;
    };
    const fiberOf = (el) => {
        const key = Object.keys(el).find(k => k.startsWith('__reactFiber') || k.startsWith('__reactInternalInstance'));
        return key ? el[key] : null;
    };
    const walk = (start, limit, where) => {
        const visited = new Set();
        let fiber = start;
        for (let i = 0; i < limit && fiber; i++) {
            if (visited.has(fiber)) break;
            visited.add(fiber);
            const hit = fromProps(fiber.memoizedProps, where) || fromState(fiber);
            if (hit) return hit;
            let child = fiber.child;
            for (let n = 0; child && n < 50; n++) {
                const childHit = fromProps(child.memoizedProps, 'child');
                if (childHit) return childHit;
                child = child.sibling;
            }
            fiber = fiber.return;
        }
        return null;
    };

    const canvasFiber = fiberOf(canvas);
    if (canvasFiber) {
        const hit = walk(canvasFiber, 300, 'fiber');
        if (hit) return hit;
    }

    if (container) {
        const containerFiber = fiberOf(container);
        if (containerFiber) {
            const hit = walk(containerFiber, 200, 'container');
            if (hit) return hit;
        }

        const containerVueKey = Object.keys(container).find(k => k.startsWith('__vue'));
        const vue = containerVueKey && container[containerVueKey];
        if (vue && vue.$data && vue.$data.chartData) {
            const d = vue.$data.chartData;
            if (chartShape(d)) return pack('Vue (container $data)', d.labels, mapDatasets(d.datasets));
            if (Array.isArray(d)) return pack('Vue (container $data)', null, null, d);
        }

        const containerNgKey = Object.keys(container).find(k => k.startsWith('__ngContext'));
        if (containerNgKey && Array.isArray(container[containerNgKey])) {
            const item = container[containerNgKey].find(i => i && i.chartData);
            if (item) {
                const d = item.chartData;
                if (chartShape(d)) return pack('Angular (container context)', d.labels, mapDatasets(d.datasets));
                if (Array.isArray(d)) return pack('Angular (container context)', null, null, d);
            }
        }
    }

    return { error: 'No chart data found in any known structure' };
})()"#;
