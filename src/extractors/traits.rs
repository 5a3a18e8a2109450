// Copyright 2025 Kirky.X
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use async_trait::async_trait;
use chrono::NaiveDate;
use std::sync::Arc;
use std::time::Duration;

use crate::config::settings::{PacingSettings, Settings, SiteSettings};
use crate::domain::models::captured_response::ResponseFilter;
use crate::domain::models::record::ScrapeOutcome;
use crate::engines::traits::BrowserSession;

/// 页面提取器特质
///
/// 每个目标页面一个实现。提取器先用 [`PageExtractor::configure`] 绑定到某一天，
/// 再用 [`PageExtractor::extract`] 在已登录的会话上执行一次页面访问。
/// 没有数据不是错误：失败会写入元数据，记录为空。
#[async_trait]
pub trait PageExtractor: Send + Sync {
    /// 模块名，同时是输出目录名
    fn module_name(&self) -> &'static str;

    /// 绑定日期，只设置参数，不访问页面
    fn configure(&mut self, day: NaiveDate);

    /// 当前配置下的目标URL
    fn target_url(&self) -> String;

    /// 执行一次页面访问并提取记录
    async fn extract(&self, session: &dyn BrowserSession) -> ScrapeOutcome;
}

/// 提取器模板
///
/// 编排器为每一天实例化一个全新的、已配置的提取器，天与天之间不共享状态。
pub trait ExtractorTemplate: Send + Sync {
    fn name(&self) -> &'static str;

    fn instantiate(&self, day: NaiveDate) -> Box<dyn PageExtractor>;
}

impl<T> ExtractorTemplate for T
where
    T: PageExtractor + Clone + 'static,
{
    fn name(&self) -> &'static str {
        self.module_name()
    }

    fn instantiate(&self, day: NaiveDate) -> Box<dyn PageExtractor> {
        let mut extractor = self.clone();
        extractor.configure(day);
        Box::new(extractor)
    }
}

/// 所有提取器共享的配置
#[derive(Debug, Clone)]
pub struct ExtractorSettings {
    pub site: SiteSettings,
    pub pacing: PacingSettings,
    pub keywords: Vec<String>,
}

impl ExtractorSettings {
    pub fn from_settings(settings: &Settings) -> Arc<Self> {
        Arc::new(Self {
            site: settings.site.clone(),
            pacing: settings.pacing.clone(),
            keywords: settings.network.keywords.clone(),
        })
    }

    /// 网络捕获过滤器，可追加页面专用的关键字
    pub fn response_filter(&self, extra: &[&str]) -> ResponseFilter {
        ResponseFilter::new(
            self.keywords
                .iter()
                .map(String::as_str)
                .chain(extra.iter().copied()),
        )
    }

    pub fn hourly_hover_delay(&self) -> Duration {
        Duration::from_millis(self.pacing.hourly_hover_delay_ms)
    }

    pub fn booking_hover_delay(&self) -> Duration {
        Duration::from_millis(self.pacing.booking_hover_delay_ms)
    }
}
