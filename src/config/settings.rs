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

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::time::Duration;

/// 应用程序配置设置
///
/// 包含浏览器、登录、凭据、输出、节奏控制、站点参数和模块注册等所有配置项
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    /// 浏览器配置
    pub browser: BrowserSettings,
    /// 登录流程配置
    pub login: LoginSettings,
    /// 凭据文件配置
    pub credentials: CredentialSettings,
    /// 输出配置
    pub output: OutputSettings,
    /// 延迟与超时配置
    pub pacing: PacingSettings,
    /// 站点参数
    pub site: SiteSettings,
    /// 网络捕获配置
    pub network: NetworkSettings,
    /// 按顺序执行的模块
    #[serde(default)]
    pub modules: Vec<ModuleSettings>,
}

/// 浏览器配置设置
#[derive(Debug, Clone, Deserialize)]
pub struct BrowserSettings {
    /// 是否无头运行
    pub headless: bool,
    /// 远程调试地址（设置后连接已有 Chrome 而不是启动新实例）
    pub remote_debugging_url: Option<String>,
    /// CDP 请求超时时间（秒）
    pub request_timeout_secs: u64,
    /// 窗口宽度
    pub window_width: u32,
    /// 窗口高度
    pub window_height: u32,
}

/// 登录流程配置
///
/// 选择器以候选列表给出，按顺序尝试直到命中
#[derive(Debug, Clone, Deserialize)]
pub struct LoginSettings {
    /// 登录页URL
    pub login_url: String,
    /// 登录后进入的控制台URL
    pub base_url: String,
    /// 控制台URL必须包含的主机名片段
    pub success_host: String,
    #[serde(default = "default_id_selectors")]
    pub id_selectors: Vec<String>,
    #[serde(default = "default_pw_selectors")]
    pub pw_selectors: Vec<String>,
    /// 登录按钮
    pub submit_selector: String,
    /// "IP安全"开关的 label
    pub keep_off_label: Option<String>,
    #[serde(default = "default_keep_off_checkboxes")]
    pub keep_off_checkbox_selectors: Vec<String>,
    /// 登录后依次点击的元素（不存在时跳过）
    #[serde(default)]
    pub post_login_clicks: Vec<String>,
    /// 服务链接选择器，点击 href 中含 `svid=<id>` 的那一个
    pub service_link_selector: Option<String>,
    /// 每步之后的等待时间（毫秒）
    pub step_delay_ms: u64,
}

/// 凭据文件配置
#[derive(Debug, Clone, Deserialize)]
pub struct CredentialSettings {
    /// CSV 路径，可带或不带 `.csv` 后缀
    pub path: String,
}

/// 输出配置设置
#[derive(Debug, Clone, Deserialize)]
pub struct OutputSettings {
    /// 输出根目录
    pub root: String,
}

/// 延迟与超时配置
#[derive(Debug, Clone, Deserialize)]
pub struct PacingSettings {
    /// 日期之间的等待（毫秒）
    pub day_delay_ms: u64,
    /// 模块之间的等待（毫秒）
    pub module_delay_ms: u64,
    /// 单个任务的总超时（秒）
    pub task_timeout_secs: u64,
    /// 导航超时（秒）
    pub navigation_timeout_secs: u64,
    /// 等待内容出现的超时（秒）
    pub content_timeout_secs: u64,
    /// 内容出现后的渲染等待（毫秒）
    pub settle_ms: u64,
    /// 小时图悬停间隔（毫秒）
    pub hourly_hover_delay_ms: u64,
    /// 预约趋势图悬停间隔（毫秒）
    pub booking_hover_delay_ms: u64,
}

impl PacingSettings {
    pub fn day_delay(&self) -> Duration {
        Duration::from_millis(self.day_delay_ms)
    }

    pub fn module_delay(&self) -> Duration {
        Duration::from_millis(self.module_delay_ms)
    }

    pub fn task_timeout(&self) -> Duration {
        Duration::from_secs(self.task_timeout_secs)
    }

    pub fn navigation_timeout(&self) -> Duration {
        Duration::from_secs(self.navigation_timeout_secs)
    }

    pub fn content_timeout(&self) -> Duration {
        Duration::from_secs(self.content_timeout_secs)
    }

    pub fn settle(&self) -> Duration {
        Duration::from_millis(self.settle_ms)
    }
}

/// 站点参数
#[derive(Debug, Clone, Deserialize)]
pub struct SiteSettings {
    pub place_base_url: String,
    pub place_id: String,
    pub booking_base_url: String,
    pub booking_business_id: String,
    pub smartcall_base_url: String,
    pub smartcall_id: String,
    pub smlog_base_url: String,
    pub smlog_svid: String,
}

/// 网络捕获配置
#[derive(Debug, Clone, Deserialize)]
pub struct NetworkSettings {
    /// URL 关键字（忽略大小写）
    #[serde(default = "default_network_keywords")]
    pub keywords: Vec<String>,
}

/// 模块注册项
#[derive(Debug, Clone, Deserialize)]
pub struct ModuleSettings {
    /// 模块名
    pub name: String,
    /// 开始日期 `YYYY-MM-DD`
    pub start_date: String,
    /// 结束日期 `YYYY-MM-DD`
    pub end_date: String,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

fn default_id_selectors() -> Vec<String> {
    [
        "#input_item_id input",
        "input#id",
        "input[name='id']",
        "input[type='text'][name='id']",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn default_pw_selectors() -> Vec<String> {
    [
        "#input_item_pw input",
        "input#pw",
        "input[name='pw']",
        "input[type='password'][name='pw']",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn default_keep_off_checkboxes() -> Vec<String> {
    [
        "#ip_on",
        "#keep_login",
        "#keep_login_chk",
        "#login_keep_wrap input[type='checkbox']",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn default_network_keywords() -> Vec<String> {
    ["statistics", "chart", "data", "api"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_enabled() -> bool {
    true
}

impl Settings {
    /// 创建新的配置实例
    ///
    /// 依次叠加内置默认值、`config/default`、`config/{APP_ENVIRONMENT}` 和 `DASHCRAWL__*` 环境变量
    ///
    /// # Returns
    ///
    /// * `Ok(Settings)` - 成功加载的配置
    /// * `Err(ConfigError)` - 配置加载失败
    pub fn new() -> Result<Self, ConfigError> {
        let env = std::env::var("APP_ENVIRONMENT").unwrap_or_else(|_| "default".to_string());
        Self::builder()?
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", env)).required(false))
            .add_source(Environment::with_prefix("DASHCRAWL").separator("__"))
            .build()?
            .try_deserialize()
    }

    /// 从指定文件加载（不读取环境变量）
    pub fn from_file(path: &str) -> Result<Self, ConfigError> {
        Self::builder()?
            .add_source(File::with_name(path))
            .build()?
            .try_deserialize()
    }

    fn builder() -> Result<config::ConfigBuilder<config::builder::DefaultState>, ConfigError> {
        Config::builder()
            // Browser
            .set_default("browser.headless", true)?
            .set_default("browser.request_timeout_secs", 30)?
            .set_default("browser.window_width", 1600)?
            .set_default("browser.window_height", 1000)?
            // Login
            .set_default(
                "login.login_url",
                "https://nid.naver.com/nidlogin.login?svctype=1&locale=ko_KR&url=https%3A%2F%2Fnew.smartplace.naver.com%2F&area=bbt",
            )?
            .set_default(
                "login.base_url",
                "https://new.smartplace.naver.com/bizes/place/5921383?bookingBusinessId=603738",
            )?
            .set_default("login.success_host", "smartplace.naver.com")?
            .set_default("login.submit_selector", "#log\\.login")?
            .set_default("login.step_delay_ms", 1000)?
            // Credentials and output
            .set_default("credentials.path", "data/info_naver.csv")?
            .set_default("output.root", "data/naverplace")?
            // Pacing
            .set_default("pacing.day_delay_ms", 1000)?
            .set_default("pacing.module_delay_ms", 2000)?
            .set_default("pacing.task_timeout_secs", 300)?
            .set_default("pacing.navigation_timeout_secs", 30)?
            .set_default("pacing.content_timeout_secs", 15)?
            .set_default("pacing.settle_ms", 3000)?
            .set_default("pacing.hourly_hover_delay_ms", 600)?
            .set_default("pacing.booking_hover_delay_ms", 1000)?
            // Site
            .set_default("site.place_base_url", "https://new.smartplace.naver.com")?
            .set_default("site.place_id", "5921383")?
            .set_default("site.booking_base_url", "https://partner.booking.naver.com")?
            .set_default("site.booking_business_id", "603738")?
            .set_default("site.smartcall_base_url", "https://smartcall.smartplace.naver.com")?
            .set_default("site.smartcall_id", "1191881927")?
            .set_default("site.smlog_base_url", "https://smlog.co.kr")?
            .set_default("site.smlog_svid", "33138")?
            // Network
            .set_default("network.keywords", default_network_keywords())
    }
}

#[cfg(test)]
#[path = "settings_test.rs"]
mod tests;
