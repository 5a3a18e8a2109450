// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::settings::LoginSettings;
use crate::domain::models::credential::Credential;
use crate::engines::traits::{js_string, BrowserSession, EngineError};

/// 登录错误
///
/// 登录失败对整个运行是致命的
#[derive(Error, Debug)]
pub enum LoginError {
    #[error("navigation to {url} failed: {source}")]
    Navigation {
        url: String,
        #[source]
        source: EngineError,
    },

    #[error("no {0} field matched any candidate selector")]
    FieldNotFound(&'static str),

    #[error("submit failed: {0}")]
    Submit(#[source] EngineError),

    #[error("login form is still visible after submit")]
    FormStillVisible,
}

/// 会话驱动
///
/// 在共享页面上执行登录流程并进入控制台
pub struct SessionDriver {
    settings: LoginSettings,
    service_id: Option<String>,
}

impl SessionDriver {
    pub fn new(settings: LoginSettings) -> Self {
        Self {
            settings,
            service_id: None,
        }
    }

    /// 登录后要进入的服务编号（匹配服务链接 href 中的 `svid=`）
    pub fn with_service_id(mut self, service_id: impl Into<String>) -> Self {
        self.service_id = Some(service_id.into());
        self
    }

    fn step_delay(&self) -> Duration {
        Duration::from_millis(self.settings.step_delay_ms)
    }

    /// 执行登录
    ///
    /// 依次：打开登录页、填写账号密码、关闭 IP 安全开关、提交、确认登录表单消失、
    /// 执行登录后的点击。
    pub async fn login(
        &self,
        session: &dyn BrowserSession,
        credential: &Credential,
    ) -> Result<(), LoginError> {
        info!("Starting login sequence");
        session
            .goto(&self.settings.login_url)
            .await
            .map_err(|source| LoginError::Navigation {
                url: self.settings.login_url.clone(),
                source,
            })?;
        tokio::time::sleep(self.step_delay()).await;

        if !fill_first(session, &self.settings.id_selectors, credential.identifier(), "ID").await {
            return Err(LoginError::FieldNotFound("identifier"));
        }
        if !fill_first(session, &self.settings.pw_selectors, credential.secret(), "Password").await {
            return Err(LoginError::FieldNotFound("secret"));
        }
        tokio::time::sleep(Duration::from_millis(500)).await;

        self.toggle_keep_off(session).await;

        debug!("Clicking login button");
        session
            .click(&self.settings.submit_selector)
            .await
            .map_err(LoginError::Submit)?;
        tokio::time::sleep(self.step_delay() + Duration::from_millis(500)).await;

        if self.is_login_form_visible(session).await {
            warn!("Login might have failed, ID input still visible");
            return Err(LoginError::FormStillVisible);
        }
        info!("Login successful");

        for selector in &self.settings.post_login_clicks {
            match session.click(selector).await {
                Ok(()) => {
                    debug!("Clicked post-login element {}", selector);
                    tokio::time::sleep(self.step_delay()).await;
                }
                Err(e) => debug!("Skipping post-login click {}: {}", selector, e),
            }
        }

        if let (Some(selector), Some(service_id)) =
            (&self.settings.service_link_selector, &self.service_id)
        {
            self.open_service_link(session, selector, service_id).await;
        }

        Ok(())
    }

    /// 进入控制台首页；URL 不含预期主机时返回 `Ok(false)`
    pub async fn navigate_to_base(&self, session: &dyn BrowserSession) -> Result<bool, LoginError> {
        info!("Moving to base dashboard");
        session
            .goto(&self.settings.base_url)
            .await
            .map_err(|source| LoginError::Navigation {
                url: self.settings.base_url.clone(),
                source,
            })?;
        tokio::time::sleep(self.step_delay() * 2).await;

        let current = session.current_url().await.ok().flatten().unwrap_or_default();
        if current.contains(&self.settings.success_host) {
            info!("Arrived at {}", current);
            Ok(true)
        } else {
            warn!("Unexpected URL after navigation: {}", current);
            Ok(false)
        }
    }

    async fn is_login_form_visible(&self, session: &dyn BrowserSession) -> bool {
        for selector in &self.settings.id_selectors {
            if let Ok(true) = session.is_visible(selector).await {
                return true;
            }
        }
        false
    }

    /// 确保"IP安全"开关处于关闭状态
    async fn toggle_keep_off(&self, session: &dyn BrowserSession) {
        let Some(label) = &self.settings.keep_off_label else {
            return;
        };

        let mut checkbox = None;
        for selector in &self.settings.keep_off_checkbox_selectors {
            if let Some(state) = checkbox_state(session, selector).await {
                debug!("Found checkbox selector: {}", selector);
                checkbox = Some((selector.as_str(), state));
                break;
            }
        }

        if !matches!(session.is_visible(label).await, Ok(true)) {
            warn!("IP security toggle label not found, skipping");
            return;
        }

        let pause = Duration::from_millis(500);
        match checkbox {
            None => {
                debug!("Checkbox state unknown, clicking label once to ensure OFF");
                if let Err(e) = session.click(label).await {
                    warn!("Failed to click IP security toggle: {}", e);
                }
                tokio::time::sleep(pause).await;
            }
            Some((selector, true)) => {
                debug!("IP security is ON, toggling OFF");
                let _ = session.click(label).await;
                tokio::time::sleep(pause).await;
                if checkbox_state(session, selector).await == Some(true) {
                    warn!("Toggle still ON, clicking again");
                    let _ = session.click(label).await;
                    tokio::time::sleep(pause).await;
                }
            }
            Some((_, false)) => debug!("IP security already OFF"),
        }
    }

    async fn open_service_link(&self, session: &dyn BrowserSession, selector: &str, service_id: &str) {
        let script = format!(
            r#"(() => {{
                const needle = {needle};
                for (const link of document.querySelectorAll({sel})) {{
                    const href = link.getAttribute('href');
                    if (href && href.includes(needle)) {{ link.click(); return true; }}
                }}
                return false;
            }})()"#,
            needle = js_string(&format!("svid={}", service_id)),
            sel = js_string(selector)
        );
        match session.evaluate(&script).await {
            Ok(v) if v.as_bool() == Some(true) => {
                debug!("Opened service link for svid={}", service_id);
                tokio::time::sleep(self.step_delay()).await;
            }
            Ok(_) => warn!("No service link matched svid={}", service_id),
            Err(e) => warn!("Service link lookup failed: {}", e),
        }
    }
}

/// 按顺序尝试候选选择器，直到其中一个被填写
async fn fill_first(
    session: &dyn BrowserSession,
    selectors: &[String],
    value: &str,
    field_name: &str,
) -> bool {
    for selector in selectors {
        match session.fill(selector, value).await {
            Ok(true) => {
                debug!("{} filled via selector: {}", field_name, selector);
                return true;
            }
            Ok(false) => continue,
            Err(e) => {
                warn!("Failed to fill {} with {}: {}", field_name, selector, e);
                continue;
            }
        }
    }
    warn!("Could not fill {} (selectors exhausted)", field_name);
    false
}

async fn checkbox_state(session: &dyn BrowserSession, selector: &str) -> Option<bool> {
    let script = format!(
        "(() => {{ const el = document.querySelector({}); return el ? !!el.checked : null; }})()",
        js_string(selector)
    );
    session.evaluate(&script).await.ok()?.as_bool()
}
