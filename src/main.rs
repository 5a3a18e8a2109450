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

use anyhow::Context;
use dashcrawl::config::settings::Settings;
use dashcrawl::domain::repositories::credential_repository::CredentialRepository;
use dashcrawl::engines::chromium_session::ChromiumSession;
use dashcrawl::engines::session_driver::SessionDriver;
use dashcrawl::engines::traits::BrowserSession;
use dashcrawl::extractors::registry::build_registrations;
use dashcrawl::infrastructure::credentials::CsvCredentialLoader;
use dashcrawl::infrastructure::storage::LocalResultWriter;
use dashcrawl::workers::Orchestrator;
use std::sync::Arc;
use tracing::{info, warn};

use dashcrawl::utils::telemetry;

/// 主函数
///
/// 读取配置和凭据、登录一次，然后顺序执行所有已启用的模块并打印汇总。
/// 可选的第一个参数是配置文件路径（不带扩展名也可以）。
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Initialize logging
    telemetry::init_telemetry();
    info!("Starting dashcrawl...");

    // 2. Load configuration
    let settings = match std::env::args().nth(1) {
        Some(path) => Settings::from_file(&path)
            .with_context(|| format!("failed to load configuration from {}", path))?,
        None => Settings::new().context("failed to load configuration")?,
    };
    info!("Configuration loaded");

    // 3. Load credentials
    let credential = CsvCredentialLoader::new(&settings.credentials.path)
        .load()
        .context("failed to load credentials")?;
    info!("Credentials loaded for {}", credential.identifier());

    // 4. Launch browser and log in
    let session: Arc<dyn BrowserSession> = Arc::new(
        ChromiumSession::launch(&settings.browser)
            .await
            .context("failed to launch browser")?,
    );
    let mut driver = SessionDriver::new(settings.login.clone());
    if let Some(account_id) = credential.account_id() {
        driver = driver.with_service_id(account_id.to_string());
    }
    driver
        .login(session.as_ref(), &credential)
        .await
        .context("login failed")?;
    match driver.navigate_to_base(session.as_ref()).await {
        Ok(true) => {}
        Ok(false) => warn!("Dashboard home not confirmed, continuing"),
        Err(e) => warn!("Failed to open dashboard home: {}", e),
    }

    // 5. Run registered modules
    let registrations = build_registrations(&settings);
    let storage = Arc::new(LocalResultWriter::new(&settings.output.root));
    let orchestrator = Orchestrator::new(
        session.clone(),
        storage,
        registrations,
        settings.pacing.clone(),
        &settings.output.root,
    );
    let summary = orchestrator.run().await;
    println!("{}", summary);

    if let Err(e) = session.close().await {
        warn!("Failed to close browser: {}", e);
    }
    info!("dashcrawl finished");
    Ok(())
}
