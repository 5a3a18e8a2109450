// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use std::path::{Path, PathBuf};
use tracing::info;

use crate::domain::models::credential::Credential;
use crate::domain::repositories::credential_repository::{CredentialError, CredentialRepository};

/// 从本地 CSV 表读取凭据
///
/// 表格带表头，取第一行数据：标识、密码，以及可选的数字账户ID。
/// 路径可以带或不带 `.csv` 后缀。
pub struct CsvCredentialLoader {
    path: PathBuf,
}

impl CsvCredentialLoader {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// 找到实际存在的文件：原路径优先，其次切换 `.csv` 后缀
    fn resolve(&self) -> Result<PathBuf, CredentialError> {
        if self.path.is_file() {
            return Ok(self.path.clone());
        }
        let alternate = match self.path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("csv") => self.path.with_extension(""),
            _ => with_csv_suffix(&self.path),
        };
        if alternate.is_file() {
            return Ok(alternate);
        }
        Err(CredentialError::NotFound(self.path.display().to_string()))
    }
}

fn with_csv_suffix(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".csv");
    PathBuf::from(name)
}

impl CredentialRepository for CsvCredentialLoader {
    fn load(&self) -> Result<Credential, CredentialError> {
        let path = self.resolve()?;
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_path(&path)?;

        let row = reader
            .records()
            .next()
            .ok_or_else(|| CredentialError::Malformed("no data rows".to_string()))??;

        let identifier = row.get(0).filter(|v| !v.is_empty());
        let secret = row.get(1).filter(|v| !v.is_empty());
        let (Some(identifier), Some(secret)) = (identifier, secret) else {
            return Err(CredentialError::Malformed(
                "first row needs an identifier and a secret".to_string(),
            ));
        };

        let mut credential = Credential::new(identifier, secret);
        if let Some(raw) = row.get(2).filter(|v| !v.is_empty()) {
            let account_id = raw.parse::<u64>().map_err(|_| {
                CredentialError::Malformed(format!("account id is not numeric: {}", raw))
            })?;
            credential = credential.with_account_id(account_id);
        }

        info!("Credentials loaded from {}", path.display());
        Ok(credential)
    }
}
