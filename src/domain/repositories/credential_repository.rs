// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use thiserror::Error;

use crate::domain::models::credential::Credential;

/// 凭据加载错误
#[derive(Error, Debug)]
pub enum CredentialError {
    #[error("credentials file not found: {0}")]
    NotFound(String),

    #[error("credentials table is malformed: {0}")]
    Malformed(String),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

/// 凭据来源
pub trait CredentialRepository {
    /// 加载本次运行使用的凭据
    fn load(&self) -> Result<Credential, CredentialError>;
}
