// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use std::fmt;

/// 登录凭据
///
/// 每次运行加载一次，之后不可变。`Debug` 输出会隐藏密码。
#[derive(Clone, PartialEq, Eq)]
pub struct Credential {
    identifier: String,
    secret: String,
    account_id: Option<u64>,
}

impl Credential {
    pub fn new(identifier: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            secret: secret.into(),
            account_id: None,
        }
    }

    pub fn with_account_id(mut self, account_id: u64) -> Self {
        self.account_id = Some(account_id);
        self
    }

    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    pub fn secret(&self) -> &str {
        &self.secret
    }

    /// 数字账户/站点ID（仅部分控制台需要）
    pub fn account_id(&self) -> Option<u64> {
        self.account_id
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("identifier", &self.identifier)
            .field("secret", &"[REDACTED]")
            .field("account_id", &self.account_id)
            .finish()
    }
}
