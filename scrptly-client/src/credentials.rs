//! Bearer credential capability
//!
//! The gateway asks a [`CredentialProvider`] for the API key on every call.
//! Providers are free to cache; the gateway never stores the token.

use async_trait::async_trait;
use std::fmt;

use crate::error::{ClientError, Result};

/// Supplies the API key sent as `Authorization: Bearer <token>`
#[async_trait]
pub trait CredentialProvider: Send + Sync {
    /// Returns the current token, or [`ClientError::Auth`] if none is available
    async fn bearer_token(&self) -> Result<String>;
}

/// A fixed API key
#[derive(Clone)]
pub struct StaticToken(String);

impl StaticToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }
}

impl fmt::Debug for StaticToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("StaticToken(<redacted>)")
    }
}

#[async_trait]
impl CredentialProvider for StaticToken {
    async fn bearer_token(&self) -> Result<String> {
        if self.0.trim().is_empty() {
            return Err(ClientError::Auth("API key is empty".to_string()));
        }
        Ok(self.0.clone())
    }
}

/// Reads the API key from an environment variable on every call
#[derive(Debug, Clone)]
pub struct EnvToken {
    var: String,
}

impl EnvToken {
    pub fn new(var: impl Into<String>) -> Self {
        Self { var: var.into() }
    }
}

#[async_trait]
impl CredentialProvider for EnvToken {
    async fn bearer_token(&self) -> Result<String> {
        match std::env::var(&self.var) {
            Ok(token) if !token.trim().is_empty() => Ok(token),
            _ => Err(ClientError::Auth(format!(
                "{} environment variable not set",
                self.var
            ))),
        }
    }
}
