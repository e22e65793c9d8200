//! Caller authentication

use async_trait::async_trait;
use std::collections::HashMap;

use crate::config::AuthConfig;
use crate::error::Result;

/// Role that may upload documents
pub const PRIVILEGED_ROLE: &str = "admin";

/// An authenticated caller
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Caller {
    pub uid: String,
    pub role: String,
}

impl Caller {
    pub fn new(uid: impl Into<String>, role: impl Into<String>) -> Self {
        Self {
            uid: uid.into(),
            role: role.into(),
        }
    }

    /// The single privileged-uploader check
    pub fn is_privileged(&self) -> bool {
        self.role.eq_ignore_ascii_case(PRIVILEGED_ROLE)
    }
}

/// Resolves a bearer credential to a caller
#[async_trait]
pub trait Authorizer: Send + Sync {
    /// `Ok(None)` for an unknown credential
    async fn authenticate(&self, token: &str) -> Result<Option<Caller>>;
}

/// Authorizer backed by the `[[auth.tokens]]` config table
#[derive(Debug, Default)]
pub struct StaticTokenAuthorizer {
    tokens: HashMap<String, Caller>,
}

impl StaticTokenAuthorizer {
    pub fn from_config(config: &AuthConfig) -> Self {
        let tokens = config
            .tokens
            .iter()
            .filter(|entry| !entry.token.trim().is_empty())
            .map(|entry| {
                (
                    entry.token.trim().to_string(),
                    Caller::new(&entry.uid, &entry.role),
                )
            })
            .collect();
        Self { tokens }
    }

    /// Register a token, replacing any existing entry
    pub fn with_token(mut self, token: impl Into<String>, caller: Caller) -> Self {
        self.tokens.insert(token.into(), caller);
        self
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

#[async_trait]
impl Authorizer for StaticTokenAuthorizer {
    async fn authenticate(&self, token: &str) -> Result<Option<Caller>> {
        Ok(self.tokens.get(token.trim()).cloned())
    }
}
