// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Registry token providers.
//!
//! A provider pairs a [`TokenSource`] with the secret it feeds and the
//! encoding that secret uses. Providers are kept in a [`ProviderRegistry`]
//! and run in registration order on every refresh cycle.

pub mod ecr;

pub use ecr::{create_ecr_client, AuthorizationTokenApi, EcrTokenSource};

use crate::error::{RegistryCredsError, Result};
use async_trait::async_trait;
use std::sync::Arc;

/// Access token for one registry endpoint
#[derive(Clone, PartialEq, Eq)]
pub struct AuthToken {
    pub access_token: String,
    pub endpoint: String,
}

impl std::fmt::Debug for AuthToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthToken")
            .field("endpoint", &self.endpoint)
            .finish_non_exhaustive()
    }
}

/// Wire format of the generated pull secret
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SecretEncoding {
    /// `.dockerconfigjson` with one entry per registry
    Json,
    /// `.dockercfg` for a single registry
    Legacy,
}

/// Source of registry tokens. One call either returns every token or fails.
#[async_trait]
pub trait TokenSource: Send + Sync {
    async fn generate(&self) -> Result<Vec<AuthToken>>;
}

#[derive(Clone)]
pub struct TokenProvider {
    pub name: String,
    /// Name of the secret this provider's tokens are written to
    pub secret_name: String,
    pub encoding: SecretEncoding,
    source: Arc<dyn TokenSource>,
}

impl TokenProvider {
    pub fn new(
        name: impl Into<String>,
        secret_name: impl Into<String>,
        encoding: SecretEncoding,
        source: Arc<dyn TokenSource>,
    ) -> Self {
        Self {
            name: name.into(),
            secret_name: secret_name.into(),
            encoding,
            source,
        }
    }

    pub async fn generate(&self) -> Result<Vec<AuthToken>> {
        self.source.generate().await
    }
}

impl std::fmt::Debug for TokenProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenProvider")
            .field("name", &self.name)
            .field("secret_name", &self.secret_name)
            .field("encoding", &self.encoding)
            .finish_non_exhaustive()
    }
}

/// Providers keyed by name, in registration order
#[derive(Debug, Clone, Default)]
pub struct ProviderRegistry {
    providers: Vec<TokenProvider>,
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, provider: TokenProvider) -> Result<()> {
        if self.get(&provider.name).is_some() {
            return Err(RegistryCredsError::DuplicateProvider(provider.name));
        }
        self.providers.push(provider);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&TokenProvider> {
        self.providers.iter().find(|p| p.name == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &TokenProvider> {
        self.providers.iter()
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }
}
