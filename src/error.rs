// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RegistryCredsError {
    #[error("Kubernetes API error: {0}")]
    KubeError(#[from] kube::Error),

    #[error("Invalid configuration: {0}")]
    ConfigError(String),

    #[error("Token generation failed: {0}")]
    TokenGenerationError(String),

    #[error("Failed to encode secret: {0}")]
    MaterializationError(#[from] serde_json::Error),

    #[error("ServiceAccount {namespace}/{name} not found")]
    ServiceAccountNotFound { namespace: String, name: String },

    #[error("Could not reconcile secret {secret} in namespace {namespace}: {source}")]
    ReconciliationError {
        namespace: String,
        secret: String,
        #[source]
        source: Box<RegistryCredsError>,
    },

    #[error("Provider already registered: {0}")]
    DuplicateProvider(String),
}

impl RegistryCredsError {
    /// Wrap a store failure with the namespace and secret it happened for
    pub fn reconciliation(namespace: &str, secret: &str, source: RegistryCredsError) -> Self {
        RegistryCredsError::ReconciliationError {
            namespace: namespace.to_string(),
            secret: secret.to_string(),
            source: Box::new(source),
        }
    }
}

pub type Result<T> = std::result::Result<T, RegistryCredsError>;
