// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Runs one refresh cycle for a namespace: fetch tokens from every provider,
//! build their secrets and write them into the namespace.

use crate::config::{Config, RetryConfig};
use crate::constants::KUBE_SYSTEM_NAMESPACE;
use crate::error::Result;
use crate::kubernetes::NamespaceStore;
use crate::providers::{AuthToken, ProviderRegistry, TokenProvider};
use crate::refresh::namespace::reconcile_namespace;
use crate::refresh::secrets::SecretPayload;
use crate::retry::RetryPolicy;
use std::sync::Arc;
use tokio::time::sleep;
use tracing::{debug, error, info, instrument};

/// What a refresh cycle did to a namespace
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// Namespace is in the excluded list
    Excluded,
    /// Namespace is kube-system and skipping it is enabled
    SystemNamespaceSkipped,
    /// Names of the secrets written, in provider order
    Refreshed { secrets: Vec<String> },
}

pub struct RefreshOrchestrator {
    store: Arc<dyn NamespaceStore>,
    providers: ProviderRegistry,
    retry: RetryConfig,
    excluded_namespaces: Vec<String>,
    skip_kube_system: bool,
}

impl RefreshOrchestrator {
    pub fn new(
        store: Arc<dyn NamespaceStore>,
        providers: ProviderRegistry,
        retry: RetryConfig,
    ) -> Self {
        Self {
            store,
            providers,
            retry,
            excluded_namespaces: Vec::new(),
            skip_kube_system: true,
        }
    }

    pub fn from_config(
        store: Arc<dyn NamespaceStore>,
        providers: ProviderRegistry,
        config: &Config,
    ) -> Self {
        Self::new(store, providers, config.retry)
            .with_excluded_namespaces(config.excluded_namespaces.clone())
            .with_skip_kube_system(config.skip_kube_system)
    }

    pub fn with_excluded_namespaces(mut self, namespaces: Vec<String>) -> Self {
        self.excluded_namespaces = namespaces;
        self
    }

    pub fn with_skip_kube_system(mut self, skip: bool) -> Self {
        self.skip_kube_system = skip;
        self
    }

    /// Refresh every provider's secret in `namespace`.
    ///
    /// Provider failures are logged and skip that provider for this cycle.
    /// The first failure to write into the namespace stops the cycle and is
    /// returned.
    #[instrument(skip(self))]
    pub async fn refresh_namespace(&self, namespace: &str) -> Result<RefreshOutcome> {
        if self.excluded_namespaces.iter().any(|ns| ns == namespace) {
            info!("Namespace {} is excluded, skipping", namespace);
            return Ok(RefreshOutcome::Excluded);
        }
        if self.skip_kube_system && namespace == KUBE_SYSTEM_NAMESPACE {
            debug!("Skipping namespace {}", namespace);
            return Ok(RefreshOutcome::SystemNamespaceSkipped);
        }

        info!("Generating credentials for namespace {}", namespace);
        let secrets = self.generate_secrets().await;
        info!(
            "Got {} refreshed credential(s) for namespace {}",
            secrets.len(),
            namespace
        );

        let mut refreshed = Vec::with_capacity(secrets.len());
        for payload in &secrets {
            info!(
                "Processing secret {} for namespace {}",
                payload.name, namespace
            );
            if let Err(e) = reconcile_namespace(self.store.as_ref(), namespace, payload).await {
                error!(
                    "Error processing secret {} for namespace {}: {}",
                    payload.name, namespace, e
                );
                return Err(e);
            }
            refreshed.push(payload.name.clone());
        }

        info!("Finished refreshing credentials for namespace {}", namespace);
        Ok(RefreshOutcome::Refreshed { secrets: refreshed })
    }

    /// One secret per provider that produced tokens this cycle
    pub async fn generate_secrets(&self) -> Vec<SecretPayload> {
        let mut secrets = Vec::with_capacity(self.providers.len());

        for provider in self.providers.iter() {
            let Some(tokens) = self.fetch_tokens(provider).await else {
                continue;
            };

            match SecretPayload::materialize(&provider.secret_name, provider.encoding, &tokens) {
                Ok(payload) => secrets.push(payload),
                Err(e) => error!(
                    "Error generating secret {} for provider {}. Skipping provider until the next refresh cycle! [Err: {}]",
                    provider.secret_name, provider.name, e
                ),
            }
        }

        secrets
    }

    /// Call the provider until it succeeds, attempts run out or the policy stops
    async fn fetch_tokens(&self, provider: &TokenProvider) -> Option<Vec<AuthToken>> {
        let max_attempts = self.retry.max_attempts();
        let mut policy = RetryPolicy::from_config(&self.retry);
        policy.reset();

        let mut attempt = 0;
        loop {
            attempt += 1;
            info!(
                "Getting tokens for provider {}; try #{} of {}",
                provider.name, attempt, max_attempts
            );

            match provider.generate().await {
                Ok(tokens) => {
                    info!(
                        "Got {} token(s) for provider {} after {} attempt(s)",
                        tokens.len(),
                        provider.name,
                        attempt
                    );
                    return Some(tokens);
                }
                Err(e) if attempt < max_attempts => {
                    let Some(delay) = policy.next_delay() else {
                        error!(
                            "Error getting tokens for provider {}. Retry timer exceeded max tries/duration; will not try again until the next refresh cycle. [Err: {}]",
                            provider.name, e
                        );
                        return None;
                    };
                    error!(
                        "Error getting tokens for provider {}. Will try again after {:.3} seconds. [Err: {}]",
                        provider.name,
                        delay.as_secs_f64(),
                        e
                    );
                    sleep(delay).await;
                }
                Err(e) => {
                    error!(
                        "Error getting tokens for provider {}. Tried {} time(s); will not try again until the next refresh cycle. [Err: {}]",
                        provider.name, attempt, e
                    );
                    return None;
                }
            }
        }
    }
}
