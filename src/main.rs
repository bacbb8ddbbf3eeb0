// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use anyhow::Result;
use clap::Parser;
use kube::Client;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use registry_creds::config::{Args, Config};
use registry_creds::kubernetes::KubeStore;
use registry_creds::providers::{
    create_ecr_client, EcrTokenSource, ProviderRegistry, SecretEncoding, TokenProvider,
};
use registry_creds::reconcilers::NamespaceReconciler;
use registry_creds::refresh::RefreshOrchestrator;

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!("Starting registry-creds operator");

    let config = Config::from_args(args);
    info!(
        "Configuration loaded: secret_name={}, aws_region={}, refresh_interval={:?}, excluded_namespaces={:?}, skip_kube_system={}, retry={:?}",
        config.secret_name,
        config.aws_region,
        config.refresh_interval,
        config.excluded_namespaces,
        config.skip_kube_system,
        config.retry
    );

    // Create Kubernetes client
    let client = Client::try_default().await?;
    info!("Connected to Kubernetes cluster");

    let ecr = create_ecr_client(&config.aws_region, config.aws_assume_role.as_deref()).await;
    let mut providers = ProviderRegistry::new();
    providers.register(TokenProvider::new(
        "ecr",
        config.secret_name.clone(),
        SecretEncoding::Json,
        Arc::new(EcrTokenSource::new(
            Arc::new(ecr),
            config.aws_account_ids.clone(),
        )),
    ))?;

    let store = Arc::new(KubeStore::new(client.clone()));
    let orchestrator = RefreshOrchestrator::from_config(store, providers, &config);
    let reconciler = NamespaceReconciler::new(client, orchestrator, config.refresh_interval);

    info!("Starting namespace reconciler...");
    reconciler.run().await?;

    // This should never be reached as the reconciler runs forever
    warn!("Namespace reconciler stopped unexpectedly");
    Ok(())
}
