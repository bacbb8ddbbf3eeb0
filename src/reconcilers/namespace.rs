// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Namespace reconciler - refreshes pull secrets in every namespace on a timer.

use crate::constants::ERROR_REQUEUE_SECS;
use crate::error::{RegistryCredsError, Result};
use crate::refresh::{RefreshOrchestrator, RefreshOutcome};
use futures::StreamExt;
use k8s_openapi::api::core::v1::Namespace;
use kube::{
    runtime::{controller::Action, Controller},
    Api, Client, ResourceExt,
};
use kube_runtime::watcher::Config as WatcherConfig;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, instrument, warn};

pub struct NamespaceReconciler {
    client: Client,
    orchestrator: RefreshOrchestrator,
    refresh_interval: Duration,
}

impl NamespaceReconciler {
    pub fn new(
        client: Client,
        orchestrator: RefreshOrchestrator,
        refresh_interval: Duration,
    ) -> Self {
        Self {
            client,
            orchestrator,
            refresh_interval,
        }
    }

    pub async fn run(self) -> anyhow::Result<()> {
        let namespaces: Api<Namespace> = Api::all(self.client.clone());
        let context = Arc::new(self);

        Controller::new(namespaces, WatcherConfig::default())
            .run(reconcile, error_policy, context)
            .for_each(|res| async move {
                match res {
                    Ok(o) => debug!("Reconciled namespace: {:?}", o),
                    Err(e) => warn!("Reconciliation error: {:?}", e),
                }
            })
            .await;

        Ok(())
    }
}

#[instrument(skip(namespace, ctx), fields(namespace = %namespace.name_any()))]
async fn reconcile(namespace: Arc<Namespace>, ctx: Arc<NamespaceReconciler>) -> Result<Action> {
    let name = namespace.name_any();

    if namespace.metadata.deletion_timestamp.is_some() {
        debug!("Namespace {} is being deleted, skipping", name);
        return Ok(Action::await_change());
    }

    debug!("Reconciling namespace: {}", name);

    match ctx.orchestrator.refresh_namespace(&name).await? {
        RefreshOutcome::Excluded | RefreshOutcome::SystemNamespaceSkipped => {
            Ok(Action::await_change())
        }
        // a zero interval disables periodic refresh
        RefreshOutcome::Refreshed { .. } if ctx.refresh_interval.is_zero() => {
            Ok(Action::await_change())
        }
        RefreshOutcome::Refreshed { .. } => Ok(Action::requeue(ctx.refresh_interval)),
    }
}

fn error_policy(
    namespace: Arc<Namespace>,
    error: &RegistryCredsError,
    _ctx: Arc<NamespaceReconciler>,
) -> Action {
    error!(
        "Reconciliation error for namespace {}: {}",
        namespace.name_any(),
        error
    );
    Action::requeue(Duration::from_secs(ERROR_REQUEUE_SECS))
}
