// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Converges one namespace to a freshly generated pull secret

use crate::constants::DEFAULT_SERVICE_ACCOUNT;
use crate::error::{RegistryCredsError, Result};
use crate::kubernetes::NamespaceStore;
use crate::refresh::secrets::SecretPayload;
use k8s_openapi::api::core::v1::LocalObjectReference;
use tracing::{debug, error, info, instrument};

/// Write `payload` into `namespace` and reference it from the default service account.
///
/// The secret is created or fully replaced. The service account keeps every
/// other pull secret reference; the managed one is replaced in place or
/// appended, so repeated calls never grow the list.
#[instrument(skip(store, payload), fields(secret = %payload.name))]
pub async fn reconcile_namespace<S>(
    store: &S,
    namespace: &str,
    payload: &SecretPayload,
) -> Result<()>
where
    S: NamespaceStore + ?Sized,
{
    let secret_name = payload.name.as_str();
    let secret = payload.to_secret();
    let fail = |e: RegistryCredsError| RegistryCredsError::reconciliation(namespace, secret_name, e);

    debug!("Checking for secret {} in namespace {}", secret_name, namespace);
    match store.get_secret(namespace, secret_name).await.map_err(fail)? {
        None => {
            debug!(
                "Secret {} not found in namespace {}; creating it",
                secret_name, namespace
            );
            store
                .create_secret(namespace, &secret)
                .await
                .map_err(fail)?;
            info!("Created secret {} in namespace {}", secret_name, namespace);
        }
        Some(_) => {
            debug!(
                "Found secret {} in namespace {}; updating it",
                secret_name, namespace
            );
            store
                .update_secret(namespace, &secret)
                .await
                .map_err(fail)?;
            info!("Updated secret {} in namespace {}", secret_name, namespace);
        }
    }

    let mut service_account = store
        .get_service_account(namespace, DEFAULT_SERVICE_ACCOUNT)
        .await
        .map_err(fail)?
        .ok_or_else(|| {
            error!(
                "ServiceAccount {} not found in namespace {}",
                DEFAULT_SERVICE_ACCOUNT, namespace
            );
            fail(RegistryCredsError::ServiceAccountNotFound {
                namespace: namespace.to_string(),
                name: DEFAULT_SERVICE_ACCOUNT.to_string(),
            })
        })?;

    let reference = LocalObjectReference {
        name: secret_name.to_string(),
    };
    let pull_secrets = service_account
        .image_pull_secrets
        .get_or_insert_with(Vec::new);
    match pull_secrets.iter_mut().find(|r| r.name == secret_name) {
        Some(existing) => *existing = reference,
        None => pull_secrets.push(reference),
    }

    info!(
        "Updating ServiceAccount {} in namespace {}",
        DEFAULT_SERVICE_ACCOUNT, namespace
    );
    store
        .update_service_account(namespace, &service_account)
        .await
        .map_err(|e| {
            error!(
                "Error updating ServiceAccount {} in namespace {}: {}",
                DEFAULT_SERVICE_ACCOUNT, namespace, e
            );
            fail(e)
        })?;

    Ok(())
}
