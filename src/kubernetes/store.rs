// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Secret and service account access for a namespace

use crate::error::Result;
use async_trait::async_trait;
use k8s_openapi::api::core::v1::{Secret, ServiceAccount};
use kube::{api::PostParams, Api, Client, ResourceExt};
use tracing::{debug, instrument};

/// Cluster operations the refresh engine needs.
///
/// Getters return `Ok(None)` when the object does not exist so callers can
/// tell "not found" apart from other API failures.
#[async_trait]
pub trait NamespaceStore: Send + Sync {
    async fn get_secret(&self, namespace: &str, name: &str) -> Result<Option<Secret>>;

    async fn create_secret(&self, namespace: &str, secret: &Secret) -> Result<()>;

    async fn update_secret(&self, namespace: &str, secret: &Secret) -> Result<()>;

    async fn get_service_account(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<Option<ServiceAccount>>;

    async fn update_service_account(
        &self,
        namespace: &str,
        service_account: &ServiceAccount,
    ) -> Result<()>;
}

/// [`NamespaceStore`] backed by the Kubernetes API
#[derive(Clone)]
pub struct KubeStore {
    client: Client,
}

impl KubeStore {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    fn secrets(&self, namespace: &str) -> Api<Secret> {
        Api::namespaced(self.client.clone(), namespace)
    }

    fn service_accounts(&self, namespace: &str) -> Api<ServiceAccount> {
        Api::namespaced(self.client.clone(), namespace)
    }
}

#[async_trait]
impl NamespaceStore for KubeStore {
    #[instrument(skip(self))]
    async fn get_secret(&self, namespace: &str, name: &str) -> Result<Option<Secret>> {
        match self.secrets(namespace).get(name).await {
            Ok(secret) => Ok(Some(secret)),
            Err(kube::Error::Api(err)) if err.code == 404 => {
                debug!("Secret {}/{} does not exist", namespace, name);
                Ok(None)
            }
            Err(e) => Err(e.into()),
        }
    }

    #[instrument(skip(self, secret), fields(secret = %secret.name_any()))]
    async fn create_secret(&self, namespace: &str, secret: &Secret) -> Result<()> {
        self.secrets(namespace)
            .create(&PostParams::default(), secret)
            .await?;
        Ok(())
    }

    #[instrument(skip(self, secret), fields(secret = %secret.name_any()))]
    async fn update_secret(&self, namespace: &str, secret: &Secret) -> Result<()> {
        self.secrets(namespace)
            .replace(&secret.name_any(), &PostParams::default(), secret)
            .await?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn get_service_account(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<Option<ServiceAccount>> {
        match self.service_accounts(namespace).get(name).await {
            Ok(sa) => Ok(Some(sa)),
            Err(kube::Error::Api(err)) if err.code == 404 => {
                debug!("ServiceAccount {}/{} does not exist", namespace, name);
                Ok(None)
            }
            Err(e) => Err(e.into()),
        }
    }

    #[instrument(skip(self, service_account), fields(service_account = %service_account.name_any()))]
    async fn update_service_account(
        &self,
        namespace: &str,
        service_account: &ServiceAccount,
    ) -> Result<()> {
        self.service_accounts(namespace)
            .replace(
                &service_account.name_any(),
                &PostParams::default(),
                service_account,
            )
            .await?;
        Ok(())
    }
}
