// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Test utilities: Kubernetes API mocks, an in-memory store and fake token sources.

use crate::constants::DEFAULT_SERVICE_ACCOUNT;
use crate::error::{RegistryCredsError, Result};
use crate::kubernetes::NamespaceStore;
use crate::providers::{AuthToken, TokenSource};
use async_trait::async_trait;
use http::{Request, Response};
use k8s_openapi::api::core::v1::{Secret, ServiceAccount};
use kube::api::ObjectMeta;
use kube::client::Body;
use kube::{Client, ResourceExt};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll};
use tower::Service;

/// A mock HTTP service that returns predefined responses based on request paths.
#[derive(Clone)]
pub struct MockService {
    responses: Arc<Mutex<HashMap<(String, String), (u16, String)>>>,
}

impl MockService {
    pub fn new() -> Self {
        Self {
            responses: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    pub fn on_get(self, path: &str, status: u16, body: &str) -> Self {
        self.on("GET", path, status, body)
    }

    pub fn on_post(self, path: &str, status: u16, body: &str) -> Self {
        self.on("POST", path, status, body)
    }

    pub fn on_put(self, path: &str, status: u16, body: &str) -> Self {
        self.on("PUT", path, status, body)
    }

    fn on(self, method: &str, path: &str, status: u16, body: &str) -> Self {
        self.responses.lock().unwrap().insert(
            (method.to_string(), path.to_string()),
            (status, body.to_string()),
        );
        self
    }

    /// Build a kube Client from this mock service
    pub fn into_client(self) -> Client {
        Client::new(self, "default")
    }

    fn find_response(&self, method: &str, path: &str) -> Option<(u16, String)> {
        self.responses
            .lock()
            .unwrap()
            .get(&(method.to_string(), path.to_string()))
            .cloned()
    }
}

impl Default for MockService {
    fn default() -> Self {
        Self::new()
    }
}

impl Service<Request<Body>> for MockService {
    type Response = Response<Body>;
    type Error = tower::BoxError;
    type Future = std::pin::Pin<
        Box<dyn std::future::Future<Output = std::result::Result<Self::Response, Self::Error>> + Send>,
    >;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<std::result::Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: Request<Body>) -> Self::Future {
        let method = req.method().to_string();
        let path = req.uri().path().to_string();

        let (status, body) = self
            .find_response(&method, &path)
            .unwrap_or_else(|| (404, not_found_json("resource", &path)));

        Box::pin(async move {
            Ok(Response::builder()
                .status(status)
                .header("content-type", "application/json")
                .body(Body::from(body.into_bytes()))
                .unwrap())
        })
    }
}

pub fn secret_json(namespace: &str, name: &str) -> String {
    serde_json::json!({
        "apiVersion": "v1",
        "kind": "Secret",
        "metadata": {
            "name": name,
            "namespace": namespace,
            "uid": "test-uid"
        },
        "type": "kubernetes.io/dockerconfigjson",
        "data": {}
    })
    .to_string()
}

pub fn service_account_json(namespace: &str, name: &str) -> String {
    serde_json::json!({
        "apiVersion": "v1",
        "kind": "ServiceAccount",
        "metadata": {
            "name": name,
            "namespace": namespace,
            "uid": "test-uid",
            "resourceVersion": "1"
        },
        "imagePullSecrets": [{"name": "someOtherSecret"}]
    })
    .to_string()
}

/// Create a 404 not found response
pub fn not_found_json(resource: &str, name: &str) -> String {
    serde_json::json!({
        "kind": "Status",
        "apiVersion": "v1",
        "status": "Failure",
        "message": format!("{} \"{}\" not found", resource, name),
        "reason": "NotFound",
        "code": 404
    })
    .to_string()
}

type Key = (String, String);

fn key(namespace: &str, name: &str) -> Key {
    (namespace.to_string(), name.to_string())
}

/// In-memory [`NamespaceStore`] with the same create/update rules as the API server
#[derive(Default)]
pub struct FakeStore {
    secrets: Mutex<HashMap<Key, Secret>>,
    service_accounts: Mutex<HashMap<Key, ServiceAccount>>,
    fail_service_account_updates: AtomicBool,
    secret_writes: AtomicUsize,
}

impl FakeStore {
    /// A store where every namespace has an empty `default` service account
    pub fn with_namespaces(namespaces: &[&str]) -> Self {
        let store = Self::default();
        for namespace in namespaces {
            store.put_service_account(
                namespace,
                ServiceAccount {
                    metadata: ObjectMeta {
                        name: Some(DEFAULT_SERVICE_ACCOUNT.to_string()),
                        namespace: Some(namespace.to_string()),
                        ..Default::default()
                    },
                    ..Default::default()
                },
            );
        }
        store
    }

    pub fn fail_service_account_updates(self) -> Self {
        self.fail_service_account_updates
            .store(true, Ordering::SeqCst);
        self
    }

    pub fn secret(&self, namespace: &str, name: &str) -> Option<Secret> {
        self.secrets.lock().unwrap().get(&key(namespace, name)).cloned()
    }

    pub fn put_secret(&self, namespace: &str, secret: Secret) {
        self.secrets
            .lock()
            .unwrap()
            .insert(key(namespace, &secret.name_any()), secret);
    }

    pub fn service_account(&self, namespace: &str, name: &str) -> Option<ServiceAccount> {
        self.service_accounts
            .lock()
            .unwrap()
            .get(&key(namespace, name))
            .cloned()
    }

    pub fn put_service_account(&self, namespace: &str, service_account: ServiceAccount) {
        self.service_accounts
            .lock()
            .unwrap()
            .insert(key(namespace, &service_account.name_any()), service_account);
    }

    /// Names in the default service account's pull secret list
    pub fn pull_secret_names(&self, namespace: &str) -> Vec<String> {
        self.service_account(namespace, DEFAULT_SERVICE_ACCOUNT)
            .and_then(|sa| sa.image_pull_secrets)
            .unwrap_or_default()
            .into_iter()
            .map(|r| r.name)
            .collect()
    }

    /// Number of secret creates and updates so far
    pub fn secret_writes(&self) -> usize {
        self.secret_writes.load(Ordering::SeqCst)
    }
}

fn store_error(message: String) -> RegistryCredsError {
    RegistryCredsError::KubeError(kube::Error::Service(message.into()))
}

#[async_trait]
impl NamespaceStore for FakeStore {
    async fn get_secret(&self, namespace: &str, name: &str) -> Result<Option<Secret>> {
        Ok(self.secret(namespace, name))
    }

    async fn create_secret(&self, namespace: &str, secret: &Secret) -> Result<()> {
        let mut secrets = self.secrets.lock().unwrap();
        let k = key(namespace, &secret.name_any());
        if secrets.contains_key(&k) {
            return Err(store_error(format!("secret {} already exists", k.1)));
        }
        secrets.insert(k, secret.clone());
        self.secret_writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn update_secret(&self, namespace: &str, secret: &Secret) -> Result<()> {
        let mut secrets = self.secrets.lock().unwrap();
        let k = key(namespace, &secret.name_any());
        if !secrets.contains_key(&k) {
            return Err(store_error(format!("secret {} not found", k.1)));
        }
        secrets.insert(k, secret.clone());
        self.secret_writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn get_service_account(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<Option<ServiceAccount>> {
        Ok(self.service_account(namespace, name))
    }

    async fn update_service_account(
        &self,
        namespace: &str,
        service_account: &ServiceAccount,
    ) -> Result<()> {
        if self.fail_service_account_updates.load(Ordering::SeqCst) {
            return Err(store_error("service account update rejected".to_string()));
        }
        let mut accounts = self.service_accounts.lock().unwrap();
        let k = key(namespace, &service_account.name_any());
        if !accounts.contains_key(&k) {
            return Err(store_error(format!("service account {} not found", k.1)));
        }
        accounts.insert(k, service_account.clone());
        Ok(())
    }
}

pub fn token(access_token: &str, endpoint: &str) -> AuthToken {
    AuthToken {
        access_token: access_token.to_string(),
        endpoint: endpoint.to_string(),
    }
}

/// Always returns the same tokens
pub struct StaticTokenSource {
    tokens: Vec<AuthToken>,
}

impl StaticTokenSource {
    pub fn new(tokens: Vec<AuthToken>) -> Self {
        Self { tokens }
    }

    pub fn single(access_token: &str, endpoint: &str) -> Self {
        Self::new(vec![token(access_token, endpoint)])
    }
}

#[async_trait]
impl TokenSource for StaticTokenSource {
    async fn generate(&self) -> Result<Vec<AuthToken>> {
        Ok(self.tokens.clone())
    }
}

/// Fails a fixed number of times before returning its tokens
pub struct FlakyTokenSource {
    failures_left: AtomicUsize,
    calls: AtomicUsize,
    tokens: Vec<AuthToken>,
}

impl FlakyTokenSource {
    pub fn new(failures: usize, tokens: Vec<AuthToken>) -> Self {
        Self {
            failures_left: AtomicUsize::new(failures),
            calls: AtomicUsize::new(0),
            tokens,
        }
    }

    /// A source that never succeeds
    pub fn always_failing() -> Self {
        Self::new(usize::MAX, Vec::new())
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TokenSource for FlakyTokenSource {
    async fn generate(&self) -> Result<Vec<AuthToken>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let failing = self
            .failures_left
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if failing {
            return Err(RegistryCredsError::TokenGenerationError(
                "fake error".to_string(),
            ));
        }
        Ok(self.tokens.clone())
    }
}
