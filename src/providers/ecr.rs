// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! AWS ECR authorization tokens.

use crate::constants::ASSUME_ROLE_SESSION_NAME;
use crate::error::{RegistryCredsError, Result};
use crate::providers::{AuthToken, TokenSource};
use async_trait::async_trait;
use aws_config::sts::AssumeRoleProvider;
use aws_config::{BehaviorVersion, Region};
use aws_sdk_ecr::error::DisplayErrorContext;
use aws_sdk_ecr::operation::get_authorization_token::GetAuthorizationTokenOutput;
use std::sync::Arc;
use tracing::{debug, info, instrument};

/// The slice of the ECR API the token source needs
#[async_trait]
pub trait AuthorizationTokenApi: Send + Sync {
    async fn authorization_token(
        &self,
        registry_ids: &[String],
    ) -> Result<GetAuthorizationTokenOutput>;
}

#[async_trait]
impl AuthorizationTokenApi for aws_sdk_ecr::Client {
    async fn authorization_token(
        &self,
        registry_ids: &[String],
    ) -> Result<GetAuthorizationTokenOutput> {
        let mut request = self.get_authorization_token();
        if !registry_ids.is_empty() {
            request = request.set_registry_ids(Some(registry_ids.to_vec()));
        }

        request.send().await.map_err(|e| {
            RegistryCredsError::TokenGenerationError(format!(
                "GetAuthorizationToken failed: {}",
                DisplayErrorContext(&e)
            ))
        })
    }
}

/// Create an ECR client for `region`, optionally assuming `assume_role` first
pub async fn create_ecr_client(region: &str, assume_role: Option<&str>) -> aws_sdk_ecr::Client {
    let base = aws_config::defaults(BehaviorVersion::latest())
        .region(Region::new(region.to_string()))
        .load()
        .await;

    match assume_role {
        Some(role_arn) => {
            info!("Assuming role {} to retrieve ECR tokens", role_arn);
            let credentials = AssumeRoleProvider::builder(role_arn)
                .session_name(ASSUME_ROLE_SESSION_NAME)
                .configure(&base)
                .build()
                .await;
            let config = aws_sdk_ecr::config::Builder::from(&base)
                .credentials_provider(credentials)
                .build();
            aws_sdk_ecr::Client::from_conf(config)
        }
        None => aws_sdk_ecr::Client::new(&base),
    }
}

/// Fetches one token per configured registry id
pub struct EcrTokenSource {
    api: Arc<dyn AuthorizationTokenApi>,
    registry_ids: Vec<String>,
}

impl EcrTokenSource {
    /// An empty `registry_ids` asks for the default registry of the caller's account
    pub fn new(api: Arc<dyn AuthorizationTokenApi>, registry_ids: Vec<String>) -> Self {
        Self { api, registry_ids }
    }
}

#[async_trait]
impl TokenSource for EcrTokenSource {
    #[instrument(skip(self), fields(registries = self.registry_ids.len()))]
    async fn generate(&self) -> Result<Vec<AuthToken>> {
        let output = self.api.authorization_token(&self.registry_ids).await?;

        let tokens = output
            .authorization_data()
            .iter()
            .map(|data| {
                let (Some(token), Some(endpoint)) =
                    (data.authorization_token(), data.proxy_endpoint())
                else {
                    return Err(RegistryCredsError::TokenGenerationError(
                        "ECR returned authorization data without token or endpoint".to_string(),
                    ));
                };
                Ok(AuthToken {
                    access_token: token.to_string(),
                    endpoint: endpoint.to_string(),
                })
            })
            .collect::<Result<Vec<_>>>()?;

        debug!("Got {} ECR authorization token(s)", tokens.len());
        Ok(tokens)
    }
}
