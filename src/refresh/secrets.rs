// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Pull secret materialization from registry tokens

use crate::constants::docker;
use crate::error::Result;
use crate::providers::{AuthToken, SecretEncoding};
use k8s_openapi::api::core::v1::Secret;
use k8s_openapi::ByteString;
use kube::api::ObjectMeta;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::warn;

/// `.dockerconfigjson` document
#[derive(Serialize, Deserialize, Debug, Default)]
pub struct DockerConfigJson {
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub auths: BTreeMap<String, RegistryAuth>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct RegistryAuth {
    pub auth: String,
    pub email: String,
}

/// A generated pull secret, ready to be written to any namespace
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecretPayload {
    pub name: String,
    pub encoding: SecretEncoding,
    pub data: BTreeMap<String, Vec<u8>>,
    pub type_tag: Option<String>,
}

impl SecretPayload {
    /// Build the payload for `tokens` in the given encoding
    pub fn materialize(
        name: &str,
        encoding: SecretEncoding,
        tokens: &[AuthToken],
    ) -> Result<Self> {
        let mut payload = SecretPayload {
            name: name.to_string(),
            encoding,
            data: BTreeMap::new(),
            type_tag: None,
        };

        match encoding {
            SecretEncoding::Json => {
                let config = DockerConfigJson {
                    auths: tokens
                        .iter()
                        .map(|t| {
                            (
                                t.endpoint.clone(),
                                RegistryAuth {
                                    auth: t.access_token.clone(),
                                    email: docker::EMAIL.to_string(),
                                },
                            )
                        })
                        .collect(),
                };
                payload.data.insert(
                    docker::CONFIG_JSON_KEY.to_string(),
                    serde_json::to_vec(&config)?,
                );
                payload.type_tag = Some(docker::CONFIG_JSON_TYPE.to_string());
            }
            SecretEncoding::Legacy => match tokens {
                [token] => {
                    payload.data.insert(
                        docker::LEGACY_CONFIG_KEY.to_string(),
                        legacy_config(token).into_bytes(),
                    );
                    payload.type_tag = Some(docker::LEGACY_CONFIG_TYPE.to_string());
                }
                _ => warn!(
                    "Legacy secret {} needs exactly one token but got {}; leaving it empty",
                    name,
                    tokens.len()
                ),
            },
        }

        Ok(payload)
    }

    /// The Kubernetes Secret carrying this payload
    pub fn to_secret(&self) -> Secret {
        let data = (!self.data.is_empty()).then(|| {
            self.data
                .iter()
                .map(|(k, v)| (k.clone(), ByteString(v.clone())))
                .collect()
        });

        Secret {
            metadata: ObjectMeta {
                name: Some(self.name.clone()),
                ..Default::default()
            },
            data,
            type_: self.type_tag.clone(),
            ..Default::default()
        }
    }
}

fn legacy_config(token: &AuthToken) -> String {
    format!(
        r#"{{"{}":{{"username":"{}","password":"{}","email":"{}"}}}}"#,
        token.endpoint,
        docker::LEGACY_USERNAME,
        token.access_token,
        docker::EMAIL
    )
}
