// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

/// Name of the service account that receives the pull secret
pub const DEFAULT_SERVICE_ACCOUNT: &str = "default";

/// Namespace skipped when `--skip-kube-system` is set
pub const KUBE_SYSTEM_NAMESPACE: &str = "kube-system";

/// Docker registry secret layouts
pub mod docker {
    pub const CONFIG_JSON_KEY: &str = ".dockerconfigjson";
    pub const CONFIG_JSON_TYPE: &str = "kubernetes.io/dockerconfigjson";
    pub const LEGACY_CONFIG_KEY: &str = ".dockercfg";
    pub const LEGACY_CONFIG_TYPE: &str = "kubernetes.io/dockercfg";
    /// Username ECR expects alongside a bearer token
    pub const LEGACY_USERNAME: &str = "oauth2accesstoken";
    pub const EMAIL: &str = "none";
}

/// Token retry defaults, also used when configured values are invalid
pub mod retry {
    pub const DEFAULT_RETRIES: u32 = 3;
    pub const DEFAULT_DELAY_SECS: u64 = 5;

    /// Exponential strategy parameters
    pub const EXPONENTIAL_INITIAL_INTERVAL_MILLIS: u64 = 500;
    pub const EXPONENTIAL_MULTIPLIER: f64 = 1.5;
    pub const EXPONENTIAL_RANDOMIZATION_FACTOR: f64 = 0.1;
    pub const EXPONENTIAL_MAX_INTERVAL_SECS: u64 = 60;
    pub const EXPONENTIAL_MAX_ELAPSED_SECS: u64 = 15 * 60;
}

/// Environment variables that override command-line flags
pub mod env {
    pub const TOKEN_RETRY_TYPE: &str = "TOKEN_RETRY_TYPE";
    pub const TOKEN_RETRIES: &str = "TOKEN_RETRIES";
    pub const TOKEN_RETRY_DELAY: &str = "TOKEN_RETRY_DELAY";
    pub const AWS_ACCOUNT: &str = "awsaccount";
    pub const AWS_REGION: &str = "awsregion";
    pub const AWS_ASSUME_ROLE: &str = "aws_assume_role";
}

/// Requeue delay after a failed namespace refresh
pub const ERROR_REQUEUE_SECS: u64 = 60;

/// Session name used when assuming an AWS role
pub const ASSUME_ROLE_SESSION_NAME: &str = "registry-creds";
