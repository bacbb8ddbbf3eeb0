// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use crate::constants::{env as env_keys, retry as retry_defaults};
use crate::error::RegistryCredsError;
use clap::{ArgAction, Parser};
use std::env;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use tracing::error;

/// Command-line flags
#[derive(Parser, Debug, Clone)]
#[command(
    name = "registry-creds",
    about = "Keeps registry pull secrets fresh in every namespace"
)]
pub struct Args {
    /// Comma separated list of namespaces that do NOT need updated secrets
    #[arg(long, default_value = "")]
    pub excluded_namespaces: String,

    /// Name of the pull secret created in each namespace
    #[arg(long, default_value = "awsecr-cred")]
    pub aws_secret_name: String,

    /// AWS region of the registry
    #[arg(long, default_value = "us-east-1")]
    pub aws_region: String,

    /// Minutes to wait before refreshing a namespace again
    #[arg(long, default_value_t = 60)]
    pub refresh_mins: u64,

    /// If true, will not attempt to set image pull secrets on the kube-system namespace
    #[arg(
        long,
        default_value_t = true,
        num_args = 0..=1,
        default_missing_value = "true",
        action = ArgAction::Set
    )]
    pub skip_kube_system: bool,

    /// If specified, assume this role to retrieve tokens
    #[arg(long = "aws_assume_role", default_value = "")]
    pub aws_assume_role: String,

    /// Retry timer used when generating a token; either simple or exponential
    #[arg(long, default_value = "simple")]
    pub token_retry_type: String,

    /// Number of times to retry generating a token
    #[arg(long, default_value_t = 3, allow_negative_numbers = true)]
    pub token_retries: i64,

    /// Seconds to wait before retrying token generation
    #[arg(long, default_value_t = 5, allow_negative_numbers = true)]
    pub token_retry_delay: i64,
}

/// Backoff strategy between token generation attempts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RetryStrategy {
    #[default]
    Simple,
    Exponential,
}

impl FromStr for RetryStrategy {
    type Err = RegistryCredsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "simple" => Ok(RetryStrategy::Simple),
            "exponential" => Ok(RetryStrategy::Exponential),
            other => Err(RegistryCredsError::ConfigError(format!(
                "Unknown retry timer type '{}'",
                other
            ))),
        }
    }
}

impl fmt::Display for RetryStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RetryStrategy::Simple => write!(f, "simple"),
            RetryStrategy::Exponential => write!(f, "exponential"),
        }
    }
}

/// Validated retry settings for token generation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryConfig {
    pub strategy: RetryStrategy,
    pub max_retries: u32,
    pub delay_seconds: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            strategy: RetryStrategy::Simple,
            max_retries: retry_defaults::DEFAULT_RETRIES,
            delay_seconds: retry_defaults::DEFAULT_DELAY_SECS,
        }
    }
}

impl RetryConfig {
    /// Build a retry config, substituting defaults for invalid values
    pub fn validated(strategy: &str, max_retries: i64, delay_seconds: i64) -> Self {
        Self {
            strategy: parse_strategy(strategy),
            max_retries: non_negative(
                max_retries,
                retry_defaults::DEFAULT_RETRIES,
                "the number of retries",
            ),
            delay_seconds: non_negative(
                delay_seconds,
                retry_defaults::DEFAULT_DELAY_SECS,
                "the retry delay in seconds",
            ),
        }
    }

    /// Total number of attempts per provider and cycle
    pub fn max_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }

    pub fn delay(&self) -> Duration {
        Duration::from_secs(self.delay_seconds)
    }

    fn apply_env_overrides<F>(&mut self, lookup: &F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(strategy) = non_empty(lookup, env_keys::TOKEN_RETRY_TYPE) {
            self.strategy = parse_strategy(&strategy);
        }
        if let Some(retries) = parse_env_int(lookup, env_keys::TOKEN_RETRIES) {
            self.max_retries = non_negative(
                retries,
                retry_defaults::DEFAULT_RETRIES,
                env_keys::TOKEN_RETRIES,
            );
        }
        if let Some(delay) = parse_env_int(lookup, env_keys::TOKEN_RETRY_DELAY) {
            self.delay_seconds = non_negative(
                delay,
                retry_defaults::DEFAULT_DELAY_SECS,
                env_keys::TOKEN_RETRY_DELAY,
            );
        }
    }
}

/// Operator configuration resolved from flags and environment variables
#[derive(Debug, Clone)]
pub struct Config {
    pub excluded_namespaces: Vec<String>,
    /// Name of the pull secret written to every namespace
    pub secret_name: String,
    pub aws_region: String,
    /// Registry (account) ids to request tokens for; empty means the caller's own registry
    pub aws_account_ids: Vec<String>,
    pub aws_assume_role: Option<String>,
    pub refresh_interval: Duration,
    pub skip_kube_system: bool,
    pub retry: RetryConfig,
}

impl Config {
    /// Resolve configuration from flags, letting environment variables override them
    pub fn from_args(args: Args) -> Self {
        Self::resolve(args, |key| env::var(key).ok())
    }

    pub fn resolve<F>(args: Args, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut retry = RetryConfig::validated(
            &args.token_retry_type,
            args.token_retries,
            args.token_retry_delay,
        );
        retry.apply_env_overrides(&lookup);

        let aws_region =
            non_empty(&lookup, env_keys::AWS_REGION).unwrap_or(args.aws_region);
        let aws_account_ids = non_empty(&lookup, env_keys::AWS_ACCOUNT)
            .map(|ids| split_list(&ids))
            .unwrap_or_default();
        let aws_assume_role = non_empty(&lookup, env_keys::AWS_ASSUME_ROLE)
            .or(Some(args.aws_assume_role))
            .filter(|role| !role.is_empty());

        Config {
            excluded_namespaces: split_list(&args.excluded_namespaces),
            secret_name: args.aws_secret_name,
            aws_region,
            aws_account_ids,
            aws_assume_role,
            refresh_interval: Duration::from_secs(args.refresh_mins.saturating_mul(60)),
            skip_kube_system: args.skip_kube_system,
            retry,
        }
    }
}

fn parse_strategy(value: &str) -> RetryStrategy {
    value.parse().unwrap_or_else(|e| {
        error!("{}! Defaulting to {}", e, RetryStrategy::default());
        RetryStrategy::default()
    })
}

fn non_negative<T>(value: i64, default: T, what: &str) -> T
where
    T: TryFrom<i64> + fmt::Display + Copy,
{
    if value < 0 {
        error!(
            "Cannot use a negative value for {}! Defaulting to {}",
            what, default
        );
        return default;
    }
    T::try_from(value).unwrap_or_else(|_| {
        error!("Value {} for {} is out of range! Defaulting to {}", value, what, default);
        default
    })
}

fn non_empty<F>(lookup: &F, key: &str) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key).filter(|v| !v.is_empty())
}

fn parse_env_int<F>(lookup: &F, key: &str) -> Option<i64>
where
    F: Fn(&str) -> Option<String>,
{
    let raw = non_empty(lookup, key)?;
    match raw.trim().parse::<i64>() {
        Ok(v) => Some(v),
        Err(e) => {
            error!(
                "Unable to parse value of environment variable {}! [Err: {}]",
                key, e
            );
            None
        }
    }
}

fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}
