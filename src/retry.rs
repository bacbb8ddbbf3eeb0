// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Backoff policies for token generation retries.

use crate::config::{RetryConfig, RetryStrategy};
use crate::constants::retry::{
    EXPONENTIAL_INITIAL_INTERVAL_MILLIS, EXPONENTIAL_MAX_ELAPSED_SECS,
    EXPONENTIAL_MAX_INTERVAL_SECS, EXPONENTIAL_MULTIPLIER, EXPONENTIAL_RANDOMIZATION_FACTOR,
};
use backoff::backoff::{Backoff, Constant};
use backoff::{ExponentialBackoff, ExponentialBackoffBuilder};
use std::fmt;
use std::time::Duration;

/// Wait strategy between failed attempts of one provider.
///
/// A policy holds attempt state, so every refresh cycle builds its own
/// instances from the shared [`RetryConfig`].
pub enum RetryPolicy {
    /// Same delay every time, never stops on its own
    Simple(Constant),
    /// Growing delays until the maximum elapsed time is used up.
    /// `last` keeps the jittered sequence from shrinking once the cap is hit.
    Exponential {
        backoff: ExponentialBackoff,
        last: Duration,
    },
}

impl fmt::Debug for RetryPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RetryPolicy::Simple(_) => write!(f, "RetryPolicy::Simple"),
            RetryPolicy::Exponential { last, .. } => {
                write!(f, "RetryPolicy::Exponential(last: {:?})", last)
            }
        }
    }
}

impl RetryPolicy {
    pub fn from_config(config: &RetryConfig) -> Self {
        match config.strategy {
            RetryStrategy::Simple => Self::simple(config.delay()),
            RetryStrategy::Exponential => Self::exponential(Duration::from_secs(
                EXPONENTIAL_MAX_ELAPSED_SECS,
            )),
        }
    }

    pub fn simple(delay: Duration) -> Self {
        RetryPolicy::Simple(Constant::new(delay))
    }

    /// Exponential policy that stops once `max_elapsed` would be exceeded
    pub fn exponential(max_elapsed: Duration) -> Self {
        let backoff = ExponentialBackoffBuilder::new()
            .with_initial_interval(Duration::from_millis(EXPONENTIAL_INITIAL_INTERVAL_MILLIS))
            .with_multiplier(EXPONENTIAL_MULTIPLIER)
            .with_randomization_factor(EXPONENTIAL_RANDOMIZATION_FACTOR)
            .with_max_interval(Duration::from_secs(EXPONENTIAL_MAX_INTERVAL_SECS))
            .with_max_elapsed_time(Some(max_elapsed))
            .build();
        RetryPolicy::Exponential {
            backoff,
            last: Duration::ZERO,
        }
    }

    /// Clear attempt state before a new retry sequence
    pub fn reset(&mut self) {
        match self {
            RetryPolicy::Simple(b) => b.reset(),
            RetryPolicy::Exponential { backoff, last } => {
                backoff.reset();
                *last = Duration::ZERO;
            }
        }
    }

    /// Delay before the next attempt, or `None` when retrying should stop
    pub fn next_delay(&mut self) -> Option<Duration> {
        match self {
            RetryPolicy::Simple(b) => b.next_backoff(),
            RetryPolicy::Exponential { backoff, last } => {
                let delay = backoff
                    .next_backoff()?
                    .min(Duration::from_secs(EXPONENTIAL_MAX_INTERVAL_SECS))
                    .max(*last);
                *last = delay;
                Some(delay)
            }
        }
    }
}
