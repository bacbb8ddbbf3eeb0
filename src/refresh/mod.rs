// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Credential refresh: secret materialization, per-namespace reconciliation
//! and the orchestration of a refresh cycle.

pub mod namespace;
pub mod orchestrator;
pub mod secrets;

pub use namespace::reconcile_namespace;
pub use orchestrator::{RefreshOrchestrator, RefreshOutcome};
pub use secrets::{DockerConfigJson, RegistryAuth, SecretPayload};
