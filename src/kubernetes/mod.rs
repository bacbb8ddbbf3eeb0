// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Kubernetes access for secrets and service accounts.

pub mod store;

pub use store::{KubeStore, NamespaceStore};
