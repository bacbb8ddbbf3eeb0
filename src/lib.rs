// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
pub mod config;
pub mod constants;
pub mod error;
pub mod kubernetes;
pub mod providers;
pub mod reconcilers;
pub mod refresh;
pub mod retry;

#[cfg(test)]
mod test_utils;
