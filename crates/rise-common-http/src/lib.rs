// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Shared HTTP plumbing for the directory and token clients.
//!
//! - a client builder carrying the provisioning User-Agent
//! - bounded retry with exponential backoff for idempotent calls

mod client;
mod retry;

pub use client::{builder, new_client, user_agent};
pub use retry::{retry, RetryConfig, RetryableError};
