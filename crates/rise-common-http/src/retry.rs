// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Bounded retry with exponential backoff.
//!
//! Only idempotent calls go through [`retry`]. The token exchange is retried;
//! writes to the directory service are not, because a replayed POST would
//! create a second extension.

use reqwest::StatusCode;
use std::future::Future;
use std::time::Duration;
use tracing::warn;

const TRANSIENT_STATUSES: [StatusCode; 6] = [
	StatusCode::TOO_MANY_REQUESTS,
	StatusCode::REQUEST_TIMEOUT,
	StatusCode::INTERNAL_SERVER_ERROR,
	StatusCode::BAD_GATEWAY,
	StatusCode::SERVICE_UNAVAILABLE,
	StatusCode::GATEWAY_TIMEOUT,
];

#[derive(Debug, Clone)]
pub struct RetryConfig {
	/// Total attempts including the first one.
	pub max_attempts: u32,
	pub base_delay: Duration,
	pub max_delay: Duration,
	pub backoff_factor: f64,
	pub jitter: bool,
	pub retryable_statuses: Vec<StatusCode>,
}

impl Default for RetryConfig {
	fn default() -> Self {
		Self {
			max_attempts: 3,
			base_delay: Duration::from_millis(200),
			max_delay: Duration::from_secs(5),
			backoff_factor: 2.0,
			jitter: true,
			retryable_statuses: TRANSIENT_STATUSES.to_vec(),
		}
	}
}

impl RetryConfig {
	/// A single attempt, no retries.
	pub fn none() -> Self {
		Self {
			max_attempts: 1,
			..Self::default()
		}
	}

	pub fn is_retryable_status(&self, status: StatusCode) -> bool {
		self.retryable_statuses.contains(&status)
	}

	fn delay_for(&self, attempt: u32) -> Duration {
		let exponential = self.base_delay.as_secs_f64() * self.backoff_factor.powi(attempt as i32);
		let capped = exponential.min(self.max_delay.as_secs_f64());

		let delay = if self.jitter {
			capped * (0.5 + fastrand::f64())
		} else {
			capped
		};

		Duration::from_secs_f64(delay)
	}
}

/// Classifies failures as transient (worth another attempt) or final.
pub trait RetryableError {
	fn is_retryable(&self) -> bool;
}

impl RetryableError for reqwest::Error {
	fn is_retryable(&self) -> bool {
		if self.is_timeout() || self.is_connect() {
			return true;
		}

		self
			.status()
			.is_some_and(|status| TRANSIENT_STATUSES.contains(&status))
	}
}

/// Runs `operation` until it succeeds, fails with a non-retryable error, or
/// `cfg.max_attempts` is reached.
pub async fn retry<F, Fut, T, E>(cfg: &RetryConfig, mut operation: F) -> Result<T, E>
where
	F: FnMut() -> Fut,
	Fut: Future<Output = Result<T, E>>,
	E: RetryableError + std::fmt::Debug,
{
	let mut attempt = 0;

	loop {
		let err = match operation().await {
			Ok(value) => return Ok(value),
			Err(err) => err,
		};
		attempt += 1;

		if !err.is_retryable() {
			warn!(error = ?err, attempt, "non-retryable error encountered");
			return Err(err);
		}

		if attempt >= cfg.max_attempts {
			warn!(
				error = ?err,
				attempt,
				max_attempts = cfg.max_attempts,
				"max retry attempts exhausted"
			);
			return Err(err);
		}

		let delay = cfg.delay_for(attempt - 1);
		warn!(
			error = ?err,
			attempt,
			max_attempts = cfg.max_attempts,
			delay_ms = delay.as_millis() as u64,
			"retrying after error"
		);
		tokio::time::sleep(delay).await;
	}
}
