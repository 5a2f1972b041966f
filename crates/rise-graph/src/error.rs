// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use rise_common_http::RetryableError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GraphError {
	/// Transport failure talking to the token endpoint or the directory.
	#[error("network error: {0}")]
	Network(#[from] reqwest::Error),

	/// The identity platform refused the client credentials.
	#[error("token request rejected ({status}): {message}")]
	TokenRejected { status: u16, message: String },

	/// A successful token response without an `access_token`.
	#[error("token response did not contain an access token")]
	MissingAccessToken,

	/// Throttled by the directory service.
	#[error("rate limited, retry after {retry_after_secs:?} seconds")]
	RateLimited { retry_after_secs: Option<u64> },

	/// The directory service answered with a non-success status.
	#[error("directory API error ({status}): {message}")]
	ApiError { status: u16, message: String },

	#[error("invalid URL: {0}")]
	InvalidUrl(String),

	#[error("failed to parse response: {0}")]
	Parse(String),
}

impl RetryableError for GraphError {
	fn is_retryable(&self) -> bool {
		match self {
			GraphError::Network(e) => e.is_retryable(),
			GraphError::RateLimited { .. } => true,
			GraphError::ApiError { status, .. } | GraphError::TokenRejected { status, .. } => {
				matches!(*status, 408 | 429 | 500 | 502 | 503 | 504)
			}
			_ => false,
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn server_side_statuses_are_retryable() {
		for status in [408, 429, 500, 502, 503, 504] {
			let err = GraphError::ApiError {
				status,
				message: "busy".to_string(),
			};
			assert!(err.is_retryable(), "status {status} should be retryable");
		}
	}

	#[test]
	fn client_side_failures_are_final() {
		let rejected = GraphError::TokenRejected {
			status: 401,
			message: "invalid_client".to_string(),
		};
		assert!(!rejected.is_retryable());
		assert!(!GraphError::MissingAccessToken.is_retryable());
		assert!(!GraphError::ApiError {
			status: 404,
			message: "group not found".to_string()
		}
		.is_retryable());
		assert!(GraphError::RateLimited {
			retry_after_secs: Some(3)
		}
		.is_retryable());
	}
}
