// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! HTTP client with the provisioning User-Agent.
//!
//! No request timeout is configured; provisioning calls against the directory
//! service are allowed to take as long as the service needs.

use reqwest::{Client, ClientBuilder};

/// Builds a client with the standard User-Agent.
pub fn new_client() -> Client {
	builder().build().expect("failed to build HTTP client")
}

/// Client builder preloaded with the standard User-Agent.
///
/// ```ignore
/// let client = rise_common_http::builder().https_only(true).build()?;
/// ```
pub fn builder() -> ClientBuilder {
	Client::builder().user_agent(user_agent())
}

/// Format: `rise-provisioning/{version} ({os}-{arch})`
pub fn user_agent() -> String {
	format!(
		"rise-provisioning/{} ({}-{})",
		env!("CARGO_PKG_VERSION"),
		std::env::consts::OS,
		std::env::consts::ARCH
	)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn user_agent_names_product_and_platform() {
		let ua = user_agent();
		assert!(ua.starts_with("rise-provisioning/"));
		assert!(ua.contains(std::env::consts::OS));
	}

	#[test]
	fn builder_produces_client() {
		assert!(builder().build().is_ok());
	}
}
