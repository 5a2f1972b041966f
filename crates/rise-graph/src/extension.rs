// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Open-type extensions on directory groups.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use rise_common_secret::SecretString;
use serde_json::{json, Value};
use tracing::{debug, error, instrument};
use url::Url;

use crate::error::GraphError;

pub const DEFAULT_GRAPH_BASE_URL: &str = "https://graph.microsoft.com";

pub const OPEN_EXTENSION_TYPE: &str = "microsoft.graph.openTypeExtension";

/// Extension name core metadata is stored under.
pub const CORE_METADATA_EXTENSION: &str = "PRFTCoreMetadata";

#[async_trait]
pub trait DirectoryClient: Send + Sync {
	/// Creates an open-type extension named `extension_name` on the group.
	/// A single request is made; callers must not assume idempotency.
	async fn create_open_extension(
		&self,
		token: &SecretString,
		group_id: &str,
		extension_name: &str,
		data: &Value,
	) -> Result<(), GraphError>;
}

#[derive(Clone)]
pub struct GraphExtensionClient {
	http_client: Client,
	base_url: String,
}

impl GraphExtensionClient {
	pub fn new() -> Self {
		Self {
			http_client: rise_common_http::new_client(),
			base_url: DEFAULT_GRAPH_BASE_URL.to_string(),
		}
	}

	pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
		self.base_url = url.into();
		self
	}

	fn extensions_url(&self, group_id: &str) -> Result<Url, GraphError> {
		let mut url =
			Url::parse(&self.base_url).map_err(|e| GraphError::InvalidUrl(format!("{}: {e}", self.base_url)))?;
		url
			.path_segments_mut()
			.map_err(|_| GraphError::InvalidUrl(self.base_url.clone()))?
			.pop_if_empty()
			.extend(["v1.0", "groups", group_id, "extensions"]);
		Ok(url)
	}
}

impl Default for GraphExtensionClient {
	fn default() -> Self {
		Self::new()
	}
}

/// Request body for an open-type extension; `data` is embedded verbatim.
fn extension_body(extension_name: &str, data: &Value) -> Value {
	json!({
		"@odata.type": OPEN_EXTENSION_TYPE,
		"extensionName": extension_name,
		"data": data,
	})
}

#[async_trait]
impl DirectoryClient for GraphExtensionClient {
	#[instrument(skip(self, token, data), fields(group_id = %group_id, extension = %extension_name))]
	async fn create_open_extension(
		&self,
		token: &SecretString,
		group_id: &str,
		extension_name: &str,
		data: &Value,
	) -> Result<(), GraphError> {
		let url = self.extensions_url(group_id)?;
		debug!(url = %url, "creating open extension");

		let response = self
			.http_client
			.post(url)
			.bearer_auth(token.expose())
			.json(&extension_body(extension_name, data))
			.send()
			.await?;

		match response.status() {
			status if status.is_success() => {
				debug!(status = status.as_u16(), "open extension created");
				Ok(())
			}
			StatusCode::TOO_MANY_REQUESTS => {
				let retry_after_secs = response
					.headers()
					.get("retry-after")
					.and_then(|v| v.to_str().ok())
					.and_then(|v| v.parse().ok());
				Err(GraphError::RateLimited { retry_after_secs })
			}
			status => {
				let message = response.text().await.unwrap_or_default();
				error!(status = status.as_u16(), message = %message, "directory rejected extension");
				Err(GraphError::ApiError {
					status: status.as_u16(),
					message,
				})
			}
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use wiremock::matchers::{body_json, header, method, path};
	use wiremock::{Mock, MockServer, ResponseTemplate};

	fn token() -> SecretString {
		SecretString::new("bearer-value".to_string())
	}

	#[test]
	fn body_embeds_data_verbatim() {
		let data = json!({ "Region": [ { "Label": "EMEA", "Id": "r-1" } ] });
		let body = extension_body(CORE_METADATA_EXTENSION, &data);

		assert_eq!(body["@odata.type"], "microsoft.graph.openTypeExtension");
		assert_eq!(body["extensionName"], "PRFTCoreMetadata");
		assert_eq!(body["data"], data);
	}

	#[test]
	fn extensions_url_tolerates_trailing_slash() {
		let client = GraphExtensionClient::new().with_base_url("https://graph.example.com/");
		let url = client.extensions_url("g-1").unwrap();
		assert_eq!(url.as_str(), "https://graph.example.com/v1.0/groups/g-1/extensions");
	}

	#[tokio::test]
	async fn posts_extension_with_bearer_token() {
		let server = MockServer::start().await;
		let data = json!({ "Region": [ { "Label": "EMEA", "Id": "r-1" } ] });

		Mock::given(method("POST"))
			.and(path("/v1.0/groups/group-1/extensions"))
			.and(header("authorization", "Bearer bearer-value"))
			.and(body_json(extension_body(CORE_METADATA_EXTENSION, &data)))
			.respond_with(ResponseTemplate::new(201))
			.expect(1)
			.mount(&server)
			.await;

		GraphExtensionClient::new()
			.with_base_url(server.uri())
			.create_open_extension(&token(), "group-1", CORE_METADATA_EXTENSION, &data)
			.await
			.unwrap();
	}

	#[tokio::test]
	async fn server_errors_are_surfaced_without_retry() {
		let server = MockServer::start().await;
		Mock::given(method("POST"))
			.and(path("/v1.0/groups/group-1/extensions"))
			.respond_with(ResponseTemplate::new(503).set_body_string("unavailable"))
			.expect(1)
			.mount(&server)
			.await;

		let err = GraphExtensionClient::new()
			.with_base_url(server.uri())
			.create_open_extension(&token(), "group-1", CORE_METADATA_EXTENSION, &json!({}))
			.await
			.unwrap_err();

		match err {
			GraphError::ApiError { status, message } => {
				assert_eq!(status, 503);
				assert_eq!(message, "unavailable");
			}
			other => panic!("unexpected error: {other:?}"),
		}
	}

	#[tokio::test]
	async fn throttling_reports_retry_after() {
		let server = MockServer::start().await;
		Mock::given(method("POST"))
			.respond_with(ResponseTemplate::new(429).insert_header("Retry-After", "7"))
			.mount(&server)
			.await;

		let err = GraphExtensionClient::new()
			.with_base_url(server.uri())
			.create_open_extension(&token(), "group-1", CORE_METADATA_EXTENSION, &json!({}))
			.await
			.unwrap_err();

		assert!(matches!(
			err,
			GraphError::RateLimited {
				retry_after_secs: Some(7)
			}
		));
	}
}
