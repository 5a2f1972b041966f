// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! App-only token acquisition via the OAuth 2.0 client-credentials grant.

use async_trait::async_trait;
use reqwest::Client;
use rise_common_http::{retry, RetryConfig};
use rise_common_secret::SecretString;
use serde::Deserialize;
use tracing::{debug, instrument};

use crate::error::GraphError;

pub const DEFAULT_AUTHORITY_URL: &str = "https://login.microsoftonline.com";
pub const DEFAULT_GRAPH_SCOPE: &str = "https://graph.microsoft.com/.default";

/// Hands out bearer tokens for directory calls on behalf of a tenant.
#[async_trait]
pub trait TokenBroker: Send + Sync {
	async fn token(&self, tenant_id: &str) -> Result<SecretString, GraphError>;
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
	#[serde(default)]
	access_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TokenErrorResponse {
	error: String,
	#[serde(default)]
	error_description: Option<String>,
}

/// Token broker posting to `{authority}/{tenant}/oauth2/v2.0/token`.
#[derive(Clone)]
pub struct ClientCredentialsTokenBroker {
	http_client: Client,
	authority_url: String,
	client_id: String,
	client_secret: SecretString,
	scope: String,
	retry_config: RetryConfig,
}

impl ClientCredentialsTokenBroker {
	pub fn new(client_id: impl Into<String>, client_secret: SecretString) -> Self {
		Self {
			http_client: rise_common_http::new_client(),
			authority_url: DEFAULT_AUTHORITY_URL.to_string(),
			client_id: client_id.into(),
			client_secret,
			scope: DEFAULT_GRAPH_SCOPE.to_string(),
			retry_config: RetryConfig::default(),
		}
	}

	pub fn with_authority_url(mut self, url: impl Into<String>) -> Self {
		self.authority_url = url.into();
		self
	}

	pub fn with_scope(mut self, scope: impl Into<String>) -> Self {
		self.scope = scope.into();
		self
	}

	pub fn with_retry_config(mut self, config: RetryConfig) -> Self {
		self.retry_config = config;
		self
	}

	fn token_endpoint(&self, tenant_id: &str) -> String {
		format!(
			"{}/{}/oauth2/v2.0/token",
			self.authority_url.trim_end_matches('/'),
			tenant_id
		)
	}

	async fn request_token(&self, tenant_id: &str) -> Result<SecretString, GraphError> {
		let response = self
			.http_client
			.post(self.token_endpoint(tenant_id))
			.header("Accept", "application/json")
			.form(&[
				("client_id", self.client_id.as_str()),
				("scope", self.scope.as_str()),
				("client_secret", self.client_secret.expose().as_str()),
				("grant_type", "client_credentials"),
			])
			.send()
			.await?;

		let status = response.status();
		let body = response.text().await?;

		if !status.is_success() {
			let message = serde_json::from_str::<TokenErrorResponse>(&body)
				.map(|e| e.error_description.unwrap_or(e.error))
				.unwrap_or(body);
			return Err(GraphError::TokenRejected {
				status: status.as_u16(),
				message,
			});
		}

		let parsed: TokenResponse = serde_json::from_str(&body)
			.map_err(|e| GraphError::Parse(format!("token response: {e}")))?;

		parsed
			.access_token
			.filter(|token| !token.is_empty())
			.map(SecretString::new)
			.ok_or(GraphError::MissingAccessToken)
	}
}

#[async_trait]
impl TokenBroker for ClientCredentialsTokenBroker {
	#[instrument(skip(self), fields(client_id = %self.client_id))]
	async fn token(&self, tenant_id: &str) -> Result<SecretString, GraphError> {
		debug!("requesting app-only access token");
		retry(&self.retry_config, || self.request_token(tenant_id)).await
	}
}
