// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! App-only directory credentials used for open extensions on group sites.

use rise_common_secret::SecretString;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

fn default_authority_url() -> String {
	"https://login.microsoftonline.com".to_string()
}

fn default_graph_base_url() -> String {
	"https://graph.microsoft.com".to_string()
}

fn default_scope() -> String {
	"https://graph.microsoft.com/.default".to_string()
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GraphConfigLayer {
	/// Application (client) id of the app registration.
	pub client_id: Option<String>,
	#[serde(skip_serializing)]
	pub client_secret: Option<SecretString>,
	pub authority_url: Option<String>,
	pub graph_base_url: Option<String>,
	pub scope: Option<String>,
}

impl GraphConfigLayer {
	pub fn merge(&mut self, other: GraphConfigLayer) {
		if other.client_id.is_some() {
			self.client_id = other.client_id;
		}
		if other.client_secret.is_some() {
			self.client_secret = other.client_secret;
		}
		if other.authority_url.is_some() {
			self.authority_url = other.authority_url;
		}
		if other.graph_base_url.is_some() {
			self.graph_base_url = other.graph_base_url;
		}
		if other.scope.is_some() {
			self.scope = other.scope;
		}
	}

	pub fn build(self) -> Result<GraphConfig, ConfigError> {
		let client_id = self.client_id.filter(|s| !s.trim().is_empty());

		let client_secret = match (&client_id, self.client_secret) {
			(None, _) => None,
			(Some(_), None) => {
				return Err(ConfigError::Validation(
					"graph client_secret is required when client_id is set".to_string(),
				));
			}
			(Some(_), Some(secret)) if secret.is_blank() => {
				return Err(ConfigError::Validation(
					"graph client_secret cannot be empty".to_string(),
				));
			}
			(Some(_), Some(secret)) => Some(secret),
		};

		Ok(GraphConfig {
			client_id,
			client_secret,
			authority_url: self.authority_url.unwrap_or_else(default_authority_url),
			graph_base_url: self.graph_base_url.unwrap_or_else(default_graph_base_url),
			scope: self.scope.unwrap_or_else(default_scope),
		})
	}
}

#[derive(Debug, Clone, Serialize)]
pub struct GraphConfig {
	#[serde(skip_serializing_if = "Option::is_none")]
	pub client_id: Option<String>,
	/// Serialized as a redaction marker.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub client_secret: Option<SecretString>,
	pub authority_url: String,
	pub graph_base_url: String,
	pub scope: String,
}

impl GraphConfig {
	/// Client id and secret, when the app registration is configured.
	pub fn credentials(&self) -> Option<(&str, &SecretString)> {
		match (&self.client_id, &self.client_secret) {
			(Some(id), Some(secret)) => Some((id.as_str(), secret)),
			_ => None,
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn unconfigured_graph_has_defaults_and_no_credentials() {
		let config = GraphConfigLayer::default().build().unwrap();
		assert!(config.credentials().is_none());
		assert_eq!(config.authority_url, "https://login.microsoftonline.com");
		assert_eq!(config.graph_base_url, "https://graph.microsoft.com");
		assert_eq!(config.scope, "https://graph.microsoft.com/.default");
	}

	#[test]
	fn secret_is_required_with_client_id() {
		let layer = GraphConfigLayer {
			client_id: Some("app-1".to_string()),
			..Default::default()
		};
		let err = layer.build().unwrap_err();
		assert!(err.to_string().contains("client_secret is required"));
	}

	#[test]
	fn blank_secret_is_rejected() {
		let layer = GraphConfigLayer {
			client_id: Some("app-1".to_string()),
			client_secret: Some(SecretString::new("   ".to_string())),
			..Default::default()
		};
		assert!(matches!(layer.build(), Err(ConfigError::Validation(_))));
	}

	#[test]
	fn configured_credentials_are_exposed_together() {
		let layer = GraphConfigLayer {
			client_id: Some("app-1".to_string()),
			client_secret: Some(SecretString::new("s3cret".to_string())),
			..Default::default()
		};
		let config = layer.build().unwrap();
		let (id, secret) = config.credentials().unwrap();
		assert_eq!(id, "app-1");
		assert_eq!(secret.expose(), "s3cret");
	}

	#[test]
	fn secret_never_reaches_debug_output() {
		let layer = GraphConfigLayer {
			client_id: Some("app-1".to_string()),
			client_secret: Some(SecretString::new("s3cret".to_string())),
			..Default::default()
		};
		let config = layer.build().unwrap();
		assert!(!format!("{config:?}").contains("s3cret"));
	}

	#[test]
	fn merge_keeps_base_secret_when_overlay_has_none() {
		let mut base = GraphConfigLayer {
			client_id: Some("app-1".to_string()),
			client_secret: Some(SecretString::new("s3cret".to_string())),
			..Default::default()
		};
		base.merge(GraphConfigLayer {
			client_id: Some("app-2".to_string()),
			..Default::default()
		});
		assert_eq!(base.client_id.as_deref(), Some("app-2"));
		assert!(base.client_secret.is_some());
	}
}
