// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Tenancy section: where infrastructure sites live and the fallback site
//! template.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

fn default_site_template() -> String {
	"STS#0".to_string()
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct TenancyConfigLayer {
	pub single_tenant: Option<bool>,
	pub infrastructure_site_url: Option<String>,
	/// Tenant id to infrastructure site url, used in multi-tenant mode.
	pub tenants: Option<BTreeMap<String, String>>,
	pub default_site_template: Option<String>,
}

impl TenancyConfigLayer {
	pub fn merge(&mut self, other: Self) {
		if other.single_tenant.is_some() {
			self.single_tenant = other.single_tenant;
		}
		if other.infrastructure_site_url.is_some() {
			self.infrastructure_site_url = other.infrastructure_site_url;
		}
		if other.tenants.is_some() {
			self.tenants = other.tenants;
		}
		if other.default_site_template.is_some() {
			self.default_site_template = other.default_site_template;
		}
	}

	pub fn build(self) -> Result<TenancyConfig, ConfigError> {
		let single_tenant = self.single_tenant.unwrap_or(true);
		let infrastructure_site_url = self
			.infrastructure_site_url
			.map(|url| url.trim().to_string())
			.filter(|url| !url.is_empty());
		let tenants = self.tenants.unwrap_or_default();

		if single_tenant {
			let url = infrastructure_site_url.as_deref().ok_or_else(|| {
				ConfigError::Validation(
					"tenancy.infrastructure_site_url is required in single-tenant mode".to_string(),
				)
			})?;
			validate_site_url("tenancy.infrastructure_site_url", url)?;
		} else {
			if tenants.is_empty() {
				return Err(ConfigError::Validation(
					"tenancy.tenants must list at least one tenant in multi-tenant mode".to_string(),
				));
			}
			for (tenant, url) in &tenants {
				validate_site_url(&format!("tenancy.tenants.{tenant}"), url)?;
			}
		}

		let default_site_template = self
			.default_site_template
			.filter(|t| !t.trim().is_empty())
			.unwrap_or_else(default_site_template);

		Ok(TenancyConfig {
			single_tenant,
			infrastructure_site_url,
			tenants,
			default_site_template,
		})
	}
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct TenancyConfig {
	pub single_tenant: bool,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub infrastructure_site_url: Option<String>,
	pub default_site_template: String,
	pub tenants: BTreeMap<String, String>,
}

impl TenancyConfig {
	/// Infrastructure site for `tenant_id` under the configured mode.
	pub fn infrastructure_site_for(&self, tenant_id: &str) -> Option<&str> {
		if self.single_tenant {
			self.infrastructure_site_url.as_deref()
		} else {
			self.tenants.get(tenant_id).map(String::as_str)
		}
	}
}

/// Infrastructure sites must be absolute https SharePoint Online urls.
pub(crate) fn validate_site_url(key: &str, value: &str) -> Result<(), ConfigError> {
	let parsed = url::Url::parse(value).map_err(|e| ConfigError::InvalidValue {
		key: key.to_string(),
		message: e.to_string(),
	})?;

	if parsed.scheme() != "https" {
		return Err(ConfigError::InvalidValue {
			key: key.to_string(),
			message: format!("expected an https url, got {}", parsed.scheme()),
		});
	}
	if !value.to_ascii_lowercase().contains("sharepoint.com/") {
		return Err(ConfigError::InvalidValue {
			key: key.to_string(),
			message: "expected a sharepoint.com site url".to_string(),
		});
	}
	Ok(())
}

#[cfg(test)]
mod tests {
	use super::*;

	const INFRA: &str = "https://contoso.sharepoint.com/sites/infrastructure";

	#[test]
	fn single_tenant_is_the_default_mode() {
		let layer = TenancyConfigLayer {
			infrastructure_site_url: Some(INFRA.to_string()),
			..Default::default()
		};
		let config = layer.build().unwrap();
		assert!(config.single_tenant);
		assert_eq!(config.default_site_template, "STS#0");
		assert_eq!(config.infrastructure_site_for("anyone"), Some(INFRA));
	}

	#[test]
	fn single_tenant_requires_infrastructure_site() {
		let err = TenancyConfigLayer::default().build().unwrap_err();
		assert!(matches!(err, ConfigError::Validation(_)));

		let blank = TenancyConfigLayer {
			infrastructure_site_url: Some("  ".to_string()),
			..Default::default()
		};
		assert!(blank.build().is_err());
	}

	#[test]
	fn multi_tenant_looks_up_by_id() {
		let layer = TenancyConfigLayer {
			single_tenant: Some(false),
			tenants: Some(BTreeMap::from([
				("contoso".to_string(), INFRA.to_string()),
				(
					"fabrikam".to_string(),
					"https://fabrikam.sharepoint.com/sites/infra".to_string(),
				),
			])),
			..Default::default()
		};
		let config = layer.build().unwrap();
		assert_eq!(config.infrastructure_site_for("contoso"), Some(INFRA));
		assert_eq!(config.infrastructure_site_for("unknown"), None);
	}

	#[test]
	fn multi_tenant_requires_tenants() {
		let layer = TenancyConfigLayer {
			single_tenant: Some(false),
			..Default::default()
		};
		assert!(matches!(layer.build(), Err(ConfigError::Validation(_))));
	}

	#[test]
	fn non_sharepoint_urls_are_rejected() {
		for url in [
			"http://contoso.sharepoint.com/sites/infra",
			"https://example.com/sites/infra",
			"not a url",
		] {
			let layer = TenancyConfigLayer {
				infrastructure_site_url: Some(url.to_string()),
				..Default::default()
			};
			assert!(
				matches!(layer.build(), Err(ConfigError::InvalidValue { .. })),
				"{url} should be rejected"
			);
		}
	}

	#[test]
	fn merge_replaces_tenant_map_wholesale() {
		let mut base = TenancyConfigLayer {
			tenants: Some(BTreeMap::from([("a".to_string(), INFRA.to_string())])),
			default_site_template: Some("STS#3".to_string()),
			..Default::default()
		};
		base.merge(TenancyConfigLayer {
			tenants: Some(BTreeMap::from([("b".to_string(), INFRA.to_string())])),
			..Default::default()
		});
		let tenants = base.tenants.unwrap();
		assert!(tenants.contains_key("b"));
		assert!(!tenants.contains_key("a"));
		assert_eq!(base.default_site_template.as_deref(), Some("STS#3"));
	}
}
