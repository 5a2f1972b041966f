// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Configuration layer for merging from multiple sources.

use serde::Deserialize;

use crate::sections::{
	GraphConfigLayer, LoggingConfigLayer, MetadataStoreConfigLayer, TenancyConfigLayer,
};

/// Provisioning configuration layer - all fields are Option for merging.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProvisioningConfigLayer {
	#[serde(default)]
	pub tenancy: Option<TenancyConfigLayer>,
	#[serde(default)]
	pub graph: Option<GraphConfigLayer>,
	#[serde(default)]
	pub metadata_store: Option<MetadataStoreConfigLayer>,
	#[serde(default)]
	pub logging: Option<LoggingConfigLayer>,
}

impl ProvisioningConfigLayer {
	/// Merge another layer into this one. Other layer takes precedence.
	pub fn merge(&mut self, other: ProvisioningConfigLayer) {
		merge_option(&mut self.tenancy, other.tenancy, TenancyConfigLayer::merge);
		merge_option(&mut self.graph, other.graph, GraphConfigLayer::merge);
		merge_option(
			&mut self.metadata_store,
			other.metadata_store,
			MetadataStoreConfigLayer::merge,
		);
		merge_option(&mut self.logging, other.logging, LoggingConfigLayer::merge);
	}
}

fn merge_option<T, F>(target: &mut Option<T>, source: Option<T>, merge_fn: F)
where
	F: FnOnce(&mut T, T),
{
	match (target.as_mut(), source) {
		(Some(t), Some(s)) => merge_fn(t, s),
		(None, Some(s)) => *target = Some(s),
		_ => {}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_merge_empty_layers() {
		let mut base = ProvisioningConfigLayer::default();
		base.merge(ProvisioningConfigLayer::default());
		assert!(base.tenancy.is_none());
		assert!(base.graph.is_none());
	}

	#[test]
	fn test_merge_fills_missing_section() {
		let mut base = ProvisioningConfigLayer::default();
		base.merge(ProvisioningConfigLayer {
			metadata_store: Some(MetadataStoreConfigLayer {
				library: Some("menus".to_string()),
				..Default::default()
			}),
			..Default::default()
		});
		assert_eq!(
			base.metadata_store.unwrap().library.as_deref(),
			Some("menus")
		);
	}

	#[test]
	fn test_merge_is_field_wise_within_section() {
		let mut base = ProvisioningConfigLayer {
			tenancy: Some(TenancyConfigLayer {
				infrastructure_site_url: Some(
					"https://contoso.sharepoint.com/sites/infra".to_string(),
				),
				default_site_template: Some("STS#3".to_string()),
				..Default::default()
			}),
			..Default::default()
		};
		base.merge(ProvisioningConfigLayer {
			tenancy: Some(TenancyConfigLayer {
				default_site_template: Some("GROUP#0".to_string()),
				..Default::default()
			}),
			..Default::default()
		});
		let tenancy = base.tenancy.unwrap();
		assert_eq!(
			tenancy.infrastructure_site_url.as_deref(),
			Some("https://contoso.sharepoint.com/sites/infra")
		);
		assert_eq!(tenancy.default_site_template.as_deref(), Some("GROUP#0"));
	}

	#[test]
	fn test_deserialize_full_layer() {
		let layer: ProvisioningConfigLayer = toml::from_str(
			r#"
[tenancy]
single_tenant = false

[tenancy.tenants]
contoso = "https://contoso.sharepoint.com/sites/infra"

[graph]
client_id = "app-1"
client_secret = "s3cret"

[logging]
level = "debug"
"#,
		)
		.unwrap();

		let tenancy = layer.tenancy.unwrap();
		assert_eq!(tenancy.single_tenant, Some(false));
		assert_eq!(tenancy.tenants.unwrap().len(), 1);
		let graph = layer.graph.unwrap();
		assert_eq!(graph.client_secret.unwrap().expose(), "s3cret");
		assert!(layer.metadata_store.is_none());
		assert_eq!(layer.logging.unwrap().level.as_deref(), Some("debug"));
	}
}
