// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::collections::BTreeMap;

use crate::content::ObjectLocation;
use crate::error::SiteUrlError;

pub const DEFAULT_SITE_TEMPLATE: &str = "STS#0";
pub const DEFAULT_METADATA_FILE: &str = "Global.json.js";
pub const DEFAULT_METADATA_LIBRARY: &str = "riseData";

/// Where each tenant's infrastructure site lives.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Tenancy {
	/// Every tenant shares one infrastructure site.
	Single { infrastructure_site_url: String },
	/// Infrastructure site looked up per tenant id.
	Multi {
		infrastructure_sites: BTreeMap<String, String>,
	},
}

impl Tenancy {
	pub fn infrastructure_site_url(&self, tenant_id: &str) -> Result<&str, SiteUrlError> {
		match self {
			Tenancy::Single {
				infrastructure_site_url,
			} => Ok(infrastructure_site_url),
			Tenancy::Multi {
				infrastructure_sites,
			} => infrastructure_sites
				.get(tenant_id)
				.map(String::as_str)
				.ok_or_else(|| SiteUrlError::UnknownTenant {
					tenant_id: tenant_id.to_string(),
				}),
		}
	}
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MetadataStoreSettings {
	pub file_name: String,
	pub library: String,
	/// Extra attempts after a conditional write loses to a concurrent writer.
	pub max_conflict_retries: u32,
}

impl Default for MetadataStoreSettings {
	fn default() -> Self {
		Self {
			file_name: DEFAULT_METADATA_FILE.to_string(),
			library: DEFAULT_METADATA_LIBRARY.to_string(),
			max_conflict_retries: 3,
		}
	}
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProvisioningSettings {
	pub tenancy: Tenancy,
	pub default_site_template: String,
	pub metadata_store: MetadataStoreSettings,
}

impl ProvisioningSettings {
	pub fn new(tenancy: Tenancy) -> Self {
		Self {
			tenancy,
			default_site_template: DEFAULT_SITE_TEMPLATE.to_string(),
			metadata_store: MetadataStoreSettings::default(),
		}
	}

	/// The shared metadata document on the tenant's infrastructure site.
	pub fn metadata_location(&self, tenant_id: &str) -> Result<ObjectLocation, SiteUrlError> {
		Ok(ObjectLocation {
			tenant_id: tenant_id.to_string(),
			site_url: self.tenancy.infrastructure_site_url(tenant_id)?.to_string(),
			library: self.metadata_store.library.clone(),
			name: self.metadata_store.file_name.clone(),
		})
	}
}
