// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Maps loaded configuration onto the orchestrator's settings.

use anyhow::{Context, Result};
use rise_config::ProvisioningConfig;
use rise_provisioning::{MetadataStoreSettings, ProvisioningSettings, Tenancy};

pub fn provisioning_settings(config: &ProvisioningConfig) -> Result<ProvisioningSettings> {
	let tenancy = if config.tenancy.single_tenant {
		let url = config
			.tenancy
			.infrastructure_site_url
			.clone()
			.context("single-tenant mode without an infrastructure site url")?;
		Tenancy::Single {
			infrastructure_site_url: url,
		}
	} else {
		Tenancy::Multi {
			infrastructure_sites: config.tenancy.tenants.clone(),
		}
	};

	Ok(ProvisioningSettings {
		tenancy,
		default_site_template: config.tenancy.default_site_template.clone(),
		metadata_store: MetadataStoreSettings {
			file_name: config.metadata_store.file_name.clone(),
			library: config.metadata_store.library.clone(),
			max_conflict_retries: config.metadata_store.max_conflict_retries,
		},
	})
}
