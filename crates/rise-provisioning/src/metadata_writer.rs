// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Writes a job's core metadata to the site property bag and, for
//! group-backed sites, to a directory open extension.

use rise_graph::{DirectoryClient, TokenBroker, CORE_METADATA_EXTENSION};
use rise_provisioning_core::CoreMetadata;
use tracing::{debug, info, instrument};

use crate::error::{ProvisioningError, SiteError};
use crate::site::{SiteClient, GROUP_ID_PROPERTY};

/// Stores each taxonomy under its `PRFT` key and registers the key as
/// indexed. Returns the keys written.
#[instrument(skip_all, fields(site_url = %site.url()))]
pub async fn write_property_bag(
	site: &dyn SiteClient,
	metadata: &CoreMetadata,
) -> Result<Vec<String>, SiteError> {
	let mut keys = Vec::with_capacity(metadata.len());

	for entry in metadata.property_bag_entries() {
		debug!(key = %entry.key, "writing property");
		site.set_property(&entry.key, &entry.value).await?;
		site.add_indexed_property_key(&entry.key).await?;
		keys.push(entry.key);
	}

	info!(count = keys.len(), "core metadata written to property bag");
	Ok(keys)
}

/// Creates the core-metadata open extension on the site's group. A single
/// request; a rejection surfaces as an error. Returns the group id.
#[instrument(skip_all, fields(site_url = %site.url(), tenant_id = %tenant_id))]
pub async fn write_directory_extension(
	site: &dyn SiteClient,
	tokens: &dyn TokenBroker,
	directory: &dyn DirectoryClient,
	tenant_id: &str,
	metadata: &CoreMetadata,
) -> Result<String, ProvisioningError> {
	let group_id = site
		.property(GROUP_ID_PROPERTY)
		.await?
		.filter(|id| !id.trim().is_empty())
		.ok_or_else(|| ProvisioningError::MissingGroupId {
			site_url: site.url().to_string(),
		})?;

	let token = tokens.token(tenant_id).await?;
	directory
		.create_open_extension(&token, &group_id, CORE_METADATA_EXTENSION, &metadata.to_value())
		.await?;

	info!(group_id = %group_id, "core metadata written to directory extension");
	Ok(group_id)
}
