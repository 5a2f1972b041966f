// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Operations against a single provisioned site.

use async_trait::async_trait;
use rise_provisioning_core::{HandlerSet, Template};

use crate::error::SiteError;
use crate::progress::ProvisioningProgress;

/// Property holding the directory group id of a group-backed site.
pub const GROUP_ID_PROPERTY: &str = "GroupId";

#[async_trait]
pub trait SiteClient: Send + Sync {
	fn url(&self) -> &str;

	/// Id of the site's root web.
	async fn web_id(&self) -> Result<String, SiteError>;

	/// Applies `template` running only `handlers`. No client-side timeout.
	async fn apply_template(
		&self,
		template: &Template,
		handlers: &HandlerSet,
		progress: &dyn ProvisioningProgress,
	) -> Result<(), SiteError>;

	async fn apply_site_policy(&self, policy_name: &str) -> Result<(), SiteError>;

	async fn property(&self, key: &str) -> Result<Option<String>, SiteError>;

	async fn set_property(&self, key: &str, value: &str) -> Result<(), SiteError>;

	/// Marks a property-bag key as indexed for search.
	async fn add_indexed_property_key(&self, key: &str) -> Result<(), SiteError>;
}

/// Opens app-only sessions against sites of a tenant.
#[async_trait]
pub trait SiteConnector: Send + Sync {
	async fn connect(&self, tenant_id: &str, site_url: &str) -> Result<Box<dyn SiteClient>, SiteError>;
}
