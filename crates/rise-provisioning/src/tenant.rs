// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Tenant administration: site existence, creation and the
//! deny-add-and-customize-pages flag.

use async_trait::async_trait;
use rise_provisioning_core::{SiteCollectionJob, Template};
use serde::{Deserialize, Serialize};

use crate::error::TenantAdminError;

/// Everything needed to create a site collection.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SiteDescriptor {
	pub url: String,
	pub title: String,
	pub description: String,
	pub lcid: u32,
	pub owner_login: String,
	pub template: String,
	pub time_zone_id: i32,
	pub storage_maximum_level: i64,
	pub storage_warning_level: i64,
	pub user_code_maximum_level: f64,
	pub user_code_warning_level: f64,
}

impl SiteDescriptor {
	/// Uses the template's base site template, else `default_template`.
	pub fn for_job(
		site_url: &str,
		job: &SiteCollectionJob,
		template: &Template,
		default_template: &str,
	) -> Self {
		Self {
			url: site_url.to_string(),
			title: job.site_title.clone(),
			description: job.description.clone(),
			lcid: job.language,
			owner_login: job.primary_site_collection_admin.clone(),
			template: template.site_template_or(default_template).to_string(),
			time_zone_id: job.time_zone,
			storage_maximum_level: job.storage_maximum_level,
			storage_warning_level: job.storage_warning_level,
			user_code_maximum_level: job.user_code_maximum_level,
			user_code_warning_level: job.user_code_warning_level,
		}
	}
}

/// Each call is a single round trip; there is no compare-and-swap on the
/// customization flag.
#[async_trait]
pub trait TenantAdmin: Send + Sync {
	async fn site_exists(&self, tenant_id: &str, site_url: &str) -> Result<bool, TenantAdminError>;

	/// Returns once the site is addressable. No cleanup on failure.
	async fn create_site(
		&self,
		tenant_id: &str,
		descriptor: &SiteDescriptor,
	) -> Result<(), TenantAdminError>;

	/// `true` when adding and customizing pages (scripting) is denied.
	async fn deny_add_and_customize_pages(
		&self,
		tenant_id: &str,
		site_url: &str,
	) -> Result<bool, TenantAdminError>;

	async fn set_deny_add_and_customize_pages(
		&self,
		tenant_id: &str,
		site_url: &str,
		deny: bool,
	) -> Result<(), TenantAdminError>;
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::testing::site_collection_job;

	#[test]
	fn descriptor_carries_job_fields_and_falls_back_to_default_template() {
		let mut job = site_collection_job("/sites/teamA");
		job.time_zone = 4;
		job.user_code_maximum_level = 300.0;
		job.storage_maximum_level = 1024;

		let descriptor = SiteDescriptor::for_job(
			"https://contoso.sharepoint.com/sites/teamA",
			&job,
			&Template::default(),
			"STS#0",
		);

		assert_eq!(descriptor.template, "STS#0");
		assert_eq!(descriptor.title, job.site_title);
		assert_eq!(descriptor.owner_login, job.primary_site_collection_admin);
		assert_eq!(descriptor.time_zone_id, 4);
		assert_eq!(descriptor.user_code_maximum_level, 300.0);
		assert_eq!(descriptor.storage_maximum_level, 1024);
		assert_eq!(descriptor.lcid, 1033);
	}

	#[test]
	fn descriptor_prefers_template_base() {
		let job = site_collection_job("/sites/teamA");
		let template = Template {
			base_site_template: Some("GROUP#0".to_string()),
			..Template::default()
		};

		let descriptor = SiteDescriptor::for_job("u", &job, &template, "STS#0");
		assert_eq!(descriptor.template, "GROUP#0");
	}
}
