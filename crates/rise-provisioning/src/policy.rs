// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Scoped relaxation of the deny-add-and-customize-pages flag.
//!
//! Template application needs scripting allowed on the site. The guard lifts
//! the restriction when it is in force and puts it back on release. A site
//! that was already permissive is never touched.

use tracing::{error, info};

use crate::error::TenantAdminError;
use crate::tenant::TenantAdmin;

#[must_use = "a relaxed policy must be released"]
pub struct PolicyGuard<'a> {
	admin: &'a dyn TenantAdmin,
	tenant_id: String,
	site_url: String,
	was_restricted: bool,
	released: bool,
}

impl<'a> PolicyGuard<'a> {
	/// Reads the flag and, if customization is denied, allows it.
	pub async fn acquire(
		admin: &'a dyn TenantAdmin,
		tenant_id: &str,
		site_url: &str,
	) -> Result<PolicyGuard<'a>, TenantAdminError> {
		let was_restricted = admin
			.deny_add_and_customize_pages(tenant_id, site_url)
			.await?;

		if was_restricted {
			info!(site_url, "enabling scripts on site");
			admin
				.set_deny_add_and_customize_pages(tenant_id, site_url, false)
				.await?;
		}

		Ok(PolicyGuard {
			admin,
			tenant_id: tenant_id.to_string(),
			site_url: site_url.to_string(),
			was_restricted,
			released: false,
		})
	}

	/// Whether `acquire` had to relax the policy.
	pub fn was_restricted(&self) -> bool {
		self.was_restricted
	}

	/// Puts the restriction back if `acquire` lifted it. Returns whether a
	/// restore happened.
	pub async fn release(mut self) -> Result<bool, TenantAdminError> {
		self.released = true;
		if !self.was_restricted {
			return Ok(false);
		}

		info!(site_url = %self.site_url, "disabling scripts on site");
		self
			.admin
			.set_deny_add_and_customize_pages(&self.tenant_id, &self.site_url, true)
			.await?;
		Ok(true)
	}
}

impl Drop for PolicyGuard<'_> {
	fn drop(&mut self) {
		if self.was_restricted && !self.released {
			error!(
				site_url = %self.site_url,
				"policy guard dropped without release; scripts remain enabled on site"
			);
		}
	}
}
