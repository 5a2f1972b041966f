// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Absolute URL of the site a job provisions.

use rise_provisioning_core::SiteCollectionJob;

use crate::error::SiteUrlError;
use crate::settings::Tenancy;

const SHAREPOINT_HOST_SUFFIX: &str = "sharepoint.com";

/// `root_url + relative_url` when the job names a root. Otherwise the tenant
/// root is cut from the infrastructure site URL, up to and including
/// `sharepoint.com`, and the relative URL appended.
pub fn resolve_site_url(
	job: &SiteCollectionJob,
	tenant_id: &str,
	tenancy: &Tenancy,
) -> Result<String, SiteUrlError> {
	if let Some(root) = &job.root_url {
		return Ok(format!("{root}{}", job.relative_url));
	}

	let infrastructure = tenancy.infrastructure_site_url(tenant_id)?;
	let root = tenant_root(infrastructure)?;
	Ok(format!("{root}{}", job.relative_url))
}

/// `https://contoso.sharepoint.com/sites/infra` becomes
/// `https://contoso.sharepoint.com`.
pub fn tenant_root(infrastructure_site_url: &str) -> Result<&str, SiteUrlError> {
	let marker = format!("{SHAREPOINT_HOST_SUFFIX}/");
	infrastructure_site_url
		.find(&marker)
		.map(|index| &infrastructure_site_url[..index + SHAREPOINT_HOST_SUFFIX.len()])
		.ok_or_else(|| SiteUrlError::NotSharePoint {
			url: infrastructure_site_url.to_string(),
		})
}
