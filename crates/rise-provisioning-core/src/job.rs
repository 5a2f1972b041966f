// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Provisioning jobs as handed over by the dispatch layer.
//!
//! A job is immutable once dispatched. The payload carries the kind-specific
//! fields; only [`JobPayload::SiteCollection`] is run by the orchestrator.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::metadata::CoreMetadata;

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(String);

impl JobId {
	pub fn new(id: impl Into<String>) -> Self {
		Self(id.into())
	}

	pub fn as_str(&self) -> &str {
		&self.0
	}
}

impl fmt::Display for JobId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.0)
	}
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
	#[default]
	Pending,
	Running,
	Provisioned,
	Failed,
	Cancelled,
}

impl JobStatus {
	pub fn as_str(&self) -> &'static str {
		match self {
			JobStatus::Pending => "pending",
			JobStatus::Running => "running",
			JobStatus::Provisioned => "provisioned",
			JobStatus::Failed => "failed",
			JobStatus::Cancelled => "cancelled",
		}
	}
}

/// Envelope shared by every job kind.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ProvisioningJob {
	pub job_id: JobId,
	pub owner: String,
	pub title: String,
	#[serde(default)]
	pub status: JobStatus,
	pub tenant_id: String,
	pub payload: JobPayload,
}

impl ProvisioningJob {
	pub fn kind(&self) -> &'static str {
		self.payload.kind()
	}

	pub fn as_site_collection(&self) -> Option<&SiteCollectionJob> {
		match &self.payload {
			JobPayload::SiteCollection(job) => Some(job),
			_ => None,
		}
	}
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum JobPayload {
	SiteCollection(SiteCollectionJob),
	SubSite(SubSiteJob),
	ApplyTemplate(ApplyTemplateJob),
	Branding(BrandingJob),
}

impl JobPayload {
	pub fn kind(&self) -> &'static str {
		match self {
			JobPayload::SiteCollection(_) => "site_collection",
			JobPayload::SubSite(_) => "sub_site",
			JobPayload::ApplyTemplate(_) => "apply_template",
			JobPayload::Branding(_) => "branding",
		}
	}
}

/// Request to create (or reuse) a site collection and apply a template to it.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SiteCollectionJob {
	/// Server-relative path, e.g. `/sites/teamA`.
	pub relative_url: String,
	/// Absolute tenant root. When absent the root is derived from the tenant's
	/// infrastructure site.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub root_url: Option<String>,
	pub site_title: String,
	#[serde(default)]
	pub description: String,
	/// Locale identifier (LCID), 1033 for en-US.
	#[serde(default = "default_language")]
	pub language: u32,
	#[serde(default)]
	pub time_zone: i32,
	pub primary_site_collection_admin: String,
	#[serde(default)]
	pub storage_maximum_level: i64,
	#[serde(default)]
	pub storage_warning_level: i64,
	#[serde(default)]
	pub user_code_maximum_level: f64,
	#[serde(default)]
	pub user_code_warning_level: f64,
	/// Name of the template provider registered for the tenant.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub templates_provider: Option<String>,
	pub template_uri: String,
	#[serde(default)]
	pub template_parameters: BTreeMap<String, String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub site_policy: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub main_menu: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub footer_menu: Option<String>,
	#[serde(default)]
	pub core_metadata: CoreMetadata,
}

fn default_language() -> u32 {
	1033
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SubSiteJob {
	pub parent_site_url: String,
	pub relative_url: String,
	pub site_title: String,
	#[serde(default)]
	pub description: String,
	#[serde(default = "default_language")]
	pub language: u32,
	#[serde(default)]
	pub time_zone: i32,
	#[serde(default)]
	pub inherit_permissions: bool,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub templates_provider: Option<String>,
	pub template_uri: String,
	#[serde(default)]
	pub template_parameters: BTreeMap<String, String>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ApplyTemplateJob {
	pub target_site_url: String,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub templates_provider: Option<String>,
	pub template_uri: String,
	#[serde(default)]
	pub template_parameters: BTreeMap<String, String>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct BrandingJob {
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub logo_image_url: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub background_image_url: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub color_file: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub font_file: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub css_override_url: Option<String>,
	#[serde(default)]
	pub update_children: bool,
}

#[cfg(test)]
mod tests {
	use super::*;

	const SITE_COLLECTION_JOB: &str = r#"{
		"job_id": "job-42",
		"owner": "admin@contoso.onmicrosoft.com",
		"title": "Team A",
		"tenant_id": "contoso",
		"payload": {
			"kind": "site_collection",
			"relative_url": "/sites/teamA",
			"site_title": "Team A",
			"primary_site_collection_admin": "admin@contoso.onmicrosoft.com",
			"templates_provider": "local",
			"template_uri": "team.json",
			"main_menu": "menu-1",
			"core_metadata": "{\"Region\":[{\"Label\":\"EMEA\",\"Id\":\"r-1\"}]}"
		}
	}"#;

	#[test]
	fn site_collection_job_parses_with_defaults() {
		let job: ProvisioningJob = serde_json::from_str(SITE_COLLECTION_JOB).unwrap();

		assert_eq!(job.kind(), "site_collection");
		assert_eq!(job.status, JobStatus::Pending);

		let payload = job.as_site_collection().unwrap();
		assert_eq!(payload.relative_url, "/sites/teamA");
		assert_eq!(payload.language, 1033);
		assert!(payload.root_url.is_none());
		assert!(payload.footer_menu.is_none());
		assert_eq!(payload.main_menu.as_deref(), Some("menu-1"));
		assert_eq!(payload.core_metadata.len(), 1);
	}

	#[test]
	fn other_kinds_are_not_site_collections() {
		let job = ProvisioningJob {
			job_id: JobId::new("job-7"),
			owner: "owner".to_string(),
			title: "Branding".to_string(),
			status: JobStatus::Pending,
			tenant_id: "contoso".to_string(),
			payload: JobPayload::Branding(BrandingJob::default()),
		};

		assert_eq!(job.kind(), "branding");
		assert!(job.as_site_collection().is_none());
	}

	#[test]
	fn status_serializes_snake_case() {
		let json = serde_json::to_string(&JobStatus::Provisioned).unwrap();
		assert_eq!(json, "\"provisioned\"");
		assert_eq!(JobStatus::Cancelled.as_str(), "cancelled");
	}
}
