// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Error types for provisioning runs and their collaborators.

use std::path::PathBuf;

use rise_common_http::RetryableError;
use rise_graph::GraphError;
use rise_provisioning_core::DocumentError;
use thiserror::Error;

/// Failures from the tenant administration endpoint.
#[derive(Debug, Error)]
pub enum TenantAdminError {
	#[error("site not found: {site_url}")]
	SiteNotFound { site_url: String },

	/// Site creation was submitted but did not complete.
	#[error("failed to create site {site_url}: {message}")]
	CreationFailed { site_url: String, message: String },

	#[error("tenant administration call failed: {0}")]
	Remote(String),
}

/// Failures talking to a provisioned site.
#[derive(Debug, Error)]
pub enum SiteError {
	#[error("failed to connect to {site_url}: {message}")]
	Connect { site_url: String, message: String },

	#[error("template application failed: {0}")]
	TemplateApplication(String),

	#[error("site call failed: {0}")]
	Remote(String),
}

#[derive(Debug, Error)]
pub enum TemplateError {
	#[error("failed to read template {path}: {source}")]
	Io {
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},

	#[error("template {uri} is not valid: {source}")]
	Parse {
		uri: String,
		#[source]
		source: serde_json::Error,
	},

	#[error("template URI escapes the template root: {0}")]
	InvalidUri(String),

	#[error("template provider failed: {0}")]
	Remote(String),
}

#[derive(Debug, Error)]
pub enum ContentStoreError {
	/// A conditional write lost against a concurrent writer.
	#[error("object {name} was modified concurrently")]
	Conflict { name: String },

	#[error("invalid object name: {name}")]
	InvalidName { name: String },

	#[error("I/O error on {path}: {source}")]
	Io {
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},

	#[error("content store call failed ({status}): {message}")]
	Remote { status: u16, message: String },
}

impl RetryableError for ContentStoreError {
	fn is_retryable(&self) -> bool {
		match self {
			ContentStoreError::Remote { status, .. } => {
				matches!(*status, 408 | 429 | 500 | 502 | 503 | 504)
			}
			_ => false,
		}
	}
}

#[derive(Debug, Error)]
pub enum DocumentStoreError {
	#[error("metadata document {name} does not exist")]
	NotFound { name: String },

	#[error("metadata document {name} kept changing; gave up after {attempts} attempts")]
	ConflictRetriesExhausted { name: String, attempts: u32 },

	#[error(transparent)]
	Document(#[from] DocumentError),

	#[error(transparent)]
	Store(#[from] ContentStoreError),
}

#[derive(Debug, Error)]
pub enum SiteUrlError {
	#[error("no infrastructure site configured for tenant {tenant_id}")]
	UnknownTenant { tenant_id: String },

	#[error("infrastructure site URL {url} is not a sharepoint.com address")]
	NotSharePoint { url: String },
}

#[derive(Debug, Error)]
pub enum ProvisioningError {
	/// The handler was given a job it does not run.
	#[error("invalid job type for site collection provisioning: {kind}")]
	InvalidJobType { kind: String },

	#[error(transparent)]
	SiteUrl(#[from] SiteUrlError),

	#[error("tenant administration: {0}")]
	TenantAdmin(#[from] TenantAdminError),

	#[error("site: {0}")]
	Site(#[from] SiteError),

	#[error("template: {0}")]
	Template(#[from] TemplateError),

	#[error("metadata store: {0}")]
	Store(#[from] DocumentStoreError),

	#[error("directory: {0}")]
	Graph(#[from] GraphError),

	/// The run finished but the relaxed policy could not be put back.
	#[error("failed to restore customization policy on {site_url}: {source}")]
	PolicyRestoration {
		site_url: String,
		#[source]
		source: TenantAdminError,
	},

	#[error("site {site_url} is group-backed but has no GroupId property")]
	MissingGroupId { site_url: String },
}

pub type Result<T> = std::result::Result<T, ProvisioningError>;
