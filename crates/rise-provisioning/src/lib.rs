// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Site collection provisioning for Rise.
//!
//! [`Orchestrator`] runs one [`ProvisioningJob`](rise_provisioning_core::ProvisioningJob)
//! at a time: it creates or reuses the site, relaxes the customization policy
//! for the duration of template application, writes core metadata and menu
//! references, then restores the policy.
//!
//! Remote systems sit behind traits ([`TenantAdmin`], [`SiteConnector`],
//! [`TemplateRepository`], [`ContentStore`] and the directory traits in
//! `rise-graph`). The `testing` module, built for tests and behind the
//! `test-support` feature, provides in-memory versions of each.

pub mod content;
pub mod customizer;
pub mod document_store;
pub mod error;
pub mod local_store;
pub mod metadata_writer;
pub mod orchestrator;
pub mod policy;
pub mod progress;
pub mod settings;
pub mod site;
pub mod site_url;
pub mod templates;
pub mod tenant;

#[cfg(any(test, feature = "test-support"))]
pub mod testing;

pub use content::{ContentStore, ETag, ObjectLocation, StoredObject, WritePrecondition};
pub use customizer::{customize, PreparedTemplate, EXCLUDED_HANDLERS};
pub use document_store::{DocumentStore, UpsertReport};
pub use error::{
	ContentStoreError, DocumentStoreError, ProvisioningError, Result, SiteError, SiteUrlError,
	TemplateError, TenantAdminError,
};
pub use local_store::{content_etag, LocalContentStore};
pub use metadata_writer::{write_directory_extension, write_property_bag};
pub use orchestrator::{
	Collaborators, JobHandler, Orchestrator, ProvisioningOutcome, ProvisioningState, RunReport,
};
pub use policy::PolicyGuard;
pub use progress::{parse_progress_message, MessageKind, ProgressUpdate, ProvisioningProgress, TracingProgress};
pub use settings::{
	MetadataStoreSettings, ProvisioningSettings, Tenancy, DEFAULT_METADATA_FILE,
	DEFAULT_METADATA_LIBRARY, DEFAULT_SITE_TEMPLATE,
};
pub use site::{SiteClient, SiteConnector, GROUP_ID_PROPERTY};
pub use site_url::{resolve_site_url, tenant_root};
pub use templates::{DirectoryTemplateRepository, TemplateProviderRegistry, TemplateRepository};
pub use tenant::{SiteDescriptor, TenantAdmin};
