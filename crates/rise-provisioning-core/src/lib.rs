// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Domain model for Rise site provisioning.
//!
//! Everything in this crate is plain data plus pure transformations. Remote
//! calls live in `rise-provisioning` and `rise-graph`.
//!
//! - [`job`]: the dispatched job envelope and its payload kinds
//! - [`metadata`]: core-metadata payload and its property-bag encoding
//! - [`template`]: the subset of a provisioning template the orchestrator edits
//! - [`document`]: the Loki database dump that maps sites to menus

pub mod document;
pub mod error;
pub mod job;
pub mod metadata;
pub mod template;

pub use document::{
	backup_name, decode_document, encode_document, AppendOutcome, Collection, Entry, EntryMeta,
	MenuKind, MetadataDocument, BACKUP_SUFFIX, GLOBAL_WRAPPER_PREFIX,
};
pub use error::{CoreMetadataError, DocumentError};
pub use job::{
	ApplyTemplateJob, BrandingJob, JobId, JobPayload, JobStatus, ProvisioningJob,
	SiteCollectionJob, SubSiteJob,
};
pub use metadata::{CoreMetadata, MetadataTerm, PropertyBagEntry, PROPERTY_KEY_PREFIX};
pub use template::{
	CurrentNavigation, CurrentNavigationType, GlobalNavigation, GlobalNavigationType, Handler,
	HandlerSet, ManagedNavigation, Navigation, NavigationNode, SiteTemplateInfo,
	StructuralNavigation, Template, WebSettings, GROUP_SITE_TEMPLATE,
};
