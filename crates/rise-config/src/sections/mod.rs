// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Configuration sections for rise provisioning.

pub mod graph;
pub mod logging;
pub mod metadata_store;
pub mod tenancy;

pub use graph::{GraphConfig, GraphConfigLayer};
pub use logging::{LogFormat, LoggingConfig, LoggingConfigLayer};
pub use metadata_store::{MetadataStoreConfig, MetadataStoreConfigLayer};
pub use tenancy::{TenancyConfig, TenancyConfigLayer};
