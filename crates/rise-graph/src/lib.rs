// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Directory service collaborators used after a template is applied.
//!
//! - [`ClientCredentialsTokenBroker`] exchanges the app registration's client
//!   secret for a bearer token per tenant.
//! - [`GraphExtensionClient`] stores core metadata as an open-type extension
//!   on the group behind a group-backed site.
//!
//! Both sit behind traits so the orchestrator can be exercised with fakes.

mod error;
mod extension;
mod token;

pub use error::GraphError;
pub use extension::{
	DirectoryClient, GraphExtensionClient, CORE_METADATA_EXTENSION, DEFAULT_GRAPH_BASE_URL,
	OPEN_EXTENSION_TYPE,
};
pub use token::{
	ClientCredentialsTokenBroker, TokenBroker, DEFAULT_AUTHORITY_URL, DEFAULT_GRAPH_SCOPE,
};
