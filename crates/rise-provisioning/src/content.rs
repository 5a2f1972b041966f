// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Object storage for shared provisioning files, with optimistic versioning.

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::ContentStoreError;

/// Opaque version tag of a stored object.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ETag(String);

impl ETag {
	pub fn new(tag: impl Into<String>) -> Self {
		Self(tag.into())
	}

	pub fn as_str(&self) -> &str {
		&self.0
	}
}

impl fmt::Display for ETag {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.0)
	}
}

/// A file in a document library of a tenant's infrastructure site.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ObjectLocation {
	pub tenant_id: String,
	pub site_url: String,
	pub library: String,
	pub name: String,
}

impl ObjectLocation {
	/// Same library, different file name.
	pub fn sibling(&self, name: impl Into<String>) -> Self {
		Self {
			name: name.into(),
			..self.clone()
		}
	}
}

impl fmt::Display for ObjectLocation {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}/{}/{}", self.site_url.trim_end_matches('/'), self.library, self.name)
	}
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StoredObject {
	pub bytes: Vec<u8>,
	pub etag: ETag,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum WritePrecondition {
	/// Overwrite unconditionally, creating the object if needed.
	Any,
	/// Write only if the stored object still carries this tag.
	IfMatch(ETag),
}

#[async_trait]
pub trait ContentStore: Send + Sync {
	/// `Ok(None)` when the object does not exist.
	async fn read(&self, location: &ObjectLocation) -> Result<Option<StoredObject>, ContentStoreError>;

	/// Returns the new tag. A failed precondition is
	/// [`ContentStoreError::Conflict`].
	async fn write(
		&self,
		location: &ObjectLocation,
		bytes: &[u8],
		precondition: WritePrecondition,
	) -> Result<ETag, ContentStoreError>;
}
