// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Filesystem-backed [`ContentStore`].
//!
//! Objects live at `<root>/<tenant>/<library>/<name>`. The ETag is the
//! SHA-256 of the content. Writes go to a temporary file that is renamed over
//! the target, and conditional writes are serialized within the process.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use sha2::{Digest, Sha256};
use tokio::fs;
use tokio::sync::Mutex;
use tracing::debug;

use crate::content::{ContentStore, ETag, ObjectLocation, StoredObject, WritePrecondition};
use crate::error::ContentStoreError;

pub struct LocalContentStore {
	root: PathBuf,
	write_lock: Mutex<()>,
}

impl LocalContentStore {
	pub fn new(root: impl Into<PathBuf>) -> Self {
		Self {
			root: root.into(),
			write_lock: Mutex::new(()),
		}
	}

	pub fn root(&self) -> &Path {
		&self.root
	}

	pub fn path_for(&self, location: &ObjectLocation) -> Result<PathBuf, ContentStoreError> {
		for segment in [&location.tenant_id, &location.library, &location.name] {
			if !is_plain_segment(segment) {
				return Err(ContentStoreError::InvalidName {
					name: segment.clone(),
				});
			}
		}
		Ok(self
			.root
			.join(&location.tenant_id)
			.join(&location.library)
			.join(&location.name))
	}

	async fn read_path(&self, path: &Path) -> Result<Option<StoredObject>, ContentStoreError> {
		match fs::read(path).await {
			Ok(bytes) => {
				let etag = content_etag(&bytes);
				Ok(Some(StoredObject { bytes, etag }))
			}
			Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
			Err(source) => Err(ContentStoreError::Io {
				path: path.to_path_buf(),
				source,
			}),
		}
	}
}

fn is_plain_segment(segment: &str) -> bool {
	!segment.is_empty()
		&& segment != "."
		&& segment != ".."
		&& !segment.contains(['/', '\\'])
}

pub fn content_etag(bytes: &[u8]) -> ETag {
	ETag::new(hex::encode(Sha256::digest(bytes)))
}

fn io_error(path: &Path) -> impl FnOnce(std::io::Error) -> ContentStoreError + '_ {
	move |source| ContentStoreError::Io {
		path: path.to_path_buf(),
		source,
	}
}

#[async_trait]
impl ContentStore for LocalContentStore {
	async fn read(&self, location: &ObjectLocation) -> Result<Option<StoredObject>, ContentStoreError> {
		let path = self.path_for(location)?;
		self.read_path(&path).await
	}

	async fn write(
		&self,
		location: &ObjectLocation,
		bytes: &[u8],
		precondition: WritePrecondition,
	) -> Result<ETag, ContentStoreError> {
		let path = self.path_for(location)?;
		let _guard = self.write_lock.lock().await;

		if let WritePrecondition::IfMatch(expected) = &precondition {
			let current = self.read_path(&path).await?;
			if current.map(|object| object.etag).as_ref() != Some(expected) {
				return Err(ContentStoreError::Conflict {
					name: location.name.clone(),
				});
			}
		}

		if let Some(parent) = path.parent() {
			fs::create_dir_all(parent).await.map_err(io_error(parent))?;
		}

		let tmp_path = path.with_file_name(format!("{}.tmp", location.name));
		fs::write(&tmp_path, bytes).await.map_err(io_error(&tmp_path))?;
		fs::rename(&tmp_path, &path).await.map_err(io_error(&path))?;

		let etag = content_etag(bytes);
		debug!(path = %path.display(), etag = %etag, "object written");
		Ok(etag)
	}
}
