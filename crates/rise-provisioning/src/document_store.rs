// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Backup-before-overwrite upsert into the shared metadata document.
//!
//! Every attempt:
//!
//! 1. reads the document and keeps the exact bytes and their ETag
//! 2. appends the entry to each collection with the target name, or creates
//!    the collection
//! 3. writes the original bytes to `<name>_provisioning_backup`
//! 4. writes the new document only if the ETag is unchanged
//!
//! A lost race in step 4 starts a new attempt from fresh content, up to
//! `max_conflict_retries` extra attempts.

use std::sync::Arc;

use rise_provisioning_core::document::backup_name;
use rise_provisioning_core::{decode_document, encode_document, AppendOutcome, Entry};
use tracing::{debug, info, instrument, warn};

use crate::content::{ContentStore, ETag, ObjectLocation, WritePrecondition};
use crate::error::{ContentStoreError, DocumentStoreError};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UpsertReport {
	pub collection: String,
	pub outcome: AppendOutcome,
	pub etag: ETag,
	pub attempts: u32,
}

#[derive(Clone)]
pub struct DocumentStore {
	content: Arc<dyn ContentStore>,
	max_conflict_retries: u32,
}

impl DocumentStore {
	pub fn new(content: Arc<dyn ContentStore>) -> Self {
		Self {
			content,
			max_conflict_retries: 3,
		}
	}

	pub fn with_max_conflict_retries(mut self, retries: u32) -> Self {
		self.max_conflict_retries = retries;
		self
	}

	/// Appends `entry` to the collection called `collection`. Duplicate
	/// entries are not detected.
	#[instrument(skip(self, entry), fields(document = %location, collection = %collection))]
	pub async fn upsert_entry(
		&self,
		location: &ObjectLocation,
		collection: &str,
		entry: Entry,
	) -> Result<UpsertReport, DocumentStoreError> {
		let backup = location.sibling(backup_name(&location.name));
		let max_attempts = self.max_conflict_retries.saturating_add(1);
		let mut attempt = 0;

		loop {
			attempt += 1;

			let current = self
				.content
				.read(location)
				.await?
				.ok_or_else(|| DocumentStoreError::NotFound {
					name: location.name.clone(),
				})?;

			let mut document = decode_document(&current.bytes)?;
			let outcome = document.append_entry(collection, entry.clone())?;
			let updated = encode_document(&document)?;

			debug!(attempt, backup = %backup.name, "writing backup");
			self
				.content
				.write(&backup, &current.bytes, WritePrecondition::Any)
				.await?;

			let written = self
				.content
				.write(location, &updated, WritePrecondition::IfMatch(current.etag))
				.await;

			match written {
				Ok(etag) => {
					info!(attempt, ?outcome, "metadata document updated");
					return Ok(UpsertReport {
						collection: collection.to_string(),
						outcome,
						etag,
						attempts: attempt,
					});
				}
				Err(ContentStoreError::Conflict { .. }) if attempt < max_attempts => {
					warn!(attempt, max_attempts, "metadata document changed underneath us, retrying");
				}
				Err(ContentStoreError::Conflict { .. }) => {
					return Err(DocumentStoreError::ConflictRetriesExhausted {
						name: location.name.clone(),
						attempts: attempt,
					});
				}
				Err(e) => return Err(e.into()),
			}
		}
	}

	/// Copies `<name>_provisioning_backup` back over `<name>`.
	#[instrument(skip(self), fields(document = %location))]
	pub async fn restore_backup(&self, location: &ObjectLocation) -> Result<ETag, DocumentStoreError> {
		let backup = location.sibling(backup_name(&location.name));
		let object = self
			.content
			.read(&backup)
			.await?
			.ok_or_else(|| DocumentStoreError::NotFound {
				name: backup.name.clone(),
			})?;

		decode_document(&object.bytes)?;

		let etag = self
			.content
			.write(location, &object.bytes, WritePrecondition::Any)
			.await?;
		info!(etag = %etag, "metadata document restored from backup");
		Ok(etag)
	}
}
