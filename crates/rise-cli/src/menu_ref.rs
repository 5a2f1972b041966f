// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! `rise menu-ref`: menu reference maintenance against the on-disk content
//! store.

use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::Utc;
use rise_provisioning::{
	DocumentStore, ETag, LocalContentStore, ObjectLocation, ProvisioningSettings, UpsertReport,
};
use rise_provisioning_core::{Entry, MenuKind};
use tracing::info;

pub struct MenuRefs {
	settings: ProvisioningSettings,
	store: DocumentStore,
}

impl MenuRefs {
	pub fn new(settings: ProvisioningSettings, content: LocalContentStore) -> Self {
		let store = DocumentStore::new(Arc::new(content))
			.with_max_conflict_retries(settings.metadata_store.max_conflict_retries);
		Self { settings, store }
	}

	fn location(&self, tenant_id: &str) -> Result<ObjectLocation> {
		self
			.settings
			.metadata_location(tenant_id)
			.with_context(|| format!("no metadata document for tenant {tenant_id}"))
	}

	/// Appends a site-to-menu mapping. Running it twice adds two entries.
	pub async fn add(
		&self,
		tenant_id: &str,
		site_id: &str,
		menu_id: &str,
		kind: MenuKind,
	) -> Result<UpsertReport> {
		let location = self.location(tenant_id)?;
		let entry = Entry::menu_reference(site_id, menu_id, Utc::now().timestamp_millis());

		let report = self
			.store
			.upsert_entry(&location, kind.collection_name(), entry)
			.await
			.with_context(|| format!("failed to update {location}"))?;

		info!(
			tenant_id,
			collection = %report.collection,
			attempts = report.attempts,
			"menu reference added"
		);
		Ok(report)
	}

	/// Puts the last backup back in place of the metadata document.
	pub async fn restore(&self, tenant_id: &str) -> Result<ETag> {
		let location = self.location(tenant_id)?;
		self
			.store
			.restore_backup(&location)
			.await
			.with_context(|| format!("failed to restore {location}"))
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::settings::provisioning_settings;
	use crate::settings::tests::config_with_root;
	use rise_provisioning_core::{backup_name, decode_document};
	use std::path::{Path, PathBuf};
	use tempfile::TempDir;

	const SEED: &str = r#"window.lokiFiles['Global'] = {
		"filename": "Global",
		"collections": [
			{ "name": "MenuMapping", "data": [], "idIndex": [], "maxId": 0 }
		]
	};"#;

	fn document_path(root: &Path, name: &str) -> PathBuf {
		root.join("contoso").join("riseData").join(name)
	}

	fn seeded() -> (TempDir, MenuRefs) {
		let dir = TempDir::new().unwrap();
		let path = document_path(dir.path(), "Global.json.js");
		std::fs::create_dir_all(path.parent().unwrap()).unwrap();
		std::fs::write(&path, SEED).unwrap();

		let settings = provisioning_settings(&config_with_root(dir.path())).unwrap();
		let refs = MenuRefs::new(settings, LocalContentStore::new(dir.path()));
		(dir, refs)
	}

	fn read_document(root: &Path) -> rise_provisioning_core::MetadataDocument {
		let bytes = std::fs::read(document_path(root, "Global.json.js")).unwrap();
		decode_document(&bytes).unwrap()
	}

	#[tokio::test]
	async fn add_appends_main_and_footer_references() {
		let (dir, refs) = seeded();

		refs.add("contoso", "web-1", "menu-main", MenuKind::Main).await.unwrap();
		refs.add("contoso", "web-1", "menu-footer", MenuKind::Footer).await.unwrap();

		let document = read_document(dir.path());
		let main = document.collection("MenuMapping").unwrap().unwrap().entries().unwrap();
		assert_eq!(main.len(), 1);
		assert_eq!(main[0].menu_id.as_deref(), Some("menu-main"));
		assert_eq!(main[0].loki, Some(1));
		let footer = document.collection("FooterMapping").unwrap().unwrap().entries().unwrap();
		assert_eq!(footer[0].site_id.as_deref(), Some("web-1"));
	}

	#[tokio::test]
	async fn repeated_add_is_not_deduplicated() {
		let (dir, refs) = seeded();

		refs.add("contoso", "web-1", "menu-main", MenuKind::Main).await.unwrap();
		refs.add("contoso", "web-1", "menu-main", MenuKind::Main).await.unwrap();

		let document = read_document(dir.path());
		assert_eq!(document.collection("MenuMapping").unwrap().unwrap().data.len(), 2);
	}

	#[tokio::test]
	async fn restore_reverts_the_last_add() {
		let (dir, refs) = seeded();

		refs.add("contoso", "web-1", "menu-main", MenuKind::Main).await.unwrap();
		assert!(document_path(dir.path(), &backup_name("Global.json.js")).exists());

		refs.restore("contoso").await.unwrap();

		let document = read_document(dir.path());
		assert!(document.collection("MenuMapping").unwrap().unwrap().data.is_empty());
	}

	#[tokio::test]
	async fn missing_document_is_an_error() {
		let dir = TempDir::new().unwrap();
		let settings = provisioning_settings(&config_with_root(dir.path())).unwrap();
		let refs = MenuRefs::new(settings, LocalContentStore::new(dir.path()));

		let err = refs
			.add("contoso", "web-1", "menu-main", MenuKind::Main)
			.await
			.unwrap_err();

		assert!(format!("{err:#}").contains("failed to update"));
	}
}
