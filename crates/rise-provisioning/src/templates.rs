// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Template providers and the per-tenant registry that names them.

use std::collections::BTreeMap;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use rise_provisioning_core::Template;
use tracing::debug;

use crate::error::TemplateError;

#[async_trait]
pub trait TemplateRepository: Send + Sync {
	fn display_name(&self) -> &str;

	/// `Ok(None)` when the provider has no template at `template_uri`.
	async fn resolve(
		&self,
		template_uri: &str,
		tenant_id: &str,
	) -> Result<Option<Template>, TemplateError>;
}

/// Providers keyed by the name jobs refer to them with.
#[derive(Clone, Default)]
pub struct TemplateProviderRegistry {
	providers: BTreeMap<String, Arc<dyn TemplateRepository>>,
}

impl TemplateProviderRegistry {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn register(mut self, name: impl Into<String>, provider: Arc<dyn TemplateRepository>) -> Self {
		self.providers.insert(name.into(), provider);
		self
	}

	pub fn get(&self, name: &str) -> Option<&Arc<dyn TemplateRepository>> {
		self.providers.get(name)
	}

	pub fn names(&self) -> impl Iterator<Item = &str> {
		self.providers.keys().map(String::as_str)
	}
}

/// Serves JSON templates from a directory, `template_uri` being a relative
/// path below it. The tenant is ignored.
pub struct DirectoryTemplateRepository {
	name: String,
	root: PathBuf,
}

impl DirectoryTemplateRepository {
	pub fn new(name: impl Into<String>, root: impl Into<PathBuf>) -> Self {
		Self {
			name: name.into(),
			root: root.into(),
		}
	}

	fn path_for(&self, template_uri: &str) -> Result<PathBuf, TemplateError> {
		let relative = Path::new(template_uri.trim_start_matches('/'));
		let escapes = relative
			.components()
			.any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
		if escapes {
			return Err(TemplateError::InvalidUri(template_uri.to_string()));
		}
		Ok(self.root.join(relative))
	}
}

#[async_trait]
impl TemplateRepository for DirectoryTemplateRepository {
	fn display_name(&self) -> &str {
		&self.name
	}

	async fn resolve(
		&self,
		template_uri: &str,
		_tenant_id: &str,
	) -> Result<Option<Template>, TemplateError> {
		let path = self.path_for(template_uri)?;
		debug!(path = %path.display(), "loading template");

		let bytes = match tokio::fs::read(&path).await {
			Ok(bytes) => bytes,
			Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
			Err(source) => return Err(TemplateError::Io { path, source }),
		};

		serde_json::from_slice(&bytes)
			.map(Some)
			.map_err(|source| TemplateError::Parse {
				uri: template_uri.to_string(),
				source,
			})
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use tempfile::TempDir;

	#[tokio::test]
	async fn loads_template_from_directory() {
		let dir = TempDir::new().unwrap();
		std::fs::create_dir_all(dir.path().join("teams")).unwrap();
		std::fs::write(
			dir.path().join("teams/project.json"),
			r#"{ "baseSiteTemplate": "STS#0", "parameters": { "Owner": "ops" } }"#,
		)
		.unwrap();

		let repo = DirectoryTemplateRepository::new("local", dir.path());
		let template = repo.resolve("/teams/project.json", "contoso").await.unwrap().unwrap();

		assert_eq!(template.base_site_template.as_deref(), Some("STS#0"));
		assert_eq!(template.parameters["Owner"], "ops");
	}

	#[tokio::test]
	async fn missing_template_resolves_to_none() {
		let dir = TempDir::new().unwrap();
		let repo = DirectoryTemplateRepository::new("local", dir.path());

		assert!(repo.resolve("absent.json", "contoso").await.unwrap().is_none());
	}

	#[tokio::test]
	async fn parent_components_are_rejected() {
		let dir = TempDir::new().unwrap();
		let repo = DirectoryTemplateRepository::new("local", dir.path());

		assert!(matches!(
			repo.resolve("../secrets.json", "contoso").await,
			Err(TemplateError::InvalidUri(_))
		));
	}

	#[tokio::test]
	async fn malformed_template_is_a_parse_error() {
		let dir = TempDir::new().unwrap();
		std::fs::write(dir.path().join("broken.json"), "{").unwrap();
		let repo = DirectoryTemplateRepository::new("local", dir.path());

		assert!(matches!(
			repo.resolve("broken.json", "contoso").await,
			Err(TemplateError::Parse { .. })
		));
	}

	#[test]
	fn registry_looks_up_by_name() {
		let registry = TemplateProviderRegistry::new()
			.register("local", Arc::new(DirectoryTemplateRepository::new("local", "/tmp")));

		assert!(registry.get("local").is_some());
		assert!(registry.get("global").is_none());
		assert_eq!(registry.names().collect::<Vec<_>>(), vec!["local"]);
	}
}
