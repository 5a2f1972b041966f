// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Location and write behaviour of the shared menu metadata document.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

fn default_file_name() -> String {
	"Global.json.js".to_string()
}

fn default_library() -> String {
	"riseData".to_string()
}

fn default_local_root() -> PathBuf {
	PathBuf::from("/var/lib/rise/content")
}

fn default_max_conflict_retries() -> u32 {
	3
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct MetadataStoreConfigLayer {
	pub file_name: Option<String>,
	pub library: Option<String>,
	/// Root directory of the on-disk content store used by the CLI.
	pub local_root: Option<PathBuf>,
	pub max_conflict_retries: Option<u32>,
}

impl MetadataStoreConfigLayer {
	pub fn merge(&mut self, other: Self) {
		if other.file_name.is_some() {
			self.file_name = other.file_name;
		}
		if other.library.is_some() {
			self.library = other.library;
		}
		if other.local_root.is_some() {
			self.local_root = other.local_root;
		}
		if other.max_conflict_retries.is_some() {
			self.max_conflict_retries = other.max_conflict_retries;
		}
	}

	pub fn build(self) -> Result<MetadataStoreConfig, ConfigError> {
		let file_name = self.file_name.unwrap_or_else(default_file_name);
		let library = self.library.unwrap_or_else(default_library);

		for (key, value) in [
			("metadata_store.file_name", &file_name),
			("metadata_store.library", &library),
		] {
			if value.trim().is_empty() || value.contains('/') || value.contains('\\') {
				return Err(ConfigError::InvalidValue {
					key: key.to_string(),
					message: format!("{value:?} must be a single non-empty path segment"),
				});
			}
		}

		Ok(MetadataStoreConfig {
			file_name,
			library,
			local_root: self.local_root.unwrap_or_else(default_local_root),
			max_conflict_retries: self
				.max_conflict_retries
				.unwrap_or_else(default_max_conflict_retries),
		})
	}
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct MetadataStoreConfig {
	pub file_name: String,
	pub library: String,
	pub local_root: PathBuf,
	pub max_conflict_retries: u32,
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn defaults() {
		let config = MetadataStoreConfigLayer::default().build().unwrap();
		assert_eq!(config.file_name, "Global.json.js");
		assert_eq!(config.library, "riseData");
		assert_eq!(config.local_root, PathBuf::from("/var/lib/rise/content"));
		assert_eq!(config.max_conflict_retries, 3);
	}

	#[test]
	fn zero_retries_is_allowed() {
		let layer = MetadataStoreConfigLayer {
			max_conflict_retries: Some(0),
			..Default::default()
		};
		assert_eq!(layer.build().unwrap().max_conflict_retries, 0);
	}

	#[test]
	fn nested_file_names_are_rejected() {
		let layer = MetadataStoreConfigLayer {
			file_name: Some("menus/Global.json.js".to_string()),
			..Default::default()
		};
		assert!(matches!(
			layer.build(),
			Err(ConfigError::InvalidValue { key, .. }) if key == "metadata_store.file_name"
		));
	}

	#[test]
	fn deserialize_partial_layer() {
		let layer: MetadataStoreConfigLayer = toml::from_str(
			r#"
library = "menus"
max_conflict_retries = 5
"#,
		)
		.unwrap();
		assert_eq!(layer.library.as_deref(), Some("menus"));
		assert_eq!(layer.max_conflict_retries, Some(5));
		assert!(layer.file_name.is_none());
	}
}
