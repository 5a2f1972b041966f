// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Layered configuration for rise provisioning.
//!
//! Sources are merged lowest precedence first:
//!
//! 1. built-in defaults
//! 2. a TOML file (`/etc/rise/provisioning.toml` unless a path is given)
//! 3. `RISE_<SECTION>_<FIELD>` environment variables
//! 4. command-line overrides
//!
//! The merged layer is then finalized into [`ProvisioningConfig`], which is
//! validated before it is returned.

pub mod error;
pub mod layer;
pub mod sections;
pub mod sources;

use std::path::Path;

use serde::Serialize;
use tracing::{debug, info};

pub use error::ConfigError;
pub use layer::ProvisioningConfigLayer;
pub use sections::{
	GraphConfig, GraphConfigLayer, LogFormat, LoggingConfig, LoggingConfigLayer,
	MetadataStoreConfig, MetadataStoreConfigLayer, TenancyConfig, TenancyConfigLayer,
};
pub use sources::{
	CliOverrides, CliSource, ConfigSource, DefaultsSource, EnvSource, Precedence, TomlSource,
	SYSTEM_CONFIG_PATH,
};

/// Finalized provisioning configuration.
#[derive(Debug, Clone, Serialize)]
pub struct ProvisioningConfig {
	pub tenancy: TenancyConfig,
	pub graph: GraphConfig,
	pub metadata_store: MetadataStoreConfig,
	pub logging: LoggingConfig,
}

impl ProvisioningConfigLayer {
	/// Applies defaults and validates every section.
	pub fn finalize(self) -> Result<ProvisioningConfig, ConfigError> {
		Ok(ProvisioningConfig {
			tenancy: self.tenancy.unwrap_or_default().build()?,
			graph: self.graph.unwrap_or_default().build()?,
			metadata_store: self.metadata_store.unwrap_or_default().build()?,
			logging: self.logging.unwrap_or_default().finalize(),
		})
	}
}

/// Load from defaults, the system config file and the environment.
pub fn load_config() -> Result<ProvisioningConfig, ConfigError> {
	load_config_with(None, CliOverrides::default())
}

/// Load using `path` in place of the system config file.
pub fn load_config_with_file(path: &Path) -> Result<ProvisioningConfig, ConfigError> {
	load_config_with(Some(path), CliOverrides::default())
}

/// Load from defaults and the environment only.
pub fn load_config_from_env() -> Result<ProvisioningConfig, ConfigError> {
	load_from_sources(vec![Box::new(DefaultsSource), Box::new(EnvSource)])
}

/// Full load used by the CLI: optional file, environment and overrides.
pub fn load_config_with(
	path: Option<&Path>,
	overrides: CliOverrides,
) -> Result<ProvisioningConfig, ConfigError> {
	let file = match path {
		Some(path) => TomlSource::new(path),
		None => TomlSource::system(),
	};
	load_from_sources(vec![
		Box::new(DefaultsSource),
		Box::new(file),
		Box::new(EnvSource),
		Box::new(CliSource::new(overrides)),
	])
}

/// Merge `sources` by precedence, then finalize.
pub fn load_from_sources(
	mut sources: Vec<Box<dyn ConfigSource>>,
) -> Result<ProvisioningConfig, ConfigError> {
	sources.sort_by_key(|s| s.precedence());

	let mut merged = ProvisioningConfigLayer::default();
	for source in &sources {
		debug!(source = source.name(), "merging config source");
		merged.merge(source.load()?);
	}

	let config = merged.finalize()?;
	info!(
		single_tenant = config.tenancy.single_tenant,
		tenants = config.tenancy.tenants.len(),
		graph_configured = config.graph.credentials().is_some(),
		metadata_file = %config.metadata_store.file_name,
		"configuration loaded"
	);
	Ok(config)
}

#[cfg(test)]
mod tests {
	use super::*;
	use proptest::prelude::*;
	use std::io::Write;

	struct StaticSource(Precedence, ProvisioningConfigLayer);

	impl ConfigSource for StaticSource {
		fn name(&self) -> &'static str {
			"static"
		}
		fn precedence(&self) -> Precedence {
			self.0
		}
		fn load(&self) -> Result<ProvisioningConfigLayer, ConfigError> {
			Ok(self.1.clone())
		}
	}

	fn tenancy_layer(url: &str) -> ProvisioningConfigLayer {
		ProvisioningConfigLayer {
			tenancy: Some(TenancyConfigLayer {
				infrastructure_site_url: Some(url.to_string()),
				..Default::default()
			}),
			..Default::default()
		}
	}

	#[test]
	fn file_values_are_finalized_with_defaults() {
		let mut file = tempfile::NamedTempFile::new().unwrap();
		write!(
			file,
			r#"
[tenancy]
infrastructure_site_url = "https://contoso.sharepoint.com/sites/infrastructure"

[metadata_store]
library = "menus"

[logging]
format = "compact"
"#
		)
		.unwrap();

		let config = load_from_sources(vec![
			Box::new(DefaultsSource),
			Box::new(TomlSource::new(file.path())),
		])
		.unwrap();

		assert_eq!(
			config.tenancy.infrastructure_site_for("contoso"),
			Some("https://contoso.sharepoint.com/sites/infrastructure")
		);
		assert_eq!(config.tenancy.default_site_template, "STS#0");
		assert_eq!(config.metadata_store.library, "menus");
		assert_eq!(config.metadata_store.file_name, "Global.json.js");
		assert_eq!(config.logging.format, LogFormat::Compact);
		assert!(config.graph.credentials().is_none());
	}

	#[test]
	fn higher_precedence_wins_regardless_of_order() {
		let config = load_from_sources(vec![
			Box::new(StaticSource(
				Precedence::Cli,
				tenancy_layer("https://winner.sharepoint.com/sites/infra"),
			)),
			Box::new(StaticSource(
				Precedence::ConfigFile,
				tenancy_layer("https://loser.sharepoint.com/sites/infra"),
			)),
		])
		.unwrap();

		assert_eq!(
			config.tenancy.infrastructure_site_url.as_deref(),
			Some("https://winner.sharepoint.com/sites/infra")
		);
	}

	#[test]
	fn missing_infrastructure_site_fails_validation() {
		let err = load_from_sources(vec![Box::new(DefaultsSource)]).unwrap_err();
		assert!(matches!(err, ConfigError::Validation(_)));
	}

	#[test]
	fn serialized_config_redacts_client_secret() {
		let mut layer = tenancy_layer("https://contoso.sharepoint.com/sites/infra");
		layer.graph = Some(GraphConfigLayer {
			client_id: Some("app-1".to_string()),
			client_secret: Some(rise_common_secret::SecretString::new("s3cret".to_string())),
			..Default::default()
		});

		let rendered = toml::to_string(&layer.finalize().unwrap()).unwrap();

		assert!(!rendered.contains("s3cret"));
		assert!(rendered.contains(rise_common_secret::REDACTED));
		assert!(rendered.contains("app-1"));
	}

	proptest! {
		/// **Property: later layers override field-wise**
		#[test]
		fn retries_follow_highest_source_that_sets_them(
			file in proptest::option::of(0u32..10),
			cli in proptest::option::of(0u32..10),
		) {
			let layer = |retries| {
				let mut layer = tenancy_layer("https://contoso.sharepoint.com/sites/infra");
				layer.metadata_store = Some(MetadataStoreConfigLayer {
					max_conflict_retries: retries,
					..Default::default()
				});
				layer
			};
			let config = load_from_sources(vec![
				Box::new(StaticSource(Precedence::ConfigFile, layer(file))),
				Box::new(StaticSource(Precedence::Cli, layer(cli))),
			]).unwrap();

			prop_assert_eq!(config.metadata_store.max_conflict_retries, cli.or(file).unwrap_or(3));
		}
	}
}
