// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Configuration sources: defaults, TOML file, environment, CLI overrides.

use std::collections::BTreeMap;
use std::path::PathBuf;

use rise_common_secret::load_secret_env;
use tracing::{debug, trace};

use crate::error::ConfigError;
use crate::layer::ProvisioningConfigLayer;
use crate::sections::{
	GraphConfigLayer, LogFormat, LoggingConfigLayer, MetadataStoreConfigLayer, TenancyConfigLayer,
};

/// System-wide config file.
pub const SYSTEM_CONFIG_PATH: &str = "/etc/rise/provisioning.toml";

/// Source precedence levels (higher = overrides lower).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Precedence {
	Defaults = 10,
	ConfigFile = 20,
	Environment = 50,
	Cli = 60,
}

/// Trait for configuration sources.
pub trait ConfigSource: Send + Sync {
	/// Name for logging
	fn name(&self) -> &'static str;

	fn precedence(&self) -> Precedence;

	fn load(&self) -> Result<ProvisioningConfigLayer, ConfigError>;
}

/// Built-in defaults; values are applied during finalization.
pub struct DefaultsSource;

impl ConfigSource for DefaultsSource {
	fn name(&self) -> &'static str {
		"defaults"
	}

	fn precedence(&self) -> Precedence {
		Precedence::Defaults
	}

	fn load(&self) -> Result<ProvisioningConfigLayer, ConfigError> {
		debug!("loading defaults");
		Ok(ProvisioningConfigLayer::default())
	}
}

/// TOML file source. A missing file yields an empty layer.
pub struct TomlSource {
	path: PathBuf,
}

impl TomlSource {
	pub fn new(path: impl Into<PathBuf>) -> Self {
		Self { path: path.into() }
	}

	pub fn system() -> Self {
		Self::new(SYSTEM_CONFIG_PATH)
	}
}

impl ConfigSource for TomlSource {
	fn name(&self) -> &'static str {
		"config-file"
	}

	fn precedence(&self) -> Precedence {
		Precedence::ConfigFile
	}

	fn load(&self) -> Result<ProvisioningConfigLayer, ConfigError> {
		if !self.path.exists() {
			debug!(path = %self.path.display(), "config file not found, skipping");
			return Ok(ProvisioningConfigLayer::default());
		}

		debug!(path = %self.path.display(), "loading config file");
		let content = std::fs::read_to_string(&self.path).map_err(|e| ConfigError::FileRead {
			path: self.path.clone(),
			source: e,
		})?;

		toml::from_str(&content).map_err(|e| ConfigError::TomlParse {
			path: self.path.clone(),
			source: e,
		})
	}
}

/// Environment variable source.
///
/// Convention: `RISE_<SECTION>_<FIELD>`. The graph client secret goes through
/// `load_secret_env`, so `RISE_GRAPH_CLIENT_SECRET_FILE` works as well.
pub struct EnvSource;

impl ConfigSource for EnvSource {
	fn name(&self) -> &'static str {
		"environment"
	}

	fn precedence(&self) -> Precedence {
		Precedence::Environment
	}

	fn load(&self) -> Result<ProvisioningConfigLayer, ConfigError> {
		debug!("loading environment variables");

		let tenancy = TenancyConfigLayer {
			single_tenant: env_bool("RISE_TENANCY_SINGLE_TENANT")?,
			infrastructure_site_url: env_var("RISE_TENANCY_INFRASTRUCTURE_SITE_URL"),
			tenants: env_tenants("RISE_TENANCY_TENANTS")?,
			default_site_template: env_var("RISE_TENANCY_DEFAULT_SITE_TEMPLATE"),
		};

		let client_secret = load_secret_env("RISE_GRAPH_CLIENT_SECRET")
			.map_err(|e| ConfigError::Secret(e.to_string()))?;
		if client_secret.is_some() {
			trace!("loaded graph client secret from environment");
		}
		let graph = GraphConfigLayer {
			client_id: env_var("RISE_GRAPH_CLIENT_ID"),
			client_secret,
			authority_url: env_var("RISE_GRAPH_AUTHORITY_URL"),
			graph_base_url: env_var("RISE_GRAPH_BASE_URL"),
			scope: env_var("RISE_GRAPH_SCOPE"),
		};

		let metadata_store = MetadataStoreConfigLayer {
			file_name: env_var("RISE_METADATA_STORE_FILE_NAME"),
			library: env_var("RISE_METADATA_STORE_LIBRARY"),
			local_root: env_var("RISE_METADATA_STORE_LOCAL_ROOT").map(PathBuf::from),
			max_conflict_retries: env_u32("RISE_METADATA_STORE_MAX_CONFLICT_RETRIES")?,
		};

		let logging = LoggingConfigLayer {
			level: env_var("RISE_LOGGING_LEVEL"),
			format: env_parse::<LogFormat>("RISE_LOGGING_FORMAT")?,
		};

		Ok(ProvisioningConfigLayer {
			tenancy: Some(tenancy),
			graph: Some(graph),
			metadata_store: Some(metadata_store),
			logging: Some(logging),
		})
	}
}

/// Command-line overrides, highest precedence.
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
	pub log_level: Option<String>,
	pub log_format: Option<LogFormat>,
	pub local_root: Option<PathBuf>,
}

pub struct CliSource {
	overrides: CliOverrides,
}

impl CliSource {
	pub fn new(overrides: CliOverrides) -> Self {
		Self { overrides }
	}
}

impl ConfigSource for CliSource {
	fn name(&self) -> &'static str {
		"cli"
	}

	fn precedence(&self) -> Precedence {
		Precedence::Cli
	}

	fn load(&self) -> Result<ProvisioningConfigLayer, ConfigError> {
		let overrides = self.overrides.clone();
		Ok(ProvisioningConfigLayer {
			logging: Some(LoggingConfigLayer {
				level: overrides.log_level,
				format: overrides.log_format,
			}),
			metadata_store: Some(MetadataStoreConfigLayer {
				local_root: overrides.local_root,
				..Default::default()
			}),
			..Default::default()
		})
	}
}

fn env_var(key: &str) -> Option<String> {
	std::env::var(key)
		.ok()
		.map(|v| v.trim().to_string())
		.filter(|v| !v.is_empty())
}

fn env_bool(key: &str) -> Result<Option<bool>, ConfigError> {
	match env_var(key) {
		None => Ok(None),
		Some(v) => match v.to_ascii_lowercase().as_str() {
			"true" | "1" | "yes" => Ok(Some(true)),
			"false" | "0" | "no" => Ok(Some(false)),
			_ => Err(ConfigError::InvalidValue {
				key: key.to_string(),
				message: format!("expected a boolean, got {v:?}"),
			}),
		},
	}
}

fn env_u32(key: &str) -> Result<Option<u32>, ConfigError> {
	env_parse::<u32>(key)
}

fn env_parse<T>(key: &str) -> Result<Option<T>, ConfigError>
where
	T: std::str::FromStr,
	T::Err: std::fmt::Display,
{
	env_var(key)
		.map(|v| {
			v.parse::<T>().map_err(|e| ConfigError::InvalidValue {
				key: key.to_string(),
				message: e.to_string(),
			})
		})
		.transpose()
}

fn env_tenants(key: &str) -> Result<Option<BTreeMap<String, String>>, ConfigError> {
	env_var(key).map(|v| parse_tenant_map(key, &v)).transpose()
}

/// Parses `id=url,id=url`.
pub(crate) fn parse_tenant_map(
	key: &str,
	value: &str,
) -> Result<BTreeMap<String, String>, ConfigError> {
	value
		.split(',')
		.map(str::trim)
		.filter(|pair| !pair.is_empty())
		.map(|pair| match pair.split_once('=') {
			Some((id, url)) if !id.trim().is_empty() && !url.trim().is_empty() => {
				Ok((id.trim().to_string(), url.trim().to_string()))
			}
			_ => Err(ConfigError::InvalidValue {
				key: key.to_string(),
				message: format!("expected tenant=url, got {pair:?}"),
			}),
		})
		.collect()
}
