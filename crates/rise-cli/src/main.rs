// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

mod customize;
mod menu_ref;
mod settings;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use rise_config::{
	load_config_with, CliOverrides, LogFormat, LoggingConfig, LoggingConfigLayer, ProvisioningConfig,
};
use rise_provisioning::LocalContentStore;
use rise_provisioning_core::{AppendOutcome, MenuKind};
use tracing::debug;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::menu_ref::MenuRefs;

/// Rise - site provisioning operator tools
#[derive(Parser, Debug)]
#[command(name = "rise", version, about, long_about = None)]
struct Args {
	/// Path to configuration file (defaults to /etc/rise/provisioning.toml)
	#[arg(short, long)]
	config: Option<PathBuf>,

	/// Log level (overrides config)
	#[arg(short, long)]
	log_level: Option<String>,

	/// Output logs as JSON (overrides config)
	#[arg(long)]
	json_logs: bool,

	/// Root of the on-disk content store (overrides config)
	#[arg(long)]
	local_root: Option<PathBuf>,

	#[command(subcommand)]
	command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
	/// Print the template a job would apply, without contacting a tenant
	Customize {
		/// Template JSON file
		#[arg(long)]
		template: PathBuf,
		/// Site collection job JSON file
		#[arg(long)]
		job: PathBuf,
	},
	/// Maintain menu references in the shared metadata document
	#[command(name = "menu-ref", subcommand)]
	MenuRef(MenuRefCommand),
	/// Inspect configuration
	#[command(subcommand)]
	Config(ConfigCommand),
}

#[derive(Subcommand, Debug)]
enum MenuRefCommand {
	/// Append a site-to-menu mapping
	Add {
		tenant: String,
		/// Web id of the site
		#[arg(long)]
		site_id: String,
		#[arg(long)]
		menu_id: String,
		/// Record a footer menu instead of the main menu
		#[arg(long)]
		footer: bool,
	},
	/// Copy the provisioning backup back over the metadata document
	Restore { tenant: String },
}

#[derive(Subcommand, Debug)]
enum ConfigCommand {
	/// Print the effective configuration with secrets redacted
	Show,
}

impl From<&Args> for CliOverrides {
	fn from(args: &Args) -> Self {
		CliOverrides {
			log_level: args.log_level.clone(),
			log_format: args.json_logs.then_some(LogFormat::Json),
			local_root: args.local_root.clone(),
		}
	}
}

fn init_tracing(logging: &LoggingConfig) {
	let filter =
		EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));

	match logging.format {
		LogFormat::Json => {
			tracing_subscriber::registry()
				.with(filter)
				.with(fmt::layer().json().with_writer(std::io::stderr))
				.init();
		}
		LogFormat::Compact => {
			tracing_subscriber::registry()
				.with(filter)
				.with(fmt::layer().compact().with_writer(std::io::stderr))
				.init();
		}
		LogFormat::Pretty => {
			tracing_subscriber::registry()
				.with(filter)
				.with(fmt::layer().with_writer(std::io::stderr))
				.init();
		}
	}
}

/// Logging for commands that run without a tenant configuration.
fn offline_logging(overrides: &CliOverrides) -> LoggingConfig {
	LoggingConfigLayer {
		level: overrides.log_level.clone(),
		format: overrides.log_format,
	}
	.finalize()
}

fn load(args: &Args) -> Result<ProvisioningConfig> {
	let config = load_config_with(args.config.as_deref(), CliOverrides::from(args))
		.context("failed to load configuration")?;
	init_tracing(&config.logging);
	Ok(config)
}

#[tokio::main]
async fn main() -> Result<()> {
	let args = Args::parse();

	match &args.command {
		Command::Customize { template, job } => {
			init_tracing(&offline_logging(&CliOverrides::from(&args)));
			let output = customize::run(template, job)?;
			println!("{}", serde_json::to_string_pretty(&output)?);
		}
		Command::MenuRef(command) => {
			let config = load(&args)?;
			debug!(root = %config.metadata_store.local_root.display(), "using local content store");
			let refs = MenuRefs::new(
				settings::provisioning_settings(&config)?,
				LocalContentStore::new(&config.metadata_store.local_root),
			);

			match command {
				MenuRefCommand::Add {
					tenant,
					site_id,
					menu_id,
					footer,
				} => {
					let kind = if *footer { MenuKind::Footer } else { MenuKind::Main };
					let report = refs.add(tenant, site_id, menu_id, kind).await?;
					let placement = match report.outcome {
						AppendOutcome::Appended { collections } => {
							format!("appended to {collections} {} collection(s)", report.collection)
						}
						AppendOutcome::CreatedCollection => {
							format!("created collection {}", report.collection)
						}
					};
					println!("{placement}; etag {}", report.etag);
				}
				MenuRefCommand::Restore { tenant } => {
					let etag = refs.restore(tenant).await?;
					println!("restored metadata document; etag {etag}");
				}
			}
		}
		Command::Config(ConfigCommand::Show) => {
			let config = load(&args)?;
			print!(
				"{}",
				toml::to_string_pretty(&config).context("failed to render configuration")?
			);
		}
	}

	Ok(())
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn args_parse_menu_ref_add() {
		let args = Args::try_parse_from([
			"rise",
			"--json-logs",
			"menu-ref",
			"add",
			"contoso",
			"--site-id",
			"web-1",
			"--menu-id",
			"menu-9",
			"--footer",
		])
		.unwrap();

		let overrides = CliOverrides::from(&args);
		assert_eq!(overrides.log_format, Some(LogFormat::Json));
		match args.command {
			Command::MenuRef(MenuRefCommand::Add {
				tenant,
				site_id,
				menu_id,
				footer,
			}) => {
				assert_eq!(tenant, "contoso");
				assert_eq!(site_id, "web-1");
				assert_eq!(menu_id, "menu-9");
				assert!(footer);
			}
			other => panic!("unexpected command: {other:?}"),
		}
	}

	#[test]
	fn offline_logging_honours_overrides() {
		let args = Args::try_parse_from([
			"rise",
			"-l",
			"debug",
			"customize",
			"--template",
			"t.json",
			"--job",
			"j.json",
		])
		.unwrap();

		let logging = offline_logging(&CliOverrides::from(&args));
		assert_eq!(logging.level, "debug");
		assert_eq!(logging.format, LogFormat::Pretty);
	}

	#[test]
	fn cli_definition_is_consistent() {
		use clap::CommandFactory;
		Args::command().debug_assert();
	}
}
