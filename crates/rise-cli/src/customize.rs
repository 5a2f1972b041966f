// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! `rise customize`: shows what a job does to a template without touching a
//! tenant.

use std::path::Path;

use anyhow::{Context, Result};
use rise_provisioning::customize;
use rise_provisioning_core::{SiteCollectionJob, Template};
use serde_json::{json, Value};
use tracing::info;

/// Customized template and the handlers that would run, as JSON.
pub fn run(template_path: &Path, job_path: &Path) -> Result<Value> {
	let template: Template = read_json(template_path).context("failed to read template")?;
	let job: SiteCollectionJob = read_json(job_path).context("failed to read job")?;

	let prepared = customize(template, &job);
	info!(
		relative_url = %job.relative_url,
		handlers = prepared.handlers.len(),
		"template customized"
	);

	Ok(json!({
		"template": prepared.template,
		"handlers": prepared.handlers,
	}))
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
	let raw = std::fs::read_to_string(path)
		.with_context(|| format!("cannot read {}", path.display()))?;
	serde_json::from_str(&raw).with_context(|| format!("invalid JSON in {}", path.display()))
}
