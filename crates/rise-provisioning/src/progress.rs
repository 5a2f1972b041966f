// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Progress reporting while a template is applied.
//!
//! The template engine emits free-form messages. Progress messages shaped
//! `status|description|current|total` are turned into a percentage; anything
//! else is logged as is.

use tracing::{info, warn};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MessageKind {
	Progress,
	Warning,
	Completed,
}

pub trait ProvisioningProgress: Send + Sync {
	fn message(&self, kind: MessageKind, message: &str);

	/// Handler-level progress: `step` of `total` handlers.
	fn step(&self, message: &str, step: u32, total: u32);
}

#[derive(Clone, Debug, PartialEq)]
pub struct ProgressUpdate {
	pub status: String,
	pub description: String,
	pub percent: i64,
}

/// Parses `status|description|current|total`. `None` for any other shape or
/// a zero total.
pub fn parse_progress_message(message: &str) -> Option<ProgressUpdate> {
	let parts: Vec<&str> = message.split('|').collect();
	let [status, description, current, total] = parts.as_slice() else {
		return None;
	};

	let current: f64 = current.trim().parse().ok()?;
	let total: f64 = total.trim().parse().ok()?;
	if total == 0.0 {
		return None;
	}

	Some(ProgressUpdate {
		status: status.to_string(),
		description: description.to_string(),
		percent: percent(current, total),
	})
}

fn percent(current: f64, total: f64) -> i64 {
	((100.0 / total) * current).round() as i64
}

/// Logs progress through `tracing`, tagged with the site being provisioned.
pub struct TracingProgress {
	site_url: String,
}

impl TracingProgress {
	pub fn new(site_url: impl Into<String>) -> Self {
		Self {
			site_url: site_url.into(),
		}
	}
}

impl ProvisioningProgress for TracingProgress {
	fn message(&self, kind: MessageKind, message: &str) {
		match kind {
			MessageKind::Warning => warn!(site_url = %self.site_url, "{message}"),
			MessageKind::Completed => info!(site_url = %self.site_url, "template application completed"),
			MessageKind::Progress => match parse_progress_message(message) {
				Some(update) => info!(
					site_url = %self.site_url,
					percent = update.percent,
					status = %update.status,
					"{}",
					update.description
				),
				None => info!(site_url = %self.site_url, "{message}"),
			},
		}
	}

	fn step(&self, message: &str, step: u32, total: u32) {
		let percent = if total == 0 {
			0
		} else {
			percent(f64::from(step), f64::from(total))
		};
		info!(
			site_url = %self.site_url,
			step,
			total,
			percent,
			"{message}"
		);
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn four_part_message_becomes_percentage() {
		let update = parse_progress_message("Lists|Provisioning lists|3|12").unwrap();

		assert_eq!(update.status, "Lists");
		assert_eq!(update.description, "Provisioning lists");
		assert_eq!(update.percent, 25);
	}

	#[test]
	fn other_shapes_are_not_parsed() {
		assert!(parse_progress_message("Applying template").is_none());
		assert!(parse_progress_message("a|b|c").is_none());
		assert!(parse_progress_message("a|b|x|4").is_none());
		assert!(parse_progress_message("a|b|1|0").is_none());
		assert!(parse_progress_message("a|b|1|2|3").is_none());
	}

	#[test]
	fn final_step_is_one_hundred_percent() {
		assert_eq!(parse_progress_message("Done|All|7|7").unwrap().percent, 100);
	}
}
