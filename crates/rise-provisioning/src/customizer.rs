// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Job-specific edits to a template before it is applied.

use rise_provisioning_core::{
	CurrentNavigationType, GlobalNavigationType, Handler, HandlerSet, SiteCollectionJob, Template,
};

/// Handlers never run for app-only provisioning.
pub const EXCLUDED_HANDLERS: [Handler; 2] = [Handler::TermGroups, Handler::SearchSettings];

#[derive(Clone, Debug, PartialEq)]
pub struct PreparedTemplate {
	pub template: Template,
	pub handlers: HandlerSet,
}

/// Rewrites `template` for `job`:
///
/// - job parameters overwrite or extend the template parameters
/// - web settings, when present, take the job's title and description
/// - structural navigation replaces existing nodes; managed navigation is
///   dropped from the template
///
/// Term groups and search settings are left out of the handler set.
pub fn customize(mut template: Template, job: &SiteCollectionJob) -> PreparedTemplate {
	overlay_parameters(&mut template, job);

	if let Some(web) = template.web_settings.as_mut() {
		web.title = Some(job.site_title.clone());
		web.description = Some(job.description.clone());
	}

	fix_navigation(&mut template);

	let handlers = EXCLUDED_HANDLERS
		.into_iter()
		.fold(HandlerSet::all(), HandlerSet::without);

	PreparedTemplate { template, handlers }
}

fn overlay_parameters(template: &mut Template, job: &SiteCollectionJob) {
	for (key, value) in &job.template_parameters {
		template.parameters.insert(key.clone(), value.clone());
	}
}

fn fix_navigation(template: &mut Template) {
	let Some(navigation) = template.navigation.as_mut() else {
		return;
	};

	if let Some(current) = navigation.current.as_mut() {
		match (current.navigation_type, current.structural_navigation.as_mut()) {
			(kind, Some(structural)) if kind.is_structural() => {
				structural.remove_existing_nodes = true;
			}
			(CurrentNavigationType::Managed, _) if current.managed_navigation.is_some() => {
				navigation.current = None;
			}
			_ => {}
		}
	}

	if let Some(global) = navigation.global.as_mut() {
		match (global.navigation_type, global.structural_navigation.as_mut()) {
			(GlobalNavigationType::Structural, Some(structural)) => {
				structural.remove_existing_nodes = true;
			}
			(GlobalNavigationType::Managed, _) if global.managed_navigation.is_some() => {
				navigation.global = None;
			}
			_ => {}
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::testing::site_collection_job;
	use proptest::prelude::*;
	use rise_provisioning_core::{
		CurrentNavigation, GlobalNavigation, ManagedNavigation, Navigation, StructuralNavigation,
		WebSettings,
	};
	use std::collections::BTreeMap;

	fn structural() -> StructuralNavigation {
		StructuralNavigation::default()
	}

	fn managed() -> ManagedNavigation {
		ManagedNavigation {
			term_store_id: "store".to_string(),
			term_set_id: "set".to_string(),
			..ManagedNavigation::default()
		}
	}

	fn params(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
		pairs
			.iter()
			.map(|(k, v)| (k.to_string(), v.to_string()))
			.collect()
	}

	#[test]
	fn job_parameters_take_precedence() {
		let template = Template {
			parameters: params(&[("A", "1"), ("B", "2")]),
			..Template::default()
		};
		let mut job = site_collection_job("/sites/teamA");
		job.template_parameters = params(&[("B", "9"), ("C", "3")]);

		let prepared = customize(template, &job);

		assert_eq!(
			prepared.template.parameters,
			params(&[("A", "1"), ("B", "9"), ("C", "3")])
		);
	}

	#[test]
	fn web_settings_take_job_identity() {
		let template = Template {
			web_settings: Some(WebSettings {
				title: Some("Template title".to_string()),
				..WebSettings::default()
			}),
			..Template::default()
		};
		let mut job = site_collection_job("/sites/teamA");
		job.site_title = "Team A".to_string();
		job.description = "Team A workspace".to_string();

		let prepared = customize(template, &job);
		let web = prepared.template.web_settings.unwrap();

		assert_eq!(web.title.as_deref(), Some("Team A"));
		assert_eq!(web.description.as_deref(), Some("Team A workspace"));
	}

	#[test]
	fn absent_web_settings_stay_absent() {
		let prepared = customize(Template::default(), &site_collection_job("/sites/teamA"));
		assert!(prepared.template.web_settings.is_none());
	}

	#[test]
	fn managed_current_is_stripped_and_structural_global_replaces_nodes() {
		let template = Template {
			navigation: Some(Navigation {
				current: Some(CurrentNavigation {
					navigation_type: CurrentNavigationType::Managed,
					structural_navigation: None,
					managed_navigation: Some(managed()),
					..CurrentNavigation::default()
				}),
				global: Some(GlobalNavigation {
					navigation_type: GlobalNavigationType::Structural,
					structural_navigation: Some(structural()),
					managed_navigation: None,
					..GlobalNavigation::default()
				}),
				..Navigation::default()
			}),
			..Template::default()
		};

		let prepared = customize(template, &site_collection_job("/sites/teamA"));
		let navigation = prepared.template.navigation.unwrap();

		assert!(navigation.current.is_none());
		let global = navigation.global.unwrap();
		assert!(global.structural_navigation.unwrap().remove_existing_nodes);
	}

	#[test]
	fn structural_local_current_replaces_nodes_and_managed_global_is_stripped() {
		let template = Template {
			navigation: Some(Navigation {
				current: Some(CurrentNavigation {
					navigation_type: CurrentNavigationType::StructuralLocal,
					structural_navigation: Some(structural()),
					managed_navigation: None,
					..CurrentNavigation::default()
				}),
				global: Some(GlobalNavigation {
					navigation_type: GlobalNavigationType::Managed,
					structural_navigation: None,
					managed_navigation: Some(managed()),
					..GlobalNavigation::default()
				}),
				..Navigation::default()
			}),
			..Template::default()
		};

		let prepared = customize(template, &site_collection_job("/sites/teamA"));
		let navigation = prepared.template.navigation.unwrap();

		assert!(navigation.global.is_none());
		assert!(
			navigation
				.current
				.unwrap()
				.structural_navigation
				.unwrap()
				.remove_existing_nodes
		);
	}

	#[test]
	fn managed_type_without_managed_block_is_kept() {
		let template = Template {
			navigation: Some(Navigation {
				current: Some(CurrentNavigation {
					navigation_type: CurrentNavigationType::Managed,
					structural_navigation: None,
					managed_navigation: None,
					..CurrentNavigation::default()
				}),
				global: None,
				..Navigation::default()
			}),
			..Template::default()
		};

		let prepared = customize(template, &site_collection_job("/sites/teamA"));
		assert!(prepared.template.navigation.unwrap().current.is_some());
	}

	#[test]
	fn term_groups_and_search_settings_are_excluded() {
		let prepared = customize(Template::default(), &site_collection_job("/sites/teamA"));

		assert!(!prepared.handlers.contains(Handler::TermGroups));
		assert!(!prepared.handlers.contains(Handler::SearchSettings));
		assert!(prepared.handlers.contains(Handler::Lists));
		assert_eq!(prepared.handlers.len(), Handler::ALL.len() - 2);
	}

	proptest! {
		/// **Property: overlay precedence**
		///
		/// Every job key ends with the job's value; every other template key is
		/// unchanged; nothing else appears.
		#[test]
		fn overlay_precedence(
			base in prop::collection::btree_map("[A-Z]{1,3}", "[a-z0-9]{0,4}", 0..8),
			overlay in prop::collection::btree_map("[A-Z]{1,3}", "[a-z0-9]{0,4}", 0..8),
		) {
			let template = Template { parameters: base.clone(), ..Template::default() };
			let mut job = site_collection_job("/sites/prop");
			job.template_parameters = overlay.clone();

			let result = customize(template, &job).template.parameters;

			for (key, value) in &overlay {
				prop_assert_eq!(result.get(key), Some(value));
			}
			for (key, value) in &base {
				if !overlay.contains_key(key) {
					prop_assert_eq!(result.get(key), Some(value));
				}
			}
			for key in result.keys() {
				prop_assert!(base.contains_key(key) || overlay.contains_key(key));
			}
		}

		/// **Property: structural navigation always replaces existing nodes**
		#[test]
		fn structural_navigation_always_replaces(remove in any::<bool>(), local in any::<bool>()) {
			let kind = if local { CurrentNavigationType::StructuralLocal } else { CurrentNavigationType::Structural };
			let template = Template {
				navigation: Some(Navigation {
					current: Some(CurrentNavigation {
						navigation_type: kind,
						structural_navigation: Some(StructuralNavigation { remove_existing_nodes: remove, ..StructuralNavigation::default() }),
						managed_navigation: None,
						..CurrentNavigation::default()
					}),
					global: Some(GlobalNavigation {
						navigation_type: GlobalNavigationType::Structural,
						structural_navigation: Some(StructuralNavigation { remove_existing_nodes: remove, ..StructuralNavigation::default() }),
						managed_navigation: None,
						..GlobalNavigation::default()
					}),
					..Navigation::default()
				}),
				..Template::default()
			};

			let navigation = customize(template, &site_collection_job("/sites/prop")).template.navigation.unwrap();

			prop_assert!(navigation.current.unwrap().structural_navigation.unwrap().remove_existing_nodes);
			prop_assert!(navigation.global.unwrap().structural_navigation.unwrap().remove_existing_nodes);
		}
	}
}
