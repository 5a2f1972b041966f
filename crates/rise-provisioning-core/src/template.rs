// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Provisioning template model.
//!
//! Only the parts the orchestrator reads or rewrites are typed: base site
//! template, parameters, web settings and navigation. Everything else in the
//! template document (lists, pages, web parts, ...) is carried through
//! untouched in the `extra` maps.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Base template of group-backed ("modern team") sites.
pub const GROUP_SITE_TEMPLATE: &str = "GROUP#0";

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Template {
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub base_site_template: Option<String>,
	#[serde(default)]
	pub parameters: BTreeMap<String, String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub web_settings: Option<WebSettings>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub navigation: Option<Navigation>,
	#[serde(flatten)]
	pub extra: Map<String, Value>,
}

impl Template {
	/// Base template to create the site with, `fallback` when the template
	/// does not name one.
	pub fn site_template_or<'a>(&'a self, fallback: &'a str) -> &'a str {
		match self.base_site_template.as_deref() {
			Some(base) if !base.is_empty() => base,
			_ => fallback,
		}
	}

	pub fn is_group_site(&self) -> bool {
		self.base_site_template.as_deref() == Some(GROUP_SITE_TEMPLATE)
	}
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebSettings {
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub title: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub description: Option<String>,
	#[serde(flatten)]
	pub extra: Map<String, Value>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Navigation {
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub global: Option<GlobalNavigation>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub current: Option<CurrentNavigation>,
	#[serde(flatten)]
	pub extra: Map<String, Value>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum CurrentNavigationType {
	#[default]
	Inherit,
	Structural,
	StructuralLocal,
	Managed,
}

impl CurrentNavigationType {
	pub fn is_structural(&self) -> bool {
		matches!(self, Self::Structural | Self::StructuralLocal)
	}
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum GlobalNavigationType {
	#[default]
	Inherit,
	Structural,
	Managed,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrentNavigation {
	#[serde(default)]
	pub navigation_type: CurrentNavigationType,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub structural_navigation: Option<StructuralNavigation>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub managed_navigation: Option<ManagedNavigation>,
	#[serde(flatten)]
	pub extra: Map<String, Value>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GlobalNavigation {
	#[serde(default)]
	pub navigation_type: GlobalNavigationType,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub structural_navigation: Option<StructuralNavigation>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub managed_navigation: Option<ManagedNavigation>,
	#[serde(flatten)]
	pub extra: Map<String, Value>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StructuralNavigation {
	/// Clear the nodes already on the site before adding these.
	#[serde(default)]
	pub remove_existing_nodes: bool,
	#[serde(default)]
	pub navigation_nodes: Vec<NavigationNode>,
	#[serde(flatten)]
	pub extra: Map<String, Value>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NavigationNode {
	#[serde(default)]
	pub title: String,
	#[serde(default)]
	pub url: String,
	#[serde(default)]
	pub is_external: bool,
	#[serde(default)]
	pub navigation_nodes: Vec<NavigationNode>,
	#[serde(flatten)]
	pub extra: Map<String, Value>,
}

/// Term-store backed navigation. The ids may be tokens or absent in
/// templates exported from a site that never had managed navigation.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManagedNavigation {
	#[serde(default)]
	pub term_store_id: String,
	#[serde(default)]
	pub term_set_id: String,
	#[serde(flatten)]
	pub extra: Map<String, Value>,
}

/// Object handlers the template engine runs when applying a template.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Handler {
	RegionalSettings,
	SupportedUiLanguages,
	AuditSettings,
	SitePolicy,
	SiteSecurity,
	Features,
	TermGroups,
	Fields,
	ContentTypes,
	Lists,
	Files,
	Pages,
	PageContents,
	CustomActions,
	ComposedLook,
	SearchSettings,
	Workflows,
	Navigation,
	WebSettings,
	PropertyBagEntries,
	Publishing,
	ExtensibilityProviders,
}

impl Handler {
	pub const ALL: [Handler; 22] = [
		Handler::RegionalSettings,
		Handler::SupportedUiLanguages,
		Handler::AuditSettings,
		Handler::SitePolicy,
		Handler::SiteSecurity,
		Handler::Features,
		Handler::TermGroups,
		Handler::Fields,
		Handler::ContentTypes,
		Handler::Lists,
		Handler::Files,
		Handler::Pages,
		Handler::PageContents,
		Handler::CustomActions,
		Handler::ComposedLook,
		Handler::SearchSettings,
		Handler::Workflows,
		Handler::Navigation,
		Handler::WebSettings,
		Handler::PropertyBagEntries,
		Handler::Publishing,
		Handler::ExtensibilityProviders,
	];
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HandlerSet(BTreeSet<Handler>);

impl HandlerSet {
	pub fn all() -> Self {
		Self(Handler::ALL.into_iter().collect())
	}

	pub fn without(mut self, handler: Handler) -> Self {
		self.0.remove(&handler);
		self
	}

	pub fn contains(&self, handler: Handler) -> bool {
		self.0.contains(&handler)
	}

	pub fn iter(&self) -> impl Iterator<Item = Handler> + '_ {
		self.0.iter().copied()
	}

	pub fn len(&self) -> usize {
		self.0.len()
	}

	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}
}

impl Default for HandlerSet {
	fn default() -> Self {
		Self::all()
	}
}

/// Record of the template applied to a site.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SiteTemplateInfo {
	pub provider: String,
	pub uri: String,
	pub parameters: BTreeMap<String, String>,
	pub applied_on: DateTime<Utc>,
}
