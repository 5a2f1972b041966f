// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Site collection provisioning run.
//!
//! One job moves through
//!
//! ```text
//! Start -> Resolved -> Checked -> Created | Reused -> [PolicyRelaxed]
//!       -> TemplateApplied -> MetadataWritten -> [PolicyRestored] -> Done
//! ```
//!
//! and ends in `Failed` on the first error. Side effects of completed steps
//! are kept. Once the customization policy has been relaxed it is put back on
//! every exit path.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use rise_graph::{DirectoryClient, TokenBroker};
use rise_provisioning_core::{
	Entry, JobId, MenuKind, ProvisioningJob, SiteCollectionJob, SiteTemplateInfo, Template,
};
use tracing::{debug, error, info, instrument, warn};

use crate::content::ContentStore;
use crate::customizer::customize;
use crate::document_store::{DocumentStore, UpsertReport};
use crate::error::{ProvisioningError, Result};
use crate::metadata_writer::{write_directory_extension, write_property_bag};
use crate::policy::PolicyGuard;
use crate::progress::TracingProgress;
use crate::settings::ProvisioningSettings;
use crate::site::{SiteClient, SiteConnector};
use crate::site_url::resolve_site_url;
use crate::templates::TemplateProviderRegistry;
use crate::tenant::{SiteDescriptor, TenantAdmin};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ProvisioningState {
	Start,
	Resolved,
	Checked { exists: bool },
	Created,
	Reused,
	PolicyRelaxed,
	TemplateApplied,
	MetadataWritten,
	PolicyRestored,
	Done,
	Failed,
}

#[derive(Clone, Debug, PartialEq)]
pub struct RunReport {
	pub job_id: JobId,
	pub site_url: String,
	/// `false` when an existing site was reused.
	pub created: bool,
	pub policy_relaxed: bool,
	pub template: SiteTemplateInfo,
	pub property_keys: Vec<String>,
	/// Group that received the directory extension.
	pub group_id: Option<String>,
	pub menu_updates: Vec<UpsertReport>,
	pub states: Vec<ProvisioningState>,
}

#[derive(Clone, Debug, PartialEq)]
pub enum ProvisioningOutcome {
	Completed(RunReport),
	/// Nothing was touched.
	Skipped { reason: String },
}

/// Entry point the dispatch loop calls for each pending job.
#[async_trait]
pub trait JobHandler: Send + Sync {
	fn name(&self) -> &str;

	async fn run_job(&self, job: &ProvisioningJob) -> Result<ProvisioningOutcome>;
}

/// Remote services a run talks to.
#[derive(Clone)]
pub struct Collaborators {
	pub tenant_admin: Arc<dyn TenantAdmin>,
	pub sites: Arc<dyn SiteConnector>,
	pub templates: TemplateProviderRegistry,
	pub tokens: Arc<dyn TokenBroker>,
	pub directory: Arc<dyn DirectoryClient>,
	pub content: Arc<dyn ContentStore>,
}

pub struct Orchestrator {
	settings: ProvisioningSettings,
	tenant_admin: Arc<dyn TenantAdmin>,
	sites: Arc<dyn SiteConnector>,
	templates: TemplateProviderRegistry,
	tokens: Arc<dyn TokenBroker>,
	directory: Arc<dyn DirectoryClient>,
	documents: DocumentStore,
}

struct StateTrace {
	job_id: JobId,
	states: Vec<ProvisioningState>,
}

impl StateTrace {
	fn new(job_id: &JobId) -> Self {
		Self {
			job_id: job_id.clone(),
			states: vec![ProvisioningState::Start],
		}
	}

	fn advance(&mut self, next: ProvisioningState) {
		debug!(
			job_id = %self.job_id,
			from = ?self.states.last(),
			to = ?next,
			"state transition"
		);
		self.states.push(next);
	}
}

/// Output of the steps run while the policy is relaxed.
struct AppliedSite {
	template: SiteTemplateInfo,
	property_keys: Vec<String>,
	group_id: Option<String>,
	menu_updates: Vec<UpsertReport>,
}

impl Orchestrator {
	pub fn new(settings: ProvisioningSettings, collaborators: Collaborators) -> Self {
		let documents = DocumentStore::new(collaborators.content)
			.with_max_conflict_retries(settings.metadata_store.max_conflict_retries);
		Self {
			settings,
			tenant_admin: collaborators.tenant_admin,
			sites: collaborators.sites,
			templates: collaborators.templates,
			tokens: collaborators.tokens,
			directory: collaborators.directory,
			documents,
		}
	}

	pub fn settings(&self) -> &ProvisioningSettings {
		&self.settings
	}

	async fn provision_site_collection(
		&self,
		envelope: &ProvisioningJob,
		job: &SiteCollectionJob,
	) -> Result<ProvisioningOutcome> {
		let mut trace = StateTrace::new(&envelope.job_id);
		match self.run(&envelope.tenant_id, job, &mut trace).await {
			Ok(outcome) => Ok(outcome),
			Err(e) => {
				trace.advance(ProvisioningState::Failed);
				error!(error = %e, states = ?trace.states, "site collection provisioning failed");
				Err(e)
			}
		}
	}

	async fn resolve_template(
		&self,
		job: &SiteCollectionJob,
		tenant_id: &str,
	) -> Result<std::result::Result<(String, Template), String>> {
		let Some(provider_name) = job.templates_provider.as_deref() else {
			return Ok(Err("job names no template provider".to_string()));
		};
		let Some(provider) = self.templates.get(provider_name) else {
			return Ok(Err(format!("template provider {provider_name} is not registered")));
		};

		debug!(provider = provider.display_name(), uri = %job.template_uri, "resolving template");
		match provider.resolve(&job.template_uri, tenant_id).await? {
			Some(template) => Ok(Ok((provider_name.to_string(), template))),
			None => Ok(Err(format!(
				"template {} not found in provider {provider_name}",
				job.template_uri
			))),
		}
	}

	async fn run(
		&self,
		tenant_id: &str,
		job: &SiteCollectionJob,
		trace: &mut StateTrace,
	) -> Result<ProvisioningOutcome> {
		let (provider_name, template) = match self.resolve_template(job, tenant_id).await? {
			Ok(resolved) => resolved,
			Err(reason) => {
				warn!(%reason, "skipping job");
				return Ok(ProvisioningOutcome::Skipped { reason });
			}
		};
		trace.advance(ProvisioningState::Resolved);

		let site_url = resolve_site_url(job, tenant_id, &self.settings.tenancy)?;
		let exists = self.tenant_admin.site_exists(tenant_id, &site_url).await?;
		trace.advance(ProvisioningState::Checked { exists });

		let created = if exists {
			info!(%site_url, "site already exists, reusing it");
			trace.advance(ProvisioningState::Reused);
			false
		} else {
			let descriptor = SiteDescriptor::for_job(
				&site_url,
				job,
				&template,
				&self.settings.default_site_template,
			);
			info!(%site_url, template = %descriptor.template, "creating site collection");
			self.tenant_admin.create_site(tenant_id, &descriptor).await?;
			trace.advance(ProvisioningState::Created);
			true
		};

		let site = self.sites.connect(tenant_id, &site_url).await?;

		let guard = PolicyGuard::acquire(self.tenant_admin.as_ref(), tenant_id, &site_url).await?;
		let policy_relaxed = guard.was_restricted();
		if policy_relaxed {
			trace.advance(ProvisioningState::PolicyRelaxed);
		}

		let applied = self
			.apply_and_record(tenant_id, job, &provider_name, template, site.as_ref(), trace)
			.await;
		let restored = guard.release().await;

		let applied = match (applied, restored) {
			(Ok(applied), Ok(restored)) => {
				if restored {
					trace.advance(ProvisioningState::PolicyRestored);
				}
				applied
			}
			(Ok(_), Err(source)) => {
				return Err(ProvisioningError::PolicyRestoration { site_url, source });
			}
			(Err(e), Ok(restored)) => {
				if restored {
					trace.advance(ProvisioningState::PolicyRestored);
				}
				return Err(e);
			}
			(Err(e), Err(restore_error)) => {
				error!(
					%site_url,
					error = %restore_error,
					"failed to restore customization policy after a failed run"
				);
				return Err(e);
			}
		};

		trace.advance(ProvisioningState::Done);
		info!(%site_url, created, "site collection provisioned");

		Ok(ProvisioningOutcome::Completed(RunReport {
			job_id: trace.job_id.clone(),
			site_url,
			created,
			policy_relaxed,
			template: applied.template,
			property_keys: applied.property_keys,
			group_id: applied.group_id,
			menu_updates: applied.menu_updates,
			states: trace.states.clone(),
		}))
	}

	async fn apply_and_record(
		&self,
		tenant_id: &str,
		job: &SiteCollectionJob,
		provider_name: &str,
		template: Template,
		site: &dyn SiteClient,
		trace: &mut StateTrace,
	) -> Result<AppliedSite> {
		let prepared = customize(template, job);

		info!(site_url = %site.url(), uri = %job.template_uri, "applying template");
		let progress = TracingProgress::new(site.url());
		site
			.apply_template(&prepared.template, &prepared.handlers, &progress)
			.await?;

		let info = SiteTemplateInfo {
			provider: provider_name.to_string(),
			uri: job.template_uri.clone(),
			parameters: prepared.template.parameters.clone(),
			applied_on: Utc::now(),
		};

		if let Some(policy) = job.site_policy.as_deref().filter(|p| !p.is_empty()) {
			info!(policy, "applying site policy");
			site.apply_site_policy(policy).await?;
		}
		trace.advance(ProvisioningState::TemplateApplied);

		let property_keys = write_property_bag(site, &job.core_metadata).await?;

		let group_id = if prepared.template.is_group_site() {
			Some(
				write_directory_extension(
					site,
					self.tokens.as_ref(),
					self.directory.as_ref(),
					tenant_id,
					&job.core_metadata,
				)
				.await?,
			)
		} else {
			None
		};

		let menu_updates = self.write_menu_references(tenant_id, job, site).await?;
		trace.advance(ProvisioningState::MetadataWritten);

		Ok(AppliedSite {
			template: info,
			property_keys,
			group_id,
			menu_updates,
		})
	}

	/// Main menu first, then footer. The shared document is not read when the
	/// job names neither.
	async fn write_menu_references(
		&self,
		tenant_id: &str,
		job: &SiteCollectionJob,
		site: &dyn SiteClient,
	) -> Result<Vec<UpsertReport>> {
		let menus: Vec<(MenuKind, &str)> = [
			(MenuKind::Main, job.main_menu.as_deref()),
			(MenuKind::Footer, job.footer_menu.as_deref()),
		]
		.into_iter()
		.filter_map(|(kind, menu)| menu.map(|menu| (kind, menu)))
		.collect();

		if menus.is_empty() {
			return Ok(Vec::new());
		}

		let location = self.settings.metadata_location(tenant_id)?;
		let web_id = site.web_id().await?;

		let mut reports = Vec::with_capacity(menus.len());
		for (kind, menu_id) in menus {
			let entry = Entry::menu_reference(&web_id, menu_id, Utc::now().timestamp_millis());
			info!(collection = kind.collection_name(), menu_id, "writing menu reference");
			let report = self
				.documents
				.upsert_entry(&location, kind.collection_name(), entry)
				.await?;
			reports.push(report);
		}
		Ok(reports)
	}
}

#[async_trait]
impl JobHandler for Orchestrator {
	fn name(&self) -> &str {
		"site-collection-provisioning"
	}

	#[instrument(
		skip(self, job),
		fields(job_id = %job.job_id, tenant_id = %job.tenant_id, kind = job.kind())
	)]
	async fn run_job(&self, job: &ProvisioningJob) -> Result<ProvisioningOutcome> {
		let Some(site_job) = job.as_site_collection() else {
			return Err(ProvisioningError::InvalidJobType {
				kind: job.kind().to_string(),
			});
		};

		info!(relative_url = %site_job.relative_url, "provisioning site collection");
		self.provision_site_collection(job, site_job).await
	}
}
