// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! In-memory collaborators for exercising the orchestrator without a tenant.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use rise_common_secret::SecretString;
use rise_graph::{DirectoryClient, GraphError, TokenBroker};
use rise_provisioning_core::{
	CoreMetadata, HandlerSet, JobId, JobPayload, MetadataTerm, ProvisioningJob, SiteCollectionJob,
	Template,
};
use serde_json::Value;

use crate::content::{ContentStore, ETag, ObjectLocation, StoredObject, WritePrecondition};
use crate::error::{ContentStoreError, SiteError, TemplateError, TenantAdminError};
use crate::progress::{MessageKind, ProvisioningProgress};
use crate::site::{SiteClient, SiteConnector};
use crate::templates::TemplateRepository;
use crate::tenant::{SiteDescriptor, TenantAdmin};

pub const TEST_TENANT: &str = "contoso";
pub const TEST_INFRASTRUCTURE_SITE: &str = "https://contoso.sharepoint.com/sites/infrastructure";
pub const TEST_PROVIDER: &str = "static";
pub const TEST_TEMPLATE_URI: &str = "/templates/team.json";

/// A job with one taxonomy of core metadata and no menus, policy or overlay.
pub fn site_collection_job(relative_url: &str) -> SiteCollectionJob {
	let mut core_metadata = CoreMetadata::default();
	core_metadata.insert("Region", vec![MetadataTerm::new("EMEA", "r-1")]);

	SiteCollectionJob {
		relative_url: relative_url.to_string(),
		root_url: None,
		site_title: "Team A".to_string(),
		description: "Team A workspace".to_string(),
		language: 1033,
		time_zone: 0,
		primary_site_collection_admin: "admin@contoso.onmicrosoft.com".to_string(),
		storage_maximum_level: 0,
		storage_warning_level: 0,
		user_code_maximum_level: 0.0,
		user_code_warning_level: 0.0,
		templates_provider: Some(TEST_PROVIDER.to_string()),
		template_uri: TEST_TEMPLATE_URI.to_string(),
		template_parameters: BTreeMap::new(),
		site_policy: None,
		main_menu: None,
		footer_menu: None,
		core_metadata,
	}
}

pub fn provisioning_job(job: SiteCollectionJob) -> ProvisioningJob {
	ProvisioningJob {
		job_id: JobId::new("job-1"),
		owner: "owner@contoso.onmicrosoft.com".to_string(),
		title: job.site_title.clone(),
		status: Default::default(),
		tenant_id: TEST_TENANT.to_string(),
		payload: JobPayload::SiteCollection(job),
	}
}

pub fn infrastructure_location(name: &str) -> ObjectLocation {
	ObjectLocation {
		tenant_id: TEST_TENANT.to_string(),
		site_url: TEST_INFRASTRUCTURE_SITE.to_string(),
		library: "riseData".to_string(),
		name: name.to_string(),
	}
}

#[derive(Clone, Debug, PartialEq)]
pub enum AdminCall {
	SiteExists { site_url: String },
	CreateSite { descriptor: SiteDescriptor },
	GetDenyFlag { site_url: String },
	SetDenyFlag { site_url: String, deny: bool },
}

#[derive(Default)]
struct AdminState {
	deny_flags: HashMap<String, bool>,
	calls: Vec<AdminCall>,
	fail_set_to: Option<bool>,
	fail_create: bool,
}

/// Sites are known by URL together with their deny-customization flag.
pub struct FakeTenantAdmin {
	state: Mutex<AdminState>,
	new_site_denies_customization: bool,
}

impl FakeTenantAdmin {
	pub fn new() -> Self {
		Self {
			state: Mutex::new(AdminState::default()),
			new_site_denies_customization: true,
		}
	}

	pub fn with_site(self, site_url: &str, deny: bool) -> Self {
		self
			.state
			.lock()
			.unwrap()
			.deny_flags
			.insert(site_url.to_string(), deny);
		self
	}

	/// Flag value given to sites created through [`TenantAdmin::create_site`].
	pub fn with_new_site_deny_flag(mut self, deny: bool) -> Self {
		self.new_site_denies_customization = deny;
		self
	}

	pub fn failing_site_creation(self) -> Self {
		self.state.lock().unwrap().fail_create = true;
		self
	}

	/// Makes every later attempt to set the flag to `deny` fail.
	pub fn fail_set_deny_flag_to(&self, deny: bool) {
		self.state.lock().unwrap().fail_set_to = Some(deny);
	}

	pub fn deny_flag(&self, site_url: &str) -> Option<bool> {
		self.state.lock().unwrap().deny_flags.get(site_url).copied()
	}

	pub fn calls(&self) -> Vec<AdminCall> {
		self.state.lock().unwrap().calls.clone()
	}

	pub fn created_sites(&self) -> Vec<SiteDescriptor> {
		self
			.calls()
			.into_iter()
			.filter_map(|call| match call {
				AdminCall::CreateSite { descriptor } => Some(descriptor),
				_ => None,
			})
			.collect()
	}
}

impl Default for FakeTenantAdmin {
	fn default() -> Self {
		Self::new()
	}
}

#[async_trait]
impl TenantAdmin for FakeTenantAdmin {
	async fn site_exists(&self, _tenant_id: &str, site_url: &str) -> Result<bool, TenantAdminError> {
		let mut state = self.state.lock().unwrap();
		state.calls.push(AdminCall::SiteExists {
			site_url: site_url.to_string(),
		});
		Ok(state.deny_flags.contains_key(site_url))
	}

	async fn create_site(
		&self,
		_tenant_id: &str,
		descriptor: &SiteDescriptor,
	) -> Result<(), TenantAdminError> {
		let mut state = self.state.lock().unwrap();
		state.calls.push(AdminCall::CreateSite {
			descriptor: descriptor.clone(),
		});
		if state.fail_create {
			return Err(TenantAdminError::CreationFailed {
				site_url: descriptor.url.clone(),
				message: "quota exceeded".to_string(),
			});
		}
		state
			.deny_flags
			.insert(descriptor.url.clone(), self.new_site_denies_customization);
		Ok(())
	}

	async fn deny_add_and_customize_pages(
		&self,
		_tenant_id: &str,
		site_url: &str,
	) -> Result<bool, TenantAdminError> {
		let mut state = self.state.lock().unwrap();
		state.calls.push(AdminCall::GetDenyFlag {
			site_url: site_url.to_string(),
		});
		state
			.deny_flags
			.get(site_url)
			.copied()
			.ok_or_else(|| TenantAdminError::SiteNotFound {
				site_url: site_url.to_string(),
			})
	}

	async fn set_deny_add_and_customize_pages(
		&self,
		_tenant_id: &str,
		site_url: &str,
		deny: bool,
	) -> Result<(), TenantAdminError> {
		let mut state = self.state.lock().unwrap();
		state.calls.push(AdminCall::SetDenyFlag {
			site_url: site_url.to_string(),
			deny,
		});
		if state.fail_set_to == Some(deny) {
			return Err(TenantAdminError::Remote("service unavailable".to_string()));
		}
		match state.deny_flags.get_mut(site_url) {
			Some(flag) => {
				*flag = deny;
				Ok(())
			}
			None => Err(TenantAdminError::SiteNotFound {
				site_url: site_url.to_string(),
			}),
		}
	}
}

#[derive(Default)]
struct SiteState {
	web_id: String,
	properties: BTreeMap<String, String>,
	indexed_keys: Vec<String>,
	applied: Vec<(Template, HandlerSet)>,
	policies: Vec<String>,
	fail_apply: Option<String>,
}

/// A site whose state is shared between clones, so a test keeps a handle
/// while the orchestrator owns a boxed client.
#[derive(Clone)]
pub struct FakeSite {
	url: String,
	state: Arc<Mutex<SiteState>>,
}

impl FakeSite {
	pub fn new(url: &str) -> Self {
		Self {
			url: url.to_string(),
			state: Arc::new(Mutex::new(SiteState {
				web_id: "00000000-0000-0000-0000-00000000a001".to_string(),
				..SiteState::default()
			})),
		}
	}

	pub fn with_web_id(self, web_id: &str) -> Self {
		self.state.lock().unwrap().web_id = web_id.to_string();
		self
	}

	pub fn with_property(self, key: &str, value: &str) -> Self {
		self
			.state
			.lock()
			.unwrap()
			.properties
			.insert(key.to_string(), value.to_string());
		self
	}

	pub fn failing_template_application(self, message: &str) -> Self {
		self.state.lock().unwrap().fail_apply = Some(message.to_string());
		self
	}

	pub fn web_id_value(&self) -> String {
		self.state.lock().unwrap().web_id.clone()
	}

	pub fn property_value(&self, key: &str) -> Option<String> {
		self.state.lock().unwrap().properties.get(key).cloned()
	}

	pub fn property_keys(&self) -> Vec<String> {
		self.state.lock().unwrap().properties.keys().cloned().collect()
	}

	pub fn indexed_keys(&self) -> Vec<String> {
		self.state.lock().unwrap().indexed_keys.clone()
	}

	pub fn applied_templates(&self) -> Vec<(Template, HandlerSet)> {
		self.state.lock().unwrap().applied.clone()
	}

	pub fn applied_policies(&self) -> Vec<String> {
		self.state.lock().unwrap().policies.clone()
	}
}

#[async_trait]
impl SiteClient for FakeSite {
	fn url(&self) -> &str {
		&self.url
	}

	async fn web_id(&self) -> Result<String, SiteError> {
		Ok(self.web_id_value())
	}

	async fn apply_template(
		&self,
		template: &Template,
		handlers: &HandlerSet,
		progress: &dyn ProvisioningProgress,
	) -> Result<(), SiteError> {
		let total = handlers.len() as u32;
		for (step, handler) in handlers.iter().enumerate() {
			progress.step(&format!("{handler:?}"), step as u32 + 1, total);
		}

		let mut state = self.state.lock().unwrap();
		if let Some(message) = state.fail_apply.clone() {
			progress.message(MessageKind::Warning, &message);
			return Err(SiteError::TemplateApplication(message));
		}
		state.applied.push((template.clone(), handlers.clone()));
		progress.message(MessageKind::Completed, "Completed");
		Ok(())
	}

	async fn apply_site_policy(&self, policy_name: &str) -> Result<(), SiteError> {
		self.state.lock().unwrap().policies.push(policy_name.to_string());
		Ok(())
	}

	async fn property(&self, key: &str) -> Result<Option<String>, SiteError> {
		Ok(self.property_value(key))
	}

	async fn set_property(&self, key: &str, value: &str) -> Result<(), SiteError> {
		self
			.state
			.lock()
			.unwrap()
			.properties
			.insert(key.to_string(), value.to_string());
		Ok(())
	}

	async fn add_indexed_property_key(&self, key: &str) -> Result<(), SiteError> {
		let mut state = self.state.lock().unwrap();
		if !state.indexed_keys.iter().any(|k| k == key) {
			state.indexed_keys.push(key.to_string());
		}
		Ok(())
	}
}

/// Hands out [`FakeSite`]s by URL, creating a fresh one for unknown URLs.
#[derive(Default)]
pub struct FakeSiteConnector {
	sites: Mutex<HashMap<String, FakeSite>>,
	connections: Mutex<Vec<String>>,
}

impl FakeSiteConnector {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn with_site(self, site: FakeSite) -> Self {
		self.sites.lock().unwrap().insert(site.url.clone(), site);
		self
	}

	pub fn site(&self, url: &str) -> FakeSite {
		self
			.sites
			.lock()
			.unwrap()
			.entry(url.to_string())
			.or_insert_with(|| FakeSite::new(url))
			.clone()
	}

	pub fn connections(&self) -> Vec<String> {
		self.connections.lock().unwrap().clone()
	}
}

#[async_trait]
impl SiteConnector for FakeSiteConnector {
	async fn connect(&self, _tenant_id: &str, site_url: &str) -> Result<Box<dyn SiteClient>, SiteError> {
		self.connections.lock().unwrap().push(site_url.to_string());
		Ok(Box::new(self.site(site_url)))
	}
}

pub struct StaticTemplateRepository {
	name: String,
	templates: BTreeMap<String, Template>,
	requests: Mutex<Vec<String>>,
}

impl StaticTemplateRepository {
	pub fn new(name: &str) -> Self {
		Self {
			name: name.to_string(),
			templates: BTreeMap::new(),
			requests: Mutex::new(Vec::new()),
		}
	}

	pub fn with_template(mut self, uri: &str, template: Template) -> Self {
		self.templates.insert(uri.to_string(), template);
		self
	}

	pub fn requests(&self) -> Vec<String> {
		self.requests.lock().unwrap().clone()
	}
}

#[async_trait]
impl TemplateRepository for StaticTemplateRepository {
	fn display_name(&self) -> &str {
		&self.name
	}

	async fn resolve(
		&self,
		template_uri: &str,
		_tenant_id: &str,
	) -> Result<Option<Template>, TemplateError> {
		self.requests.lock().unwrap().push(template_uri.to_string());
		Ok(self.templates.get(template_uri).cloned())
	}
}

pub struct FakeTokenBroker {
	token: String,
	requests: Mutex<Vec<String>>,
}

impl FakeTokenBroker {
	pub fn new(token: &str) -> Self {
		Self {
			token: token.to_string(),
			requests: Mutex::new(Vec::new()),
		}
	}

	pub fn requested_tenants(&self) -> Vec<String> {
		self.requests.lock().unwrap().clone()
	}
}

#[async_trait]
impl TokenBroker for FakeTokenBroker {
	async fn token(&self, tenant_id: &str) -> Result<SecretString, GraphError> {
		self.requests.lock().unwrap().push(tenant_id.to_string());
		Ok(SecretString::new(self.token.clone()))
	}
}

#[derive(Clone, Debug, PartialEq)]
pub struct ExtensionCall {
	pub token: String,
	pub group_id: String,
	pub extension_name: String,
	pub data: Value,
}

#[derive(Default)]
pub struct RecordingDirectory {
	calls: Mutex<Vec<ExtensionCall>>,
	reject_with: Option<u16>,
}

impl RecordingDirectory {
	pub fn new() -> Self {
		Self::default()
	}

	/// Records the call, then answers with `status`.
	pub fn rejecting(mut self, status: u16) -> Self {
		self.reject_with = Some(status);
		self
	}

	pub fn calls(&self) -> Vec<ExtensionCall> {
		self.calls.lock().unwrap().clone()
	}
}

#[async_trait]
impl DirectoryClient for RecordingDirectory {
	async fn create_open_extension(
		&self,
		token: &SecretString,
		group_id: &str,
		extension_name: &str,
		data: &Value,
	) -> Result<(), GraphError> {
		self.calls.lock().unwrap().push(ExtensionCall {
			token: token.expose().clone(),
			group_id: group_id.to_string(),
			extension_name: extension_name.to_string(),
			data: data.clone(),
		});
		match self.reject_with {
			Some(status) => Err(GraphError::ApiError {
				status,
				message: "rejected".to_string(),
			}),
			None => Ok(()),
		}
	}
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StoreEvent {
	Read { name: String },
	Write { name: String, conditional: bool },
	/// A conditional write turned away.
	Conflict { name: String },
}

#[derive(Default)]
struct ContentState {
	objects: HashMap<ObjectLocation, (Vec<u8>, u64)>,
	next_version: u64,
	events: Vec<StoreEvent>,
	pending_conflicts: u32,
}

impl ContentState {
	fn put(&mut self, location: &ObjectLocation, bytes: &[u8]) -> ETag {
		self.next_version += 1;
		let version = self.next_version;
		self.objects.insert(location.clone(), (bytes.to_vec(), version));
		version_tag(version)
	}
}

fn version_tag(version: u64) -> ETag {
	ETag::new(format!("\"{version}\""))
}

/// Versioned object map. Only successful writes are recorded as
/// [`StoreEvent::Write`].
#[derive(Default)]
pub struct InMemoryContentStore {
	state: Mutex<ContentState>,
}

impl InMemoryContentStore {
	pub fn new() -> Self {
		Self::default()
	}

	/// Seeds an object without recording an event.
	pub fn insert(&self, location: &ObjectLocation, bytes: &[u8]) {
		self.state.lock().unwrap().put(location, bytes);
	}

	pub fn get(&self, location: &ObjectLocation) -> Option<Vec<u8>> {
		self
			.state
			.lock()
			.unwrap()
			.objects
			.get(location)
			.map(|(bytes, _)| bytes.clone())
	}

	pub fn events(&self) -> Vec<StoreEvent> {
		self.state.lock().unwrap().events.clone()
	}

	/// The next `count` conditional writes lose to a simulated concurrent
	/// writer; stored content is left as is.
	pub fn fail_next_conditional_writes(&self, count: u32) {
		self.state.lock().unwrap().pending_conflicts = count;
	}
}

#[async_trait]
impl ContentStore for InMemoryContentStore {
	async fn read(&self, location: &ObjectLocation) -> Result<Option<StoredObject>, ContentStoreError> {
		let mut state = self.state.lock().unwrap();
		state.events.push(StoreEvent::Read {
			name: location.name.clone(),
		});
		Ok(state.objects.get(location).map(|(bytes, version)| StoredObject {
			bytes: bytes.clone(),
			etag: version_tag(*version),
		}))
	}

	async fn write(
		&self,
		location: &ObjectLocation,
		bytes: &[u8],
		precondition: WritePrecondition,
	) -> Result<ETag, ContentStoreError> {
		let mut state = self.state.lock().unwrap();
		let conditional = matches!(precondition, WritePrecondition::IfMatch(_));

		if let WritePrecondition::IfMatch(expected) = &precondition {
			let current = state.objects.get(location).map(|(_, v)| version_tag(*v));
			let simulated = state.pending_conflicts > 0;
			if simulated {
				state.pending_conflicts -= 1;
			}
			if simulated || current.as_ref() != Some(expected) {
				state.events.push(StoreEvent::Conflict {
					name: location.name.clone(),
				});
				return Err(ContentStoreError::Conflict {
					name: location.name.clone(),
				});
			}
		}

		let etag = state.put(location, bytes);
		state.events.push(StoreEvent::Write {
			name: location.name.clone(),
			conditional,
		});
		Ok(etag)
	}
}
