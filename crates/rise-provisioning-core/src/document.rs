// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Typed model of the shared metadata document.
//!
//! The document is a LokiJS database dump stored as a script that assigns the
//! database to a global:
//!
//! ```text
//! window.lokiFiles['Global'] = { "filename": "Global", "collections": [ ... ], ... }
//! ```
//!
//! Only the collection being appended to is decoded, and only the fields the
//! menu mapping touches are typed. Every other collection, every existing
//! entry and every unknown field round-trips as raw JSON, in original order.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{json, Map, Value};

use crate::error::DocumentError;

/// Assignment the document body is wrapped in.
pub const GLOBAL_WRAPPER_PREFIX: &str = "window.lokiFiles['Global'] = ";

/// Appended to the object name to form the backup object name.
pub const BACKUP_SUFFIX: &str = "_provisioning_backup";

pub fn backup_name(object_name: &str) -> String {
	format!("{object_name}{BACKUP_SUFFIX}")
}

/// Which site menu a mapping entry refers to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MenuKind {
	Main,
	Footer,
}

impl MenuKind {
	pub fn collection_name(&self) -> &'static str {
		match self {
			MenuKind::Main => "MenuMapping",
			MenuKind::Footer => "FooterMapping",
		}
	}
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct MetadataDocument {
	/// Raw collections. Only a collection being appended to is decoded into
	/// a [`Collection`]; every other one is written back exactly as read.
	#[serde(default, deserialize_with = "null_as_default")]
	pub collections: Vec<Value>,
	#[serde(flatten)]
	pub extra: Map<String, Value>,
}

/// Result of [`MetadataDocument::append_entry`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AppendOutcome {
	/// The entry went into this many existing collections of that name.
	Appended { collections: usize },
	/// No collection had the name; a new one was created.
	CreatedCollection,
}

fn collection_name(collection: &Value) -> Option<&str> {
	collection.get("name").and_then(Value::as_str)
}

impl MetadataDocument {
	pub fn collection_names(&self) -> impl Iterator<Item = &str> {
		self.collections.iter().filter_map(collection_name)
	}

	/// Typed view of the first collection called `name`.
	pub fn collection(&self, name: &str) -> Result<Option<Collection>, DocumentError> {
		self
			.collections
			.iter()
			.find(|c| collection_name(c) == Some(name))
			.map(|c| Collection::deserialize(c).map_err(DocumentError::from))
			.transpose()
	}

	/// Appends `entry` to every collection called `name`, creating the
	/// collection when none exists. Existing entries are never inspected, so
	/// repeated calls with the same site and menu add duplicates. Collections
	/// with other names are left byte-for-byte alone.
	pub fn append_entry(&mut self, name: &str, entry: Entry) -> Result<AppendOutcome, DocumentError> {
		let mut matched = 0;
		for slot in self
			.collections
			.iter_mut()
			.filter(|c| collection_name(c) == Some(name))
		{
			let mut collection = Collection::deserialize(&*slot)?;
			collection.push(entry.clone())?;
			collection.write_counters(slot)?;
			matched += 1;
		}

		if matched > 0 {
			return Ok(AppendOutcome::Appended {
				collections: matched,
			});
		}

		let collection = Collection::with_entry(name, entry)?;
		self.collections.push(serde_json::to_value(&collection)?);
		Ok(AppendOutcome::CreatedCollection)
	}
}

/// A Loki collection being appended to. Existing entries stay raw JSON.
///
/// `idIndex` and `maxId` are only maintained when the collection already
/// carries them (a `null` counts as carried); a collection without them is
/// not given them.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Collection {
	pub name: String,
	#[serde(default, deserialize_with = "null_as_default")]
	pub data: Vec<Value>,
	#[serde(
		rename = "idIndex",
		default,
		deserialize_with = "present_or_null",
		skip_serializing_if = "Option::is_none"
	)]
	pub id_index: Option<Vec<u64>>,
	#[serde(
		rename = "maxId",
		default,
		deserialize_with = "present_or_null",
		skip_serializing_if = "Option::is_none"
	)]
	pub max_id: Option<u64>,
	#[serde(flatten)]
	pub extra: Map<String, Value>,
}

impl Collection {
	/// A fresh collection holding only `entry`, with the structural fields a
	/// LokiJS collection carries when first serialized.
	pub fn with_entry(name: &str, entry: Entry) -> Result<Self, DocumentError> {
		let mut collection = Self {
			name: name.to_string(),
			data: Vec::new(),
			id_index: Some(Vec::new()),
			max_id: Some(0),
			extra: loki_collection_defaults(name),
		};
		collection.push(entry)?;
		Ok(collection)
	}

	/// Adds `entry` with the next `$loki` id, one above the highest id found
	/// in `idIndex`, `maxId` or the entries themselves. Returns the id.
	pub fn push(&mut self, entry: Entry) -> Result<u64, DocumentError> {
		let highest = self
			.data
			.iter()
			.filter_map(|e| e.get("$loki").and_then(Value::as_u64))
			.chain(self.id_index.iter().flatten().copied())
			.chain(self.max_id)
			.max()
			.unwrap_or_default();
		let id = highest + 1;

		let entry = Entry {
			loki: Some(id),
			..entry
		};
		self.data.push(serde_json::to_value(entry)?);
		if let Some(index) = self.id_index.as_mut() {
			index.push(id);
		}
		if self.max_id.is_some() {
			self.max_id = Some(id);
		}
		Ok(id)
	}

	/// Writes `data`, `idIndex` and `maxId` back into the raw collection it
	/// was decoded from, keeping the position of every other key.
	fn write_counters(&self, raw: &mut Value) -> Result<(), DocumentError> {
		let Value::Object(map) = raw else {
			return Ok(());
		};
		map.insert("data".to_string(), Value::Array(self.data.clone()));
		if let Some(index) = &self.id_index {
			map.insert("idIndex".to_string(), serde_json::to_value(index)?);
		}
		if let Some(max_id) = self.max_id {
			map.insert("maxId".to_string(), Value::from(max_id));
		}
		Ok(())
	}

	/// Entries decoded as menu mappings.
	pub fn entries(&self) -> Result<Vec<Entry>, DocumentError> {
		self
			.data
			.iter()
			.map(|e| Entry::deserialize(e).map_err(DocumentError::from))
			.collect()
	}
}

fn loki_collection_defaults(name: &str) -> Map<String, Value> {
	let defaults = json!({
		"binaryIndices": {},
		"constraints": null,
		"uniqueNames": [],
		"transforms": {},
		"objType": name,
		"dirty": false,
		"cachedIndex": null,
		"cachedBinaryIndex": null,
		"cachedData": null,
		"adaptiveBinaryIndices": false,
		"transactional": false,
		"cloneObjects": false,
		"cloneMethod": "parse-stringify",
		"asyncListeners": false,
		"disableChangesApi": true,
		"autoupdate": false,
		"ttl": null,
		"DynamicViews": [],
		"events": {
			"insert": [null],
			"update": [null],
			"pre-insert": [],
			"pre-update": [],
			"close": [],
			"flushbuffer": [],
			"error": [],
			"delete": [null],
			"warning": [null]
		},
		"changes": []
	});

	match defaults {
		Value::Object(map) => map,
		_ => Map::new(),
	}
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Entry {
	#[serde(rename = "siteId", default, skip_serializing_if = "Option::is_none")]
	pub site_id: Option<String>,
	#[serde(rename = "menuId", default, skip_serializing_if = "Option::is_none")]
	pub menu_id: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub meta: Option<EntryMeta>,
	#[serde(rename = "$loki", default, skip_serializing_if = "Option::is_none")]
	pub loki: Option<u64>,
	#[serde(flatten)]
	pub extra: Map<String, Value>,
}

impl Entry {
	/// A site-to-menu mapping created at `created_ms` (UTC epoch millis).
	pub fn menu_reference(
		site_id: impl Into<String>,
		menu_id: impl Into<String>,
		created_ms: i64,
	) -> Self {
		Self {
			site_id: Some(site_id.into()),
			menu_id: Some(menu_id.into()),
			meta: Some(EntryMeta {
				revision: 0,
				created: created_ms,
				version: 0,
				extra: Map::new(),
			}),
			loki: None,
			extra: Map::new(),
		}
	}
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct EntryMeta {
	#[serde(default)]
	pub revision: u64,
	#[serde(default)]
	pub created: i64,
	#[serde(default)]
	pub version: u64,
	#[serde(flatten)]
	pub extra: Map<String, Value>,
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
	D: Deserializer<'de>,
	T: Default + Deserialize<'de>,
{
	Option::<T>::deserialize(deserializer).map(Option::unwrap_or_default)
}

/// Only called when the key is present, so absent stays `None` through
/// `default` while `null` becomes `Some(T::default())`.
fn present_or_null<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
	D: Deserializer<'de>,
	T: Default + Deserialize<'de>,
{
	Option::<T>::deserialize(deserializer).map(|value| Some(value.unwrap_or_default()))
}

/// Parses document bytes. The wrapper assignment and a trailing `;` are
/// optional so a bare JSON dump is accepted too.
pub fn decode_document(bytes: &[u8]) -> Result<MetadataDocument, DocumentError> {
	let text = String::from_utf8(bytes.to_vec())?;
	Ok(serde_json::from_str(strip_wrapper(&text))?)
}

/// Serializes the document and re-applies the wrapper assignment.
pub fn encode_document(document: &MetadataDocument) -> Result<Vec<u8>, DocumentError> {
	let body = serde_json::to_string_pretty(document)?;
	Ok(format!("{GLOBAL_WRAPPER_PREFIX}{body}").into_bytes())
}

fn strip_wrapper(text: &str) -> &str {
	let text = text.trim_start_matches('\u{feff}').trim();
	let body = text.strip_prefix(GLOBAL_WRAPPER_PREFIX).unwrap_or(text).trim();
	body.strip_suffix(';').unwrap_or(body).trim_end()
}
