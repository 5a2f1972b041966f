// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Core metadata attached to a provisioning job.
//!
//! The payload maps a taxonomy name to the terms chosen for the site:
//!
//! ```json
//! { "Region": [ { "Label": "EMEA", "Id": "4f1c..." } ] }
//! ```
//!
//! It is written twice: flattened into indexed property-bag values on the
//! site, and verbatim as the data of a directory extension on group sites.

use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

use crate::error::CoreMetadataError;

/// Prefix for every property-bag key written from core metadata.
pub const PROPERTY_KEY_PREFIX: &str = "PRFT";

/// A chosen term. `Label` and `Id` are kept as sent: dispatchers emit
/// numeric ids for some taxonomies.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MetadataTerm {
	#[serde(rename = "Label", default)]
	pub label: Value,
	#[serde(rename = "Id", default)]
	pub id: Value,
	#[serde(flatten)]
	pub extra: Map<String, Value>,
}

impl MetadataTerm {
	pub fn new(label: impl Into<String>, id: impl Into<String>) -> Self {
		Self {
			label: Value::String(label.into()),
			id: Value::String(id.into()),
			extra: Map::new(),
		}
	}

	/// `#label|id;`
	fn property_fragment(&self) -> String {
		format!("#{}|{};", scalar_text(&self.label), scalar_text(&self.id))
	}
}

fn scalar_text(value: &Value) -> String {
	match value {
		Value::String(text) => text.clone(),
		Value::Null => String::new(),
		other => other.to_string(),
	}
}

/// One property-bag value derived from core metadata.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PropertyBagEntry {
	pub key: String,
	pub value: String,
}

/// Accepts both the structured form and the JSON-encoded string form that
/// older dispatchers emit.
#[derive(Deserialize)]
#[serde(untagged)]
enum CoreMetadataRepr {
	Encoded(String),
	Structured(Map<String, Value>),
}

/// Taxonomies in payload order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CoreMetadata {
	terms: Vec<(String, Vec<MetadataTerm>)>,
}

impl<'de> Deserialize<'de> for CoreMetadata {
	fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
	where
		D: Deserializer<'de>,
	{
		match CoreMetadataRepr::deserialize(deserializer)? {
			CoreMetadataRepr::Encoded(raw) => Self::parse(&raw).map_err(de::Error::custom),
			CoreMetadataRepr::Structured(map) => Self::from_map(map).map_err(de::Error::custom),
		}
	}
}

impl Serialize for CoreMetadata {
	fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
	where
		S: Serializer,
	{
		serializer.collect_map(self.terms.iter().map(|(name, terms)| (name, terms)))
	}
}

impl CoreMetadata {
	/// Parses the JSON text form. Blank input yields empty metadata.
	pub fn parse(raw: &str) -> Result<Self, CoreMetadataError> {
		if raw.trim().is_empty() {
			return Ok(Self::default());
		}
		let map: Map<String, Value> = serde_json::from_str(raw)?;
		Ok(Self::from_map(map)?)
	}

	fn from_map(map: Map<String, Value>) -> Result<Self, serde_json::Error> {
		let terms = map
			.into_iter()
			.map(|(name, terms)| serde_json::from_value(terms).map(|terms| (name, terms)))
			.collect::<Result<Vec<_>, _>>()?;
		Ok(Self { terms })
	}

	/// Replaces the terms of `key` in place, or appends a new taxonomy.
	pub fn insert(&mut self, key: impl Into<String>, terms: Vec<MetadataTerm>) {
		let key = key.into();
		match self.terms.iter_mut().find(|(name, _)| *name == key) {
			Some((_, existing)) => *existing = terms,
			None => self.terms.push((key, terms)),
		}
	}

	pub fn get(&self, key: &str) -> Option<&[MetadataTerm]> {
		self
			.terms
			.iter()
			.find(|(name, _)| name == key)
			.map(|(_, terms)| terms.as_slice())
	}

	pub fn len(&self) -> usize {
		self.terms.len()
	}

	pub fn is_empty(&self) -> bool {
		self.terms.is_empty()
	}

	/// One entry per taxonomy in payload order: key `PRFT<name>`, value
	/// `#label|id;` repeated for every term.
	pub fn property_bag_entries(&self) -> Vec<PropertyBagEntry> {
		self
			.terms
			.iter()
			.map(|(name, terms)| PropertyBagEntry {
				key: format!("{PROPERTY_KEY_PREFIX}{name}"),
				value: terms.iter().map(MetadataTerm::property_fragment).collect(),
			})
			.collect()
	}

	/// The payload as sent to the directory service.
	pub fn to_value(&self) -> Value {
		serde_json::to_value(self).unwrap_or(Value::Object(Map::new()))
	}
}
