//! Turns a snapshot tree into canonical JSON text.
//!
//! Every domain object is first converted to a plain JSON value by a
//! conversion hook; the walker then attaches notes, children and metadata,
//! sorts all object keys recursively and prints with four-space indentation.
//! Arrays keep their source order. Non-ASCII text is written as-is.

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::{Map, Value, ser::PrettyFormatter};
use tracing::{debug, instrument};

use crate::{error::DeckError, types::{DeckConfig, DeckHeader, DeckSnapshot, NoteModel, NoteSnapshot}};

const TYPE_KEY: &str = "__type__";

/// Any object reachable from a snapshot tree.
#[derive(Debug, Clone, Copy)]
pub enum Entity<'a> {
	Deck(&'a DeckHeader),
	Note(&'a NoteSnapshot),
	NoteModel(&'a NoteModel),
	DeckConfig(&'a DeckConfig),
}

impl Entity<'_> {
	pub fn type_name(&self) -> &'static str {
		match self {
			Entity::Deck(_) => "Deck",
			Entity::Note(_) => "Note",
			Entity::NoteModel(_) => "NoteModel",
			Entity::DeckConfig(_) => "DeckConfig",
		}
	}
}

/// Converts one entity to a plain JSON object. `None` means the hook has no
/// conversion for that kind of entity.
pub type ConversionHook = fn(Entity<'_>) -> Option<serde_json::Result<Value>>;

/// Conversion for every entity kind: its serde form tagged with `__type__`.
pub fn default_json(entity: Entity<'_>) -> Option<serde_json::Result<Value>> {
	let value = match entity {
		Entity::Deck(deck) => serde_json::to_value(deck),
		Entity::Note(note) => serde_json::to_value(note),
		Entity::NoteModel(model) => serde_json::to_value(model),
		Entity::DeckConfig(config) => serde_json::to_value(config),
	};

	Some(value.map(|mut value| {
		if let Value::Object(map) = &mut value {
			map.insert(TYPE_KEY.to_string(), Value::String(entity.type_name().to_string()));
		}
		value
	}))
}

#[derive(Debug, Clone, Copy)]
pub struct CanonicalSerializer {
	hook: ConversionHook,
}

impl Default for CanonicalSerializer {
	fn default() -> Self { Self::with_hook(default_json) }
}

impl CanonicalSerializer {
	pub fn with_hook(hook: ConversionHook) -> Self { Self { hook } }

	#[instrument(skip(self, deck), fields(deck = deck.name()))]
	pub fn serialize(&self, deck: &DeckSnapshot) -> Result<String, DeckError> {
		let tree = sort_keys(self.deck_value(deck)?);

		let mut buffer = Vec::new();
		let mut serializer = serde_json::Serializer::with_formatter(&mut buffer, PrettyFormatter::with_indent(b"    "));
		tree.serialize(&mut serializer)?;

		let text = String::from_utf8(buffer).map_err(|e| DeckError::Serialization {
			type_name: "Deck",
			reason:    e.to_string(),
		})?;
		debug!("Serialized {} bytes", text.len());
		Ok(text)
	}

	fn convert(&self, entity: Entity<'_>) -> Result<Map<String, Value>, DeckError> {
		let type_name = entity.type_name();
		let failure = |reason: String| DeckError::Serialization { type_name, reason };

		match (self.hook)(entity) {
			None => Err(failure("no conversion registered".to_string())),
			Some(Err(e)) => Err(failure(e.to_string())),
			Some(Ok(Value::Object(map))) => Ok(map),
			Some(Ok(other)) => Err(failure(format!("converted to a non-object value: {}", other))),
		}
	}

	fn deck_value(&self, deck: &DeckSnapshot) -> Result<Value, DeckError> {
		let mut map = self.convert(Entity::Deck(&deck.header))?;

		let notes = deck.notes.iter().map(|note| self.convert(Entity::Note(note)).map(Value::Object));
		map.insert("notes".to_string(), Value::Array(notes.collect::<Result<_, _>>()?));

		let children = deck.children.iter().map(|child| self.deck_value(child));
		map.insert("children".to_string(), Value::Array(children.collect::<Result<_, _>>()?));

		if let Some(metadata) = &deck.metadata {
			let mut models = Map::new();
			for (uuid, model) in &metadata.note_models {
				models.insert(uuid.clone(), Value::Object(self.convert(Entity::NoteModel(model))?));
			}

			let mut configs = Map::new();
			for (uuid, config) in &metadata.deck_configs {
				configs.insert(uuid.clone(), Value::Object(self.convert(Entity::DeckConfig(config))?));
			}

			let mut section = Map::new();
			section.insert("note_models".to_string(), Value::Object(models));
			section.insert("deck_configs".to_string(), Value::Object(configs));
			map.insert("metadata".to_string(), Value::Object(section));
		}

		Ok(Value::Object(map))
	}
}

/// Sorts the keys of every object in `value`. Array order is preserved.
pub fn sort_keys(value: Value) -> Value {
	match value {
		Value::Object(map) => {
			let sorted: BTreeMap<String, Value> = map.into_iter().map(|(key, value)| (key, sort_keys(value))).collect();
			Value::Object(sorted.into_iter().collect())
		}
		Value::Array(items) => Value::Array(items.into_iter().map(sort_keys).collect()),
		other => other,
	}
}

#[cfg(test)]
mod tests {
	use serde_json::json;

	use super::*;
	use crate::types::Metadata;

	fn deck() -> DeckSnapshot {
		let note = NoteSnapshot {
			guid:            "g1".to_string(),
			note_model_uuid: "m1".to_string(),
			fields:          vec!["日本語".to_string(), "b".to_string(), "a".to_string()],
			tags:            vec![],
			flags:           0,
			data:            String::new(),
			source:          None,
			guid_assigned:   false,
		};

		let mut model = NoteModel::new("Basic", &["Front", "Back"], vec![]);
		model.crowdanki_uuid = Some("m1".to_string());
		let mut metadata = Metadata::default();
		metadata.note_models.insert("m1".to_string(), model);

		DeckSnapshot {
			header:   DeckHeader {
				name:             "Japanese".to_string(),
				crowdanki_uuid:   "d1".to_string(),
				deck_config_uuid: None,
				desc:             String::new(),
				is_dynamic:       0,
				extend_new:       0,
				extend_rev:       0,
				media_files:      vec![],
			},
			notes:    vec![note],
			children: vec![],
			metadata: Some(metadata),
			source:   None,
		}
	}

	#[test]
	fn keys_sorted_arrays_kept() {
		let sorted = sort_keys(json!({ "b": 1, "a": { "d": [3, 1, 2], "c": null } }));
		assert_eq!(serde_json::to_string(&sorted).unwrap(), r#"{"a":{"c":null,"d":[3,1,2]},"b":1}"#);
	}

	#[test]
	fn four_space_indent_and_literal_unicode() {
		let text = CanonicalSerializer::default().serialize(&deck()).unwrap();

		assert!(text.starts_with("{\n    \"__type__\": \"Deck\",\n    \"children\": [],"));
		assert!(text.contains("\"日本語\""));
		assert!(!text.ends_with('\n'));

		let first = text.find("\"日本語\"").unwrap();
		let second = text.find("\"b\"").unwrap();
		let third = text.find("\"a\"").unwrap();
		assert!(first < second && second < third);
	}

	#[test]
	fn metadata_keyed_by_uuid_on_top_level_only() {
		let text = CanonicalSerializer::default().serialize(&deck()).unwrap();
		let value: Value = serde_json::from_str(&text).unwrap();

		assert_eq!(value["metadata"]["note_models"]["m1"]["__type__"], "NoteModel");
		assert_eq!(value["metadata"]["deck_configs"], json!({}));
		assert_eq!(value["notes"][0]["__type__"], "Note");
		assert!(value["notes"][0].get("source").is_none());
	}

	#[test]
	fn incomplete_hook_names_the_offending_type() {
		fn without_models(entity: Entity<'_>) -> Option<serde_json::Result<Value>> {
			match entity {
				Entity::NoteModel(_) => None,
				other => default_json(other),
			}
		}

		let err = CanonicalSerializer::with_hook(without_models).serialize(&deck()).unwrap_err();
		assert!(matches!(err, DeckError::Serialization { type_name: "NoteModel", .. }));
	}
}
