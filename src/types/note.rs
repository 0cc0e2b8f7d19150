use serde::{Deserialize, Serialize};

/// A note as the collection stores it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note {
	pub id: i64,

	/// Stable identifier; empty until first assigned.
	#[serde(default)]
	pub guid: String,

	pub model_id: i64,
	/// Home deck of the note's cards.
	pub deck_id:  i64,

	pub fields: Vec<String>,
	#[serde(default)]
	pub tags:   Vec<String>,
	#[serde(default)]
	pub flags:  i32,
	#[serde(default)]
	pub data:   String,
}

impl Note {
	pub fn new(model_id: i64, deck_id: i64, fields: &[&str]) -> Self {
		Self {
			id: 0,
			guid: String::new(),
			model_id,
			deck_id,
			fields: fields.iter().map(|f| f.to_string()).collect(),
			tags: Vec::new(),
			flags: 0,
			data: String::new(),
		}
	}

	pub fn with_tags(mut self, tags: &[&str]) -> Self {
		self.tags = tags.iter().map(|t| t.to_string()).collect();
		self
	}

	pub fn with_guid(mut self, guid: impl Into<String>) -> Self {
		self.guid = guid.into();
		self
	}

	/// Content used to derive an identifier for a note that never had one.
	pub fn to_content_string(&self) -> String { format!("{}\u{1f}{}", self.id, self.fields.join("\u{1f}")) }
}
