//! The canonical, self-contained tree produced for one export. It only lives
//! for the duration of that export; the collection stays the system of
//! record.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::types::{deck::Deck, deck_config::DeckConfig, note::Note, note_model::NoteModel};

/// Deck-level fields as they appear in the exported JSON.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeckHeader {
	pub name:           String,
	pub crowdanki_uuid: String,

	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub deck_config_uuid: Option<String>,

	#[serde(default)]
	pub desc: String,

	#[serde(rename = "dyn", default)]
	pub is_dynamic: i32,

	#[serde(rename = "extendNew", default)]
	pub extend_new: i32,
	#[serde(rename = "extendRev", default)]
	pub extend_rev: i32,

	#[serde(default)]
	pub media_files: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoteSnapshot {
	pub guid:            String,
	pub note_model_uuid: String,
	pub fields:          Vec<String>,
	#[serde(default)]
	pub tags:            Vec<String>,
	#[serde(default)]
	pub flags:           i32,
	#[serde(default)]
	pub data:            String,

	/// Collection record this note was taken from, with any newly assigned
	/// guid applied.
	#[serde(skip)]
	pub source:        Option<Note>,
	#[serde(skip)]
	pub guid_assigned: bool,
}

/// Shared entities of one export, each present exactly once, keyed by uuid.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metadata {
	#[serde(default)]
	pub deck_configs: BTreeMap<String, DeckConfig>,
	#[serde(default)]
	pub note_models:  BTreeMap<String, NoteModel>,
}

impl Metadata {
	pub fn model_name(&self, uuid: &str) -> Option<&str> {
		self.note_models.get(uuid).map(|model| model.name.as_str())
	}
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DeckSnapshot {
	#[serde(flatten)]
	pub header: DeckHeader,

	#[serde(default)]
	pub notes:    Vec<NoteSnapshot>,
	#[serde(default)]
	pub children: Vec<DeckSnapshot>,

	/// Only present on the top-level deck of an export.
	#[serde(default)]
	pub metadata: Option<Metadata>,

	#[serde(skip)]
	pub source: Option<Deck>,
}

impl DeckSnapshot {
	pub fn name(&self) -> &str { &self.header.name }

	/// Notes in this deck and all of its descendants.
	pub fn note_count(&self) -> usize {
		self.notes.len() + self.children.iter().map(DeckSnapshot::note_count).sum::<usize>()
	}

	/// Media referenced anywhere in the tree, sorted and de-duplicated.
	pub fn media_file_list(&self) -> BTreeSet<String> {
		let mut files: BTreeSet<String> = self.header.media_files.iter().cloned().collect();
		for child in &self.children {
			files.extend(child.media_file_list());
		}
		files
	}

	/// Visits this deck and every descendant, parents first.
	pub fn walk<'a>(&'a self, visit: &mut impl FnMut(&'a DeckSnapshot)) {
		visit(self);
		for child in &self.children {
			child.walk(visit);
		}
	}
}
