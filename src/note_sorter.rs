use std::cmp::Ordering;

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::{settings::Settings, types::{DeckSnapshot, Metadata, NoteSnapshot}};

/// One sort key. Keys are compared in the configured order; the note guid is
/// always the final tie-break so the order is total.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoteSortMethod {
	None,
	Guid,
	Flag,
	Tag,
	NoteModelName,
	/// Compares note model uuids; collection ids are not part of the export.
	NoteModelId,
	Field1,
	Field2,
}

impl NoteSortMethod {
	fn compare(self, a: &NoteSnapshot, b: &NoteSnapshot, metadata: &Metadata) -> Ordering {
		match self {
			NoteSortMethod::None => Ordering::Equal,
			NoteSortMethod::Guid => a.guid.cmp(&b.guid),
			NoteSortMethod::Flag => a.flags.cmp(&b.flags),
			NoteSortMethod::Tag => a.tags.cmp(&b.tags),
			NoteSortMethod::NoteModelName => {
				metadata.model_name(&a.note_model_uuid).cmp(&metadata.model_name(&b.note_model_uuid))
			}
			NoteSortMethod::NoteModelId => a.note_model_uuid.cmp(&b.note_model_uuid),
			NoteSortMethod::Field1 => field(a, 0).cmp(field(b, 0)),
			NoteSortMethod::Field2 => field(a, 1).cmp(field(b, 1)),
		}
	}
}

fn field(note: &NoteSnapshot, index: usize) -> &str { note.fields.get(index).map(String::as_str).unwrap_or("") }

pub fn default_sort_methods() -> Vec<NoteSortMethod> { vec![NoteSortMethod::Field1, NoteSortMethod::Tag] }

/// Orders notes purely by exported content, so the result does not depend on
/// how the collection happened to store or return them.
#[derive(Debug, Clone)]
pub struct NoteSorter {
	methods: Vec<NoteSortMethod>,
	reverse: bool,
}

impl NoteSorter {
	pub fn new(methods: Vec<NoteSortMethod>, reverse: bool) -> Self { Self { methods, reverse } }

	pub fn from_settings(settings: &Settings) -> Self {
		Self::new(settings.export_note_sort_methods.clone(), settings.export_notes_reverse_order)
	}

	pub fn compare(&self, a: &NoteSnapshot, b: &NoteSnapshot, metadata: &Metadata) -> Ordering {
		let ordering = self
			.methods
			.iter()
			.map(|method| method.compare(a, b, metadata))
			.find(|ordering| ordering.is_ne())
			.unwrap_or(Ordering::Equal)
			.then_with(|| a.guid.cmp(&b.guid));

		if self.reverse { ordering.reverse() } else { ordering }
	}

	pub fn sort_notes(&self, mut notes: Vec<NoteSnapshot>, metadata: &Metadata) -> Vec<NoteSnapshot> {
		notes.sort_by(|a, b| self.compare(a, b, metadata));
		notes
	}

	/// Sorts the notes of `deck` and of every descendant, using the metadata
	/// of the top-level deck.
	#[instrument(skip(self, deck), fields(deck = deck.name()))]
	pub fn sort_tree(&self, deck: &mut DeckSnapshot) {
		let metadata = deck.metadata.take().unwrap_or_default();
		self.sort_deck(deck, &metadata);
		deck.metadata = Some(metadata);
	}

	fn sort_deck(&self, deck: &mut DeckSnapshot, metadata: &Metadata) {
		debug!("Sorting {} notes of '{}'", deck.notes.len(), deck.header.name);
		let notes = std::mem::take(&mut deck.notes);
		deck.notes = self.sort_notes(notes, metadata);

		for child in &mut deck.children {
			self.sort_deck(child, metadata);
		}
	}
}

impl Default for NoteSorter {
	fn default() -> Self { Self::new(default_sort_methods(), false) }
}
