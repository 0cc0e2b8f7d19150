//! The host collection as seen from the exporter. Storage semantics belong to
//! the implementor; this crate only reads records and hands updated ones
//! back.

use std::path::PathBuf;

use thiserror::Error;

use crate::types::{Deck, DeckConfig, Note, NoteModel};

#[derive(Debug, Error)]
pub enum CollectionError {
	#[error("A deck named '{0}' already exists")]
	DuplicateDeckName(String),

	#[error("No {kind} with id {id} in the collection")]
	UnknownId { kind: &'static str, id: i64 },

	#[error("Collection file is unreadable: {0}")]
	Corrupt(String),

	#[error(transparent)]
	Io(#[from] std::io::Error),
}

/// Records are written back whole. An id of `0` asks the store to insert the
/// record and assign a fresh id, which is returned.
pub trait CollectionStore {
	fn decks(&self) -> Result<Vec<Deck>, CollectionError>;
	fn notes_in_deck(&self, deck_id: i64) -> Result<Vec<Note>, CollectionError>;
	fn note_by_guid(&self, guid: &str) -> Result<Option<Note>, CollectionError>;
	fn note_model(&self, id: i64) -> Result<Option<NoteModel>, CollectionError>;
	fn note_models(&self) -> Result<Vec<NoteModel>, CollectionError>;
	fn deck_config(&self, id: i64) -> Result<Option<DeckConfig>, CollectionError>;
	fn deck_configs(&self) -> Result<Vec<DeckConfig>, CollectionError>;

	fn save_deck(&mut self, deck: &Deck) -> Result<i64, CollectionError>;
	fn save_deck_config(&mut self, config: &DeckConfig) -> Result<i64, CollectionError>;
	fn save_note_model(&mut self, model: &NoteModel) -> Result<i64, CollectionError>;
	fn save_note(&mut self, note: &Note) -> Result<i64, CollectionError>;

	/// Directory holding the media files referenced from note fields.
	fn media_dir(&self) -> PathBuf;

	fn deck_by_name(&self, name: &str) -> Result<Option<Deck>, CollectionError> {
		Ok(self.decks()?.into_iter().find(|deck| deck.name == name))
	}

	fn deck_by_uuid(&self, uuid: &str) -> Result<Option<Deck>, CollectionError> {
		Ok(self.decks()?.into_iter().find(|deck| deck.crowdanki_uuid.as_deref() == Some(uuid)))
	}

	/// Direct children of `parent`, in no particular order.
	fn child_decks(&self, parent: &Deck) -> Result<Vec<Deck>, CollectionError> {
		Ok(self.decks()?.into_iter().filter(|deck| deck.is_child_of(&parent.name)).collect())
	}

	fn note_model_by_uuid(&self, uuid: &str) -> Result<Option<NoteModel>, CollectionError> {
		Ok(self.note_models()?.into_iter().find(|model| model.crowdanki_uuid.as_deref() == Some(uuid)))
	}

	fn deck_config_by_uuid(&self, uuid: &str) -> Result<Option<DeckConfig>, CollectionError> {
		Ok(self.deck_configs()?.into_iter().find(|config| config.crowdanki_uuid.as_deref() == Some(uuid)))
	}
}
