use std::{collections::BTreeMap, path::{Path, PathBuf}};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

use crate::{collection::{CollectionError, CollectionStore}, types::{Deck, DeckConfig, Note, NoteModel}};

/// A record written through [`CollectionStore`], by kind and id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Saved {
	Deck(i64),
	DeckConfig(i64),
	NoteModel(i64),
	Note(i64),
}

/// Collection kept in memory and persisted as a single JSON file.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct MemoryCollection {
	#[serde(default)]
	decks:        BTreeMap<i64, Deck>,
	#[serde(default)]
	deck_configs: BTreeMap<i64, DeckConfig>,
	#[serde(default)]
	note_models:  BTreeMap<i64, NoteModel>,
	#[serde(default)]
	notes:        BTreeMap<i64, Note>,

	#[serde(default)]
	media_dir: PathBuf,
	#[serde(default)]
	last_id:   i64,

	#[serde(skip)]
	journal: Vec<Saved>,
}

impl MemoryCollection {
	pub fn new(media_dir: impl Into<PathBuf>) -> Self {
		Self { media_dir: media_dir.into(), ..Self::default() }
	}

	#[instrument]
	pub fn load(path: &Path) -> Result<Self, CollectionError> {
		let text = fs_err::read_to_string(path)?;
		let mut collection: Self =
			serde_json::from_str(&text).map_err(|e| CollectionError::Corrupt(e.to_string()))?;

		// Models and configs don't carry their id in serialized form
		for (id, model) in collection.note_models.iter_mut() {
			model.id = *id;
		}
		for (id, config) in collection.deck_configs.iter_mut() {
			config.id = *id;
		}

		// Files written by hand may lack `last_id` or lag behind their keys
		let highest = [
			collection.decks.keys().next_back(),
			collection.deck_configs.keys().next_back(),
			collection.note_models.keys().next_back(),
			collection.notes.keys().next_back(),
		]
		.into_iter()
		.flatten()
		.copied()
		.max()
		.unwrap_or(0);
		collection.last_id = collection.last_id.max(highest);

		if collection.media_dir.is_relative() {
			if let Some(parent) = path.parent() {
				collection.media_dir = parent.join(&collection.media_dir);
			}
		}

		info!(
			"Loaded collection with {} decks and {} notes",
			collection.decks.len(),
			collection.notes.len()
		);
		Ok(collection)
	}

	#[instrument(skip(self))]
	pub fn persist(&self, path: &Path) -> Result<(), CollectionError> {
		let text = serde_json::to_string_pretty(self).map_err(|e| CollectionError::Corrupt(e.to_string()))?;
		fs_err::write(path, text)?;
		info!("Collection written to {:?}", path);
		Ok(())
	}

	/// Every save since the collection was created or loaded, oldest first.
	pub fn journal(&self) -> &[Saved] { &self.journal }

	pub fn clear_journal(&mut self) { self.journal.clear(); }

	pub fn note(&self, id: i64) -> Option<&Note> { self.notes.get(&id) }

	pub fn all_notes(&self) -> impl Iterator<Item = &Note> { self.notes.values() }

	fn next_id(&mut self) -> i64 {
		self.last_id += 1;
		self.last_id
	}

	fn assign_id(&mut self, id: i64) -> i64 {
		if id == 0 { self.next_id() } else { id }
	}
}

impl CollectionStore for MemoryCollection {
	fn decks(&self) -> Result<Vec<Deck>, CollectionError> { Ok(self.decks.values().cloned().collect()) }

	fn notes_in_deck(&self, deck_id: i64) -> Result<Vec<Note>, CollectionError> {
		Ok(self.notes.values().filter(|note| note.deck_id == deck_id).cloned().collect())
	}

	fn note_by_guid(&self, guid: &str) -> Result<Option<Note>, CollectionError> {
		Ok(self.notes.values().find(|note| !note.guid.is_empty() && note.guid == guid).cloned())
	}

	fn note_model(&self, id: i64) -> Result<Option<NoteModel>, CollectionError> {
		Ok(self.note_models.get(&id).cloned())
	}

	fn note_models(&self) -> Result<Vec<NoteModel>, CollectionError> {
		Ok(self.note_models.values().cloned().collect())
	}

	fn deck_config(&self, id: i64) -> Result<Option<DeckConfig>, CollectionError> {
		Ok(self.deck_configs.get(&id).cloned())
	}

	fn deck_configs(&self) -> Result<Vec<DeckConfig>, CollectionError> {
		Ok(self.deck_configs.values().cloned().collect())
	}

	fn save_deck(&mut self, deck: &Deck) -> Result<i64, CollectionError> {
		let clash = self.decks.values().any(|other| other.name == deck.name && other.id != deck.id);
		if clash {
			return Err(CollectionError::DuplicateDeckName(deck.name.clone()));
		}
		if deck.id != 0 && !self.decks.contains_key(&deck.id) {
			return Err(CollectionError::UnknownId { kind: "deck", id: deck.id });
		}

		let id = self.assign_id(deck.id);
		debug!("Saving deck {} ({})", deck.name, id);
		self.decks.insert(id, Deck { id, ..deck.clone() });
		self.journal.push(Saved::Deck(id));
		Ok(id)
	}

	fn save_deck_config(&mut self, config: &DeckConfig) -> Result<i64, CollectionError> {
		if config.id != 0 && !self.deck_configs.contains_key(&config.id) {
			return Err(CollectionError::UnknownId { kind: "deck configuration", id: config.id });
		}

		let id = self.assign_id(config.id);
		debug!("Saving deck configuration {} ({})", config.name, id);
		self.deck_configs.insert(id, DeckConfig { id, ..config.clone() });
		self.journal.push(Saved::DeckConfig(id));
		Ok(id)
	}

	fn save_note_model(&mut self, model: &NoteModel) -> Result<i64, CollectionError> {
		if model.id != 0 && !self.note_models.contains_key(&model.id) {
			return Err(CollectionError::UnknownId { kind: "note model", id: model.id });
		}

		let id = self.assign_id(model.id);
		debug!("Saving note model {} ({})", model.name, id);
		self.note_models.insert(id, NoteModel { id, ..model.clone() });
		self.journal.push(Saved::NoteModel(id));
		Ok(id)
	}

	fn save_note(&mut self, note: &Note) -> Result<i64, CollectionError> {
		if !self.decks.contains_key(&note.deck_id) {
			return Err(CollectionError::UnknownId { kind: "deck", id: note.deck_id });
		}
		if !self.note_models.contains_key(&note.model_id) {
			return Err(CollectionError::UnknownId { kind: "note model", id: note.model_id });
		}
		if note.id != 0 && !self.notes.contains_key(&note.id) {
			return Err(CollectionError::UnknownId { kind: "note", id: note.id });
		}

		let id = self.assign_id(note.id);
		self.notes.insert(id, Note { id, ..note.clone() });
		self.journal.push(Saved::Note(id));
		Ok(id)
	}

	fn media_dir(&self) -> PathBuf { self.media_dir.clone() }
}
