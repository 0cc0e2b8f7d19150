//! Walks the collection from one named deck and produces the snapshot tree:
//! the deck, its non-filtered descendants, their notes, and a single
//! metadata section holding every note model and deck configuration they
//! reference.
//!
//! Building has one deliberate side effect on the *snapshot*: decks, models
//! and configurations without a `crowdanki_uuid`, and notes without a guid,
//! get one here. The collection itself is untouched until
//! [`commit_changes`](crate::change_propagator::commit_changes) writes the
//! updated records back. Entities that already carry an identifier keep it.

use std::collections::HashMap;

use tracing::{debug, info, instrument};

use crate::{collection::CollectionStore, error::DeckError, media, types::{Deck, DeckHeader, DeckSnapshot, Metadata, Note, NoteSnapshot}, uuid_generator};

#[instrument(skip(collection))]
pub fn build_snapshot<C>(collection: &C, deck_name: &str) -> Result<DeckSnapshot, DeckError>
where
	C: CollectionStore + ?Sized,
{
	let deck = collection.deck_by_name(deck_name)?.ok_or_else(|| DeckError::NotFound(deck_name.to_string()))?;

	if deck.is_dynamic {
		return Err(DeckError::DynamicDeck(deck.name));
	}

	let mut builder = SnapshotBuilder::new(collection);
	let mut snapshot = builder.build_deck(deck)?;
	snapshot.metadata = Some(builder.metadata);

	info!("Built snapshot of '{}' with {} notes", deck_name, snapshot.note_count());
	Ok(snapshot)
}

struct SnapshotBuilder<'c, C: ?Sized> {
	collection:   &'c C,
	metadata:     Metadata,
	// collection id -> uuid of everything already placed in `metadata`
	model_uuids:  HashMap<i64, String>,
	config_uuids: HashMap<i64, String>,
}

impl<'c, C> SnapshotBuilder<'c, C>
where
	C: CollectionStore + ?Sized,
{
	fn new(collection: &'c C) -> Self {
		Self { collection, metadata: Metadata::default(), model_uuids: HashMap::new(), config_uuids: HashMap::new() }
	}

	fn build_deck(&mut self, mut deck: Deck) -> Result<DeckSnapshot, DeckError> {
		debug!("Building deck '{}'", deck.name);

		let crowdanki_uuid = ensure_uuid(&mut deck.crowdanki_uuid);
		let deck_config_uuid = match deck.conf {
			Some(config_id) if !deck.is_dynamic => Some(self.resolve_config(config_id)?),
			_ => None,
		};

		let mut notes = Vec::new();
		for note in self.collection.notes_in_deck(deck.id)? {
			notes.push(self.build_note(note)?);
		}

		let media_files = media::files_in_fields(notes.iter().flat_map(|note| &note.fields)).into_iter().collect();

		let mut child_decks = self.collection.child_decks(&deck)?;
		child_decks.retain(|child| {
			if child.is_dynamic {
				debug!("Skipping filtered deck '{}'", child.name);
			}
			!child.is_dynamic
		});
		child_decks.sort_by(|a, b| a.name.cmp(&b.name));

		let children = child_decks.into_iter().map(|child| self.build_deck(child)).collect::<Result<Vec<_>, _>>()?;

		let header = DeckHeader {
			name: deck.name.clone(),
			crowdanki_uuid,
			deck_config_uuid,
			desc: deck.desc.clone(),
			is_dynamic: i32::from(deck.is_dynamic),
			extend_new: deck.extend_new,
			extend_rev: deck.extend_rev,
			media_files,
		};

		Ok(DeckSnapshot { header, notes, children, metadata: None, source: Some(deck) })
	}

	fn build_note(&mut self, mut note: Note) -> Result<NoteSnapshot, DeckError> {
		let note_model_uuid = self.resolve_model(note.model_id)?;

		let guid_assigned = note.guid.is_empty();
		if guid_assigned {
			let namespace = uuid_generator::model_namespace(&note_model_uuid);
			note.guid = uuid_generator::generate_note_uuid(&namespace, &note.to_content_string()).to_string();
			debug!("Assigned guid {} to note {}", note.guid, note.id);
		}

		let mut tags = note.tags.clone();
		tags.sort();
		tags.dedup();

		Ok(NoteSnapshot {
			guid: note.guid.clone(),
			note_model_uuid,
			fields: note.fields.clone(),
			tags,
			flags: note.flags,
			data: note.data.clone(),
			source: Some(note),
			guid_assigned,
		})
	}

	fn resolve_model(&mut self, model_id: i64) -> Result<String, DeckError> {
		if let Some(uuid) = self.model_uuids.get(&model_id) {
			return Ok(uuid.clone());
		}

		let mut model = self.collection.note_model(model_id)?.ok_or(DeckError::ModelNotFound(model_id))?;
		let uuid = ensure_uuid(&mut model.crowdanki_uuid);
		debug!("Recording note model '{}' as {}", model.name, uuid);

		self.model_uuids.insert(model_id, uuid.clone());
		self.metadata.note_models.insert(uuid.clone(), model);
		Ok(uuid)
	}

	fn resolve_config(&mut self, config_id: i64) -> Result<String, DeckError> {
		if let Some(uuid) = self.config_uuids.get(&config_id) {
			return Ok(uuid.clone());
		}

		let mut config =
			self.collection.deck_config(config_id)?.ok_or(DeckError::DeckConfigNotFound(config_id))?;
		let uuid = ensure_uuid(&mut config.crowdanki_uuid);
		debug!("Recording deck configuration '{}' as {}", config.name, uuid);

		self.config_uuids.insert(config_id, uuid.clone());
		self.metadata.deck_configs.insert(uuid.clone(), config);
		Ok(uuid)
	}
}

fn ensure_uuid(slot: &mut Option<String>) -> String {
	slot.get_or_insert_with(|| uuid_generator::create_entity_uuid().to_string()).clone()
}
