use std::{collections::HashMap, path::Path};

use tracing::{debug, info, instrument};

use crate::{collection::CollectionStore, deck_locator, error::DeckError, exporter::{DECK_FILE_EXTENSION, DECK_FILE_NAME, MEDIA_SUBDIRECTORY_NAME}, media, settings::Settings, types::{Deck, DeckSnapshot, Metadata, Note, deck::{DECK_NAME_SEPARATOR, leaf_name}}};

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ImportSummary {
	pub decks:         usize,
	pub deck_configs:  usize,
	pub note_models:   usize,
	pub notes_added:   usize,
	pub notes_updated: usize,
	pub media_copied:  usize,
	pub media_failed:  usize,
}

/// Parses the canonical JSON of an exported deck.
pub fn parse_snapshot(text: &str) -> Result<DeckSnapshot, DeckError> { Ok(serde_json::from_str(text)?) }

// uuid -> collection id of the shared entities already imported
#[derive(Debug, Default)]
struct Resolved {
	deck_configs: HashMap<String, i64>,
	note_models:  HashMap<String, i64>,
}

/// Applies exported decks to a collection, matching existing entities by
/// their stable identifiers so that re-importing updates instead of
/// duplicating.
pub struct DeckImporter<'c, C: ?Sized> {
	collection:           &'c mut C,
	ignore_deck_movement: bool,
}

impl<'c, C> DeckImporter<'c, C>
where
	C: CollectionStore + ?Sized,
{
	pub fn new(collection: &'c mut C, settings: &Settings) -> Self {
		Self { collection, ignore_deck_movement: settings.import_notes_ignore_deck_movement }
	}

	#[instrument(skip(self))]
	pub fn import_from_directory(&mut self, directory: &Path, import_media: bool) -> Result<ImportSummary, DeckError> {
		let file_name = format!("{}{}", DECK_FILE_NAME, DECK_FILE_EXTENSION);
		let deck_file = deck_locator::find_deck_file(directory, &file_name)?;

		let snapshot = parse_snapshot(&fs_err::read_to_string(&deck_file)?)?;
		let mut summary = self.import_snapshot(&snapshot)?;

		if import_media {
			let deck_directory = deck_file.parent().unwrap_or(directory);
			let source = deck_directory.join(MEDIA_SUBDIRECTORY_NAME);
			let files = deck_locator::scan_media_directory(&source)?;

			let report = media::copy_media_files(&source, &self.collection.media_dir(), &files)?;
			summary.media_copied = report.copied.len();
			summary.media_failed = report.failures.len();
		}

		Ok(summary)
	}

	#[instrument(skip(self, snapshot), fields(deck = snapshot.name()))]
	pub fn import_snapshot(&mut self, snapshot: &DeckSnapshot) -> Result<ImportSummary, DeckError> {
		let metadata = snapshot.metadata.as_ref().ok_or(DeckError::MissingMetadata)?;

		let mut summary = ImportSummary::default();
		let resolved = self.import_shared(metadata, &mut summary)?;

		self.ensure_ancestors(&snapshot.header.name)?;
		self.import_deck(snapshot, None, &resolved, &mut summary)?;

		info!(
			"Imported {} decks: {} notes added, {} updated",
			summary.decks, summary.notes_added, summary.notes_updated
		);
		Ok(summary)
	}

	fn import_shared(&mut self, metadata: &Metadata, summary: &mut ImportSummary) -> Result<Resolved, DeckError> {
		let mut resolved = Resolved::default();

		for (uuid, config) in &metadata.deck_configs {
			let mut record = config.clone();
			record.id = self.collection.deck_config_by_uuid(uuid)?.map_or(0, |existing| existing.id);
			record.crowdanki_uuid = Some(uuid.clone());

			let id = self.collection.save_deck_config(&record)?;
			resolved.deck_configs.insert(uuid.clone(), id);
			summary.deck_configs += 1;
		}

		for (uuid, model) in &metadata.note_models {
			let mut record = model.clone();
			record.id = self.collection.note_model_by_uuid(uuid)?.map_or(0, |existing| existing.id);
			record.crowdanki_uuid = Some(uuid.clone());

			let id = self.collection.save_note_model(&record)?;
			resolved.note_models.insert(uuid.clone(), id);
			summary.note_models += 1;
		}

		Ok(resolved)
	}

	/// Anki keeps a deck's ancestors around; create any that are missing.
	fn ensure_ancestors(&mut self, full_name: &str) -> Result<(), DeckError> {
		let parts: Vec<&str> = full_name.split(DECK_NAME_SEPARATOR).collect();
		for depth in 1..parts.len() {
			let ancestor = parts[..depth].join(DECK_NAME_SEPARATOR);
			if self.collection.deck_by_name(&ancestor)?.is_none() {
				debug!("Creating missing parent deck '{}'", ancestor);
				self.collection.save_deck(&Deck::new(ancestor))?;
			}
		}
		Ok(())
	}

	fn import_deck(
		&mut self,
		snapshot: &DeckSnapshot,
		parent: Option<&str>,
		resolved: &Resolved,
		summary: &mut ImportSummary,
	) -> Result<(), DeckError> {
		let header = &snapshot.header;
		let full_name = match parent {
			Some(parent) => format!("{}{}{}", parent, DECK_NAME_SEPARATOR, leaf_name(&header.name)),
			None => header.name.clone(),
		};

		let existing = match self.collection.deck_by_name(&full_name)? {
			Some(deck) => Some(deck),
			None => self.collection.deck_by_uuid(&header.crowdanki_uuid)?,
		};

		let mut deck = existing.unwrap_or_else(|| Deck::new(full_name.clone()));
		deck.name = full_name.clone();
		deck.desc = header.desc.clone();
		deck.is_dynamic = false;
		deck.extend_new = header.extend_new;
		deck.extend_rev = header.extend_rev;
		deck.crowdanki_uuid = Some(header.crowdanki_uuid.clone());
		if let Some(config_uuid) = &header.deck_config_uuid {
			deck.conf = resolved.deck_configs.get(config_uuid).copied().or(deck.conf);
		}

		let deck_id = self.collection.save_deck(&deck)?;
		summary.decks += 1;
		debug!("Imported deck '{}' as {}", full_name, deck_id);

		for note in &snapshot.notes {
			let model_id = match resolved.note_models.get(&note.note_model_uuid) {
				Some(id) => *id,
				None => self.collection.note_model_by_uuid(&note.note_model_uuid)?.map(|model| model.id).ok_or_else(|| {
					DeckError::UnknownNoteModel { guid: note.guid.clone(), model_uuid: note.note_model_uuid.clone() }
				})?,
			};

			let record = match self.collection.note_by_guid(&note.guid)? {
				Some(mut existing) => {
					if !self.ignore_deck_movement {
						existing.deck_id = deck_id;
					}
					summary.notes_updated += 1;
					Note {
						model_id,
						fields: note.fields.clone(),
						tags: note.tags.clone(),
						flags: note.flags,
						data: note.data.clone(),
						..existing
					}
				}
				None => {
					summary.notes_added += 1;
					Note {
						id: 0,
						guid: note.guid.clone(),
						model_id,
						deck_id,
						fields: note.fields.clone(),
						tags: note.tags.clone(),
						flags: note.flags,
						data: note.data.clone(),
					}
				}
			};
			self.collection.save_note(&record)?;
		}

		for child in &snapshot.children {
			self.import_deck(child, Some(&full_name), resolved, summary)?;
		}

		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::{memory_collection::MemoryCollection, serializer::CanonicalSerializer, snapshot_builder::build_snapshot, types::{DeckConfig, NoteModel}};

	fn exported(deck_name: &str) -> DeckSnapshot {
		let mut collection = MemoryCollection::default();
		let config = collection.save_deck_config(&DeckConfig::new("Default")).unwrap();
		let model = collection.save_note_model(&NoteModel::new("Basic", &["Front", "Back"], vec![])).unwrap();

		for name in ["Japanese", "Japanese::N5", "Japanese::N5::Verbs"] {
			let id = collection.save_deck(&Deck { conf: Some(config), ..Deck::new(name) }).unwrap();
			collection.save_note(&Note::new(model, id, &[leaf_name(name), "back"]).with_guid(name)).unwrap();
		}

		let snapshot = build_snapshot(&collection, deck_name).unwrap();
		parse_snapshot(&CanonicalSerializer::default().serialize(&snapshot).unwrap()).unwrap()
	}

	#[test]
	fn import_into_empty_collection_rebuilds_the_tree() {
		let mut collection = MemoryCollection::default();
		let summary = DeckImporter::new(&mut collection, &Settings::default()).import_snapshot(&exported("Japanese")).unwrap();

		assert_eq!(summary.decks, 3);
		assert_eq!(summary.notes_added, 3);
		assert_eq!(summary.note_models, 1);
		assert_eq!(summary.deck_configs, 1);

		let verbs = collection.deck_by_name("Japanese::N5::Verbs").unwrap().unwrap();
		let note = collection.note_by_guid("Japanese::N5::Verbs").unwrap().unwrap();
		assert_eq!(note.deck_id, verbs.id);
		assert_eq!(note.fields, ["Verbs", "back"]);
		assert!(verbs.conf.is_some());
	}

	#[test]
	fn reimport_updates_instead_of_duplicating() {
		let snapshot = exported("Japanese");
		let mut collection = MemoryCollection::default();
		DeckImporter::new(&mut collection, &Settings::default()).import_snapshot(&snapshot).unwrap();
		let summary = DeckImporter::new(&mut collection, &Settings::default()).import_snapshot(&snapshot).unwrap();

		assert_eq!(summary.notes_added, 0);
		assert_eq!(summary.notes_updated, 3);
		assert_eq!(collection.all_notes().count(), 3);
		assert_eq!(collection.decks().unwrap().len(), 3);
		assert_eq!(collection.note_models().unwrap().len(), 1);
	}

	#[test]
	fn subdeck_export_creates_missing_parents() {
		let mut collection = MemoryCollection::default();
		DeckImporter::new(&mut collection, &Settings::default()).import_snapshot(&exported("Japanese::N5")).unwrap();

		assert!(collection.deck_by_name("Japanese").unwrap().is_some());
		assert!(collection.deck_by_name("Japanese::N5::Verbs").unwrap().is_some());
	}

	#[test]
	fn moved_notes_stay_put_when_deck_movement_is_ignored() {
		let snapshot = exported("Japanese");
		let mut collection = MemoryCollection::default();
		DeckImporter::new(&mut collection, &Settings::default()).import_snapshot(&snapshot).unwrap();

		let elsewhere = collection.save_deck(&Deck::new("Elsewhere")).unwrap();
		let mut note = collection.note_by_guid("Japanese").unwrap().unwrap();
		note.deck_id = elsewhere;
		collection.save_note(&note).unwrap();

		let settings = Settings { import_notes_ignore_deck_movement: true, ..Settings::default() };
		DeckImporter::new(&mut collection, &settings).import_snapshot(&snapshot).unwrap();
		assert_eq!(collection.note_by_guid("Japanese").unwrap().unwrap().deck_id, elsewhere);

		DeckImporter::new(&mut collection, &Settings::default()).import_snapshot(&snapshot).unwrap();
		assert_ne!(collection.note_by_guid("Japanese").unwrap().unwrap().deck_id, elsewhere);
	}

	#[test]
	fn child_export_without_metadata_is_rejected() {
		let mut snapshot = exported("Japanese");
		snapshot.metadata = None;

		let mut collection = MemoryCollection::default();
		let err = DeckImporter::new(&mut collection, &Settings::default()).import_snapshot(&snapshot).unwrap_err();
		assert!(matches!(err, DeckError::MissingMetadata));
	}

	#[test]
	fn unknown_note_model_is_reported() {
		let mut snapshot = exported("Japanese");
		snapshot.notes[0].note_model_uuid = "missing".to_string();

		let mut collection = MemoryCollection::default();
		let err = DeckImporter::new(&mut collection, &Settings::default()).import_snapshot(&snapshot).unwrap_err();
		assert!(matches!(err, DeckError::UnknownNoteModel { model_uuid, .. } if model_uuid == "missing"));
	}
}
