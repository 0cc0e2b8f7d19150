//! Writes the records touched while building a snapshot back into the
//! collection: every deck of the tree, notes that were given a guid, and each
//! shared deck configuration and note model exactly once.

use std::collections::BTreeSet;

use tracing::{debug, info, instrument};

use crate::{collection::CollectionStore, error::DeckError, types::DeckSnapshot};

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CommitSummary {
	pub decks:        usize,
	pub notes:        usize,
	pub deck_configs: usize,
	pub note_models:  usize,
}

#[instrument(skip(collection, deck), fields(deck = deck.name()))]
pub fn commit_changes<C>(collection: &mut C, deck: &DeckSnapshot) -> Result<CommitSummary, DeckError>
where
	C: CollectionStore + ?Sized,
{
	let mut summary = CommitSummary::default();
	save_changes(collection, deck, false, &mut summary)?;
	info!(
		"Saved {} decks, {} notes, {} deck configurations, {} note models",
		summary.decks, summary.notes, summary.deck_configs, summary.note_models
	);
	Ok(summary)
}

/// `is_nested_call` is set for the decks below the one being exported. Only
/// the outermost call saves shared entities, after its subtree is done.
fn save_changes<C>(
	collection: &mut C,
	deck: &DeckSnapshot,
	is_nested_call: bool,
	summary: &mut CommitSummary,
) -> Result<(), DeckError>
where
	C: CollectionStore + ?Sized,
{
	if let Some(record) = &deck.source {
		collection.save_deck(record)?;
		summary.decks += 1;
	}

	for note in deck.notes.iter().filter(|note| note.guid_assigned) {
		if let Some(record) = &note.source {
			debug!("Saving guid {} for note {}", record.guid, record.id);
			collection.save_note(record)?;
			summary.notes += 1;
		}
	}

	for child in &deck.children {
		save_changes(collection, child, true, summary)?;
	}

	if is_nested_call {
		return Ok(());
	}

	let Some(metadata) = &deck.metadata else {
		return Ok(());
	};

	let mut saved = BTreeSet::new();
	for config in metadata.deck_configs.values() {
		if saved.insert(config.id) {
			collection.save_deck_config(config)?;
			summary.deck_configs += 1;
		}
	}

	saved.clear();
	for model in metadata.note_models.values() {
		if saved.insert(model.id) {
			collection.save_note_model(model)?;
			summary.note_models += 1;
		}
	}

	Ok(())
}
