use std::path::Path;

use flash_export::{CollectionStore, DeckError, DeckExporter, DeckImporter, MemoryCollection, Settings, sink::WriteKind, types::{Deck, DeckConfig, Note, NoteModel}};

struct Ids {
	model:  i64,
	config: i64,
}

fn shared(collection: &mut MemoryCollection) -> Ids {
	let config = collection
		.save_deck_config(&DeckConfig { crowdanki_uuid: Some("config-uuid".into()), ..DeckConfig::new("Default") })
		.unwrap();
	let model = collection
		.save_note_model(&NoteModel {
			crowdanki_uuid: Some("model-uuid".into()),
			..NoteModel::new("Basic", &["Front", "Back"], vec![])
		})
		.unwrap();
	Ids { model, config }
}

fn deck(collection: &mut MemoryCollection, ids: &Ids, name: &str) -> i64 {
	collection
		.save_deck(&Deck {
			conf: Some(ids.config),
			crowdanki_uuid: Some(format!("{}-uuid", name)),
			..Deck::new(name)
		})
		.unwrap()
}

fn japanese(media_dir: &Path) -> MemoryCollection {
	let mut collection = MemoryCollection::new(media_dir);
	let ids = shared(&mut collection);
	let root = deck(&mut collection, &ids, "Japanese");
	let n5 = deck(&mut collection, &ids, "Japanese::N5");

	for (deck_id, front, tags) in [
		(root, "犬", &["animal"][..]),
		(n5, "食べる [sound:taberu.mp3]", &["verb", "n5"][..]),
		(n5, "<img src=\"cat.png\"> 猫", &["animal", "n5"][..]),
		(n5, "飲む [sound:nomu.mp3]", &["verb"][..]),
	] {
		collection.save_note(&Note::new(ids.model, deck_id, &[front, "back"]).with_tags(tags)).unwrap();
	}
	collection
}

fn read_deck(directory: &Path) -> String { fs_err::read_to_string(directory.join("deck.json")).unwrap() }

#[test]
fn second_export_is_byte_identical_and_assigns_nothing() {
	let media = tempfile::tempdir().unwrap();
	let out = tempfile::tempdir().unwrap();
	let mut collection = japanese(media.path());
	let settings = Settings::default();

	let first = DeckExporter::new(&mut collection, &settings).export_to_directory("Japanese", out.path(), false, true).unwrap();
	let first_text = read_deck(&first.deck_directory);
	assert_eq!(first.write, WriteKind::Created);
	assert_eq!(first.note_count, 4);
	assert!(collection.all_notes().all(|note| !note.guid.is_empty()));

	collection.clear_journal();
	let second = DeckExporter::new(&mut collection, &settings).export_to_directory("Japanese", out.path(), false, true).unwrap();

	assert_eq!(second.write, WriteKind::Unchanged);
	assert_eq!(read_deck(&second.deck_directory), first_text);
	assert!(!collection.journal().iter().any(|saved| matches!(saved, flash_export::memory_collection::Saved::Note(_))));
}

#[test]
fn identifiers_assigned_on_first_export_keep_later_exports_identical() {
	let out = tempfile::tempdir().unwrap();
	let mut collection = MemoryCollection::default();
	let config = collection.save_deck_config(&DeckConfig::new("Default")).unwrap();
	let model = collection.save_note_model(&NoteModel::new("Basic", &["Front", "Back"], vec![])).unwrap();
	for name in ["Fresh", "Fresh::Child"] {
		let id = collection.save_deck(&Deck { conf: Some(config), ..Deck::new(name) }).unwrap();
		collection.save_note(&Note::new(model, id, &[name, "back"])).unwrap();
	}
	let settings = Settings::default();

	let first = DeckExporter::new(&mut collection, &settings).export_to_directory("Fresh", out.path(), false, true).unwrap();
	let first_text = read_deck(&first.deck_directory);

	let deck_uuid = collection.deck_by_name("Fresh::Child").unwrap().unwrap().crowdanki_uuid.unwrap();
	let model_uuid = collection.note_model(model).unwrap().unwrap().crowdanki_uuid.unwrap();
	let config_uuid = collection.deck_config(config).unwrap().unwrap().crowdanki_uuid.unwrap();
	for uuid in [&deck_uuid, &model_uuid, &config_uuid] {
		assert!(first_text.contains(uuid.as_str()));
	}

	let second = DeckExporter::new(&mut collection, &settings).export_to_directory("Fresh", out.path(), false, true).unwrap();

	assert_eq!(second.write, WriteKind::Unchanged);
	assert_eq!(read_deck(&second.deck_directory), first_text);
	assert_eq!(collection.note_model(model).unwrap().unwrap().crowdanki_uuid, Some(model_uuid));
	assert_eq!(collection.deck_config(config).unwrap().unwrap().crowdanki_uuid, Some(config_uuid));
}

#[test]
fn output_ignores_collection_insertion_order() {
	let build = |reversed: bool| {
		let mut collection = MemoryCollection::default();
		let ids = shared(&mut collection);
		let root = deck(&mut collection, &ids, "Root");

		let mut notes = vec![("b", "guid-b"), ("a", "guid-a"), ("a", "guid-c"), ("c", "guid-d")];
		if reversed {
			notes.reverse();
		}
		for (front, guid) in notes {
			collection.save_note(&Note::new(ids.model, root, &[front, ""]).with_tags(&["t"]).with_guid(guid)).unwrap();
		}
		collection
	};

	let settings = Settings::default();
	let (one, two) = (tempfile::tempdir().unwrap(), tempfile::tempdir().unwrap());

	let mut first = build(false);
	let mut second = build(true);
	DeckExporter::new(&mut first, &settings).export_to_directory("Root", one.path(), false, false).unwrap();
	DeckExporter::new(&mut second, &settings).export_to_directory("Root", two.path(), false, false).unwrap();

	let text = read_deck(one.path());
	assert_eq!(text, read_deck(two.path()));

	let order: Vec<usize> = ["guid-a", "guid-c", "guid-b", "guid-d"].iter().map(|guid| text.find(guid).unwrap()).collect();
	assert!(order.windows(2).all(|pair| pair[0] < pair[1]));
}

#[test]
fn shared_entities_are_exported_once() {
	let out = tempfile::tempdir().unwrap();
	let mut collection = japanese(out.path());
	DeckExporter::new(&mut collection, &Settings::default()).export_to_directory("Japanese", out.path(), false, false).unwrap();

	let text = read_deck(out.path());
	assert_eq!(text.matches("\"__type__\": \"NoteModel\"").count(), 1);
	assert_eq!(text.matches("\"__type__\": \"DeckConfig\"").count(), 1);
	assert_eq!(text.matches("\"metadata\"").count(), 1);
	assert!(text.contains("食べる"));
	assert!(!text.ends_with('\n'));
}

#[test]
fn nested_deck_name_is_sanitized_for_the_subdirectory() {
	let media = tempfile::tempdir().unwrap();
	let out = tempfile::tempdir().unwrap();
	let mut collection = japanese(media.path());
	let settings = Settings::default();

	let nested = DeckExporter::new(&mut collection, &settings).export_to_directory("Japanese::N5", out.path(), false, true).unwrap();
	assert_eq!(nested.deck_directory, out.path().join("Japanese_N5"));
	assert!(out.path().join("Japanese_N5/deck.json").is_file());

	let flat = DeckExporter::new(&mut collection, &settings).export_to_directory("Japanese::N5", out.path(), false, false).unwrap();
	assert_eq!(flat.deck_directory, out.path());
	assert!(out.path().join("deck.json").is_file());
}

#[test]
fn missing_media_file_does_not_stop_the_export() {
	let media = tempfile::tempdir().unwrap();
	let out = tempfile::tempdir().unwrap();
	fs_err::write(media.path().join("taberu.mp3"), b"audio").unwrap();
	fs_err::write(media.path().join("cat.png"), b"image").unwrap();

	let mut collection = japanese(media.path());
	let export = DeckExporter::new(&mut collection, &Settings::default())
		.export_to_directory("Japanese", out.path(), true, true)
		.unwrap();

	let report = export.media.unwrap();
	assert_eq!(report.copied, ["cat.png", "taberu.mp3"]);
	assert_eq!(report.failures.len(), 1);
	assert_eq!(report.failures[0].file, "nomu.mp3");
	assert!(export.deck_directory.join("deck.json").is_file());
	assert!(export.deck_directory.join("media/cat.png").is_file());
}

#[test]
fn unknown_and_filtered_decks_fail() {
	let out = tempfile::tempdir().unwrap();
	let mut collection = japanese(out.path());
	collection.save_deck(&Deck { is_dynamic: true, ..Deck::new("Cram") }).unwrap();
	let settings = Settings::default();

	let err = DeckExporter::new(&mut collection, &settings).export_to_directory("Spanish", out.path(), false, true).unwrap_err();
	assert!(matches!(err, DeckError::NotFound(_)));

	let err = DeckExporter::new(&mut collection, &settings).export_to_directory("Cram", out.path(), false, true).unwrap_err();
	assert!(matches!(err, DeckError::DynamicDeck(_)));
}

#[test]
fn snapshot_exports_every_top_level_deck() {
	let out = tempfile::tempdir().unwrap();
	let mut collection = japanese(out.path());
	let model = collection.note_models().unwrap()[0].id;
	let french = collection.save_deck(&Deck::new("French")).unwrap();
	collection.save_note(&Note::new(model, french, &["chat", "cat"])).unwrap();

	let exports = DeckExporter::new(&mut collection, &Settings::default()).export_snapshot(out.path(), &[]).unwrap();

	let directories: Vec<_> = exports.iter().map(|export| export.deck_directory.clone()).collect();
	assert_eq!(directories, [out.path().join("French"), out.path().join("Japanese")]);
	assert!(exports.iter().all(|export| export.media.is_none()));
}

#[test]
fn exported_deck_imports_into_a_fresh_collection() {
	let media = tempfile::tempdir().unwrap();
	let out = tempfile::tempdir().unwrap();
	fs_err::write(media.path().join("cat.png"), b"image").unwrap();

	let mut source = japanese(media.path());
	DeckExporter::new(&mut source, &Settings::default()).export_to_directory("Japanese", out.path(), true, true).unwrap();

	let target_media = tempfile::tempdir().unwrap();
	let mut target = MemoryCollection::new(target_media.path());
	let summary = DeckImporter::new(&mut target, &Settings::default()).import_from_directory(out.path(), true).unwrap();

	assert_eq!(summary.decks, 2);
	assert_eq!(summary.notes_added, 4);
	assert_eq!(summary.media_copied, 1);
	assert!(target_media.path().join("cat.png").is_file());

	for note in source.all_notes() {
		let imported = target.note_by_guid(&note.guid).unwrap().unwrap();
		let mut tags = note.tags.clone();
		tags.sort();
		assert_eq!(imported.fields, note.fields);
		assert_eq!(imported.tags, tags);

		let source_deck = &source.decks().unwrap().into_iter().find(|d| d.id == note.deck_id).unwrap().name;
		let target_deck = &target.decks().unwrap().into_iter().find(|d| d.id == imported.deck_id).unwrap().name;
		assert_eq!(source_deck, target_deck);
	}

	let n5 = target.deck_by_name("Japanese::N5").unwrap().unwrap();
	assert_eq!(n5.crowdanki_uuid.as_deref(), Some("Japanese::N5-uuid"));
}
