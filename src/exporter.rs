use std::path::{Path, PathBuf};

use tracing::{info, instrument, warn};

use crate::{change_propagator::commit_changes, collection::CollectionStore, error::DeckError, media::{self, MediaReport}, note_sorter::NoteSorter, notifier::Notification, sanitizer::sanitize_deck_name, serializer::CanonicalSerializer, settings::Settings, sink::{ContentStore, DirectorySink, RemoteSink, Sink, WriteKind}, snapshot_builder::build_snapshot, types::DeckSnapshot};

pub const DECK_FILE_NAME: &str = "deck";
pub const DECK_FILE_EXTENSION: &str = ".json";
pub const MEDIA_SUBDIRECTORY_NAME: &str = "media";

#[derive(Debug)]
pub struct DirectoryExport {
	pub deck_directory: PathBuf,
	pub note_count:     usize,
	pub write:          WriteKind,
	/// `None` when media copying was not requested.
	pub media:          Option<MediaReport>,
}

#[derive(Debug)]
pub enum RemoteOutcome {
	Uploaded { path: String, write: WriteKind },
	/// The remote side failed; nothing was uploaded.
	Warning(Notification),
}

/// Exports decks of one collection. Each call builds a fresh snapshot, writes
/// back identifiers assigned while building it, and hands the canonical JSON
/// to a sink.
pub struct DeckExporter<'c, C: ?Sized> {
	collection:          &'c mut C,
	note_sorter:         NoteSorter,
	serializer:          CanonicalSerializer,
	deck_name_sanitizer: fn(&str) -> String,
	deck_file_name:      String,
	last_exported_count: usize,
}

impl<'c, C> DeckExporter<'c, C>
where
	C: CollectionStore + ?Sized,
{
	pub fn new(collection: &'c mut C, settings: &Settings) -> Self {
		Self {
			collection,
			note_sorter: NoteSorter::from_settings(settings),
			serializer: CanonicalSerializer::default(),
			deck_name_sanitizer: sanitize_deck_name,
			deck_file_name: DECK_FILE_NAME.to_string(),
			last_exported_count: 0,
		}
	}

	pub fn with_serializer(mut self, serializer: CanonicalSerializer) -> Self {
		self.serializer = serializer;
		self
	}

	pub fn with_deck_name_sanitizer(mut self, sanitizer: fn(&str) -> String) -> Self {
		self.deck_name_sanitizer = sanitizer;
		self
	}

	pub fn with_deck_file_name(mut self, name: impl Into<String>) -> Self {
		self.deck_file_name = name.into();
		self
	}

	/// Number of notes in the most recent export, subdecks included.
	pub fn last_exported_count(&self) -> usize { self.last_exported_count }

	fn deck_file(&self) -> String { format!("{}{}", self.deck_file_name, DECK_FILE_EXTENSION) }

	fn prepare(&mut self, deck_name: &str) -> Result<(DeckSnapshot, String), DeckError> {
		let mut snapshot = build_snapshot(&*self.collection, deck_name)?;
		self.note_sorter.sort_tree(&mut snapshot);
		self.last_exported_count = snapshot.note_count();

		let text = self.serializer.serialize(&snapshot)?;
		commit_changes(&mut *self.collection, &snapshot)?;
		Ok((snapshot, text))
	}

	#[instrument(skip(self))]
	pub fn export_to_directory(
		&mut self,
		deck_name: &str,
		output_dir: &Path,
		copy_media: bool,
		create_deck_subdirectory: bool,
	) -> Result<DirectoryExport, DeckError> {
		let (snapshot, text) = self.prepare(deck_name)?;

		let deck_directory = if create_deck_subdirectory {
			output_dir.join((self.deck_name_sanitizer)(deck_name))
		} else {
			output_dir.to_path_buf()
		};

		let file = self.deck_file();
		let mut sink = DirectorySink::new(&deck_directory);
		let write = sink.write(&file, text.as_bytes()).map_err(|source| DeckError::Sink {
			path: deck_directory.join(&file).display().to_string(),
			source,
		})?;

		let media = if copy_media {
			let report = media::copy_media_files(
				&self.collection.media_dir(),
				&deck_directory.join(MEDIA_SUBDIRECTORY_NAME),
				&snapshot.media_file_list(),
			)?;
			Some(report)
		} else {
			None
		};

		info!("Exported {} notes of '{}' to {:?}", self.last_exported_count, deck_name, deck_directory);
		Ok(DirectoryExport { deck_directory, note_count: self.last_exported_count, write, media })
	}

	/// Remote failures come back as a warning notification instead of an
	/// error; collection and serialization problems are still errors.
	#[instrument(skip(self, sink))]
	pub fn export_to_remote<S: ContentStore>(
		&mut self,
		deck_name: &str,
		sink: &mut RemoteSink<S>,
		create_deck_subdirectory: bool,
	) -> Result<RemoteOutcome, DeckError> {
		let (_, text) = self.prepare(deck_name)?;

		let path = if create_deck_subdirectory {
			format!("{}/{}", (self.deck_name_sanitizer)(deck_name), self.deck_file())
		} else {
			self.deck_file()
		};

		let upload = sink.connect().and_then(|()| sink.write(&path, text.as_bytes()));
		match upload {
			Ok(write) => {
				info!("Uploaded {} notes of '{}' to {}", self.last_exported_count, deck_name, path);
				Ok(RemoteOutcome::Uploaded { path, write })
			}
			Err(e) => {
				warn!("Upload of '{}' failed: {}", deck_name, e);
				Ok(RemoteOutcome::Warning(e.notification()))
			}
		}
	}

	/// Exports each of `deck_names` (every top-level deck when empty) into its
	/// own subdirectory of `root`, without media.
	#[instrument(skip(self))]
	pub fn export_snapshot(&mut self, root: &Path, deck_names: &[String]) -> Result<Vec<DirectoryExport>, DeckError> {
		let names: Vec<String> = if deck_names.is_empty() {
			let mut names: Vec<String> = self
				.collection
				.decks()?
				.into_iter()
				.filter(|deck| deck.is_top_level() && !deck.is_dynamic)
				.map(|deck| deck.name)
				.collect();
			names.sort();
			names
		} else {
			deck_names.to_vec()
		};

		let mut exports = Vec::with_capacity(names.len());
		for name in &names {
			exports.push(self.export_to_directory(name, root, false, true)?);
		}

		info!("Snapshot of {} decks written to {:?}", exports.len(), root);
		Ok(exports)
	}
}
