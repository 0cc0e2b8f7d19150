//! Deterministic JSON export and import of flashcard decks.
//!
//! An export walks one deck of a [`CollectionStore`] into a snapshot tree
//! ([`snapshot_builder`]), orders its notes by content ([`note_sorter`]),
//! prints it as canonical JSON ([`serializer`]) and hands the text to a
//! [`Sink`](sink::Sink): a local directory or a hosted repository. Identifiers
//! assigned along the way are written back to the collection
//! ([`change_propagator`]), so exporting an unchanged deck twice yields the
//! same bytes.

pub mod change_propagator;
pub mod collection;
pub mod deck_locator;
pub mod error;
pub mod exporter;
pub mod importer;
pub mod media;
pub mod memory_collection;
pub mod note_sorter;
pub mod notifier;
pub mod sanitizer;
pub mod serializer;
pub mod settings;
pub mod sink;
pub mod snapshot_builder;
pub mod types;
pub mod uuid_generator;

pub use collection::{CollectionError, CollectionStore};
pub use error::DeckError;
pub use exporter::{DeckExporter, DirectoryExport, RemoteOutcome};
pub use importer::{DeckImporter, ImportSummary};
pub use memory_collection::MemoryCollection;
pub use settings::Settings;
