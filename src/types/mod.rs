pub mod deck;
pub mod deck_config;
pub mod note;
pub mod note_model;
pub mod snapshot;

pub use deck::Deck;
pub use deck_config::DeckConfig;
pub use note::Note;
pub use note_model::{Field, NoteModel, NoteModelType, Template};
pub use snapshot::{DeckHeader, DeckSnapshot, Metadata, NoteSnapshot};
