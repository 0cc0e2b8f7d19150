use std::path::PathBuf;

use thiserror::Error;

use crate::collection::CollectionError;

#[derive(Debug, Error)]
pub enum DeckError {
	#[error("Deck '{0}' not found")]
	NotFound(String),

	#[error("Deck '{0}' is a filtered deck and cannot be exported")]
	DynamicDeck(String),

	#[error("Note model {0} not found")]
	ModelNotFound(i64),

	#[error("Deck configuration {0} not found")]
	DeckConfigNotFound(i64),

	#[error("No conversion to a plain representation for {type_name}: {reason}")]
	Serialization { type_name: &'static str, reason: String },

	#[error("Snapshot has no metadata section")]
	MissingMetadata,

	#[error("Note '{guid}' references unknown note model '{model_uuid}'")]
	UnknownNoteModel { guid: String, model_uuid: String },

	#[error("No deck file found in {0}")]
	NoDeckFound(PathBuf),

	#[error("Invalid configuration: {0}")]
	Config(String),

	#[error("Failed writing '{path}': {source}")]
	Sink {
		path:   String,
		#[source]
		source: std::io::Error,
	},

	#[error(transparent)]
	Collection(#[from] CollectionError),

	#[error(transparent)]
	Json(#[from] serde_json::Error),

	#[error(transparent)]
	Io(#[from] std::io::Error),
}

impl From<toml::de::Error> for DeckError {
	fn from(err: toml::de::Error) -> Self { DeckError::Config(err.to_string()) }
}

/// A single media file that could not be copied. Never fatal to an export or
/// import; these are collected and reported.
#[derive(Debug, Error)]
#[error("Failed to copy media file '{file}': {source}")]
pub struct MediaCopyError {
	pub file:   String,
	#[source]
	pub source: std::io::Error,
}
