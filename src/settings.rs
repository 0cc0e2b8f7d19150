use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

use crate::{error::DeckError, note_sorter::{NoteSortMethod, default_sort_methods}};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
	pub snapshot_path:       PathBuf,
	pub snapshot_root_decks: Vec<String>,

	pub export_notes_reverse_order:      bool,
	pub export_note_sort_methods:        Vec<NoteSortMethod>,
	pub export_create_deck_subdirectory: bool,

	pub import_notes_ignore_deck_movement: bool,

	pub github: GitHubSettings,
}

impl Default for Settings {
	fn default() -> Self {
		Self {
			snapshot_path:                     PathBuf::from("snapshots"),
			snapshot_root_decks:               Vec::new(),
			export_notes_reverse_order:        false,
			export_note_sort_methods:          default_sort_methods(),
			export_create_deck_subdirectory:   true,
			import_notes_ignore_deck_movement: false,
			github:                            GitHubSettings::default(),
		}
	}
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GitHubSettings {
	pub username:   String,
	/// Personal access token, not the account password.
	pub token:      String,
	/// `repo` (owned by `username`) or `owner/repo`.
	pub repository: String,
	pub branch:     String,
}

impl Default for GitHubSettings {
	fn default() -> Self {
		Self {
			username:   String::new(),
			token:      String::new(),
			repository: String::new(),
			branch:     "main".to_string(),
		}
	}
}

impl Settings {
	/// Reads settings from a TOML file; a missing file means defaults.
	#[instrument]
	pub fn load(path: &Path) -> Result<Self, DeckError> {
		if !path.exists() {
			debug!("No settings file at {:?}, using defaults", path);
			return Ok(Self::default());
		}

		let content = fs_err::read_to_string(path)?;
		let settings: Settings = toml::from_str(&content)?;

		let invalid = settings.find_invalid_config_values();
		if !invalid.is_empty() {
			return Err(DeckError::Config(format!("invalid values for {}", invalid.join(", "))));
		}

		info!("Loaded settings from {:?}", path);
		Ok(settings)
	}

	/// Names of the settings whose values can't be used.
	pub fn find_invalid_config_values(&self) -> Vec<&'static str> {
		let mut invalid = Vec::new();

		let methods = &self.export_note_sort_methods;
		let duplicated = methods.iter().enumerate().any(|(i, method)| methods[..i].contains(method));
		let none_mixed = methods.len() > 1 && methods.contains(&NoteSortMethod::None);
		if duplicated || none_mixed {
			invalid.push("export_note_sort_methods");
		}

		if self.snapshot_path.as_os_str().is_empty() {
			invalid.push("snapshot_path");
		}

		if self.github.branch.trim().is_empty() {
			invalid.push("github.branch");
		}

		invalid
	}
}
