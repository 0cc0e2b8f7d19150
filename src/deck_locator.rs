use std::path::{Path, PathBuf};

use tracing::{debug, error, info, instrument};

use crate::error::DeckError;

/// Finds the deck file inside `directory`, or inside one of its immediate
/// subdirectories when `directory` is the parent an export was written into.
#[instrument]
pub fn find_deck_file(directory: &Path, file_name: &str) -> Result<PathBuf, DeckError> {
	info!("Searching for {} in {:?}", file_name, directory);

	let direct = directory.join(file_name);
	if direct.is_file() {
		return Ok(direct);
	}

	let mut candidates: Vec<PathBuf> = fs_err::read_dir(directory)?
		.flatten()
		.map(|entry| entry.path())
		.filter(|path| path.is_dir())
		.map(|path| path.join(file_name))
		.filter(|path| path.is_file())
		.collect();
	candidates.sort();

	match candidates.len() {
		1 => Ok(candidates.remove(0)),
		0 => {
			error!("No deck file found");
			Err(DeckError::NoDeckFound(directory.to_path_buf()))
		}
		n => {
			error!("{} deck files found, expected one", n);
			Err(DeckError::NoDeckFound(directory.to_path_buf()))
		}
	}
}

/// Plain file names in the media directory next to a deck file.
#[instrument]
pub fn scan_media_directory(media_dir: &Path) -> Result<Vec<String>, DeckError> {
	if !media_dir.is_dir() {
		debug!("No media directory at {:?}", media_dir);
		return Ok(Vec::new());
	}

	let mut files = Vec::new();
	for entry in fs_err::read_dir(media_dir)? {
		let path = entry?.path();
		if path.is_file() {
			if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
				files.push(name.to_string());
			}
		}
	}
	files.sort();

	info!("Found {} media files", files.len());
	Ok(files)
}
