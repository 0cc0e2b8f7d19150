use std::{collections::BTreeSet, path::Path};

use logos::{Lexer, Logos};
use tracing::{debug, info, instrument, warn};

use crate::error::{DeckError, MediaCopyError};

#[derive(Logos, Debug, Clone, PartialEq)]
#[logos(skip r"[^\[<]+")]
enum MediaToken {
	#[regex(r"\[sound:[^\]]+\]", sound_name)]
	Sound(String),

	#[regex(r"<[iI][mM][gG][^>]*>", image_source)]
	Image(String),
}

fn sound_name(lex: &mut Lexer<MediaToken>) -> Option<String> {
	let slice = lex.slice();
	let name = slice.strip_prefix("[sound:")?.strip_suffix(']')?.trim();
	local_file(name)
}

fn image_source(lex: &mut Lexer<MediaToken>) -> Option<String> {
	let tag = lex.slice();
	let start = tag.to_ascii_lowercase().find("src=")? + "src=".len();
	let rest = &tag[start..];

	let value = match rest.chars().next()? {
		quote @ ('"' | '\'') => rest[1..].split(quote).next()?,
		_ => rest.split(|c: char| c.is_whitespace() || c == '>' || c == '/').next()?,
	};
	local_file(&value.replace("&amp;", "&"))
}

fn local_file(name: &str) -> Option<String> {
	let remote = name.contains("://") || name.starts_with("data:");
	(!name.is_empty() && !remote).then(|| name.to_string())
}

/// Media file names referenced from a single field's HTML.
pub fn files_in_field(content: &str) -> Vec<String> {
	MediaToken::lexer(content)
		.filter_map(Result::ok)
		.map(|token| match token {
			MediaToken::Sound(name) | MediaToken::Image(name) => name,
		})
		.collect()
}

/// Media file names referenced from any of `fields`, sorted and unique.
pub fn files_in_fields<'a>(fields: impl IntoIterator<Item = &'a String>) -> BTreeSet<String> {
	fields.into_iter().flat_map(|field| files_in_field(field)).collect()
}

#[derive(Debug, Default)]
pub struct MediaReport {
	pub copied:   Vec<String>,
	pub failures: Vec<MediaCopyError>,
}

impl MediaReport {
	pub fn is_complete(&self) -> bool { self.failures.is_empty() }
}

/// Copies each named file from `source_dir` into `target_dir`. A file that
/// can't be copied is logged and recorded; the rest still get copied.
#[instrument(skip(files))]
pub fn copy_media_files<'a>(
	source_dir: &Path,
	target_dir: &Path,
	files: impl IntoIterator<Item = &'a String>,
) -> Result<MediaReport, DeckError> {
	fs_err::create_dir_all(target_dir)?;

	let mut report = MediaReport::default();
	for file in files {
		// Names come from note content; never let them escape the directories
		if Path::new(file).components().count() != 1 {
			warn!("Skipping media reference with a path component: {}", file);
			report.failures.push(MediaCopyError {
				file:   file.clone(),
				source: std::io::Error::new(std::io::ErrorKind::InvalidInput, "not a plain file name"),
			});
			continue;
		}

		match fs_err::copy(source_dir.join(file), target_dir.join(file)) {
			Ok(_) => {
				debug!("Copied media file {}", file);
				report.copied.push(file.clone());
			}
			Err(source) => {
				let failure = MediaCopyError { file: file.clone(), source };
				warn!("{}", failure);
				report.failures.push(failure);
			}
		}
	}

	info!("Copied {} media files, {} failed", report.copied.len(), report.failures.len());
	Ok(report)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn finds_sounds_and_images() {
		let field = r#"食べる [sound:taberu.mp3] <img src="eat.png"> and <IMG class="x" src='b c.jpg'/>"#;
		assert_eq!(files_in_field(field), ["taberu.mp3", "eat.png", "b c.jpg"]);
	}

	#[test]
	fn ignores_remote_and_malformed_references() {
		let field = r#"<img src="https://example.com/a.png"> [sound:] [not a sound] <img alt="x"> <b>bold</b>"#;
		assert!(files_in_field(field).is_empty());
	}

	#[test]
	fn unquoted_sources() {
		assert_eq!(files_in_field("<img src=plain.gif>"), ["plain.gif"]);
	}

	#[test]
	fn fields_are_deduplicated() {
		let fields = vec!["<img src=\"a.png\">".to_string(), "[sound:a.png]<img src=\"b.png\">".to_string()];
		let files: Vec<_> = files_in_fields(&fields).into_iter().collect();
		assert_eq!(files, ["a.png", "b.png"]);
	}

	#[test]
	fn missing_file_does_not_stop_the_rest() {
		let source = tempfile::tempdir().unwrap();
		let target = tempfile::tempdir().unwrap();
		fs_err::write(source.path().join("a.png"), b"a").unwrap();
		fs_err::write(source.path().join("c.png"), b"c").unwrap();

		let files = vec!["a.png".to_string(), "b.png".to_string(), "c.png".to_string()];
		let report = copy_media_files(source.path(), &target.path().join("media"), &files).unwrap();

		assert_eq!(report.copied, ["a.png", "c.png"]);
		assert_eq!(report.failures.len(), 1);
		assert_eq!(report.failures[0].file, "b.png");
		assert!(target.path().join("media/c.png").exists());
	}
}
