use crate::types::deck::DECK_NAME_SEPARATOR;

const REPLACEMENT: char = '_';

/// Directory-safe form of a deck name: hierarchy separators and characters
/// that are invalid on common filesystems become `_`.
pub fn sanitize_deck_name(name: &str) -> String {
	let joined = name.replace(DECK_NAME_SEPARATOR, &REPLACEMENT.to_string());

	let cleaned: String = joined
		.chars()
		.map(|c| match c {
			'<' | '>' | ':' | '"' | '/' | '\\' | '|' | '?' | '*' => REPLACEMENT,
			c if c.is_control() => REPLACEMENT,
			c => c,
		})
		.collect();

	// Windows drops trailing dots and spaces
	let trimmed = cleaned.trim_end_matches(['.', ' ']).trim_start();
	match trimmed {
		"" | "." | ".." => REPLACEMENT.to_string(),
		name => name.to_string(),
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn hierarchy_is_flattened() {
		assert_eq!(sanitize_deck_name("Japanese::N5"), "Japanese_N5");
		assert_eq!(sanitize_deck_name("A::B::C"), "A_B_C");
	}

	#[test]
	fn unsafe_characters_are_replaced() {
		assert_eq!(sanitize_deck_name("What? <Why>/How*"), "What_ _Why__How_");
		assert_eq!(sanitize_deck_name("Trailing. "), "Trailing");
		assert_eq!(sanitize_deck_name(".."), "_");
		assert_eq!(sanitize_deck_name("日本語"), "日本語");
	}
}
