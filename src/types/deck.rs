use serde::{Deserialize, Serialize};

/// Separator Anki uses to encode the deck hierarchy into deck names.
pub const DECK_NAME_SEPARATOR: &str = "::";

/// A deck as the collection stores it. The hierarchy is carried by the full
/// name (`Parent::Child`), not by a parent pointer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Deck {
	pub id:   i64,
	pub name: String,

	#[serde(default)]
	pub desc: String,

	#[serde(rename = "dyn", default)]
	pub is_dynamic: bool,

	#[serde(rename = "extendNew", default)]
	pub extend_new: i32,
	#[serde(rename = "extendRev", default)]
	pub extend_rev: i32,

	/// Deck configuration id; filtered decks have none.
	#[serde(default)]
	pub conf: Option<i64>,

	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub crowdanki_uuid: Option<String>,
}

impl Deck {
	pub fn new(name: impl Into<String>) -> Self {
		Self {
			id: 0,
			name: name.into(),
			desc: String::new(),
			is_dynamic: false,
			extend_new: 0,
			extend_rev: 0,
			conf: None,
			crowdanki_uuid: None,
		}
	}

	/// The last component of the full deck name.
	pub fn leaf_name(&self) -> &str { leaf_name(&self.name) }

	/// Whether `self` is a direct child of the deck named `parent`.
	pub fn is_child_of(&self, parent: &str) -> bool {
		self.name
			.strip_prefix(parent)
			.and_then(|rest| rest.strip_prefix(DECK_NAME_SEPARATOR))
			.is_some_and(|rest| !rest.is_empty() && !rest.contains(DECK_NAME_SEPARATOR))
	}

	pub fn is_top_level(&self) -> bool { !self.name.contains(DECK_NAME_SEPARATOR) }
}

pub fn leaf_name(full_name: &str) -> &str {
	full_name.rsplit(DECK_NAME_SEPARATOR).next().unwrap_or(full_name)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn direct_children_only() {
		assert!(Deck::new("Japanese::N5").is_child_of("Japanese"));
		assert!(!Deck::new("Japanese::N5::Verbs").is_child_of("Japanese"));
		assert!(!Deck::new("JapaneseExtra::N5").is_child_of("Japanese"));
		assert!(!Deck::new("Japanese").is_child_of("Japanese"));
	}

	#[test]
	fn leaf_of_nested_name() {
		assert_eq!(Deck::new("Japanese::N5::Verbs").leaf_name(), "Verbs");
		assert_eq!(leaf_name("Solo"), "Solo");
	}
}
