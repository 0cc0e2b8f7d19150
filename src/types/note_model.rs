use serde::{Deserialize, Serialize};

/// Stored as its numeric code: `0` standard, `1` cloze.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "i32", into = "i32")]
pub enum NoteModelType {
	#[default]
	Standard,
	Cloze,
}

impl TryFrom<i32> for NoteModelType {
	type Error = String;

	fn try_from(code: i32) -> Result<Self, Self::Error> {
		match code {
			0 => Ok(NoteModelType::Standard),
			1 => Ok(NoteModelType::Cloze),
			other => Err(format!("unknown note model type {}", other)),
		}
	}
}

impl From<NoteModelType> for i32 {
	fn from(kind: NoteModelType) -> Self {
		match kind {
			NoteModelType::Standard => 0,
			NoteModelType::Cloze => 1,
		}
	}
}

/// A note type shared by any number of notes, possibly across decks.
///
/// The collection id is local to one collection and never leaves it; the
/// `crowdanki_uuid` is the portable identity used as the metadata key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoteModel {
	#[serde(skip)]
	pub id: i64,

	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub crowdanki_uuid: Option<String>,

	pub name: String,

	#[serde(rename = "type", default)]
	pub kind: NoteModelType,

	pub flds:  Vec<Field>,
	pub tmpls: Vec<Template>,

	#[serde(default)]
	pub css: String,

	#[serde(rename = "latexPre", default)]
	pub latex_pre:  String,
	#[serde(rename = "latexPost", default)]
	pub latex_post: String,

	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub req: Option<Vec<(i32, String, Vec<i32>)>>,

	#[serde(default)]
	pub sortf: i32,

	#[serde(default)]
	pub tags: Vec<String>,
	#[serde(default)]
	pub vers: Vec<String>,
}

impl NoteModel {
	pub fn new(name: impl Into<String>, fields: &[&str], templates: Vec<Template>) -> Self {
		let flds = fields.iter().enumerate().map(|(ord, name)| Field::new(*name, ord as i32)).collect();

		Self {
			id: 0,
			crowdanki_uuid: None,
			name: name.into(),
			kind: NoteModelType::Standard,
			flds,
			tmpls: templates,
			css: String::new(),
			latex_pre: String::new(),
			latex_post: String::new(),
			req: None,
			sortf: 0,
			tags: Vec::new(),
			vers: Vec::new(),
		}
	}
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Field {
	pub name:   String,
	pub ord:    i32,
	#[serde(default)]
	pub sticky: bool,
	#[serde(default)]
	pub rtl:    bool,
	#[serde(default = "default_font")]
	pub font:   String,
	#[serde(default = "default_font_size")]
	pub size:   i32,
	#[serde(default)]
	pub media:  Vec<String>,
}

impl Field {
	pub fn new(name: impl Into<String>, ord: i32) -> Self {
		Self {
			name: name.into(),
			ord,
			sticky: false,
			rtl: false,
			font: default_font(),
			size: default_font_size(),
			media: Vec::new(),
		}
	}
}

fn default_font() -> String { "Arial".to_string() }

fn default_font_size() -> i32 { 20 }

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Template {
	pub name:  String,
	pub ord:   i32,
	pub qfmt:  String,
	pub afmt:  String,
	#[serde(default)]
	pub bqfmt: String,
	#[serde(default)]
	pub bafmt: String,
}

impl Template {
	pub fn new(name: impl Into<String>, ord: i32, qfmt: impl Into<String>, afmt: impl Into<String>) -> Self {
		Self {
			name: name.into(),
			ord,
			qfmt: qfmt.into(),
			afmt: afmt.into(),
			bqfmt: String::new(),
			bafmt: String::new(),
		}
	}
}
