use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};

/// Scheduling options shared by every deck that points at them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeckConfig {
	#[serde(skip)]
	pub id: i64,

	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub crowdanki_uuid: Option<String>,

	pub name: String,

	#[serde(rename = "dyn", default)]
	pub is_dynamic: bool,

	#[serde(rename = "maxTaken", default, skip_serializing_if = "Option::is_none")]
	pub max_taken: Option<i32>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub new:       Option<NewConfig>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub rev:       Option<RevConfig>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub lapse:     Option<LapseConfig>,

	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub autoplay: Option<bool>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub replayq:  Option<bool>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub timer:    Option<i32>,
}

impl DeckConfig {
	pub fn new(name: impl Into<String>) -> Self {
		Self {
			id: 0,
			crowdanki_uuid: None,
			name: name.into(),
			is_dynamic: false,
			max_taken: None,
			new: None,
			rev: None,
			lapse: None,
			autoplay: None,
			replayq: None,
			timer: None,
		}
	}
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewConfig {
	pub delays:         Vec<OrderedFloat<f64>>,
	pub ints:           Vec<i32>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub initial_factor: Option<i32>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub per_day:        Option<i32>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub order:          Option<i32>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub bury:           Option<bool>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub separate:       Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RevConfig {
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub per_day:     Option<i32>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub ease4:       Option<OrderedFloat<f64>>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub ivl_fct:     Option<OrderedFloat<f64>>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub fuzz:        Option<OrderedFloat<f64>>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub hard_factor: Option<OrderedFloat<f64>>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub max_ivl:     Option<i32>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub min_space:   Option<i32>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub bury:        Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LapseConfig {
	pub delays:       Vec<OrderedFloat<f64>>,
	pub mult:         OrderedFloat<f64>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub min_int:      Option<i32>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub leech_action: Option<i32>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub leech_fails:  Option<i32>,
}

#[cfg(test)]
mod tests {
	use serde_json::json;

	use super::*;

	#[test]
	fn reads_anki_key_names() {
		let config: DeckConfig = serde_json::from_value(json!({
			"name": "Default",
			"dyn": false,
			"maxTaken": 60,
			"new": { "delays": [1.0, 10.0], "ints": [1, 4, 0], "initialFactor": 2500, "perDay": 20 },
			"rev": { "perDay": 200, "ease4": 1.3, "ivlFct": 1.0 },
			"lapse": { "delays": [10.0], "mult": 0.0, "minInt": 1, "leechFails": 8 }
		}))
		.unwrap();

		assert_eq!(config.max_taken, Some(60));
		assert_eq!(config.new.as_ref().unwrap().per_day, Some(20));
		assert_eq!(config.rev.as_ref().unwrap().ease4, Some(OrderedFloat(1.3)));
		assert_eq!(config.lapse.as_ref().unwrap().leech_fails, Some(8));
	}

	#[test]
	fn unset_groups_are_omitted() {
		let value = serde_json::to_value(DeckConfig::new("Default")).unwrap();
		assert_eq!(value, json!({ "name": "Default", "dyn": false }));
	}
}
