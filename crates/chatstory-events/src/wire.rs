//! Wire shape of `GET /chats/{id}/frontend`.
//!
//! The data layer is loose about types: numeric columns may arrive as strings, ids as numbers
//! or strings, and joined character columns may be null. Everything here deserializes
//! leniently and leaves defaulting to [`crate::payload`].

use serde::{Deserialize, Deserializer};
use serde_json::Value;
use tracing::warn;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct WirePayload {
	#[serde(default)]
	pub chat: Option<WireChat>,
	#[serde(default, deserialize_with = "lenient_vec")]
	pub messages: Vec<WireMessage>,
	#[serde(default, deserialize_with = "lenient_vec")]
	pub reactions: Vec<WireReaction>,
	#[serde(default, deserialize_with = "lenient_vec")]
	pub typing_events: Vec<WireTyping>,
	#[serde(default, deserialize_with = "lenient_vec")]
	pub presence_events: Vec<WirePresence>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct WireChat {
	#[serde(default, deserialize_with = "lenient_id")]
	pub id: Option<String>,
	#[serde(default, deserialize_with = "lenient_string")]
	pub title: Option<String>,
	#[serde(default, deserialize_with = "lenient_string")]
	pub description: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct WireMessage {
	#[serde(default, deserialize_with = "lenient_id")]
	pub id: Option<String>,
	#[serde(default, deserialize_with = "lenient_id")]
	pub chat_id: Option<String>,
	#[serde(default, deserialize_with = "lenient_id")]
	pub character_id: Option<String>,
	#[serde(default, deserialize_with = "lenient_string")]
	pub name: Option<String>,
	#[serde(default, deserialize_with = "lenient_string")]
	pub avatar: Option<String>,
	#[serde(default, deserialize_with = "lenient_string")]
	pub role: Option<String>,
	#[serde(default, deserialize_with = "lenient_string")]
	pub message: Option<String>,
	#[serde(default, deserialize_with = "lenient_string")]
	pub timestamp: Option<String>,
	#[serde(default, deserialize_with = "lenient_f64")]
	pub start_time: Option<f64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct WireReaction {
	#[serde(default, deserialize_with = "lenient_id")]
	pub id: Option<String>,
	#[serde(default, deserialize_with = "lenient_id")]
	pub target_event_id: Option<String>,
	#[serde(default, deserialize_with = "lenient_id")]
	pub character_id: Option<String>,
	#[serde(default, deserialize_with = "lenient_string")]
	pub reaction: Option<String>,
	#[serde(default, deserialize_with = "lenient_f64")]
	pub start_time: Option<f64>,
	#[serde(default, deserialize_with = "lenient_string")]
	pub name: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct WireTyping {
	#[serde(default, deserialize_with = "lenient_id")]
	pub id: Option<String>,
	#[serde(default, deserialize_with = "lenient_id")]
	pub character_id: Option<String>,
	/// Authoring-side anchor, only consulted when `start_time` is absent
	#[serde(default, deserialize_with = "lenient_id")]
	pub target_event_id: Option<String>,
	#[serde(default, deserialize_with = "lenient_f64")]
	pub start_time: Option<f64>,
	#[serde(default, deserialize_with = "lenient_f64")]
	pub duration: Option<f64>,
	#[serde(default, deserialize_with = "lenient_string")]
	pub name: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct WirePresence {
	#[serde(default, deserialize_with = "lenient_id")]
	pub id: Option<String>,
	#[serde(default, deserialize_with = "lenient_id")]
	pub character_id: Option<String>,
	#[serde(default, deserialize_with = "lenient_string")]
	pub action: Option<String>,
	#[serde(default, deserialize_with = "lenient_f64")]
	pub start_time: Option<f64>,
	#[serde(default, deserialize_with = "lenient_string")]
	pub name: Option<String>,
	#[serde(default, deserialize_with = "lenient_string")]
	pub avatar: Option<String>,
	#[serde(default, deserialize_with = "lenient_string")]
	pub role: Option<String>,
}

// ============================================================================
// Lenient field decoding
// ============================================================================

/// Parse the leading decimal number of a string, the way browsers' `parseFloat` does:
/// `"2.5s"` is 2.5, `"  7"` is 7, `"abc"` is nothing.
pub fn parse_float_prefix(input: &str) -> Option<f64> {
	let s = input.trim_start();
	let bytes = s.as_bytes();
	let mut end = 0;

	if matches!(bytes.first(), Some(b'+' | b'-')) {
		end += 1;
	}

	let int_start = end;
	while end < bytes.len() && bytes[end].is_ascii_digit() {
		end += 1;
	}
	let mut digits = end - int_start;

	if end < bytes.len() && bytes[end] == b'.' {
		let frac_start = end + 1;
		let mut frac_end = frac_start;
		while frac_end < bytes.len() && bytes[frac_end].is_ascii_digit() {
			frac_end += 1;
		}
		digits += frac_end - frac_start;
		if frac_end > frac_start || digits > 0 {
			end = frac_end;
		}
	}

	if digits == 0 {
		return None;
	}

	// Optional exponent, only consumed when well formed
	if end < bytes.len() && matches!(bytes[end], b'e' | b'E') {
		let mut exp_end = end + 1;
		if exp_end < bytes.len() && matches!(bytes[exp_end], b'+' | b'-') {
			exp_end += 1;
		}
		let exp_digits_start = exp_end;
		while exp_end < bytes.len() && bytes[exp_end].is_ascii_digit() {
			exp_end += 1;
		}
		if exp_end > exp_digits_start {
			end = exp_end;
		}
	}

	s[..end].parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Numeric reading of an arbitrary JSON value
pub fn float_from_value(value: &Value) -> Option<f64> {
	match value {
		Value::Number(n) => n.as_f64().filter(|v| v.is_finite()),
		Value::String(s) => parse_float_prefix(s),
		Value::Null | Value::Bool(_) | Value::Array(_) | Value::Object(_) => None,
	}
}

/// Normalized textual id of an arbitrary JSON value
#[allow(clippy::cast_possible_truncation)]
pub fn id_from_value(value: &Value) -> Option<String> {
	match value {
		Value::Number(n) => {
			if let Some(i) = n.as_i64() {
				Some(i.to_string())
			} else if let Some(u) = n.as_u64() {
				Some(u.to_string())
			} else {
				let f = n.as_f64()?;
				if f.is_finite() && f.fract() == 0.0 && f.abs() < 9.0e15 {
					Some((f as i64).to_string())
				} else {
					Some(f.to_string())
				}
			}
		}
		Value::String(s) => {
			let trimmed = s.trim();
			(!trimmed.is_empty()).then(|| trimmed.to_string())
		}
		Value::Null | Value::Bool(_) | Value::Array(_) | Value::Object(_) => None,
	}
}

fn string_from_value(value: Value) -> Option<String> {
	match value {
		Value::String(s) => Some(s),
		Value::Number(n) => Some(n.to_string()),
		Value::Bool(b) => Some(b.to_string()),
		Value::Null | Value::Array(_) | Value::Object(_) => None,
	}
}

fn lenient_f64<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
	D: Deserializer<'de>,
{
	let value = Option::<Value>::deserialize(deserializer)?;
	Ok(value.as_ref().and_then(float_from_value))
}

fn lenient_id<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
	D: Deserializer<'de>,
{
	let value = Option::<Value>::deserialize(deserializer)?;
	Ok(value.as_ref().and_then(id_from_value))
}

fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
	D: Deserializer<'de>,
{
	let value = Option::<Value>::deserialize(deserializer)?;
	Ok(value.and_then(string_from_value))
}

/// A list where malformed items are dropped instead of failing the whole payload.
/// Anything that is not an array reads as empty.
fn lenient_vec<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
	D: Deserializer<'de>,
	T: serde::de::DeserializeOwned,
{
	let value = Option::<Value>::deserialize(deserializer)?;
	let Some(Value::Array(items)) = value else {
		return Ok(Vec::new());
	};

	Ok(items
		.into_iter()
		.enumerate()
		.filter_map(|(index, item)| match serde_json::from_value(item) {
			Ok(parsed) => Some(parsed),
			Err(e) => {
				warn!("Dropping malformed payload item at index {}: {}", index, e);
				None
			}
		})
		.collect())
}

#[cfg(test)]
mod tests {
	use super::*;
	use serde_json::json;

	#[test]
	fn float_prefix_matches_parse_float() {
		assert_eq!(parse_float_prefix("2.5"), Some(2.5));
		assert_eq!(parse_float_prefix("  7"), Some(7.0));
		assert_eq!(parse_float_prefix("3s"), Some(3.0));
		assert_eq!(parse_float_prefix(".5"), Some(0.5));
		assert_eq!(parse_float_prefix("4."), Some(4.0));
		assert_eq!(parse_float_prefix("-1.25"), Some(-1.25));
		assert_eq!(parse_float_prefix("1e3"), Some(1000.0));
		assert_eq!(parse_float_prefix("1e"), Some(1.0));
		assert_eq!(parse_float_prefix("abc"), None);
		assert_eq!(parse_float_prefix(""), None);
		assert_eq!(parse_float_prefix("."), None);
		assert_eq!(parse_float_prefix("-"), None);
	}

	#[test]
	fn ids_normalize_across_json_types() {
		assert_eq!(id_from_value(&json!(1)), Some("1".to_string()));
		assert_eq!(id_from_value(&json!(1.0)), Some("1".to_string()));
		assert_eq!(id_from_value(&json!(" 1 ")), Some("1".to_string()));
		assert_eq!(id_from_value(&json!("")), None);
		assert_eq!(id_from_value(&json!(null)), None);
		assert_eq!(id_from_value(&json!({"id": 1})), None);
	}

	#[test]
	fn message_fields_decode_leniently() {
		let wire: WireMessage = serde_json::from_value(json!({
			"id": "12",
			"character_id": 4,
			"name": null,
			"message": "hello",
			"start_time": "1.5",
		}))
		.unwrap();

		assert_eq!(wire.id.as_deref(), Some("12"));
		assert_eq!(wire.character_id.as_deref(), Some("4"));
		assert_eq!(wire.name, None);
		assert_eq!(wire.start_time, Some(1.5));
		assert_eq!(wire.timestamp, None);
	}

	#[test]
	fn malformed_list_items_are_dropped() {
		let wire: WirePayload = serde_json::from_value(json!({
			"chat": {"id": 1, "title": "t"},
			"messages": [{"id": 1}, "garbage", 7, {"id": 2}],
			"reactions": null,
			"typing_events": {"not": "a list"},
		}))
		.unwrap();

		assert_eq!(wire.messages.len(), 2);
		assert!(wire.reactions.is_empty());
		assert!(wire.typing_events.is_empty());
		assert!(wire.presence_events.is_empty());
	}
}
