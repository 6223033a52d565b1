use serde::{Deserialize, Serialize};
use std::fmt;

/// Typing duration used when the authored value is missing or not positive
pub const DEFAULT_TYPING_DURATION: f64 = 3.0;

/// Milliseconds per second, the single multiplier between authored time and timer time
pub const MILLIS_PER_SECOND: f64 = 1000.0;

macro_rules! impl_from_integer {
	($target:ident: $($int:ty),*) => {
		$(
			impl From<$int> for $target {
				fn from(id: $int) -> Self {
					Self(id.to_string())
				}
			}
		)*
	};
}

/// Identifier of an event (message, reaction, typing or presence) within one payload.
///
/// Ids arrive as JSON numbers or strings; both normalize to the same textual form so that
/// `1`, `1.0` and `"1"` refer to the same message.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventId(String);

impl EventId {
	pub fn new(id: impl Into<String>) -> Self {
		Self(id.into())
	}

	pub fn as_str(&self) -> &str {
		&self.0
	}
}

impl fmt::Display for EventId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.0)
	}
}

impl_from_integer!(EventId: i32, i64, u32, u64);

impl From<&str> for EventId {
	fn from(id: &str) -> Self {
		Self(id.to_string())
	}
}

impl From<String> for EventId {
	fn from(id: String) -> Self {
		Self(id)
	}
}

/// Identifier of an authored character. Missing ids collapse to the empty id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CharacterId(String);

impl CharacterId {
	pub fn new(id: impl Into<String>) -> Self {
		Self(id.into())
	}

	pub fn as_str(&self) -> &str {
		&self.0
	}
}

impl fmt::Display for CharacterId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.0)
	}
}

impl_from_integer!(CharacterId: i32, i64, u32, u64);

impl From<&str> for CharacterId {
	fn from(id: &str) -> Self {
		Self(id.to_string())
	}
}

impl From<String> for CharacterId {
	fn from(id: String) -> Self {
		Self(id)
	}
}

/// Relative playback time in seconds from the playback origin (t = 0).
///
/// Always finite and non-negative: construction clamps anything else to zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Seconds(f64);

impl Seconds {
	pub const ZERO: Self = Self(0.0);

	pub fn new(value: f64) -> Self {
		if value.is_finite() && value > 0.0 {
			Self(value)
		} else {
			Self::ZERO
		}
	}

	/// Start time from a possibly missing raw value (missing means zero)
	pub fn from_raw(value: Option<f64>) -> Self {
		value.map_or(Self::ZERO, Self::new)
	}

	/// Typing duration from a possibly missing raw value, falling back to
	/// [`DEFAULT_TYPING_DURATION`] for anything that is not a positive finite number
	pub fn duration_from_raw(value: Option<f64>) -> Self {
		match value {
			Some(v) if v.is_finite() && v > 0.0 => Self(v),
			_ => Self(DEFAULT_TYPING_DURATION),
		}
	}

	pub const fn get(self) -> f64 {
		self.0
	}

	/// Convert to timer milliseconds at the given playback speed.
	/// Non-positive or non-finite speeds are treated as 1.
	pub fn to_millis(self, speed: f64) -> f64 {
		let speed = if speed.is_finite() && speed > 0.0 { speed } else { 1.0 };
		self.0 * MILLIS_PER_SECOND / speed
	}
}

impl std::ops::Add for Seconds {
	type Output = Self;

	fn add(self, rhs: Self) -> Self {
		Self::new(self.0 + rhs.0)
	}
}

impl std::ops::Sub for Seconds {
	type Output = Self;

	fn sub(self, rhs: Self) -> Self {
		Self::new(self.0 - rhs.0)
	}
}

impl fmt::Display for Seconds {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}s", self.0)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn seconds_clamp_negative_and_non_finite() {
		assert_eq!(Seconds::new(-4.0), Seconds::ZERO);
		assert_eq!(Seconds::new(f64::NAN), Seconds::ZERO);
		assert_eq!(Seconds::new(f64::INFINITY), Seconds::ZERO);
		assert_eq!(Seconds::new(2.5).get(), 2.5);
	}

	#[test]
	fn duration_falls_back_to_default() {
		assert_eq!(Seconds::duration_from_raw(None).get(), DEFAULT_TYPING_DURATION);
		assert_eq!(Seconds::duration_from_raw(Some(0.0)).get(), DEFAULT_TYPING_DURATION);
		assert_eq!(Seconds::duration_from_raw(Some(-1.0)).get(), DEFAULT_TYPING_DURATION);
		assert_eq!(Seconds::duration_from_raw(Some(1.5)).get(), 1.5);
	}

	#[test]
	fn millis_respect_speed_divisor() {
		let t = Seconds::new(5.0);
		assert_eq!(t.to_millis(1.0), 5000.0);
		assert_eq!(t.to_millis(2.0), 2500.0);
		// Invalid speeds behave like normal speed
		assert_eq!(t.to_millis(0.0), 5000.0);
		assert_eq!(t.to_millis(f64::NAN), 5000.0);
	}

	#[test]
	fn subtraction_saturates_at_origin() {
		assert_eq!(Seconds::new(1.0) - Seconds::new(3.0), Seconds::ZERO);
		assert_eq!((Seconds::new(5.0) + Seconds::new(3.0)).get(), 8.0);
	}
}
