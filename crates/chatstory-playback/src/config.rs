use serde::{Deserialize, Serialize};

/// Playback configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaybackConfig {
	/// Divisor applied to every authored delay. 1 is real time.
	pub speed: f64,
	/// Publish a state snapshot after every fired entry, not only after commands
	pub state_updates: bool,
}

impl PlaybackConfig {
	pub fn new() -> Self {
		Self {
			speed: 1.0,
			state_updates: true,
		}
	}

	pub fn with_speed(mut self, speed: f64) -> Self {
		self.speed = speed;
		self
	}

	pub fn with_state_updates(mut self, enabled: bool) -> Self {
		self.state_updates = enabled;
		self
	}

	/// Speed actually used for scheduling: invalid values fall back to 1
	pub fn effective_speed(&self) -> f64 {
		if self.speed.is_finite() && self.speed > 0.0 {
			self.speed
		} else {
			1.0
		}
	}

	pub fn validate(&self) -> Result<(), String> {
		if !(self.speed.is_finite() && self.speed > 0.0) {
			return Err(format!("speed must be a positive finite number, got {}", self.speed));
		}
		Ok(())
	}
}

impl Default for PlaybackConfig {
	fn default() -> Self {
		Self::new()
	}
}
