use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlaybackMode {
	#[default]
	Idle,
	Playing,
	Paused,
	Finished,
	Stopped,
	Failed,
}

impl PlaybackMode {
	/// No more effects will happen until the next start
	pub const fn is_terminal(self) -> bool {
		matches!(self, Self::Finished | Self::Stopped | Self::Failed)
	}

	pub const fn is_active(self) -> bool {
		matches!(self, Self::Playing | Self::Paused)
	}
}

impl fmt::Display for PlaybackMode {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let name = match self {
			Self::Idle => "idle",
			Self::Playing => "playing",
			Self::Paused => "paused",
			Self::Finished => "finished",
			Self::Stopped => "stopped",
			Self::Failed => "failed",
		};
		f.write_str(name)
	}
}

/// Observable snapshot published after every command and fired entry
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlaybackState {
	pub mode: PlaybackMode,
	pub chat_title: Option<String>,
	/// Playback time in milliseconds, not counting pauses
	pub elapsed_ms: u64,
	pub live_timers: usize,
	pub paused_timers: usize,
	pub rendered_messages: usize,
	pub skipped_events: usize,
	pub typing: Vec<String>,
	pub last_error: Option<String>,
}

impl PlaybackState {
	pub const fn pending_timers(&self) -> usize {
		self.live_timers + self.paused_timers
	}
}
