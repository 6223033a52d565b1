use chatstory_events::ChatPayload;
use tokio::sync::oneshot;

use crate::error::Result;
use crate::state::PlaybackMode;

/// Command understood by the playback engine. Every command replies with the mode it left the
/// player in.
#[derive(Debug)]
pub enum PlayerCommand {
	/// Supersede the current playback with a new payload
	Start {
		payload: Box<ChatPayload>,
		response: oneshot::Sender<Result<PlaybackMode>>,
	},
	/// Show a load error instead of playing
	Fail {
		message: String,
		response: oneshot::Sender<Result<PlaybackMode>>,
	},
	Pause {
		response: oneshot::Sender<Result<PlaybackMode>>,
	},
	Resume {
		response: oneshot::Sender<Result<PlaybackMode>>,
	},
	Stop {
		response: oneshot::Sender<Result<PlaybackMode>>,
	},
}

impl PlayerCommand {
	pub const fn name(&self) -> &'static str {
		match self {
			Self::Start { .. } => "start",
			Self::Fail { .. } => "fail",
			Self::Pause { .. } => "pause",
			Self::Resume { .. } => "resume",
			Self::Stop { .. } => "stop",
		}
	}
}
