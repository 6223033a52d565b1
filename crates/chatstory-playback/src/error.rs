use chatstory_events::{EventId, PayloadError};
use thiserror::Error;

/// Text shown on the render surface when a payload cannot be loaded
pub const FAILED_TO_LOAD: &str = "Failed to load chat";

/// Text shown on the render surface when no chat identifier was given
pub const NO_CHAT_ID: &str = "No chat ID specified";

#[derive(Debug, Error)]
pub enum PlaybackError {
	#[error("Playback is not running")]
	NotPlaying,

	#[error("{NO_CHAT_ID}")]
	EmptyChatId,

	#[error("Invalid payload: {0}")]
	Payload(#[from] PayloadError),

	#[error("Payload source failed: {0}")]
	Source(#[from] SourceError),

	#[error("Internal error: {0}")]
	Internal(String),
}

impl PlaybackError {
	/// Whether the player can keep serving commands after this error
	pub fn is_recoverable(&self) -> bool {
		matches!(self, Self::NotPlaying | Self::EmptyChatId | Self::Payload(_) | Self::Source(_))
	}
}

pub type Result<T> = std::result::Result<T, PlaybackError>;

/// Failure while fetching a payload from a [`crate::PayloadSource`]
#[derive(Debug, Error)]
pub enum SourceError {
	#[error("I/O error: {0}")]
	Io(#[from] std::io::Error),

	#[error("HTTP {status}: {message}")]
	Http { status: u16, message: String },

	#[error("Transport error: {0}")]
	Transport(String),

	#[error(transparent)]
	Payload(#[from] PayloadError),
}

impl SourceError {
	/// Text for the visible error state. Only server-provided messages are shown verbatim.
	pub fn user_message(&self) -> String {
		match self {
			Self::Http { message, .. } if !message.trim().is_empty() => message.clone(),
			_ => FAILED_TO_LOAD.to_string(),
		}
	}
}

/// Failure of a single render operation. Never fatal to playback.
#[derive(Debug, Error)]
pub enum RenderError {
	#[error("Target message {0} has not been rendered")]
	TargetNotRendered(EventId),

	#[error("Render output failed: {0}")]
	Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn http_errors_surface_server_message() {
		let err = SourceError::Http {
			status: 404,
			message: "Chat not found".into(),
		};
		assert_eq!(err.user_message(), "Chat not found");

		let blank = SourceError::Http { status: 500, message: "  ".into() };
		assert_eq!(blank.user_message(), FAILED_TO_LOAD);
	}

	#[test]
	fn other_source_errors_use_generic_text() {
		assert_eq!(SourceError::Transport("connection refused".into()).user_message(), FAILED_TO_LOAD);
		assert_eq!(SourceError::Payload(PayloadError::MissingChat).user_message(), FAILED_TO_LOAD);
	}

	#[test]
	fn internal_errors_are_not_recoverable() {
		assert!(PlaybackError::NotPlaying.is_recoverable());
		assert!(!PlaybackError::Internal("engine dropped".into()).is_recoverable());
		assert_eq!(PlaybackError::EmptyChatId.to_string(), NO_CHAT_ID);
	}
}
