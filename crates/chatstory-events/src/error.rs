use thiserror::Error;

pub type Result<T> = std::result::Result<T, PayloadError>;

#[derive(Error, Debug)]
pub enum PayloadError {
	#[error("Serialization error: {0}")]
	Json(#[from] serde_json::Error),

	#[error("Payload is not a JSON object")]
	NotAnObject,

	#[error("Failed to load chat")]
	MissingChat,
}
