use async_trait::async_trait;
use chatstory_events::ChatPayload;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::error::SourceError;

/// Where chat payloads come from
#[async_trait]
pub trait PayloadSource: Send + Sync {
	async fn fetch(&self, chat_id: &str) -> Result<ChatPayload, SourceError>;
}

/// Reads a payload saved from the frontend endpoint
#[derive(Debug, Clone)]
pub struct FileSource {
	path: PathBuf,
}

impl FileSource {
	pub fn new(path: impl Into<PathBuf>) -> Self {
		Self { path: path.into() }
	}

	pub fn path(&self) -> &Path {
		&self.path
	}
}

#[async_trait]
impl PayloadSource for FileSource {
	async fn fetch(&self, chat_id: &str) -> Result<ChatPayload, SourceError> {
		debug!("Reading chat payload from {}", self.path.display());
		let body = tokio::fs::read(&self.path).await?;
		let payload = ChatPayload::from_json_slice(&body)?;

		if let Some(id) = payload.chat.id.as_deref().filter(|id| *id != chat_id) {
			warn!("{} holds chat {}, requested {}", self.path.display(), id, chat_id);
		}
		Ok(payload)
	}
}

/// Serves one fixed response for every chat id
#[derive(Debug, Clone)]
pub struct StaticSource {
	response: Result<String, String>,
}

impl StaticSource {
	/// Respond with this JSON body
	pub fn from_json(body: impl Into<String>) -> Self {
		Self { response: Ok(body.into()) }
	}

	/// Respond with a payload value
	pub fn from_payload(payload: &ChatPayload) -> Result<Self, SourceError> {
		let body = serde_json::to_string(&wire_json(payload)).map_err(chatstory_events::PayloadError::from)?;
		Ok(Self::from_json(body))
	}

	/// Fail every fetch as if the server were unreachable
	pub fn unavailable(reason: impl Into<String>) -> Self {
		Self { response: Err(reason.into()) }
	}
}

#[async_trait]
impl PayloadSource for StaticSource {
	async fn fetch(&self, _chat_id: &str) -> Result<ChatPayload, SourceError> {
		match &self.response {
			Ok(body) => Ok(ChatPayload::from_json_str(body)?),
			Err(reason) => Err(SourceError::Transport(reason.clone())),
		}
	}
}

/// Re-encode a payload in the shape the frontend endpoint returns
fn wire_json(payload: &ChatPayload) -> serde_json::Value {
	use serde_json::json;

	json!({
		"chat": {
			"id": payload.chat.id,
			"title": payload.chat.title,
			"description": payload.chat.description,
		},
		"messages": payload.messages.iter().map(|m| json!({
			"id": m.id,
			"character_id": m.character_id,
			"name": m.name,
			"avatar": m.avatar,
			"role": m.role,
			"message": m.text,
			"timestamp": m.display_timestamp,
			"start_time": m.start_time,
		})).collect::<Vec<_>>(),
		"reactions": payload.reactions.iter().map(|r| json!({
			"id": r.id,
			"target_event_id": r.target_message_id,
			"character_id": r.character_id,
			"reaction": r.emoji,
			"start_time": r.start_time,
			"name": r.name,
		})).collect::<Vec<_>>(),
		"typing_events": payload.typing_events.iter().map(|t| json!({
			"id": t.id,
			"character_id": t.character_id,
			"target_event_id": t.target_message_id,
			"start_time": t.start_time,
			"duration": t.duration,
			"name": t.name,
		})).collect::<Vec<_>>(),
		"presence_events": payload.presence_events.iter().map(|p| json!({
			"id": p.id,
			"character_id": p.character_id,
			"action": p.action,
			"start_time": p.start_time,
			"name": p.name,
			"avatar": p.avatar,
			"role": p.role,
		})).collect::<Vec<_>>(),
	})
}

#[cfg(test)]
mod tests {
	use super::*;
	use chatstory_events::{ChatInfo, EventId, Message, PayloadError, Reaction, Seconds, TypingEvent};
	use pretty_assertions::assert_eq;
	use std::io::Write;

	const BODY: &str = r#"{
		"chat": {"id": 3, "title": "Saved"},
		"messages": [{"id": 1, "message": "hi", "start_time": "0"}]
	}"#;

	#[tokio::test]
	async fn file_source_reads_saved_payload() {
		let mut file = tempfile::NamedTempFile::new().unwrap();
		file.write_all(BODY.as_bytes()).unwrap();

		let payload = FileSource::new(file.path()).fetch("3").await.unwrap();
		assert_eq!(payload.chat.title, "Saved");
		assert_eq!(payload.messages.len(), 1);
	}

	#[tokio::test]
	async fn missing_file_is_an_io_error() {
		let dir = tempfile::tempdir().unwrap();
		let err = FileSource::new(dir.path().join("absent.json")).fetch("1").await.unwrap_err();
		assert!(matches!(err, SourceError::Io(_)));
	}

	#[tokio::test]
	async fn payload_without_chat_is_rejected() {
		let err = StaticSource::from_json(r#"{"messages": []}"#).fetch("1").await.unwrap_err();
		assert!(matches!(err, SourceError::Payload(PayloadError::MissingChat)));
	}

	#[tokio::test]
	async fn unavailable_source_fails_with_transport_error() {
		let err = StaticSource::unavailable("connection refused").fetch("1").await.unwrap_err();
		assert!(matches!(err, SourceError::Transport(reason) if reason == "connection refused"));
	}

	#[tokio::test]
	async fn payloads_survive_the_wire_shape() {
		let message = Message::new(1, Seconds::new(3.5), "hi").from_character(4, "Ana");
		let payload = ChatPayload::new(ChatInfo::new("Round").with_description("trip"))
			.with_typing(vec![TypingEvent::anchored_to(20, &message, 2.0).named("Ana")])
			.with_messages(vec![message])
			.with_reactions(vec![Reaction::new(10, 1, Seconds::new(4.0), "🎉")]);

		let fetched = StaticSource::from_payload(&payload).unwrap().fetch("1").await.unwrap();
		assert_eq!(fetched.typing_events[0].target_message_id, Some(EventId::from(1)));
		assert_eq!(fetched, payload);
	}
}
