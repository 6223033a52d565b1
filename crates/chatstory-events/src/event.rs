use crate::types::{CharacterId, EventId, Seconds};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Name shown for characters whose record carries no name
pub const UNKNOWN_NAME: &str = "Unknown";

/// Reaction symbol used when the authored reaction is missing
pub const DEFAULT_REACTION: &str = "👍";

fn display_name(name: Option<&str>) -> &str {
	match name {
		Some(n) if !n.is_empty() => n,
		_ => UNKNOWN_NAME,
	}
}

/// A chat message appearing at `start_time`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
	pub id: EventId,
	pub character_id: CharacterId,
	pub name: Option<String>,
	pub avatar: Option<String>,
	pub role: Option<String>,
	pub text: String,
	/// Free-form label shown next to the name, never used for scheduling
	pub display_timestamp: String,
	pub start_time: Seconds,
}

impl Message {
	pub fn new(id: impl Into<EventId>, start_time: Seconds, text: impl Into<String>) -> Self {
		Self {
			id: id.into(),
			character_id: CharacterId::default(),
			name: None,
			avatar: None,
			role: None,
			text: text.into(),
			display_timestamp: String::new(),
			start_time,
		}
	}

	pub fn from_character(mut self, character_id: impl Into<CharacterId>, name: impl Into<String>) -> Self {
		self.character_id = character_id.into();
		self.name = Some(name.into());
		self
	}

	pub fn display_name(&self) -> &str {
		display_name(self.name.as_deref())
	}
}

/// An emoji reaction attached beneath an earlier message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reaction {
	pub id: EventId,
	pub target_message_id: EventId,
	pub character_id: CharacterId,
	pub name: Option<String>,
	pub emoji: String,
	pub start_time: Seconds,
}

impl Reaction {
	pub fn new(id: impl Into<EventId>, target_message_id: impl Into<EventId>, start_time: Seconds, emoji: impl Into<String>) -> Self {
		Self {
			id: id.into(),
			target_message_id: target_message_id.into(),
			character_id: CharacterId::default(),
			name: None,
			emoji: emoji.into(),
			start_time,
		}
	}

	pub fn from_character(mut self, character_id: impl Into<CharacterId>, name: impl Into<String>) -> Self {
		self.character_id = character_id.into();
		self.name = Some(name.into());
		self
	}

	pub fn display_name(&self) -> &str {
		display_name(self.name.as_deref())
	}
}

/// One character typing during `[start_time, start_time + duration)`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypingEvent {
	pub id: EventId,
	pub character_id: CharacterId,
	pub name: Option<String>,
	pub start_time: Seconds,
	/// Always positive
	pub duration: Seconds,
	/// Message this typing leads into, kept for reference only
	pub target_message_id: Option<EventId>,
}

impl TypingEvent {
	/// Build a typing window. A non-positive duration falls back to the default.
	pub fn new(id: impl Into<EventId>, character_id: impl Into<CharacterId>, start_time: Seconds, duration: f64) -> Self {
		Self {
			id: id.into(),
			character_id: character_id.into(),
			name: None,
			start_time,
			duration: Seconds::duration_from_raw(Some(duration)),
			target_message_id: None,
		}
	}

	/// Typing that finishes exactly when `message` appears: starts at
	/// `max(0, message.start_time - duration)`
	pub fn anchored_to(id: impl Into<EventId>, message: &Message, duration: f64) -> Self {
		let duration = Seconds::duration_from_raw(Some(duration));
		Self {
			id: id.into(),
			character_id: message.character_id.clone(),
			name: message.name.clone(),
			start_time: message.start_time - duration,
			duration,
			target_message_id: Some(message.id.clone()),
		}
	}

	pub fn named(mut self, name: impl Into<String>) -> Self {
		self.name = Some(name.into());
		self
	}

	pub fn end_time(&self) -> Seconds {
		self.start_time + self.duration
	}

	pub fn display_name(&self) -> &str {
		display_name(self.name.as_deref())
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PresenceAction {
	Join,
	Leave,
}

impl PresenceAction {
	/// Only an exact `join` is a join. A missing action defaults to join; any other value leaves.
	pub fn parse(raw: Option<&str>) -> Self {
		match raw {
			None | Some("join") => Self::Join,
			Some(_) => Self::Leave,
		}
	}

	pub const fn verb(self) -> &'static str {
		match self {
			Self::Join => "joined the chat",
			Self::Leave => "left the chat",
		}
	}
}

impl fmt::Display for PresenceAction {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Join => f.write_str("join"),
			Self::Leave => f.write_str("leave"),
		}
	}
}

/// A character joining or leaving the visible conversation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PresenceEvent {
	pub id: EventId,
	pub character_id: CharacterId,
	pub name: Option<String>,
	pub avatar: Option<String>,
	pub role: Option<String>,
	pub action: PresenceAction,
	pub start_time: Seconds,
}

impl PresenceEvent {
	pub fn new(id: impl Into<EventId>, character_id: impl Into<CharacterId>, action: PresenceAction, start_time: Seconds) -> Self {
		Self {
			id: id.into(),
			character_id: character_id.into(),
			name: None,
			avatar: None,
			role: None,
			action,
			start_time,
		}
	}

	pub fn named(mut self, name: impl Into<String>) -> Self {
		self.name = Some(name.into());
		self
	}

	pub fn display_name(&self) -> &str {
		display_name(self.name.as_deref())
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
	Message,
	Reaction,
	Typing,
	Presence,
}

/// Closed union over everything a payload can schedule
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Event {
	Message(Message),
	Reaction(Reaction),
	Typing(TypingEvent),
	Presence(PresenceEvent),
}

impl Event {
	pub fn start_time(&self) -> Seconds {
		match self {
			Self::Message(m) => m.start_time,
			Self::Reaction(r) => r.start_time,
			Self::Typing(t) => t.start_time,
			Self::Presence(p) => p.start_time,
		}
	}

	pub fn id(&self) -> &EventId {
		match self {
			Self::Message(m) => &m.id,
			Self::Reaction(r) => &r.id,
			Self::Typing(t) => &t.id,
			Self::Presence(p) => &p.id,
		}
	}

	pub const fn kind(&self) -> EventKind {
		match self {
			Self::Message(_) => EventKind::Message,
			Self::Reaction(_) => EventKind::Reaction,
			Self::Typing(_) => EventKind::Typing,
			Self::Presence(_) => EventKind::Presence,
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn anchored_typing_ends_with_its_message() {
		let message = Message::new(7, Seconds::new(10.0), "hi").from_character(2, "Ana");
		let typing = TypingEvent::anchored_to(1, &message, 4.0);

		assert_eq!(typing.start_time.get(), 6.0);
		assert_eq!(typing.end_time(), message.start_time);
		assert_eq!(typing.character_id, CharacterId::from(2));
		assert_eq!(typing.target_message_id, Some(EventId::from(7)));
	}

	#[test]
	fn anchored_typing_clamps_to_origin() {
		let message = Message::new(7, Seconds::new(1.0), "hi");
		let typing = TypingEvent::anchored_to(1, &message, 3.0);

		assert_eq!(typing.start_time, Seconds::ZERO);
		assert_eq!(typing.end_time().get(), 3.0);
	}

	#[test]
	fn presence_action_defaults_to_join() {
		assert_eq!(PresenceAction::parse(None), PresenceAction::Join);
		assert_eq!(PresenceAction::parse(Some("join")), PresenceAction::Join);
		assert_eq!(PresenceAction::parse(Some("leave")), PresenceAction::Leave);
	}

	#[test]
	fn presence_action_only_joins_on_exact_join() {
		assert_eq!(PresenceAction::parse(Some("Join")), PresenceAction::Leave);
		assert_eq!(PresenceAction::parse(Some(" join")), PresenceAction::Leave);
		assert_eq!(PresenceAction::parse(Some("wave")), PresenceAction::Leave);
	}

	#[test]
	fn missing_names_display_as_unknown() {
		let message = Message::new(1, Seconds::ZERO, "hi");
		assert_eq!(message.display_name(), UNKNOWN_NAME);
	}
}
