use crate::error::{PayloadError, Result};
use crate::event::{Event, Message, PresenceAction, PresenceEvent, Reaction, TypingEvent, DEFAULT_REACTION};
use crate::types::{CharacterId, EventId, Seconds};
use crate::wire::{WireChat, WireMessage, WirePayload, WirePresence, WireReaction, WireTyping};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use tracing::{debug, warn};

/// Header data of a chat
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatInfo {
	pub id: Option<String>,
	pub title: String,
	pub description: String,
}

impl ChatInfo {
	pub fn new(title: impl Into<String>) -> Self {
		Self {
			id: None,
			title: title.into(),
			description: String::new(),
		}
	}

	pub fn with_description(mut self, description: impl Into<String>) -> Self {
		self.description = description.into();
		self
	}
}

impl From<WireChat> for ChatInfo {
	fn from(chat: WireChat) -> Self {
		Self {
			id: chat.id,
			title: chat.title.unwrap_or_default(),
			description: chat.description.unwrap_or_default(),
		}
	}
}

/// Pre-fetched snapshot of one chat, consumed atomically by one playback session
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChatPayload {
	pub chat: ChatInfo,
	pub messages: Vec<Message>,
	pub reactions: Vec<Reaction>,
	pub typing_events: Vec<TypingEvent>,
	pub presence_events: Vec<PresenceEvent>,
}

impl ChatPayload {
	pub fn new(chat: ChatInfo) -> Self {
		Self { chat, ..Self::default() }
	}

	pub fn with_messages(mut self, messages: Vec<Message>) -> Self {
		self.messages = messages;
		self
	}

	pub fn with_reactions(mut self, reactions: Vec<Reaction>) -> Self {
		self.reactions = reactions;
		self
	}

	pub fn with_typing(mut self, typing_events: Vec<TypingEvent>) -> Self {
		self.typing_events = typing_events;
		self
	}

	pub fn with_presence(mut self, presence_events: Vec<PresenceEvent>) -> Self {
		self.presence_events = presence_events;
		self
	}

	/// Parse the body of `GET /chats/{id}/frontend`
	pub fn from_json_str(body: &str) -> Result<Self> {
		let value: Value = serde_json::from_str(body)?;
		Self::from_json_value(value)
	}

	pub fn from_json_slice(body: &[u8]) -> Result<Self> {
		let value: Value = serde_json::from_slice(body)?;
		Self::from_json_value(value)
	}

	/// Shape check plus lenient conversion. The only hard requirement is a `chat` object.
	pub fn from_json_value(value: Value) -> Result<Self> {
		let Value::Object(map) = &value else {
			return Err(PayloadError::NotAnObject);
		};

		if !matches!(map.get("chat"), Some(Value::Object(_))) {
			return Err(PayloadError::MissingChat);
		}

		let wire: WirePayload = serde_json::from_value(value)?;
		Self::from_wire(wire)
	}

	pub fn from_wire(wire: WirePayload) -> Result<Self> {
		let chat = wire.chat.ok_or(PayloadError::MissingChat)?;

		let messages: Vec<Message> = wire.messages.into_iter().filter_map(convert_message).collect();

		let starts: HashMap<&EventId, &Message> = messages.iter().map(|m| (&m.id, m)).collect();
		let typing_events = wire.typing_events.into_iter().filter_map(|t| convert_typing(t, &starts)).collect();

		let reactions = wire.reactions.into_iter().filter_map(convert_reaction).collect();
		let presence_events = wire.presence_events.into_iter().filter_map(convert_presence).collect();

		let payload = Self {
			chat: chat.into(),
			messages,
			reactions,
			typing_events,
			presence_events,
		};

		debug!(
			"Decoded chat payload: {} messages, {} reactions, {} typing, {} presence",
			payload.messages.len(),
			payload.reactions.len(),
			payload.typing_events.len(),
			payload.presence_events.len()
		);

		Ok(payload)
	}

	/// True when there is nothing to show: no messages and no presence notices
	pub fn is_empty(&self) -> bool {
		self.messages.is_empty() && self.presence_events.is_empty()
	}

	pub fn message(&self, id: &EventId) -> Option<&Message> {
		self.messages.iter().find(|m| &m.id == id)
	}

	/// All events as the tagged union, grouped by kind with payload order kept inside each kind
	pub fn events(&self) -> impl Iterator<Item = Event> + '_ {
		let messages = self.messages.iter().cloned().map(Event::Message);
		let reactions = self.reactions.iter().cloned().map(Event::Reaction);
		let typing = self.typing_events.iter().cloned().map(Event::Typing);
		let presence = self.presence_events.iter().cloned().map(Event::Presence);
		messages.chain(reactions).chain(typing).chain(presence)
	}

	pub fn event_count(&self) -> usize {
		self.messages.len() + self.reactions.len() + self.typing_events.len() + self.presence_events.len()
	}
}

// ============================================================================
// Wire -> model conversion
// ============================================================================

fn convert_message(wire: WireMessage) -> Option<Message> {
	let Some(id) = wire.id else {
		warn!("Dropping message without an id");
		return None;
	};

	Some(Message {
		id: EventId::new(id),
		character_id: CharacterId::new(wire.character_id.unwrap_or_default()),
		name: wire.name,
		avatar: wire.avatar.filter(|a| !a.is_empty()),
		role: wire.role.filter(|r| !r.is_empty()),
		text: wire.message.unwrap_or_default(),
		display_timestamp: wire.timestamp.unwrap_or_default(),
		start_time: Seconds::from_raw(wire.start_time),
	})
}

fn convert_reaction(wire: WireReaction) -> Option<Reaction> {
	let (Some(id), Some(target)) = (wire.id, wire.target_event_id) else {
		warn!("Dropping reaction without an id or target message");
		return None;
	};

	Some(Reaction {
		id: EventId::new(id),
		target_message_id: EventId::new(target),
		character_id: CharacterId::new(wire.character_id.unwrap_or_default()),
		name: wire.name,
		emoji: wire.reaction.filter(|r| !r.is_empty()).unwrap_or_else(|| DEFAULT_REACTION.to_string()),
		start_time: Seconds::from_raw(wire.start_time),
	})
}

fn convert_typing(wire: WireTyping, messages: &HashMap<&EventId, &Message>) -> Option<TypingEvent> {
	let Some(id) = wire.id else {
		warn!("Dropping typing event without an id");
		return None;
	};

	let duration = Seconds::duration_from_raw(wire.duration);
	let target = wire.target_event_id.map(EventId::new);

	// An explicit start time is authoritative; the anchor only fills in a missing one
	let start_time = match (wire.start_time, &target) {
		(Some(start), _) => Seconds::new(start),
		(None, Some(target_id)) => {
			let Some(message) = messages.get(target_id) else {
				warn!("Skipping typing event {}: target message {} not found", id, target_id);
				return None;
			};
			message.start_time - duration
		}
		(None, None) => Seconds::ZERO,
	};

	Some(TypingEvent {
		id: EventId::new(id),
		character_id: CharacterId::new(wire.character_id.unwrap_or_default()),
		name: wire.name,
		start_time,
		duration,
		target_message_id: target,
	})
}

fn convert_presence(wire: WirePresence) -> Option<PresenceEvent> {
	let Some(id) = wire.id else {
		warn!("Dropping presence event without an id");
		return None;
	};

	Some(PresenceEvent {
		id: EventId::new(id),
		character_id: CharacterId::new(wire.character_id.unwrap_or_default()),
		name: wire.name,
		avatar: wire.avatar.filter(|a| !a.is_empty()),
		role: wire.role.filter(|r| !r.is_empty()),
		action: PresenceAction::parse(wire.action.as_deref()),
		start_time: Seconds::from_raw(wire.start_time),
	})
}
