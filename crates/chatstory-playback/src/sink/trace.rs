use chatstory_events::{ChatInfo, EventId, Message, PresenceAction, PresenceEvent, Reaction};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::time::Instant;

use super::{RenderResult, RenderSink};
use crate::error::RenderError;

/// One visible change on the surface
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "effect", rename_all = "snake_case")]
pub enum Effect {
	Reset { title: String },
	Message { id: EventId, name: String, text: String },
	Reaction { id: EventId, target: EventId, emoji: String },
	Presence { id: EventId, name: String, action: PresenceAction },
	Typing { text: Option<String> },
	Error { message: String },
	Empty,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TracedEffect {
	/// Clock time since the last reset
	#[serde(with = "millis")]
	pub at: Duration,
	#[serde(flatten)]
	pub effect: Effect,
}

mod millis {
	use serde::{Deserialize, Deserializer, Serializer};
	use std::time::Duration;

	#[allow(clippy::cast_possible_truncation)]
	pub fn serialize<S: Serializer>(at: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
		serializer.serialize_u64(at.as_millis() as u64)
	}

	pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
		u64::deserialize(deserializer).map(Duration::from_millis)
	}
}

#[derive(Debug)]
struct TraceLog {
	origin: Instant,
	effects: Vec<TracedEffect>,
	rendered: HashSet<EventId>,
	typing: Option<String>,
	scrolls: usize,
}

/// Records every effect with its time. Clones share one log, so a test can keep a handle
/// while the player owns the sink.
#[derive(Debug, Clone)]
pub struct TraceSink {
	log: Arc<Mutex<TraceLog>>,
}

impl TraceSink {
	pub fn new() -> Self {
		Self {
			log: Arc::new(Mutex::new(TraceLog {
				origin: Instant::now(),
				effects: Vec::new(),
				rendered: HashSet::new(),
				typing: None,
				scrolls: 0,
			})),
		}
	}

	fn lock(&self) -> MutexGuard<'_, TraceLog> {
		self.log.lock().unwrap_or_else(PoisonError::into_inner)
	}

	fn record(&self, effect: Effect) {
		let mut log = self.lock();
		let at = log.origin.elapsed();
		log.effects.push(TracedEffect { at, effect });
	}

	pub fn effects(&self) -> Vec<TracedEffect> {
		self.lock().effects.clone()
	}

	/// Ids of displayed messages, in display order
	pub fn message_ids(&self) -> Vec<EventId> {
		self
			.lock()
			.effects
			.iter()
			.filter_map(|e| match &e.effect {
				Effect::Message { id, .. } => Some(id.clone()),
				_ => None,
			})
			.collect()
	}

	/// Indicator text currently shown
	pub fn typing_text(&self) -> Option<String> {
		self.lock().typing.clone()
	}

	pub fn scrolls(&self) -> usize {
		self.lock().scrolls
	}

	/// Serialize the trace as JSON lines
	pub fn to_json_lines(&self) -> serde_json::Result<String> {
		let log = self.lock();
		let mut out = String::new();
		for effect in &log.effects {
			out.push_str(&serde_json::to_string(effect)?);
			out.push('\n');
		}
		Ok(out)
	}
}

impl Default for TraceSink {
	fn default() -> Self {
		Self::new()
	}
}

impl RenderSink for TraceSink {
	fn reset(&mut self, chat: &ChatInfo) -> RenderResult {
		{
			let mut log = self.lock();
			log.origin = Instant::now();
			log.rendered.clear();
			log.typing = None;
		}
		self.record(Effect::Reset { title: chat.title.clone() });
		Ok(())
	}

	fn append_message(&mut self, message: &Message) -> RenderResult {
		self.lock().rendered.insert(message.id.clone());
		self.record(Effect::Message {
			id: message.id.clone(),
			name: message.display_name().to_string(),
			text: message.text.clone(),
		});
		Ok(())
	}

	fn append_reaction(&mut self, reaction: &Reaction) -> RenderResult {
		if !self.lock().rendered.contains(&reaction.target_message_id) {
			return Err(RenderError::TargetNotRendered(reaction.target_message_id.clone()));
		}
		self.record(Effect::Reaction {
			id: reaction.id.clone(),
			target: reaction.target_message_id.clone(),
			emoji: reaction.emoji.clone(),
		});
		Ok(())
	}

	fn append_presence_notice(&mut self, presence: &PresenceEvent) -> RenderResult {
		self.record(Effect::Presence {
			id: presence.id.clone(),
			name: presence.display_name().to_string(),
			action: presence.action,
		});
		Ok(())
	}

	fn set_typing_indicator(&mut self, text: Option<&str>) -> RenderResult {
		let text = text.map(str::to_string);
		self.lock().typing.clone_from(&text);
		self.record(Effect::Typing { text });
		Ok(())
	}

	fn scroll_to_latest(&mut self) -> RenderResult {
		self.lock().scrolls += 1;
		Ok(())
	}

	fn show_error(&mut self, message: &str) -> RenderResult {
		self.lock().rendered.clear();
		self.record(Effect::Error { message: message.to_string() });
		Ok(())
	}

	fn show_empty(&mut self) -> RenderResult {
		self.record(Effect::Empty);
		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use chatstory_events::Seconds;

	#[tokio::test(start_paused = true)]
	async fn effects_carry_clock_time_since_reset() {
		let handle = TraceSink::new();
		let mut sink = handle.clone();

		tokio::time::advance(Duration::from_secs(10)).await;
		sink.reset(&ChatInfo::new("Trace")).unwrap();
		tokio::time::advance(Duration::from_millis(1500)).await;
		sink.append_message(&Message::new(1, Seconds::ZERO, "hi")).unwrap();

		let effects = handle.effects();
		assert_eq!(effects[0].at, Duration::ZERO);
		assert_eq!(effects[1].at, Duration::from_millis(1500));
		assert_eq!(handle.message_ids(), vec![EventId::from(1)]);
	}

	#[test]
	fn json_lines_flatten_effects() {
		let mut sink = TraceSink::new();
		sink.set_typing_indicator(Some("Ana is typing...")).unwrap();

		let line = sink.to_json_lines().unwrap();
		let value: serde_json::Value = serde_json::from_str(line.trim()).unwrap();
		assert_eq!(value["effect"], "typing");
		assert_eq!(value["text"], "Ana is typing...");
		assert!(value["at"].is_u64());
	}
}
