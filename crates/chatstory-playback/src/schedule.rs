use chatstory_events::{ChatPayload, CharacterId, EventId, EventKind, Message, PresenceEvent, Reaction, Seconds, TypingEvent};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::{debug, warn};

use crate::registry::TimerKind;

/// What happens when a scheduled entry fires
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum PlaybackAction {
	ShowMessage(Message),
	ShowReaction(Reaction),
	TypingStart(TypingEvent),
	TypingEnd { character_id: CharacterId },
	ShowPresence(PresenceEvent),
}

impl PlaybackAction {
	pub const fn kind(&self) -> TimerKind {
		match self {
			Self::ShowMessage(_) => TimerKind::Message,
			Self::ShowReaction(_) => TimerKind::Reaction,
			Self::TypingStart(_) => TimerKind::TypingStart,
			Self::TypingEnd { .. } => TimerKind::TypingEnd,
			Self::ShowPresence(_) => TimerKind::Presence,
		}
	}
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlannedAction {
	/// Authored playback time
	pub at: Seconds,
	/// Timer delay from the origin at the plan's speed
	pub at_ms: f64,
	pub kind: TimerKind,
	pub action: PlaybackAction,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum SkipReason {
	DanglingTarget { target: EventId },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedEvent {
	pub id: EventId,
	pub kind: EventKind,
	#[serde(flatten)]
	pub reason: SkipReason,
}

/// Everything one playback will do, compiled from a payload before any timer is armed.
///
/// Actions are grouped by kind (messages, reactions, typing, presence) and keep payload order
/// inside each kind, so arming them in sequence gives FIFO ties per kind.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlaybackPlan {
	actions: Vec<PlannedAction>,
	skipped: Vec<SkippedEvent>,
}

impl PlaybackPlan {
	pub fn compile(payload: &ChatPayload, speed: f64) -> Self {
		let mut plan = Self::default();
		let push = |actions: &mut Vec<PlannedAction>, at: Seconds, action: PlaybackAction| {
			actions.push(PlannedAction {
				at,
				at_ms: at.to_millis(speed),
				kind: action.kind(),
				action,
			});
		};

		for message in &payload.messages {
			push(&mut plan.actions, message.start_time, PlaybackAction::ShowMessage(message.clone()));
		}

		let known: HashSet<&EventId> = payload.messages.iter().map(|m| &m.id).collect();
		for reaction in &payload.reactions {
			if !known.contains(&reaction.target_message_id) {
				warn!("Skipping reaction {}: target message {} not in payload", reaction.id, reaction.target_message_id);
				plan.skipped.push(SkippedEvent {
					id: reaction.id.clone(),
					kind: EventKind::Reaction,
					reason: SkipReason::DanglingTarget {
						target: reaction.target_message_id.clone(),
					},
				});
				continue;
			}
			push(&mut plan.actions, reaction.start_time, PlaybackAction::ShowReaction(reaction.clone()));
		}

		for typing in &payload.typing_events {
			push(&mut plan.actions, typing.start_time, PlaybackAction::TypingStart(typing.clone()));
			push(
				&mut plan.actions,
				typing.end_time(),
				PlaybackAction::TypingEnd {
					character_id: typing.character_id.clone(),
				},
			);
		}

		for presence in &payload.presence_events {
			push(&mut plan.actions, presence.start_time, PlaybackAction::ShowPresence(presence.clone()));
		}

		debug!("Compiled playback plan: {} actions, {} skipped", plan.actions.len(), plan.skipped.len());
		plan
	}

	pub fn actions(&self) -> &[PlannedAction] {
		&self.actions
	}

	pub fn into_actions(self) -> Vec<PlannedAction> {
		self.actions
	}

	pub fn skipped(&self) -> &[SkippedEvent] {
		&self.skipped
	}

	pub fn len(&self) -> usize {
		self.actions.len()
	}

	pub fn is_empty(&self) -> bool {
		self.actions.is_empty()
	}

	/// Authored time of the last action
	pub fn total_duration(&self) -> Seconds {
		self.actions.iter().map(|a| a.at).fold(Seconds::ZERO, |max, at| if at > max { at } else { max })
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use chatstory_events::{ChatInfo, PresenceAction};
	use pretty_assertions::assert_eq;

	fn payload() -> ChatPayload {
		ChatPayload::new(ChatInfo::new("Plan"))
			.with_messages(vec![Message::new(1, Seconds::new(0.0), "hi"), Message::new(2, Seconds::new(4.0), "there")])
			.with_reactions(vec![
				Reaction::new(10, 1, Seconds::new(1.0), "👍"),
				Reaction::new(11, 99, Seconds::new(2.0), "🎉"),
			])
			.with_typing(vec![TypingEvent::new(20, 7, Seconds::new(5.0), 3.0)])
			.with_presence(vec![PresenceEvent::new(30, 7, PresenceAction::Join, Seconds::new(0.5))])
	}

	#[test]
	fn typing_produces_start_and_end() {
		let plan = PlaybackPlan::compile(&payload(), 1.0);
		let typing: Vec<(TimerKind, f64)> = plan
			.actions()
			.iter()
			.filter(|a| matches!(a.kind, TimerKind::TypingStart | TimerKind::TypingEnd))
			.map(|a| (a.kind, a.at_ms))
			.collect();

		assert_eq!(typing, vec![(TimerKind::TypingStart, 5000.0), (TimerKind::TypingEnd, 8000.0)]);
	}

	#[test]
	fn dangling_reactions_are_skipped() {
		let plan = PlaybackPlan::compile(&payload(), 1.0);

		assert_eq!(plan.actions().iter().filter(|a| a.kind == TimerKind::Reaction).count(), 1);
		assert_eq!(
			plan.skipped(),
			&[SkippedEvent {
				id: EventId::from(11),
				kind: EventKind::Reaction,
				reason: SkipReason::DanglingTarget { target: EventId::from(99) },
			}]
		);
	}

	#[test]
	fn kinds_are_grouped_in_payload_order() {
		let plan = PlaybackPlan::compile(&payload(), 1.0);
		let kinds: Vec<TimerKind> = plan.actions().iter().map(|a| a.kind).collect();

		assert_eq!(
			kinds,
			vec![
				TimerKind::Message,
				TimerKind::Message,
				TimerKind::Reaction,
				TimerKind::TypingStart,
				TimerKind::TypingEnd,
				TimerKind::Presence,
			]
		);
		assert_eq!(plan.total_duration().get(), 8.0);
	}

	#[test]
	fn speed_divides_delays() {
		let plan = PlaybackPlan::compile(&payload(), 2.0);
		assert_eq!(plan.actions()[1].at_ms, 2000.0);
		assert_eq!(plan.actions()[1].at.get(), 4.0);
	}

	#[test]
	fn empty_payload_compiles_to_nothing() {
		let plan = PlaybackPlan::compile(&ChatPayload::new(ChatInfo::new("Empty")), 1.0);
		assert!(plan.is_empty());
		assert_eq!(plan.total_duration(), Seconds::ZERO);
	}
}
