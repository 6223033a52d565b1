//! Render surfaces driven by a playback session.
//!
//! A sink is an append-only visual log: the session only ever appends messages, reactions and
//! notices, and replaces the single trailing typing indicator. Every operation may fail without
//! stopping playback; the session logs the error and moves on.

mod html;
mod markup;
mod terminal;
mod trace;

pub use html::HtmlSink;
pub use markup::{avatar_initial, escape_html, format_message_text};
pub use terminal::TerminalSink;
pub use trace::{Effect, TraceSink, TracedEffect};

use chatstory_events::{ChatInfo, Message, PresenceEvent, Reaction};

use crate::error::RenderError;

/// Text of the empty state
pub const EMPTY_CHAT_TEXT: &str = "No messages in this chat yet.";

pub type RenderResult = std::result::Result<(), RenderError>;

pub trait RenderSink: Send {
	/// Clear the surface and show the chat header
	fn reset(&mut self, chat: &ChatInfo) -> RenderResult;

	fn append_message(&mut self, message: &Message) -> RenderResult;

	/// Attach under the already rendered target message, or fail with
	/// [`RenderError::TargetNotRendered`]
	fn append_reaction(&mut self, reaction: &Reaction) -> RenderResult;

	fn append_presence_notice(&mut self, presence: &PresenceEvent) -> RenderResult;

	/// Replace the trailing typing indicator. `None` removes it.
	fn set_typing_indicator(&mut self, text: Option<&str>) -> RenderResult;

	fn scroll_to_latest(&mut self) -> RenderResult;

	/// Replace the message area with an error
	fn show_error(&mut self, message: &str) -> RenderResult;

	fn show_empty(&mut self) -> RenderResult;
}

impl<S: RenderSink + ?Sized> RenderSink for Box<S> {
	fn reset(&mut self, chat: &ChatInfo) -> RenderResult {
		(**self).reset(chat)
	}

	fn append_message(&mut self, message: &Message) -> RenderResult {
		(**self).append_message(message)
	}

	fn append_reaction(&mut self, reaction: &Reaction) -> RenderResult {
		(**self).append_reaction(reaction)
	}

	fn append_presence_notice(&mut self, presence: &PresenceEvent) -> RenderResult {
		(**self).append_presence_notice(presence)
	}

	fn set_typing_indicator(&mut self, text: Option<&str>) -> RenderResult {
		(**self).set_typing_indicator(text)
	}

	fn scroll_to_latest(&mut self) -> RenderResult {
		(**self).scroll_to_latest()
	}

	fn show_error(&mut self, message: &str) -> RenderResult {
		(**self).show_error(message)
	}

	fn show_empty(&mut self) -> RenderResult {
		(**self).show_empty()
	}
}

// ============================================================================
// Tee - drive two surfaces from one session
// ============================================================================

/// Forwards every operation to both sinks. Both always receive the call; the first error wins.
#[derive(Debug, Default)]
pub struct Tee<A, B> {
	pub primary: A,
	pub secondary: B,
}

impl<A, B> Tee<A, B> {
	pub fn new(primary: A, secondary: B) -> Self {
		Self { primary, secondary }
	}

	pub fn into_parts(self) -> (A, B) {
		(self.primary, self.secondary)
	}
}

fn both(first: RenderResult, second: RenderResult) -> RenderResult {
	first.and(second)
}

impl<A: RenderSink, B: RenderSink> RenderSink for Tee<A, B> {
	fn reset(&mut self, chat: &ChatInfo) -> RenderResult {
		both(self.primary.reset(chat), self.secondary.reset(chat))
	}

	fn append_message(&mut self, message: &Message) -> RenderResult {
		both(self.primary.append_message(message), self.secondary.append_message(message))
	}

	fn append_reaction(&mut self, reaction: &Reaction) -> RenderResult {
		both(self.primary.append_reaction(reaction), self.secondary.append_reaction(reaction))
	}

	fn append_presence_notice(&mut self, presence: &PresenceEvent) -> RenderResult {
		both(self.primary.append_presence_notice(presence), self.secondary.append_presence_notice(presence))
	}

	fn set_typing_indicator(&mut self, text: Option<&str>) -> RenderResult {
		both(self.primary.set_typing_indicator(text), self.secondary.set_typing_indicator(text))
	}

	fn scroll_to_latest(&mut self) -> RenderResult {
		both(self.primary.scroll_to_latest(), self.secondary.scroll_to_latest())
	}

	fn show_error(&mut self, message: &str) -> RenderResult {
		both(self.primary.show_error(message), self.secondary.show_error(message))
	}

	fn show_empty(&mut self) -> RenderResult {
		both(self.primary.show_empty(), self.secondary.show_empty())
	}
}
