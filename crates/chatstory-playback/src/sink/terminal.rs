use chatstory_events::{ChatInfo, EventId, Message, PresenceAction, PresenceEvent, Reaction};
use colored::{ColoredString, Colorize};
use std::collections::HashSet;
use std::io::Write;

use super::{RenderResult, RenderSink, EMPTY_CHAT_TEXT};
use crate::error::RenderError;

/// Line-oriented rendering for a terminal.
///
/// A terminal cannot move earlier lines, so reactions print right away as a line that names
/// their target, and the typing indicator only prints when its text changes.
pub struct TerminalSink<W> {
	out: W,
	color: bool,
	rendered: HashSet<EventId>,
	typing: Option<String>,
}

impl<W: Write + Send> TerminalSink<W> {
	pub fn new(out: W) -> Self {
		Self {
			out,
			color: true,
			rendered: HashSet::new(),
			typing: None,
		}
	}

	pub fn with_color(mut self, enabled: bool) -> Self {
		self.color = enabled;
		self
	}

	pub fn into_inner(self) -> W {
		self.out
	}

	fn paint<F>(&self, text: &str, style: F) -> String
	where
		F: FnOnce(&str) -> ColoredString,
	{
		if self.color {
			style(text).to_string()
		} else {
			text.to_string()
		}
	}
}

impl TerminalSink<std::io::Stdout> {
	pub fn stdout() -> Self {
		Self::new(std::io::stdout())
	}
}

impl<W: Write + Send> RenderSink for TerminalSink<W> {
	fn reset(&mut self, chat: &ChatInfo) -> RenderResult {
		self.rendered.clear();
		self.typing = None;

		let title = self.paint(&chat.title, |s| s.cyan().bold());
		writeln!(self.out, "{title}")?;
		if !chat.description.is_empty() {
			let description = self.paint(&chat.description, |s| s.dimmed());
			writeln!(self.out, "{description}")?;
		}
		let rule = self.paint("───────────────────────────────────────", |s| s.dimmed());
		writeln!(self.out, "{rule}")?;
		Ok(())
	}

	fn append_message(&mut self, message: &Message) -> RenderResult {
		self.rendered.insert(message.id.clone());

		let mut header = self.paint(message.display_name(), |s| s.magenta().bold());
		if let Some(role) = message.role.as_deref().filter(|r| !r.is_empty()) {
			header.push(' ');
			header.push_str(&self.paint(&format!("({role})"), |s| s.dimmed()));
		}
		if !message.display_timestamp.is_empty() {
			header.push(' ');
			header.push_str(&self.paint(&message.display_timestamp, |s| s.dimmed()));
		}

		writeln!(self.out, "{header}")?;
		for line in message.text.lines() {
			writeln!(self.out, "  {line}")?;
		}
		Ok(())
	}

	fn append_reaction(&mut self, reaction: &Reaction) -> RenderResult {
		if !self.rendered.contains(&reaction.target_message_id) {
			return Err(RenderError::TargetNotRendered(reaction.target_message_id.clone()));
		}

		let who = self.paint(&format!("{} reacted to #{}", reaction.display_name(), reaction.target_message_id), |s| s.dimmed());
		writeln!(self.out, "  ↳ {} {who}", reaction.emoji)?;
		Ok(())
	}

	fn append_presence_notice(&mut self, presence: &PresenceEvent) -> RenderResult {
		let line = format!("*** {} {} ***", presence.display_name(), presence.action.verb());
		let line = match presence.action {
			PresenceAction::Join => self.paint(&line, |s| s.green()),
			PresenceAction::Leave => self.paint(&line, |s| s.yellow()),
		};
		writeln!(self.out, "    {line}")?;
		Ok(())
	}

	fn set_typing_indicator(&mut self, text: Option<&str>) -> RenderResult {
		let next = text.map(str::to_string);
		if next == self.typing {
			return Ok(());
		}
		self.typing = next;

		if let Some(text) = text {
			let line = self.paint(&format!("… {text}"), |s| s.dimmed().italic());
			writeln!(self.out, "{line}")?;
		}
		Ok(())
	}

	fn scroll_to_latest(&mut self) -> RenderResult {
		self.out.flush()?;
		Ok(())
	}

	fn show_error(&mut self, message: &str) -> RenderResult {
		self.rendered.clear();
		let line = self.paint(&format!("✗ {message}"), |s| s.red().bold());
		writeln!(self.out, "{line}")?;
		self.out.flush()?;
		Ok(())
	}

	fn show_empty(&mut self) -> RenderResult {
		let line = self.paint(EMPTY_CHAT_TEXT, |s| s.dimmed());
		writeln!(self.out, "{line}")?;
		self.out.flush()?;
		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use chatstory_events::Seconds;

	fn output(sink: TerminalSink<Vec<u8>>) -> String {
		String::from_utf8(sink.into_inner()).unwrap()
	}

	#[test]
	fn plain_output_has_no_escape_codes() {
		let mut sink = TerminalSink::new(Vec::new()).with_color(false);
		sink.reset(&ChatInfo::new("Night Shift").with_description("A short story")).unwrap();

		let mut message = Message::new(1, Seconds::ZERO, "first\nsecond").from_character(1, "Ana");
		message.role = Some("Captain".into());
		sink.append_message(&message).unwrap();
		sink.append_reaction(&Reaction::new(10, 1, Seconds::ZERO, "👍").from_character(2, "Ben")).unwrap();

		let text = output(sink);
		assert!(!text.contains('\u{1b}'));
		assert!(text.starts_with("Night Shift\nA short story\n"));
		assert!(text.contains("Ana (Captain)\n  first\n  second\n"));
		assert!(text.contains("  ↳ 👍 Ben reacted to #1\n"));
	}

	#[test]
	fn reactions_need_a_rendered_target() {
		let mut sink = TerminalSink::new(Vec::new()).with_color(false);
		let err = sink.append_reaction(&Reaction::new(10, 5, Seconds::ZERO, "👍")).unwrap_err();
		assert!(matches!(err, RenderError::TargetNotRendered(_)));
		assert!(output(sink).is_empty());
	}

	#[test]
	fn typing_prints_only_on_change() {
		let mut sink = TerminalSink::new(Vec::new()).with_color(false);
		sink.set_typing_indicator(Some("Ana is typing...")).unwrap();
		sink.set_typing_indicator(Some("Ana is typing...")).unwrap();
		sink.set_typing_indicator(None).unwrap();
		sink.append_presence_notice(&PresenceEvent::new(3, 1, PresenceAction::Join, Seconds::ZERO).named("Ana")).unwrap();

		assert_eq!(output(sink), "… Ana is typing...\n    *** Ana joined the chat ***\n");
	}
}
