use chatstory_events::{ChatInfo, Message, PresenceAction, PresenceEvent, Reaction};
use std::fmt::Write as _;

use super::markup::{avatar_initial, escape_html, format_message_text};
use super::{RenderResult, RenderSink, EMPTY_CHAT_TEXT};
use crate::error::RenderError;

#[derive(Debug, Clone)]
struct RenderedMessage {
	message: Message,
	reactions: Vec<Reaction>,
}

#[derive(Debug, Clone)]
enum Node {
	Message(RenderedMessage),
	Presence(PresenceEvent),
	Typing(String),
	Empty,
	Error(String),
}

/// In-memory chat document rendered to the markup of the embeddable widget
#[derive(Debug, Clone, Default)]
pub struct HtmlSink {
	chat: ChatInfo,
	nodes: Vec<Node>,
	scroll_requests: usize,
}

impl HtmlSink {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn message_count(&self) -> usize {
		self.nodes.iter().filter(|n| matches!(n, Node::Message(_))).count()
	}

	pub fn reaction_count(&self) -> usize {
		self
			.nodes
			.iter()
			.map(|n| match n {
				Node::Message(m) => m.reactions.len(),
				_ => 0,
			})
			.sum()
	}

	/// Current typing indicator text, unescaped
	pub fn typing_text(&self) -> Option<&str> {
		self.nodes.iter().find_map(|n| match n {
			Node::Typing(text) => Some(text.as_str()),
			_ => None,
		})
	}

	pub fn error_text(&self) -> Option<&str> {
		self.nodes.iter().find_map(|n| match n {
			Node::Error(text) => Some(text.as_str()),
			_ => None,
		})
	}

	pub const fn scroll_requests(&self) -> usize {
		self.scroll_requests
	}

	/// The whole widget: header plus message area
	pub fn render(&self) -> String {
		format!(
			"<div class=\"chatstory-container\"><div class=\"chatstory-header\"><h2 class=\"chatstory-title\">{}</h2><p class=\"chatstory-description\">{}</p></div>{}</div>",
			escape_html(&self.chat.title),
			escape_html(&self.chat.description),
			self.render_messages()
		)
	}

	/// The message area alone
	pub fn render_messages(&self) -> String {
		let mut html = String::from("<div class=\"chatstory-messages\">");
		for node in &self.nodes {
			match node {
				Node::Message(m) => render_message(&mut html, m),
				Node::Presence(p) => render_presence(&mut html, p),
				Node::Typing(text) => render_typing(&mut html, text),
				Node::Empty => {
					let _ = write!(html, "<div class=\"chatstory-no-messages\">{EMPTY_CHAT_TEXT}</div>");
				}
				Node::Error(text) => {
					let _ = write!(html, "<div class=\"chatstory-error\">{}</div>", escape_html(text));
				}
			}
		}
		html.push_str("</div>");
		html
	}

	fn remove_typing(&mut self) {
		self.nodes.retain(|n| !matches!(n, Node::Typing(_)));
	}
}

fn render_message(html: &mut String, rendered: &RenderedMessage) {
	let message = &rendered.message;
	let name = message.display_name();

	let avatar = match message.avatar.as_deref().filter(|a| !a.is_empty()) {
		Some(url) => format!("<img src=\"{}\" alt=\"{}\" class=\"chatstory-avatar\">", escape_html(url), escape_html(name)),
		None => format!("<div class=\"chatstory-avatar-placeholder\">{}</div>", escape_html(&avatar_initial(name))),
	};

	let _ = write!(
		html,
		"<div class=\"chatstory-message\" data-message-id=\"{}\"><div class=\"chatstory-message-avatar\">{}</div><div class=\"chatstory-message-content\"><div class=\"chatstory-message-header\"><span class=\"chatstory-message-name\">{}</span>",
		escape_html(message.id.as_str()),
		avatar,
		escape_html(name)
	);

	if let Some(role) = message.role.as_deref().filter(|r| !r.is_empty()) {
		let _ = write!(html, "<span class=\"chatstory-message-role\">{}</span>", escape_html(role));
	}
	if !message.display_timestamp.is_empty() {
		let _ = write!(html, "<span class=\"chatstory-message-timestamp\">{}</span>", escape_html(&message.display_timestamp));
	}

	let _ = write!(html, "</div><div class=\"chatstory-message-bubble\">{}</div>", format_message_text(&message.text));

	if !rendered.reactions.is_empty() {
		html.push_str("<div class=\"chatstory-message-reactions\">");
		for reaction in &rendered.reactions {
			let _ = write!(
				html,
				"<span class=\"chatstory-reaction\" title=\"{}\">{}</span>",
				escape_html(reaction.display_name()),
				escape_html(&reaction.emoji)
			);
		}
		html.push_str("</div>");
	}

	html.push_str("</div></div>");
}

fn render_presence(html: &mut String, presence: &PresenceEvent) {
	let class = match presence.action {
		PresenceAction::Join => "chatstory-presence-join",
		PresenceAction::Leave => "chatstory-presence-leave",
	};
	let _ = write!(
		html,
		"<div class=\"chatstory-presence {class}\"><span class=\"chatstory-presence-text\"><strong>{}</strong> {}</span></div>",
		escape_html(presence.display_name()),
		presence.action.verb()
	);
}

fn render_typing(html: &mut String, text: &str) {
	let _ = write!(
		html,
		"<div class=\"chatstory-typing-indicator\"><div class=\"chatstory-typing-dots\"><div class=\"chatstory-typing-dot\"></div><div class=\"chatstory-typing-dot\"></div><div class=\"chatstory-typing-dot\"></div></div><div class=\"chatstory-typing-text\">{}</div></div>",
		escape_html(text)
	);
}

impl RenderSink for HtmlSink {
	fn reset(&mut self, chat: &ChatInfo) -> RenderResult {
		self.chat = chat.clone();
		self.nodes.clear();
		Ok(())
	}

	fn append_message(&mut self, message: &Message) -> RenderResult {
		self.nodes.push(Node::Message(RenderedMessage {
			message: message.clone(),
			reactions: Vec::new(),
		}));
		Ok(())
	}

	fn append_reaction(&mut self, reaction: &Reaction) -> RenderResult {
		let target = self.nodes.iter_mut().find_map(|n| match n {
			Node::Message(m) if m.message.id == reaction.target_message_id => Some(m),
			_ => None,
		});

		match target {
			Some(rendered) => {
				rendered.reactions.push(reaction.clone());
				Ok(())
			}
			None => Err(RenderError::TargetNotRendered(reaction.target_message_id.clone())),
		}
	}

	fn append_presence_notice(&mut self, presence: &PresenceEvent) -> RenderResult {
		self.nodes.push(Node::Presence(presence.clone()));
		Ok(())
	}

	fn set_typing_indicator(&mut self, text: Option<&str>) -> RenderResult {
		self.remove_typing();
		if let Some(text) = text {
			self.nodes.push(Node::Typing(text.to_string()));
		}
		Ok(())
	}

	fn scroll_to_latest(&mut self) -> RenderResult {
		self.scroll_requests += 1;
		Ok(())
	}

	fn show_error(&mut self, message: &str) -> RenderResult {
		self.nodes.clear();
		self.nodes.push(Node::Error(message.to_string()));
		Ok(())
	}

	fn show_empty(&mut self) -> RenderResult {
		self.nodes.push(Node::Empty);
		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use chatstory_events::Seconds;

	fn message(id: u32, text: &str) -> Message {
		Message::new(id, Seconds::ZERO, text).from_character(1, "ana")
	}

	#[test]
	fn messages_render_escaped_with_placeholder_avatar() {
		let mut sink = HtmlSink::new();
		sink.reset(&ChatInfo::new("<Title>")).unwrap();
		sink.append_message(&message(1, "<img onerror=x>")).unwrap();

		let html = sink.render();
		assert!(html.contains("<h2 class=\"chatstory-title\">&lt;Title&gt;</h2>"));
		assert!(html.contains("data-message-id=\"1\""));
		assert!(html.contains("<div class=\"chatstory-avatar-placeholder\">A</div>"));
		assert!(html.contains("&lt;img onerror=x&gt;"));
		assert!(!html.contains("<img onerror"));
		assert!(!html.contains("chatstory-message-role"));
	}

	#[test]
	fn reactions_attach_under_their_message() {
		let mut sink = HtmlSink::new();
		sink.append_message(&message(1, "hi")).unwrap();
		sink.append_reaction(&Reaction::new(10, 1, Seconds::ZERO, "👍").from_character(2, "Ben")).unwrap();

		let html = sink.render_messages();
		assert!(html.contains("<div class=\"chatstory-message-reactions\"><span class=\"chatstory-reaction\" title=\"Ben\">👍</span></div>"));
		assert_eq!(sink.reaction_count(), 1);

		let missing = sink.append_reaction(&Reaction::new(11, 2, Seconds::ZERO, "🎉"));
		assert!(matches!(missing, Err(RenderError::TargetNotRendered(id)) if id.as_str() == "2"));
	}

	#[test]
	fn typing_indicator_stays_last_and_unique() {
		let mut sink = HtmlSink::new();
		sink.set_typing_indicator(Some("Ana is typing...")).unwrap();
		sink.append_message(&message(1, "hi")).unwrap();
		sink.set_typing_indicator(Some("Ana, Ben is typing...")).unwrap();

		let html = sink.render_messages();
		assert_eq!(html.matches("chatstory-typing-indicator").count(), 1);
		assert!(html.ends_with("Ana, Ben is typing...</div></div></div>"));

		sink.set_typing_indicator(None).unwrap();
		assert_eq!(sink.typing_text(), None);
	}

	#[test]
	fn error_replaces_message_area() {
		let mut sink = HtmlSink::new();
		sink.append_message(&message(1, "hi")).unwrap();
		sink.show_error("Failed to load chat").unwrap();

		assert_eq!(sink.message_count(), 0);
		assert_eq!(sink.error_text(), Some("Failed to load chat"));
		assert_eq!(sink.render_messages(), "<div class=\"chatstory-messages\"><div class=\"chatstory-error\">Failed to load chat</div></div>");
	}

	#[test]
	fn presence_notices_use_action_class() {
		let mut sink = HtmlSink::new();
		sink.append_presence_notice(&PresenceEvent::new(1, 2, PresenceAction::Leave, Seconds::ZERO).named("Ben")).unwrap();
		sink.show_empty().unwrap();

		let html = sink.render_messages();
		assert!(html.contains("chatstory-presence chatstory-presence-leave"));
		assert!(html.contains("<strong>Ben</strong> left the chat"));
		assert!(html.contains(EMPTY_CHAT_TEXT));
	}
}
