use chatstory_events::{ChatInfo, ChatPayload};
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::config::PlaybackConfig;
use crate::registry::{FiredTimer, TimerRegistry};
use crate::schedule::{PlaybackAction, PlaybackPlan, SkippedEvent};
use crate::sink::{RenderResult, RenderSink};
use crate::typing::TypingTracker;

/// Render failures never stop playback
fn soft(result: RenderResult, operation: &str) {
	if let Err(e) = result {
		warn!("Render {} failed: {}", operation, e);
	}
}

/// Result of [`PlaybackSession::start`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartOutcome {
	/// Timers are armed
	Playing { scheduled: usize },
	/// Nothing to show; the empty state is displayed and no timer is armed
	Empty,
}

/// Per-player playback state: the playing flag, the pause clock, the timers, the typing set and
/// the render surface. Exactly one per player.
pub struct PlaybackSession<S> {
	config: PlaybackConfig,
	sink: S,
	registry: TimerRegistry<PlaybackAction>,
	typing: TypingTracker,
	is_playing: bool,
	chat: Option<ChatInfo>,
	skipped: Vec<SkippedEvent>,
	rendered_messages: usize,

	// Virtual clock
	origin: Option<Instant>,
	paused_at: Option<Instant>,
	paused_total: Duration,
}

impl<S: RenderSink> PlaybackSession<S> {
	pub fn new(sink: S, config: PlaybackConfig) -> Self {
		Self {
			config,
			sink,
			registry: TimerRegistry::new(),
			typing: TypingTracker::new(),
			is_playing: false,
			chat: None,
			skipped: Vec::new(),
			rendered_messages: 0,
			origin: None,
			paused_at: None,
			paused_total: Duration::ZERO,
		}
	}

	/// Supersede whatever was playing and arm every entry of `payload` at once
	pub fn start(&mut self, payload: &ChatPayload) -> StartOutcome {
		self.teardown();
		self.skipped.clear();
		self.rendered_messages = 0;
		self.chat = Some(payload.chat.clone());

		let reset = self.sink.reset(&payload.chat);
		soft(reset, "reset");

		if payload.is_empty() {
			info!("Chat {:?} has nothing to play", payload.chat.title);
			let empty = self.sink.show_empty();
			soft(empty, "show empty state");
			return StartOutcome::Empty;
		}

		let plan = PlaybackPlan::compile(payload, self.config.effective_speed());
		self.skipped = plan.skipped().to_vec();

		self.is_playing = true;
		self.origin = Some(Instant::now());
		for planned in plan.into_actions() {
			self.registry.schedule(planned.at_ms, planned.action, planned.kind);
		}

		let scheduled = self.registry.live_len();
		info!("Playback started: {} entries scheduled, {} skipped", scheduled, self.skipped.len());
		StartOutcome::Playing { scheduled }
	}

	/// Stop visible effects first, then capture every pending timer
	pub fn pause(&mut self) -> usize {
		self.is_playing = false;
		if self.paused_at.is_none() {
			self.paused_at = Some(Instant::now());
		}
		let captured = self.registry.pause_all();
		debug!("Paused with {} pending entries", captured);
		captured
	}

	pub fn resume(&mut self) -> usize {
		if let Some(paused_at) = self.paused_at.take() {
			self.paused_total += paused_at.elapsed();
		}
		self.is_playing = true;
		let resumed = self.registry.resume_all();
		debug!("Resumed {} entries", resumed);
		resumed
	}

	/// Drop every pending entry. Nothing scheduled so far will fire.
	pub fn cancel(&mut self) {
		self.teardown();
		debug!("Playback cancelled");
	}

	/// Cancel and show an error in place of the conversation
	pub fn fail(&mut self, message: &str) {
		self.teardown();
		warn!("Playback failed: {}", message);
		let shown = self.sink.show_error(message);
		soft(shown, "show error");
	}

	/// Fire every entry due at `now`. Returns how many entries were taken off the registry.
	pub fn fire_due(&mut self, now: Instant) -> usize {
		let mut fired = 0;
		while let Some(timer) = self.registry.pop_due(now) {
			fired += 1;
			self.dispatch(timer);
		}
		fired
	}

	fn dispatch(&mut self, timer: FiredTimer<PlaybackAction>) {
		if !self.is_playing {
			debug!("Suppressed {} ({}) while not playing", timer.handle, timer.kind);
			return;
		}
		debug!("Firing {} ({})", timer.handle, timer.kind);

		match timer.callback {
			PlaybackAction::ShowMessage(message) => {
				let appended = self.sink.append_message(&message);
				if appended.is_ok() {
					self.rendered_messages += 1;
				}
				soft(appended, "append message");
				self.scroll();
			}
			PlaybackAction::ShowReaction(reaction) => {
				let attached = self.sink.append_reaction(&reaction);
				if attached.is_ok() {
					self.scroll();
				}
				soft(attached, "attach reaction");
			}
			PlaybackAction::TypingStart(typing) => {
				if self.typing.add(&typing.character_id, typing.display_name()) {
					self.refresh_typing();
				}
			}
			PlaybackAction::TypingEnd { character_id } => {
				if self.typing.remove(&character_id) {
					self.refresh_typing();
				}
			}
			PlaybackAction::ShowPresence(presence) => {
				let shown = self.sink.append_presence_notice(&presence);
				soft(shown, "show presence notice");
				self.scroll();
			}
		}
	}

	fn refresh_typing(&mut self) {
		let text = self.typing.indicator_text();
		let set = self.sink.set_typing_indicator(text.as_deref());
		soft(set, "update typing indicator");
		self.scroll();
	}

	fn scroll(&mut self) {
		let scrolled = self.sink.scroll_to_latest();
		soft(scrolled, "scroll");
	}

	fn teardown(&mut self) {
		self.is_playing = false;
		self.registry.cancel_all();
		self.typing.clear();
		self.origin = None;
		self.paused_at = None;
		self.paused_total = Duration::ZERO;
	}

	pub fn next_deadline(&self) -> Option<Instant> {
		self.registry.next_deadline()
	}

	pub const fn is_playing(&self) -> bool {
		self.is_playing
	}

	/// Playing and nothing left to fire
	pub fn is_complete(&self) -> bool {
		self.is_playing && self.registry.is_idle()
	}

	/// Playback time since start, not counting pauses
	pub fn elapsed(&self) -> Duration {
		let Some(origin) = self.origin else {
			return Duration::ZERO;
		};
		let until = self.paused_at.unwrap_or_else(Instant::now);
		until.saturating_duration_since(origin).saturating_sub(self.paused_total)
	}

	pub fn live_timers(&self) -> usize {
		self.registry.live_len()
	}

	pub fn paused_timers(&self) -> usize {
		self.registry.paused_len()
	}

	pub const fn rendered_messages(&self) -> usize {
		self.rendered_messages
	}

	pub fn typing_names(&self) -> Vec<String> {
		self.typing.names()
	}

	pub fn skipped(&self) -> &[SkippedEvent] {
		&self.skipped
	}

	pub fn chat(&self) -> Option<&ChatInfo> {
		self.chat.as_ref()
	}

	pub const fn sink(&self) -> &S {
		&self.sink
	}

	pub fn into_sink(self) -> S {
		self.sink
	}
}
