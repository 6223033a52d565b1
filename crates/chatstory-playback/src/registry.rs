//! Cancellable, pausable single-shot timers on one shared clock.
//!
//! The registry never sleeps by itself. The owner asks for [`TimerRegistry::next_deadline`],
//! waits on it, then drains due entries with [`TimerRegistry::pop_due`]. Entries with equal
//! deadlines come out in scheduling order.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;
use tokio::time::Instant;
use tracing::trace;

/// Unique, never reused identifier of one armed timer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TimerHandle(u64);

impl TimerHandle {
	pub const fn get(self) -> u64 {
		self.0
	}
}

impl fmt::Display for TimerHandle {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "timer#{}", self.0)
	}
}

/// Diagnostic label of a timer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimerKind {
	Message,
	Reaction,
	TypingStart,
	TypingEnd,
	Presence,
}

impl TimerKind {
	pub const fn as_str(self) -> &'static str {
		match self {
			Self::Message => "message",
			Self::Reaction => "reaction",
			Self::TypingStart => "typing-start",
			Self::TypingEnd => "typing-end",
			Self::Presence => "presence",
		}
	}
}

impl fmt::Display for TimerKind {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

/// Deadlines never land further out than this from the moment they are armed
pub const MAX_DELAY: Duration = Duration::from_secs(86_400 * 365 * 30);

/// Convert a delay in milliseconds to a [`Duration`]. Negative or non-finite delays clamp to
/// zero, delays too large for a `Duration` saturate.
pub fn clamp_delay(delay_ms: f64) -> Duration {
	if delay_ms.is_finite() && delay_ms > 0.0 {
		Duration::try_from_secs_f64(delay_ms / 1000.0).unwrap_or(Duration::MAX)
	} else {
		Duration::ZERO
	}
}

#[derive(Debug)]
struct LiveTimer<T> {
	handle: TimerHandle,
	callback: T,
	kind: TimerKind,
}

/// A timer captured by [`TimerRegistry::pause_all`], waiting to be re-armed
#[derive(Debug, Clone)]
pub struct PausedTimer<T> {
	/// Handle the timer had when it was paused
	pub handle: TimerHandle,
	pub remaining: Duration,
	pub callback: T,
	pub kind: TimerKind,
}

/// A timer removed from the live set because its deadline passed
#[derive(Debug, Clone)]
pub struct FiredTimer<T> {
	pub handle: TimerHandle,
	pub deadline: Instant,
	pub callback: T,
	pub kind: TimerKind,
}

#[derive(Debug)]
pub struct TimerRegistry<T> {
	// (deadline, seq) keeps equal deadlines in scheduling order
	live: BTreeMap<(Instant, u64), LiveTimer<T>>,
	paused: Vec<PausedTimer<T>>,
	next_seq: u64,
}

impl<T> TimerRegistry<T> {
	pub fn new() -> Self {
		Self {
			live: BTreeMap::new(),
			paused: Vec::new(),
			next_seq: 0,
		}
	}

	/// Arm a single-shot timer `delay_ms` from now
	pub fn schedule(&mut self, delay_ms: f64, callback: T, kind: TimerKind) -> TimerHandle {
		self.schedule_after(clamp_delay(delay_ms), callback, kind)
	}

	fn schedule_after(&mut self, delay: Duration, callback: T, kind: TimerKind) -> TimerHandle {
		let seq = self.next_seq;
		self.next_seq += 1;

		let handle = TimerHandle(seq);
		let now = Instant::now();
		let deadline = now.checked_add(delay.min(MAX_DELAY)).unwrap_or(now);
		trace!("Armed {} ({}) in {:?}", handle, kind, delay);

		self.live.insert((deadline, seq), LiveTimer { handle, callback, kind });
		handle
	}

	/// Earliest live deadline, if any
	pub fn next_deadline(&self) -> Option<Instant> {
		self.live.keys().next().map(|(deadline, _)| *deadline)
	}

	/// Remove and return the earliest entry whose deadline is at or before `now`
	pub fn pop_due(&mut self, now: Instant) -> Option<FiredTimer<T>> {
		let entry = self.live.first_entry()?;
		if entry.key().0 > now {
			return None;
		}

		let ((deadline, _), timer) = entry.remove_entry();
		Some(FiredTimer {
			handle: timer.handle,
			deadline,
			callback: timer.callback,
			kind: timer.kind,
		})
	}

	/// Move every live timer into the paused set, keeping its remaining delay.
	/// Returns the number of timers captured.
	pub fn pause_all(&mut self) -> usize {
		let now = Instant::now();
		let live = std::mem::take(&mut self.live);
		let captured = live.len();

		self.paused.extend(live.into_iter().map(|((deadline, _), timer)| PausedTimer {
			handle: timer.handle,
			remaining: deadline.saturating_duration_since(now),
			callback: timer.callback,
			kind: timer.kind,
		}));

		captured
	}

	/// Re-arm every paused timer with exactly its remaining delay.
	/// Returns the number of timers re-armed.
	pub fn resume_all(&mut self) -> usize {
		let paused = std::mem::take(&mut self.paused);
		let resumed = paused.len();

		for timer in paused {
			self.schedule_after(timer.remaining, timer.callback, timer.kind);
		}

		resumed
	}

	/// Drop every live and paused timer without firing it
	pub fn cancel_all(&mut self) {
		self.live.clear();
		self.paused.clear();
	}

	pub fn live_len(&self) -> usize {
		self.live.len()
	}

	pub fn paused_len(&self) -> usize {
		self.paused.len()
	}

	pub fn paused(&self) -> &[PausedTimer<T>] {
		&self.paused
	}

	/// Nothing live and nothing paused
	pub fn is_idle(&self) -> bool {
		self.live.is_empty() && self.paused.is_empty()
	}
}

impl<T> Default for TimerRegistry<T> {
	fn default() -> Self {
		Self::new()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn drain(registry: &mut TimerRegistry<&'static str>) -> Vec<&'static str> {
		let now = Instant::now();
		std::iter::from_fn(|| registry.pop_due(now).map(|fired| fired.callback)).collect()
	}

	#[test]
	fn bad_delays_clamp_to_zero() {
		assert_eq!(clamp_delay(-5.0), Duration::ZERO);
		assert_eq!(clamp_delay(f64::NAN), Duration::ZERO);
		assert_eq!(clamp_delay(f64::INFINITY), Duration::ZERO);
		assert_eq!(clamp_delay(1500.0), Duration::from_millis(1500));
		assert_eq!(clamp_delay(1e30), Duration::MAX);
	}

	#[tokio::test(start_paused = true)]
	async fn huge_delays_are_capped() {
		let mut registry = TimerRegistry::new();
		registry.schedule(1e23, "someday", TimerKind::Message);
		registry.schedule(0.0, "now", TimerKind::Message);

		assert_eq!(drain(&mut registry), vec!["now"]);
		assert_eq!(registry.next_deadline(), Some(Instant::now() + MAX_DELAY));

		registry.pause_all();
		assert_eq!(registry.paused()[0].remaining, MAX_DELAY);
		registry.resume_all();
		assert_eq!(registry.live_len(), 1);
	}

	#[tokio::test(start_paused = true)]
	async fn fires_in_deadline_order_with_fifo_ties() {
		let mut registry = TimerRegistry::new();
		registry.schedule(200.0, "late", TimerKind::Message);
		registry.schedule(100.0, "first", TimerKind::Message);
		registry.schedule(100.0, "second", TimerKind::Reaction);
		registry.schedule(-10.0, "now", TimerKind::Presence);

		assert_eq!(drain(&mut registry), vec!["now"]);

		tokio::time::advance(Duration::from_millis(100)).await;
		assert_eq!(drain(&mut registry), vec!["first", "second"]);

		tokio::time::advance(Duration::from_millis(100)).await;
		assert_eq!(drain(&mut registry), vec!["late"]);
		assert!(registry.is_idle());
	}

	#[tokio::test(start_paused = true)]
	async fn pause_keeps_remaining_delay() {
		let mut registry = TimerRegistry::new();
		let original = registry.schedule(5000.0, "message", TimerKind::Message);

		tokio::time::advance(Duration::from_millis(2000)).await;
		assert_eq!(registry.pause_all(), 1);
		assert_eq!(registry.live_len(), 0);
		assert_eq!(registry.next_deadline(), None);

		let paused = &registry.paused()[0];
		assert_eq!(paused.handle, original);
		assert_eq!(paused.remaining, Duration::from_millis(3000));
		assert_eq!(paused.kind, TimerKind::Message);

		// Time spent paused does not count
		tokio::time::advance(Duration::from_secs(60)).await;
		assert_eq!(registry.resume_all(), 1);
		assert_eq!(registry.paused_len(), 0);

		tokio::time::advance(Duration::from_millis(2999)).await;
		assert!(drain(&mut registry).is_empty());
		tokio::time::advance(Duration::from_millis(1)).await;
		assert_eq!(drain(&mut registry), vec!["message"]);
	}

	#[tokio::test(start_paused = true)]
	async fn overdue_timers_pause_with_zero_remaining() {
		let mut registry = TimerRegistry::new();
		registry.schedule(10.0, "due", TimerKind::TypingEnd);

		tokio::time::advance(Duration::from_millis(50)).await;
		registry.pause_all();
		assert_eq!(registry.paused()[0].remaining, Duration::ZERO);

		registry.resume_all();
		assert_eq!(drain(&mut registry), vec!["due"]);
	}

	#[tokio::test(start_paused = true)]
	async fn resume_issues_new_handles_in_order() {
		let mut registry = TimerRegistry::new();
		let a = registry.schedule(100.0, "a", TimerKind::Message);
		let b = registry.schedule(100.0, "b", TimerKind::Message);

		registry.pause_all();
		registry.resume_all();

		let now = Instant::now() + Duration::from_millis(100);
		let first = registry.pop_due(now).unwrap();
		let second = registry.pop_due(now).unwrap();

		assert_eq!((first.callback, second.callback), ("a", "b"));
		assert!(first.handle > b && second.handle > first.handle);
		assert_ne!(first.handle, a);
	}

	#[test]
	fn cancel_all_is_idempotent() {
		let mut registry = TimerRegistry::new();
		registry.cancel_all();

		registry.schedule(100.0, "live", TimerKind::Message);
		registry.schedule(200.0, "paused", TimerKind::Message);
		registry.pause_all();
		registry.schedule(100.0, "live", TimerKind::Message);

		registry.cancel_all();
		registry.cancel_all();
		assert!(registry.is_idle());
		assert_eq!(registry.live_len() + registry.paused_len(), 0);
	}
}
