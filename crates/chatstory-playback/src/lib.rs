//! Timed playback of scripted chat conversations.
//!
//! A [`ChatPlayer`] owns one engine task. The engine compiles a payload into a
//! [`PlaybackPlan`], arms every entry in a [`TimerRegistry`] and fires entries into a
//! [`RenderSink`] as their deadlines pass. Pause captures each pending entry with its
//! remaining delay and resume re-arms it with exactly that delay.

pub mod commands;
pub mod config;
pub mod engine;
pub mod error;
pub mod player;
pub mod registry;
pub mod schedule;
pub mod session;
pub mod sink;
pub mod source;
pub mod state;
pub mod typing;

pub use commands::PlayerCommand;
pub use config::PlaybackConfig;
pub use engine::{transition, PlaybackEngine};
pub use error::{PlaybackError, RenderError, Result, SourceError, FAILED_TO_LOAD, NO_CHAT_ID};
pub use player::ChatPlayer;
pub use registry::{FiredTimer, PausedTimer, TimerHandle, TimerKind, TimerRegistry};
pub use schedule::{PlannedAction, PlaybackAction, PlaybackPlan, SkipReason, SkippedEvent};
pub use session::{PlaybackSession, StartOutcome};
pub use sink::{Effect, HtmlSink, RenderSink, Tee, TerminalSink, TraceSink, TracedEffect, EMPTY_CHAT_TEXT};
pub use source::{FileSource, PayloadSource, StaticSource};
pub use state::{PlaybackMode, PlaybackState};
pub use typing::TypingTracker;
