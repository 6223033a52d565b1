use chatstory_events::ChatPayload;
use tokio::sync::{mpsc, watch};
use tokio::time::{sleep_until, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::commands::PlayerCommand;
use crate::config::PlaybackConfig;
use crate::error::{PlaybackError, Result};
use crate::session::{PlaybackSession, StartOutcome};
use crate::sink::RenderSink;
use crate::state::{PlaybackMode, PlaybackState};

// ============================================================================
// Pure FSM - Returns only the next mode
// ============================================================================

/// Validates a command against the current mode. Start always supersedes; side effects decide
/// whether a started playback is actually playing or already finished.
pub fn transition(mode: PlaybackMode, cmd: &PlayerCommand) -> Result<PlaybackMode> {
	use PlaybackMode::*;
	use PlayerCommand as Cmd;

	Ok(match (mode, cmd) {
		// Start and Fail are accepted from anywhere
		(_, Cmd::Start { .. }) => Playing,
		(_, Cmd::Fail { .. }) => Failed,

		(Playing | Paused, Cmd::Pause { .. }) => Paused,
		(Idle | Finished | Stopped | Failed, Cmd::Pause { .. }) => return Err(PlaybackError::NotPlaying),

		(Paused | Playing, Cmd::Resume { .. }) => Playing,
		(Idle | Finished | Stopped | Failed, Cmd::Resume { .. }) => return Err(PlaybackError::NotPlaying),

		(Playing | Paused, Cmd::Stop { .. }) => Stopped,
		(Idle | Finished | Stopped | Failed, Cmd::Stop { .. }) => mode,
	})
}

// ============================================================================
// PlaybackEngine - actor owning the session
// ============================================================================

pub struct PlaybackEngine<S> {
	session: PlaybackSession<S>,
	mode: PlaybackMode,
	last_error: Option<String>,
	state_updates: bool,
	state_tx: watch::Sender<PlaybackState>,
	state_rx: watch::Receiver<PlaybackState>,
}

impl<S: RenderSink> PlaybackEngine<S> {
	pub fn new(sink: S, config: PlaybackConfig) -> Self {
		if let Err(e) = config.validate() {
			warn!("Invalid playback config, using normal speed: {}", e);
		}

		let (state_tx, state_rx) = watch::channel(PlaybackState::default());
		Self {
			state_updates: config.state_updates,
			session: PlaybackSession::new(sink, config),
			mode: PlaybackMode::Idle,
			last_error: None,
			state_tx,
			state_rx,
		}
	}

	pub fn subscribe(&self) -> watch::Receiver<PlaybackState> {
		self.state_rx.clone()
	}

	/// Drive the session until cancelled or every command sender is gone.
	/// Returns the sink so the caller can inspect what was rendered.
	pub async fn run(mut self, mut command_rx: mpsc::UnboundedReceiver<PlayerCommand>, cancel: CancellationToken) -> S {
		info!("Playback engine started");

		loop {
			let deadline = self.session.next_deadline();

			tokio::select! {
				biased;

				_ = cancel.cancelled() => {
					info!("Playback engine cancelled");
					break;
				}

				cmd = command_rx.recv() => match cmd {
					Some(cmd) => self.handle_command(cmd),
					None => {
						info!("Command channel closed, stopping playback engine");
						break;
					}
				},

				// Sleep only while something is armed
				_ = async {
					match deadline {
						Some(deadline) => sleep_until(deadline).await,
						None => std::future::pending::<()>().await,
					}
				} => self.handle_due(),
			}
		}

		self.session.cancel();
		self.session.into_sink()
	}

	fn handle_command(&mut self, cmd: PlayerCommand) {
		let name = cmd.name();
		let next = transition(self.mode, &cmd);

		let (result, response) = match cmd {
			PlayerCommand::Start { payload, response } => (next.map(|_| self.start(&payload)), response),
			PlayerCommand::Fail { message, response } => (next.map(|_| self.fail(message)), response),
			PlayerCommand::Pause { response } => (next.map(|next| self.pause(next)), response),
			PlayerCommand::Resume { response } => (next.map(|next| self.resume(next)), response),
			PlayerCommand::Stop { response } => (next.map(|next| self.stop(next)), response),
		};

		match &result {
			Ok(mode) => debug!("Command {} -> {}", name, mode),
			Err(e) => debug!("Command {} rejected in {}: {}", name, self.mode, e),
		}

		self.publish();
		let _ = response.send(result);
	}

	fn start(&mut self, payload: &ChatPayload) -> PlaybackMode {
		self.last_error = None;
		self.mode = match self.session.start(payload) {
			StartOutcome::Playing { .. } => PlaybackMode::Playing,
			StartOutcome::Empty => PlaybackMode::Finished,
		};
		self.check_complete();
		self.mode
	}

	fn fail(&mut self, message: String) -> PlaybackMode {
		self.session.fail(&message);
		self.last_error = Some(message);
		self.mode = PlaybackMode::Failed;
		self.mode
	}

	fn pause(&mut self, next: PlaybackMode) -> PlaybackMode {
		if self.mode == PlaybackMode::Playing {
			self.session.pause();
		}
		self.mode = next;
		self.mode
	}

	fn resume(&mut self, next: PlaybackMode) -> PlaybackMode {
		if self.mode == PlaybackMode::Paused {
			self.session.resume();
		}
		self.mode = next;
		self.check_complete();
		self.mode
	}

	fn stop(&mut self, next: PlaybackMode) -> PlaybackMode {
		if self.mode.is_active() {
			self.session.cancel();
			info!("Playback stopped");
		}
		self.mode = next;
		self.mode
	}

	fn handle_due(&mut self) {
		let fired = self.session.fire_due(Instant::now());
		let before = self.mode;
		self.check_complete();

		if fired > 0 && (self.state_updates || self.mode != before) {
			self.publish();
		}
	}

	fn check_complete(&mut self) {
		if self.mode == PlaybackMode::Playing && self.session.is_complete() {
			info!("Playback finished");
			self.mode = PlaybackMode::Finished;
		}
	}

	#[allow(clippy::cast_possible_truncation)]
	fn publish(&self) {
		let session = &self.session;
		self.state_tx.send_replace(PlaybackState {
			mode: self.mode,
			chat_title: session.chat().map(|c| c.title.clone()),
			elapsed_ms: session.elapsed().as_millis() as u64,
			live_timers: session.live_timers(),
			paused_timers: session.paused_timers(),
			rendered_messages: session.rendered_messages(),
			skipped_events: session.skipped().len(),
			typing: session.typing_names(),
			last_error: self.last_error.clone(),
		});
	}
}
