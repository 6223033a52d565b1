use chatstory_events::ChatPayload;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot, watch, Mutex};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::commands::PlayerCommand;
use crate::config::PlaybackConfig;
use crate::engine::PlaybackEngine;
use crate::error::{PlaybackError, Result, NO_CHAT_ID};
use crate::sink::RenderSink;
use crate::source::PayloadSource;
use crate::state::{PlaybackMode, PlaybackState};

type Responder = oneshot::Sender<Result<PlaybackMode>>;

/// The playback actor façade. Must be created inside a tokio runtime.
///
/// Each player owns its own engine task, timers, typing set and sink. Dropping the player
/// cancels the engine; nothing it scheduled fires afterwards.
pub struct ChatPlayer<S> {
	command_tx: mpsc::UnboundedSender<PlayerCommand>,
	state_rx: watch::Receiver<PlaybackState>,
	task_handle: Arc<Mutex<Option<JoinHandle<S>>>>,
	cancel_token: CancellationToken,
}

impl<S: RenderSink + 'static> ChatPlayer<S> {
	pub fn new(sink: S, config: PlaybackConfig) -> Self {
		let cancel_token = CancellationToken::new();
		let (command_tx, command_rx) = mpsc::unbounded_channel();

		let engine = PlaybackEngine::new(sink, config);
		let state_rx = engine.subscribe();

		let task_handle = tokio::spawn(engine.run(command_rx, cancel_token.clone()));

		info!("ChatPlayer created");

		Self {
			command_tx,
			state_rx,
			task_handle: Arc::new(Mutex::new(Some(task_handle))),
			cancel_token,
		}
	}

	/// Send a command and await the engine's reply
	async fn send_fsm<F>(&self, build: F) -> Result<PlaybackMode>
	where
		F: FnOnce(Responder) -> PlayerCommand,
	{
		let (tx, rx) = oneshot::channel();

		self.command_tx.send(build(tx)).map_err(|_| PlaybackError::Internal("Failed to send command".into()))?;

		rx.await.map_err(|_| PlaybackError::Internal("Engine dropped".into()))?
	}

	// FSM façade methods
	pub async fn start(&self, payload: ChatPayload) -> Result<PlaybackMode> {
		let payload = Box::new(payload);
		self.send_fsm(|response| PlayerCommand::Start { payload, response }).await
	}
	pub async fn pause(&self) -> Result<PlaybackMode> {
		self.send_fsm(|response| PlayerCommand::Pause { response }).await
	}
	pub async fn resume(&self) -> Result<PlaybackMode> {
		self.send_fsm(|response| PlayerCommand::Resume { response }).await
	}
	pub async fn stop(&self) -> Result<PlaybackMode> {
		self.send_fsm(|response| PlayerCommand::Stop { response }).await
	}

	/// Replace the conversation with a visible error
	pub async fn fail(&self, message: impl Into<String>) -> Result<PlaybackMode> {
		let message = message.into();
		self.send_fsm(|response| PlayerCommand::Fail { message, response }).await
	}

	/// Fetch `chat_id` from `source` and play it. Every failure is also shown on the sink.
	pub async fn load_and_start<P>(&self, source: &P, chat_id: &str) -> Result<PlaybackMode>
	where
		P: PayloadSource + ?Sized,
	{
		let chat_id = chat_id.trim();
		if chat_id.is_empty() {
			self.fail(NO_CHAT_ID).await?;
			return Err(PlaybackError::EmptyChatId);
		}

		match source.fetch(chat_id).await {
			Ok(payload) => self.start(payload).await,
			Err(e) => {
				warn!("Failed to load chat {}: {}", chat_id, e);
				self.fail(e.user_message()).await?;
				Err(e.into())
			}
		}
	}

	// Access state
	pub fn subscribe(&self) -> watch::Receiver<PlaybackState> {
		self.state_rx.clone()
	}
	pub fn current_state(&self) -> PlaybackState {
		self.state_rx.borrow().clone()
	}

	/// Wait until playback reaches a terminal mode (finished, stopped or failed)
	pub async fn wait_until_done(&self) -> PlaybackState {
		let mut rx = self.subscribe();
		loop {
			{
				let state = rx.borrow_and_update();
				if state.mode.is_terminal() {
					return state.clone();
				}
			}
			if rx.changed().await.is_err() {
				return rx.borrow().clone();
			}
		}
	}

	/// Stop the engine and hand back the sink. `None` if already shut down.
	pub async fn shutdown(&self) -> Option<S> {
		self.cancel_token.cancel();
		let handle = self.task_handle.lock().await.take()?;
		match handle.await {
			Ok(sink) => Some(sink),
			Err(e) => {
				warn!("Playback engine task failed: {}", e);
				None
			}
		}
	}
}

impl<S> Drop for ChatPlayer<S> {
	fn drop(&mut self) {
		self.cancel_token.cancel();
	}
}
