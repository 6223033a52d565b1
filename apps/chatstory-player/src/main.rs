use anyhow::Context;
use chatstory_playback::{ChatPlayer, FileSource, HtmlSink, PayloadSource, PlaybackConfig, PlaybackMode, RenderSink, Tee, TerminalSink, TraceSink};
use chatstory_player::controls::HELP;
use chatstory_player::{init_tracing, spawn_stdin_controls, Config, Control, HttpSource};
use clap::Parser;
use tokio::sync::mpsc;
use tracing::{error, info, warn};

type Surface = Tee<Box<dyn RenderSink>, HtmlSink>;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
	dotenv::dotenv().ok();

	let config = Config::parse();
	init_tracing(&config)?;

	let source: Box<dyn PayloadSource> = match &config.file {
		Some(path) => Box::new(FileSource::new(path)),
		None => Box::new(HttpSource::new(config.base_url.clone(), config.request_timeout).context("could not build HTTP client")?),
	};

	// The HTML document is always kept so a snapshot can be written at the end
	let trace = config.trace.then(TraceSink::new);
	let surface: Box<dyn RenderSink> = match &trace {
		Some(trace) => Box::new(trace.clone()),
		None => Box::new(TerminalSink::stdout().with_color(!config.no_color)),
	};
	let player: ChatPlayer<Surface> = ChatPlayer::new(Tee::new(surface, HtmlSink::new()), PlaybackConfig::default());

	let chat_id = config.effective_chat_id();
	play(&player, source.as_ref(), &chat_id).await;

	let (control_tx, mut control_rx) = mpsc::unbounded_channel();
	let _controls = spawn_stdin_controls(control_tx).context("could not start stdin reader")?;
	let mut controls_open = true;
	let mut state_rx = player.subscribe();

	loop {
		if !controls_open && player.current_state().mode.is_terminal() {
			break;
		}

		tokio::select! {
			_ = tokio::signal::ctrl_c() => {
				info!("Interrupted");
				break;
			}

			changed = state_rx.changed() => {
				if changed.is_err() {
					break;
				}
				let mode = state_rx.borrow_and_update().mode;
				if mode == PlaybackMode::Finished && controls_open {
					eprintln!("Playback finished. Type s to replay or q to quit.");
				}
			}

			control = control_rx.recv(), if controls_open => match control {
				None => controls_open = false,
				Some(Control::Quit) => break,
				Some(control) => handle_control(&player, source.as_ref(), &chat_id, control).await,
			},
		}
	}

	let last = player.current_state();
	let _ = player.stop().await;
	let sink = player.shutdown().await.context("playback engine did not shut down cleanly")?;
	let (_, html) = sink.into_parts();

	if let Some(path) = &config.html_out {
		tokio::fs::write(path, html.render()).await.with_context(|| format!("could not write {}", path.display()))?;
		info!("Wrote HTML snapshot to {}", path.display());
	}

	if let Some(trace) = trace {
		print!("{}", trace.to_json_lines()?);
	}

	match last.mode {
		PlaybackMode::Failed => anyhow::bail!(last.last_error.unwrap_or_else(|| "playback failed".to_string())),
		_ => Ok(()),
	}
}

async fn play(player: &ChatPlayer<Surface>, source: &dyn PayloadSource, chat_id: &str) {
	match player.load_and_start(source, chat_id).await {
		Ok(mode) => info!("Chat {} loaded, player {}", chat_id, mode),
		Err(e) if e.is_recoverable() => warn!("Could not play chat {:?}: {}", chat_id, e),
		Err(e) => error!("Player failed: {}", e),
	}
}

async fn handle_control(player: &ChatPlayer<Surface>, source: &dyn PayloadSource, chat_id: &str, control: Control) {
	let result = match control {
		Control::Pause => player.pause().await,
		Control::Resume => player.resume().await,
		Control::Restart => {
			play(player, source, chat_id).await;
			return;
		}
		Control::Status => {
			match serde_json::to_string_pretty(&player.current_state()) {
				Ok(state) => eprintln!("{state}"),
				Err(e) => warn!("Could not encode state: {}", e),
			}
			return;
		}
		Control::Help => {
			eprintln!("{HELP}");
			return;
		}
		Control::Quit => return,
	};

	match result {
		Ok(mode) => info!("Player {}", mode),
		Err(e) => eprintln!("{e}"),
	}
}
