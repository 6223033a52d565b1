use std::io::BufRead;
use std::str::FromStr;
use std::thread::{self, JoinHandle};
use tokio::sync::mpsc;
use tracing::{debug, warn};

pub const HELP: &str = "commands: p|pause, r|resume, s|restart, i|status, q|quit, h|help";

/// A line typed by the viewer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Control {
	Pause,
	Resume,
	Restart,
	Status,
	Quit,
	Help,
}

impl FromStr for Control {
	type Err = String;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s.trim().to_ascii_lowercase().as_str() {
			"p" | "pause" => Ok(Self::Pause),
			"r" | "resume" => Ok(Self::Resume),
			"s" | "restart" | "replay" => Ok(Self::Restart),
			"i" | "status" => Ok(Self::Status),
			"q" | "quit" | "exit" => Ok(Self::Quit),
			"h" | "help" | "?" => Ok(Self::Help),
			other => Err(format!("unknown command {other:?}")),
		}
	}
}

/// Read controls from stdin on a detached thread until stdin closes or the receiver is gone.
/// Blank lines are ignored. A plain thread never holds up runtime shutdown.
pub fn spawn_stdin_controls(tx: mpsc::UnboundedSender<Control>) -> std::io::Result<JoinHandle<()>> {
	thread::Builder::new().name("stdin-controls".into()).spawn(move || {
		for line in std::io::stdin().lock().lines() {
			let line = match line {
				Ok(line) => line,
				Err(e) => {
					warn!("Failed to read stdin: {}", e);
					break;
				}
			};
			if line.trim().is_empty() {
				continue;
			}
			match line.parse::<Control>() {
				Ok(control) => {
					if tx.send(control).is_err() {
						break;
					}
				}
				Err(e) => eprintln!("{e}; {HELP}"),
			}
		}
		debug!("stdin closed");
	})
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn parses_short_and_long_forms() {
		assert_eq!("p".parse::<Control>(), Ok(Control::Pause));
		assert_eq!(" Resume ".parse::<Control>(), Ok(Control::Resume));
		assert_eq!("replay".parse::<Control>(), Ok(Control::Restart));
		assert_eq!("exit".parse::<Control>(), Ok(Control::Quit));
		assert!("dance".parse::<Control>().is_err());
	}
}
