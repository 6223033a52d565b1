use clap::Parser;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Chat id used when playing a local file without an explicit id
pub const LOCAL_CHAT_ID: &str = "local";

#[derive(Parser, Clone, Debug, Serialize, Deserialize)]
#[command(author, version, about = "Play back a scripted chat conversation in the terminal", long_about = None)]
pub struct Config {
	#[arg(long, env = "CHATSTORY_BASE_URL", default_value = "http://localhost:8080/wp-json/chatstory/v1", help = "Base URL of the chat REST API")]
	pub base_url: String,

	#[arg(long, env = "CHATSTORY_CHAT_ID", help = "Chat to play")]
	pub chat_id: Option<String>,

	#[arg(long, env = "CHATSTORY_FILE", help = "Play a saved frontend payload instead of fetching one")]
	pub file: Option<PathBuf>,

	#[arg(long, env = "CHATSTORY_HTML_OUT", help = "Write the rendered conversation as HTML when playback ends")]
	pub html_out: Option<PathBuf>,

	#[arg(long, env = "CHATSTORY_TRACE", default_value = "false", help = "Print timed effects as JSON lines instead of the conversation")]
	pub trace: bool,

	#[arg(
        long = "request-timeout-secs",
        env = "CHATSTORY_REQUEST_TIMEOUT_SECS",
        default_value = "10",
        value_parser = parse_duration,
        help = "HTTP request timeout in seconds"
    )]
	pub request_timeout: Duration,

	#[arg(long, env = "RUST_LOG", default_value = "info", help = "Tracing filter directive")]
	pub log_level: String,

	#[arg(long, env = "LOG_JSON", default_value = "false", help = "Use JSON formatting for logs")]
	pub log_json: bool,

	#[arg(long, env = "NO_COLOR", default_value = "false", help = "Disable colored output")]
	pub no_color: bool,
}

impl Config {
	/// Chat id to load. A local file may be played without one.
	pub fn effective_chat_id(&self) -> String {
		match (self.chat_id.as_deref().map(str::trim), &self.file) {
			(Some(id), _) if !id.is_empty() => id.to_string(),
			(_, Some(_)) => LOCAL_CHAT_ID.to_string(),
			_ => String::new(),
		}
	}
}

fn parse_duration(s: &str) -> Result<Duration, std::num::ParseIntError> {
	s.parse::<u64>().map(Duration::from_secs)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_parse_duration() {
		assert_eq!(parse_duration("15").unwrap(), Duration::from_secs(15));
		assert!(parse_duration("soon").is_err());
	}

	#[test]
	fn test_config_parser() {
		let args = vec![
			"chatstory-player",
			"--base-url",
			"https://example.org/wp-json/chatstory/v1",
			"--chat-id",
			"42",
			"--html-out",
			"chat.html",
			"--request-timeout-secs",
			"3",
			"--log-level",
			"debug",
			"--no-color",
		];

		let config = Config::try_parse_from(args).unwrap();
		assert_eq!(config.base_url, "https://example.org/wp-json/chatstory/v1");
		assert_eq!(config.effective_chat_id(), "42");
		assert_eq!(config.html_out, Some(PathBuf::from("chat.html")));
		assert_eq!(config.request_timeout, Duration::from_secs(3));
		assert_eq!(config.log_level, "debug");
		assert!(config.no_color);
		assert!(!config.trace);
	}

	#[test]
	fn test_local_file_needs_no_chat_id() {
		let config = Config::try_parse_from(["chatstory-player", "--file", "saved.json", "--chat-id", " "]).unwrap();
		assert_eq!(config.effective_chat_id(), LOCAL_CHAT_ID);

		let remote = Config::try_parse_from(["chatstory-player", "--chat-id", " "]).unwrap();
		assert_eq!(remote.effective_chat_id(), "");
	}
}
