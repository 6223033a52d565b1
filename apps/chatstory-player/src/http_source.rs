use async_trait::async_trait;
use chatstory_events::{ChatPayload, PayloadError};
use chatstory_playback::{PayloadSource, SourceError, FAILED_TO_LOAD};
use reqwest::header::{CACHE_CONTROL, PRAGMA};
use reqwest::Client;
use serde_json::Value;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tracing::debug;

/// Fetches payloads from the chat REST API
pub struct HttpSource {
	client: Client,
	base_url: String,
}

impl HttpSource {
	pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, reqwest::Error> {
		let client = Client::builder().timeout(timeout).build()?;
		Ok(Self {
			client,
			base_url: base_url.into(),
		})
	}

	pub fn frontend_url(&self, chat_id: &str) -> String {
		format!("{}/chats/{}/frontend", self.base_url.trim_end_matches('/'), chat_id)
	}
}

/// The `message` field of an error body, or the generic load failure text
pub fn error_message(body: &[u8]) -> String {
	serde_json::from_slice::<Value>(body)
		.ok()
		.and_then(|v| v.get("message").and_then(Value::as_str).map(str::to_string))
		.filter(|m| !m.trim().is_empty())
		.unwrap_or_else(|| FAILED_TO_LOAD.to_string())
}

fn cache_buster() -> u128 {
	SystemTime::now().duration_since(UNIX_EPOCH).map(|d| d.as_millis()).unwrap_or_default()
}

#[async_trait]
impl PayloadSource for HttpSource {
	async fn fetch(&self, chat_id: &str) -> Result<ChatPayload, SourceError> {
		let url = self.frontend_url(chat_id);
		debug!("GET {}", url);

		let response = self
			.client
			.get(&url)
			.header(CACHE_CONTROL, "no-cache")
			.header(PRAGMA, "no-cache")
			.query(&[("_", cache_buster())])
			.send()
			.await
			.map_err(|e| SourceError::Transport(e.to_string()))?;

		let status = response.status();
		let body = response.bytes().await.map_err(|e| SourceError::Transport(e.to_string()))?;

		if !status.is_success() {
			return Err(SourceError::Http {
				status: status.as_u16(),
				message: error_message(&body),
			});
		}

		match ChatPayload::from_json_slice(&body) {
			// A successful response without a chat may still explain itself
			Err(PayloadError::MissingChat) => Err(SourceError::Http {
				status: status.as_u16(),
				message: error_message(&body),
			}),
			result => Ok(result?),
		}
	}
}
