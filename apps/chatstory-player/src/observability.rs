use std::str::FromStr;
use tracing_subscriber::{filter::EnvFilter, fmt::format::JsonFields, layer::SubscriberExt, util::SubscriberInitExt, Layer};

use crate::config::Config;

/// Install the global subscriber. Logs go to stderr so they never mix with the conversation.
pub fn init_tracing(config: &Config) -> anyhow::Result<()> {
	let filter = EnvFilter::from_str(&config.log_level)?;

	tracing_subscriber::registry()
		.with(if config.log_json {
			Box::new(
				tracing_subscriber::fmt::layer()
					.with_writer(std::io::stderr)
					.fmt_fields(JsonFields::default())
					.event_format(tracing_subscriber::fmt::format().json().flatten_event(true).with_span_list(false))
					.with_filter(filter),
			) as Box<dyn Layer<_> + Send + Sync>
		} else {
			Box::new(
				tracing_subscriber::fmt::layer()
					.with_writer(std::io::stderr)
					.with_ansi(!config.no_color)
					.with_target(true)
					.with_filter(filter),
			)
		})
		.try_init()?;

	Ok(())
}
