pub mod config;
pub mod controls;
pub mod http_source;
pub mod observability;

pub use config::Config;
pub use controls::{spawn_stdin_controls, Control};
pub use http_source::HttpSource;
pub use observability::init_tracing;
