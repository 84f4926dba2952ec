//! `tracing` subscriber setup

use tracing_subscriber::{fmt, EnvFilter};

use crate::config::CliConfig;

/// Filter from `RUST_LOG` when set, otherwise from the verbosity level
#[must_use]
pub fn env_filter(config: &CliConfig) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(config.verbosity.filter_directive()))
}

/// Install the global subscriber; later calls are ignored
pub fn init(config: &CliConfig) {
    let builder = fmt()
        .with_env_filter(env_filter(config))
        .with_writer(std::io::stderr)
        .with_target(false);
    let _ = if config.log_json {
        builder.json().try_init()
    } else {
        builder.without_time().with_ansi(config.color.should_color()).try_init()
    };
}
