//! Logging setup for the simulator.
//!
//! Installs a global `tracing-subscriber` that reads its filter from
//! `RUST_LOG` (default `info`) and tags every line with the thread name, so
//! the worker's and each sender's lines can be told apart.

use crate::config::LogFormat;
use tracing_subscriber::{EnvFilter, fmt};

pub fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into());
    let builder = fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_names(true);

    match format {
        LogFormat::Pretty => builder.compact().init(),
        LogFormat::Json => builder.json().init(),
    }
}
