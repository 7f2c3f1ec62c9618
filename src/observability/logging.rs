use std::fs;
use tracing::Subscriber;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::config::Config;

/// Initializes console logging and, when enabled, a JSON log file with daily rotation.
///
/// The returned guard must be held until exit so buffered file logs are flushed.
pub fn init_logging(config: &Config) -> Option<WorkerGuard> {
    let (subscriber, guard) = build_subscriber(config);
    subscriber.init();
    guard
}

/// Assembles the layered subscriber without installing it globally.
pub fn build_subscriber(config: &Config) -> (impl Subscriber + Send + Sync + 'static, Option<WorkerGuard>) {
    // Respect RUST_LOG if set; otherwise info for our crate
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("food_delivery_pipeline=info,warn"));

    let console_layer = fmt::layer().with_target(false).with_writer(std::io::stdout);

    let (file_layer, guard) = if config.log_to_file {
        // Ensure logs directory exists
        let _ = fs::create_dir_all(&config.log_dir);

        let file_appender = tracing_appender::rolling::daily(&config.log_dir, "pipeline.log");
        let (non_blocking_writer, guard) = tracing_appender::non_blocking(file_appender);
        (Some(fmt::layer().json().with_writer(non_blocking_writer)), Some(guard))
    } else {
        (None, None)
    };

    let subscriber = tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer)
        .with(console_layer);

    (subscriber, guard)
}
