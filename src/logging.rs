use std::fs;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Wires up console output plus a daily-rotated JSON file under the
/// configured log directory. `RUST_LOG` overrides the default filter.
pub fn init_logging(log_dir: &str) {
    let _ = fs::create_dir_all(log_dir);

    let file_appender = tracing_appender::rolling::daily(log_dir, "pipeline.log");
    let (file_writer, guard) = tracing_appender::non_blocking(file_appender);

    let file_layer = fmt::layer().json().with_writer(file_writer);
    let console_layer = fmt::layer().with_writer(std::io::stdout);

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env().add_directive("econ_extractor=info".parse().unwrap()))
        .with(file_layer)
        .with(console_layer)
        .init();

    // The appender guard must outlive main or buffered lines are lost.
    std::mem::forget(guard);
}
