//! Tracing subscriber setup for the `filebatch` binary.

use std::io;
use std::path::Path;

use tracing::Level;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

/// Level for `verbosity` repetitions of `-v`. With no `-v` the configured
/// level is used, falling back to `warn`.
pub fn level_for(verbosity: u8, configured: Option<&str>) -> String {
    let level = match verbosity {
        0 => return configured.unwrap_or("warn").to_lowercase(),
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };
    level.as_str().to_lowercase()
}

fn filter(level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level))
}

/// Install the global subscriber: compact output on stderr and, when
/// `log_file` is given, a plain-text copy appended to that file.
///
/// `RUST_LOG` overrides `level`. The returned guard must be kept alive
/// until exit or buffered file output is lost.
pub fn init_logging(level: &str, log_file: Option<&Path>) -> io::Result<Option<WorkerGuard>> {
    let stderr_layer = fmt::layer()
        .with_target(false)
        .with_writer(io::stderr)
        .compact()
        .with_filter(filter(level));

    let (file_layer, guard) = match log_file {
        Some(path) => {
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)?;
            let (writer, guard) = tracing_appender::non_blocking(file);
            let layer = fmt::layer()
                .with_ansi(false)
                .with_writer(writer)
                .with_filter(filter(level));
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    // A second init (tests, embedding) keeps the first subscriber.
    let _ = tracing_subscriber::registry()
        .with(stderr_layer)
        .with(file_layer)
        .try_init();
    Ok(guard)
}
