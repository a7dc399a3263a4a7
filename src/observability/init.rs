//! Subscriber setup.

use super::exporter::create_tracer_provider;
use super::file_writer::RotatingFileWriter;
use crate::Config;
use opentelemetry::trace::TracerProvider as _;
use std::path::PathBuf;
use tracing_opentelemetry::OpenTelemetryLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const SERVICE_NAME: &str = "notesync";

/// File name of the span trace inside the data directory.
pub const SPAN_FILE_NAME: &str = "notesync-spans.jsonl";

/// Where spans are written for `config`, if a data directory can be resolved.
#[must_use]
pub fn span_file_path(config: &Config) -> Option<PathBuf> {
    crate::infrastructure::get_data_dir(config.data_dir.as_deref())
        .map(|dir| dir.join(SPAN_FILE_NAME))
}

/// Installs the global tracing subscriber.
///
/// Spans pass an [`EnvFilter`] built from `config.trace_level` (default `"info"`)
/// and are exported as JSON lines to [`span_file_path`]. Without a usable data
/// directory nothing is installed. Calling this more than once is harmless; only
/// the first subscriber sticks.
///
/// # Example
///
/// ```rust
/// use notesync::observability::init_tracing;
/// use notesync::Config;
///
/// let config = Config {
///     trace_level: Some("debug".to_string()),
///     ..Default::default()
/// };
/// init_tracing(&config);
/// tracing::debug!("tracing is now active");
/// ```
pub fn init_tracing(config: &Config) {
    let level = config
        .trace_level
        .clone()
        .unwrap_or_else(|| "info".to_string());

    let Some(path) = span_file_path(config) else {
        return;
    };
    if let Some(dir) = path.parent() {
        if std::fs::create_dir_all(dir).is_err() {
            return;
        }
    }

    let writer = RotatingFileWriter::new(path, config.trace_max_bytes, config.trace_backups);
    let provider = create_tracer_provider(writer, SERVICE_NAME);
    let otel_layer = OpenTelemetryLayer::new(provider.tracer(SERVICE_NAME));

    let _ = tracing_subscriber::registry()
        .with(EnvFilter::new(level))
        .with(otel_layer)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn span_file_lives_in_configured_data_dir() {
        let config = Config {
            data_dir: Some("/var/lib/notesync".to_string()),
            ..Config::default()
        };
        assert_eq!(
            span_file_path(&config),
            Some(PathBuf::from("/var/lib/notesync").join(SPAN_FILE_NAME))
        );
    }
}
