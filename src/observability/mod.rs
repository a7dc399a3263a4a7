//! OpenTelemetry tracing with file-based span export.
//!
//! ```text
//! tracing macros → tracing-opentelemetry → SDK tracer → JsonLinesExporter → rotating file
//! ```
//!
//! Spans land in `<data dir>/notesync-spans.jsonl`, one JSON object per line. The
//! file rotates at `trace_max_bytes` and keeps `trace_backups` numbered backups.
//!
//! # Modules
//!
//! - `init`: subscriber setup
//! - `exporter`: span serialization and the tracer provider
//! - `file_writer`: rotating line writer

mod exporter;
mod file_writer;
mod init;

pub use exporter::{create_tracer_provider, JsonLinesExporter};
pub use file_writer::RotatingFileWriter;
pub use init::{init_tracing, span_file_path, SPAN_FILE_NAME};
