//! OpenTelemetry span exporter writing one JSON object per finished span.
//!
//! ```json
//! {"service":"notesync","name":"dispatch","traceId":"…","spanId":"…","parentSpanId":"…",
//!  "startTimeUnixNano":1700000000000000000,"endTimeUnixNano":1700000000000150000,
//!  "attributes":{"event":"ToggleNavigation"},"events":[],"status":"unset"}
//! ```

use super::file_writer::RotatingFileWriter;
use futures_util::future::BoxFuture;
use opentelemetry::trace::{SpanId, Status, TraceError};
use opentelemetry::{KeyValue, Value};
use opentelemetry_sdk::export::trace::{ExportResult, SpanData, SpanExporter};
use opentelemetry_sdk::resource::Resource;
use opentelemetry_sdk::trace::TracerProvider;
use serde_json::{json, Map, Value as JsonValue};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

/// Exports spans as JSON lines through a [`RotatingFileWriter`].
#[derive(Debug)]
pub struct JsonLinesExporter {
    writer: RotatingFileWriter,
    service: String,
    is_shutdown: AtomicBool,
}

impl JsonLinesExporter {
    #[must_use]
    pub fn new(writer: RotatingFileWriter, service: impl Into<String>) -> Self {
        Self {
            writer,
            service: service.into(),
            is_shutdown: AtomicBool::new(false),
        }
    }

    /// Serializes one span.
    #[must_use]
    pub fn format_span(&self, span: &SpanData) -> JsonValue {
        let parent = if span.parent_span_id == SpanId::INVALID {
            JsonValue::Null
        } else {
            JsonValue::String(format!("{:016x}", span.parent_span_id))
        };

        let events: Vec<JsonValue> = span
            .events
            .iter()
            .map(|event| {
                json!({
                    "name": event.name,
                    "timeUnixNano": unix_nanos(event.timestamp),
                    "attributes": attributes(&event.attributes),
                })
            })
            .collect();

        json!({
            "service": self.service,
            "name": span.name,
            "traceId": format!("{:032x}", span.span_context.trace_id()),
            "spanId": format!("{:016x}", span.span_context.span_id()),
            "parentSpanId": parent,
            "startTimeUnixNano": unix_nanos(span.start_time),
            "endTimeUnixNano": unix_nanos(span.end_time),
            "attributes": attributes(&span.attributes),
            "events": events,
            "status": match &span.status {
                Status::Unset => "unset".to_string(),
                Status::Ok => "ok".to_string(),
                Status::Error { description } => format!("error: {description}"),
            },
        })
    }
}

fn unix_nanos(at: SystemTime) -> u64 {
    at.duration_since(UNIX_EPOCH)
        .map_or(0, |d| u64::try_from(d.as_nanos()).unwrap_or(u64::MAX))
}

fn attributes(pairs: &[KeyValue]) -> JsonValue {
    let map: Map<String, JsonValue> = pairs
        .iter()
        .map(|kv| (kv.key.to_string(), attribute_value(&kv.value)))
        .collect();
    JsonValue::Object(map)
}

fn attribute_value(value: &Value) -> JsonValue {
    match value {
        Value::Bool(b) => json!(b),
        Value::I64(i) => json!(i),
        Value::F64(f) => json!(f),
        Value::String(s) => json!(s.as_str()),
        Value::Array(_) => json!(value.to_string()),
    }
}

impl SpanExporter for JsonLinesExporter {
    fn export(&mut self, batch: Vec<SpanData>) -> BoxFuture<'static, ExportResult> {
        if self.is_shutdown.load(Ordering::SeqCst) {
            return Box::pin(std::future::ready(Err(TraceError::from(
                "exporter is shut down",
            ))));
        }

        let result = batch
            .iter()
            .try_for_each(|span| self.writer.write_line(&self.format_span(span).to_string()))
            .map_err(|e| TraceError::from(e.to_string()));
        Box::pin(std::future::ready(result))
    }

    fn shutdown(&mut self) {
        self.is_shutdown.store(true, Ordering::SeqCst);
    }
}

/// Builds a tracer provider that exports every finished span immediately.
#[must_use]
pub fn create_tracer_provider(writer: RotatingFileWriter, service: &str) -> TracerProvider {
    let resource = Resource::new(vec![KeyValue::new("service.name", service.to_string())]);
    let exporter = JsonLinesExporter::new(writer, service);

    TracerProvider::builder()
        .with_config(opentelemetry_sdk::trace::Config::default().with_resource(resource))
        .with_simple_exporter(exporter)
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use opentelemetry::trace::{Span, Tracer, TracerProvider as _};

    #[test]
    fn finished_spans_are_written_as_json_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("spans.jsonl");
        let provider =
            create_tracer_provider(RotatingFileWriter::new(path.clone(), 1 << 20, 1), "notesync");
        let tracer = provider.tracer("test");

        let mut span = tracer.start("dispatch");
        span.set_attribute(KeyValue::new("event", "ToggleNavigation"));
        span.set_attribute(KeyValue::new("dispatched", 2_i64));
        span.end();

        let written = std::fs::read_to_string(&path).unwrap();
        let line: JsonValue = serde_json::from_str(written.lines().next().unwrap()).unwrap();
        assert_eq!(line["service"], "notesync");
        assert_eq!(line["name"], "dispatch");
        assert_eq!(line["parentSpanId"], JsonValue::Null);
        assert_eq!(line["attributes"]["event"], "ToggleNavigation");
        assert_eq!(line["attributes"]["dispatched"], 2);
        assert_eq!(line["status"], "unset");
        assert_eq!(line["traceId"].as_str().map(str::len), Some(32));
    }

    #[test]
    fn shut_down_exporter_refuses_spans() {
        let dir = tempfile::tempdir().unwrap();
        let writer = RotatingFileWriter::new(dir.path().join("spans.jsonl"), 1 << 20, 1);
        let mut exporter = JsonLinesExporter::new(writer, "notesync");
        exporter.shutdown();

        let result = futures_util::FutureExt::now_or_never(exporter.export(Vec::new()));
        assert!(matches!(result, Some(Err(_))));
    }
}
