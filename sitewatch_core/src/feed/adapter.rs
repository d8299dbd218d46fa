use std::sync::atomic::{AtomicI64, Ordering};

use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::activity::{
    now_millis, ActivityId, ActivityRecord, ActivityTime, Icon, Severity, DEFAULT_KIND,
    DEFAULT_MESSAGE,
};
use crate::error::DecodeError;

/// A payload as delivered by a push channel.
#[derive(Debug, Clone, PartialEq)]
pub enum RawPayload {
    /// Already parsed by the transport.
    Structured(Value),
    /// Serialized JSON text.
    Text(String),
}

impl From<Value> for RawPayload {
    fn from(value: Value) -> Self {
        RawPayload::Structured(value)
    }
}

impl From<String> for RawPayload {
    fn from(text: String) -> Self {
        RawPayload::Text(text)
    }
}

impl From<&str> for RawPayload {
    fn from(text: &str) -> Self {
        RawPayload::Text(text.to_string())
    }
}

/// Hands out fallback ids based on the current time in milliseconds, bumped
/// past the previous value so two payloads in the same millisecond never share one.
#[derive(Debug, Default)]
pub struct FallbackIds {
    last: AtomicI64,
}

impl FallbackIds {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next(&self) -> ActivityId {
        let now = now_millis();
        let previous = self
            .last
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |last| {
                Some(now.max(last + 1))
            })
            .unwrap_or(now);
        ActivityId::Number(now.max(previous + 1))
    }
}

/// Turns raw channel payloads into activity records, filling every missing
/// or unusable field with a default.
#[derive(Debug, Default)]
pub struct ActivityDecoder {
    ids: FallbackIds,
}

impl ActivityDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// A fresh fallback id, for records built locally.
    pub fn fresh_id(&self) -> ActivityId {
        self.ids.next()
    }

    /// Decodes one payload. Fails only when there is nothing to read fields from.
    pub fn decode(&self, payload: RawPayload) -> Result<ActivityRecord, DecodeError> {
        let value = match payload {
            RawPayload::Structured(value) => value,
            RawPayload::Text(text) => serde_json::from_str::<Value>(&text)?,
        };

        match value {
            Value::Null => Err(DecodeError::Null),
            Value::Object(fields) => Ok(self.record_from(&fields)),
            // Scalars and arrays have no named fields; everything defaults.
            _ => Ok(self.record_from(&Map::new())),
        }
    }

    /// Decodes one payload, logging and discarding it on failure.
    pub fn ingest(&self, payload: RawPayload) -> Option<ActivityRecord> {
        match self.decode(payload) {
            Ok(record) => {
                debug!(id = %record.id, kind = %record.kind, "decoded activity");
                Some(record)
            }
            Err(e) => {
                warn!(error = %e, "dropping activity payload");
                None
            }
        }
    }

    fn record_from(&self, fields: &Map<String, Value>) -> ActivityRecord {
        let id = match fields.get("id") {
            Some(Value::Number(n)) => match n.as_i64() {
                Some(n) => ActivityId::Number(n),
                None => ActivityId::Text(n.to_string()),
            },
            Some(Value::String(s)) => ActivityId::Text(s.clone()),
            _ => self.ids.next(),
        };

        let occurred_at = match fields.get("time") {
            Some(Value::Number(n)) => match n.as_i64() {
                Some(ms) => ActivityTime::Millis(ms),
                None => ActivityTime::Display(n.to_string()),
            },
            Some(Value::String(s)) => ActivityTime::Display(s.clone()),
            _ => ActivityTime::Millis(now_millis()),
        };

        let kind = non_empty_str(fields, "type").unwrap_or(DEFAULT_KIND);
        let message = non_empty_str(fields, "message").unwrap_or(DEFAULT_MESSAGE);
        let severity = non_empty_str(fields, "status")
            .map(Severity::from_label)
            .unwrap_or_default();
        let icon = non_empty_str(fields, "icon")
            .map(Icon::from_name)
            .unwrap_or_default();

        ActivityRecord {
            id,
            kind: kind.to_string(),
            message: message.to_string(),
            occurred_at,
            severity,
            icon,
        }
    }
}

fn non_empty_str<'a>(fields: &'a Map<String, Value>, key: &str) -> Option<&'a str> {
    fields
        .get(key)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::io::{self, Write};
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

    impl Write for CapturedLogs {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl CapturedLogs {
        fn lines_containing(&self, needle: &str) -> usize {
            let bytes = self.0.lock().unwrap();
            String::from_utf8_lossy(&bytes)
                .lines()
                .filter(|line| line.contains(needle))
                .count()
        }
    }

    #[test]
    fn test_message_only_payload_gets_defaults() {
        let decoder = ActivityDecoder::new();
        let record = decoder.decode(json!({ "message": "x" }).into()).unwrap();

        assert_eq!(record.message, "x");
        assert_eq!(record.kind, DEFAULT_KIND);
        assert_eq!(record.severity, Severity::Info);
        assert_eq!(record.icon, Icon::Info);
        assert!(!record.id.to_string().is_empty());
        assert!(matches!(record.occurred_at, ActivityTime::Millis(_)));
    }

    #[test]
    fn test_full_text_payload() {
        let decoder = ActivityDecoder::new();
        let text = r#"{"id":"HD-004","type":"device_low_battery","message":"battery low","time":"1 hour ago","status":"warning","icon":"BatteryLow"}"#;
        let record = decoder.decode(text.into()).unwrap();

        assert_eq!(record.id, ActivityId::Text("HD-004".into()));
        assert_eq!(record.kind, "device_low_battery");
        assert_eq!(record.occurred_at, ActivityTime::Display("1 hour ago".into()));
        assert_eq!(record.severity, Severity::Warning);
        assert_eq!(record.icon, Icon::BatteryLow);
    }

    #[test]
    fn test_unusable_fields_fall_back() {
        let decoder = ActivityDecoder::new();
        let record = decoder
            .decode(
                json!({
                    "id": true,
                    "type": "",
                    "message": 42,
                    "time": [1, 2],
                    "status": "resolved",
                    "icon": "CloudCheck"
                })
                .into(),
            )
            .unwrap();

        assert!(matches!(record.id, ActivityId::Number(_)));
        assert_eq!(record.kind, DEFAULT_KIND);
        assert_eq!(record.message, DEFAULT_MESSAGE);
        assert!(matches!(record.occurred_at, ActivityTime::Millis(_)));
        assert_eq!(record.severity, Severity::Info);
        assert_eq!(record.icon, Icon::Info);
    }

    #[test]
    fn test_status_labels_are_case_sensitive() {
        let decoder = ActivityDecoder::new();
        let exact = decoder.decode(json!({ "status": "warning" }).into()).unwrap();
        let capitalized = decoder.decode(json!({ "status": "Warning" }).into()).unwrap();
        let padded = decoder.decode(json!({ "status": " danger " }).into()).unwrap();

        assert_eq!(exact.severity, Severity::Warning);
        assert_eq!(capitalized.severity, Severity::Info);
        assert_eq!(padded.severity, Severity::Info);
    }

    #[test]
    fn test_numeric_fields_are_kept() {
        let decoder = ActivityDecoder::new();
        let record = decoder
            .decode(json!({ "id": 99, "time": 1_700_000_000_000i64 }).into())
            .unwrap();
        assert_eq!(record.id, ActivityId::Number(99));
        assert_eq!(record.occurred_at, ActivityTime::Millis(1_700_000_000_000));

        let record = decoder.decode(json!({ "id": 1.5 }).into()).unwrap();
        assert_eq!(record.id, ActivityId::Text("1.5".into()));
    }

    #[test]
    fn test_non_object_payloads() {
        let decoder = ActivityDecoder::new();
        let record = decoder.decode("42".into()).unwrap();
        assert_eq!(record.message, DEFAULT_MESSAGE);

        assert!(matches!(decoder.decode("null".into()), Err(DecodeError::Null)));
        assert!(matches!(
            decoder.decode(RawPayload::Structured(Value::Null)),
            Err(DecodeError::Null)
        ));
    }

    #[test]
    fn test_fallback_ids_are_unique() {
        let ids = FallbackIds::new();
        let mut seen: Vec<ActivityId> = (0..1000).map(|_| ids.next()).collect();
        let total = seen.len();
        seen.sort_by_key(|id| id.to_string());
        seen.dedup();
        assert_eq!(seen.len(), total);
    }

    #[test]
    fn test_undecodable_text_emits_one_diagnostic() {
        let logs = CapturedLogs::default();
        let writer = logs.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || writer.clone())
            .with_ansi(false)
            .with_max_level(tracing::Level::DEBUG)
            .finish();

        let decoder = ActivityDecoder::new();
        let result = tracing::subscriber::with_default(subscriber, || {
            decoder.ingest("this is {not json".into())
        });

        assert!(result.is_none());
        assert_eq!(logs.lines_containing("dropping activity payload"), 1);
        assert_eq!(logs.lines_containing("WARN"), 1);
    }
}
