mod context;
mod versions;

pub use context::EventContext;
pub use versions::{ContextV01, ContextV02, ContextV03, ContextV10, Extensions};

use crate::error::{EventError, EventResult};
use crate::spec::SpecVersion;
use bytes::Bytes;
use serde_json::Value;

/// Default content type assumed for lazily-encoded structured payloads.
pub const APPLICATION_JSON: &str = "application/json";

/// Event payload.
///
/// Exactly one of {unset, raw bytes, structured value} is the effective
/// payload at any time; the `Option<EventData>` on [`Event`] encodes that
/// invariant. Structured values are encoded lazily at marshal time.
#[derive(Debug, Clone, PartialEq)]
pub enum EventData {
    /// Raw payload bytes, opaque to the engine.
    Binary(Bytes),
    /// Arbitrary structured value, encoded on demand.
    Structured(Value),
}

impl From<Bytes> for EventData {
    fn from(b: Bytes) -> Self {
        EventData::Binary(b)
    }
}

impl From<Vec<u8>> for EventData {
    fn from(b: Vec<u8>) -> Self {
        EventData::Binary(Bytes::from(b))
    }
}

impl From<Value> for EventData {
    fn from(v: Value) -> Self {
        EventData::Structured(v)
    }
}

/// The logical entity: versioned metadata plus an optional payload.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Event {
    pub context: EventContext,
    data: Option<EventData>,
}

impl Event {
    /// New empty event of the given schema version.
    pub fn new(version: SpecVersion) -> Self {
        Event {
            context: EventContext::new(version),
            data: None,
        }
    }

    pub fn data(&self) -> Option<&EventData> {
        self.data.as_ref()
    }

    /// Replace the payload.
    pub fn set_data(&mut self, data: impl Into<EventData>) {
        self.data = Some(data.into());
    }

    /// Clear the payload.
    pub fn clear_data(&mut self) {
        self.data = None;
    }

    pub fn take_data(&mut self) -> Option<EventData> {
        self.data.take()
    }

    /// Payload as bytes, encoding a structured value with JSON on demand.
    pub fn data_bytes(&self) -> EventResult<Option<Bytes>> {
        match &self.data {
            None => Ok(None),
            Some(EventData::Binary(b)) => Ok(Some(b.clone())),
            Some(EventData::Structured(v)) => serde_json::to_vec(v)
                .map(|b| Some(Bytes::from(b)))
                .map_err(|e| EventError::DataEncode {
                    reason: e.to_string(),
                }),
        }
    }

    /// Effective content type: the context's, or `application/json` when a
    /// structured payload is present without one.
    pub fn effective_content_type(&self) -> Option<String> {
        match self.context.data_content_type() {
            Some(ct) => Some(ct),
            None => match self.data {
                Some(EventData::Structured(_)) => Some(APPLICATION_JSON.to_string()),
                _ => None,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn payload_states_are_exclusive() {
        let mut event = Event::new(SpecVersion::V10);
        assert!(event.data().is_none());

        event.set_data(json!({"id": 1}));
        assert!(matches!(event.data(), Some(EventData::Structured(_))));

        event.set_data(Bytes::from_static(b"raw"));
        assert!(matches!(event.data(), Some(EventData::Binary(_))));

        event.clear_data();
        assert!(event.data().is_none());
    }

    #[test]
    fn structured_data_encodes_lazily() {
        let mut event = Event::new(SpecVersion::V10);
        event.set_data(json!({"id": 1, "message": "hi"}));
        let bytes = event.data_bytes().unwrap().unwrap();
        let back: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(back, json!({"id": 1, "message": "hi"}));
    }

    #[test]
    fn structured_payload_defaults_content_type() {
        let mut event = Event::new(SpecVersion::V10);
        event.set_data(json!({"k": "v"}));
        assert_eq!(
            event.effective_content_type().as_deref(),
            Some(APPLICATION_JSON)
        );
        event.context.set_data_content_type("text/plain").unwrap();
        assert_eq!(event.effective_content_type().as_deref(), Some("text/plain"));
    }
}
