//! Structured-encoding codecs.
//!
//! A [`Format`] turns a whole event into one self-describing blob and back.
//! The engine consumes formats opaquely; JSON is the built-in one. A format
//! must round-trip an event's context and payload losslessly for the same
//! spec version.

use crate::error::EventError;
use crate::event::{Event, EventContext, EventData};
use crate::spec::{self, AttributeKind, SpecVersion};
use crate::value::EvValue;
use base64::Engine as _;
use bytes::Bytes;
use serde_json::{Map, Value};
use std::fmt::Debug;
use thiserror::Error;

/// Media type of the built-in JSON format.
pub const JSON_CONTENT_TYPE: &str = "application/cloudevents+json";

#[derive(Debug, Error)]
pub enum FormatError {
    #[error("json codec failed: {0}")]
    Json(#[from] serde_json::Error),
    /// Blob shape does not match the format (e.g. missing spec version).
    #[error("schema error: {reason}")]
    Schema { reason: String },
    #[error("{0}")]
    Event(#[from] EventError),
}

/// Opaque structured-encoding codec.
pub trait Format: Debug + Send + Sync {
    /// Media type this format declares on the wire.
    fn media_type(&self) -> &'static str;

    fn marshal(&self, event: &Event) -> Result<Vec<u8>, FormatError>;

    fn unmarshal(&self, bytes: &[u8], event: &mut Event) -> Result<(), FormatError>;
}

/// Built-in JSON structured format.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonFormat;

/// The built-in JSON format instance.
pub static JSON: JsonFormat = JsonFormat;

/// Resolve a format from a wire media type. Parameters after the media type
/// (e.g. `; charset=utf-8`) are tolerated. No process-wide mutable registry:
/// the set of built-in formats is fixed.
pub fn lookup(media_type: &str) -> Option<&'static dyn Format> {
    if media_type.trim().starts_with(JSON_CONTENT_TYPE) {
        Some(&JSON)
    } else {
        None
    }
}

impl Format for JsonFormat {
    fn media_type(&self) -> &'static str {
        JSON_CONTENT_TYPE
    }

    fn marshal(&self, event: &Event) -> Result<Vec<u8>, FormatError> {
        let version = event.context.spec_version();
        let mut map = Map::new();

        for attr in spec::attributes(version) {
            if let Some(value) = attr.get(&event.context) {
                map.insert(attr.name().to_string(), value.to_json());
            }
        }

        match version {
            SpecVersion::V01 | SpecVersion::V02 => {
                let exts: Map<String, Value> = event
                    .context
                    .extensions()
                    .map(|(k, v)| (k.to_string(), v.to_json()))
                    .collect();
                if !exts.is_empty() {
                    map.insert("extensions".to_string(), Value::Object(exts));
                }
            }
            SpecVersion::V03 | SpecVersion::V10 => {
                for (name, value) in event.context.extensions() {
                    map.insert(name.to_string(), value.to_json());
                }
            }
        }

        match event.data() {
            None => {}
            Some(EventData::Structured(v)) => {
                map.insert("data".to_string(), v.clone());
            }
            Some(EventData::Binary(b)) => {
                let b64 = base64::engine::general_purpose::STANDARD.encode(b);
                match version {
                    SpecVersion::V10 => {
                        map.insert("data_base64".to_string(), Value::String(b64));
                    }
                    SpecVersion::V03 => {
                        // v0.3 marks base64 payloads through the context
                        // attribute rather than a separate member.
                        map.insert(
                            "datacontentencoding".to_string(),
                            Value::String("base64".to_string()),
                        );
                        map.insert("data".to_string(), Value::String(b64));
                    }
                    SpecVersion::V01 | SpecVersion::V02 => {
                        // These versions have no encoding attribute; the
                        // marker member lives on the wire only and is not
                        // stored on the context.
                        map.insert(
                            "datacontentencoding".to_string(),
                            Value::String("base64".to_string()),
                        );
                        map.insert("data".to_string(), Value::String(b64));
                    }
                }
            }
        }

        Ok(serde_json::to_vec(&Value::Object(map))?)
    }

    fn unmarshal(&self, bytes: &[u8], event: &mut Event) -> Result<(), FormatError> {
        let value: Value = serde_json::from_slice(bytes)?;
        let obj = value.as_object().ok_or_else(|| FormatError::Schema {
            reason: "structured blob is not a JSON object".to_string(),
        })?;

        let version_str = obj
            .get("specversion")
            .or_else(|| obj.get("cloudEventsVersion"))
            .and_then(Value::as_str)
            .ok_or_else(|| FormatError::Schema {
                reason: "missing spec version member".to_string(),
            })?;
        let version = SpecVersion::parse(version_str).ok_or_else(|| FormatError::Schema {
            reason: format!("unknown spec version '{version_str}'"),
        })?;

        let mut ctx = EventContext::new(version);
        for attr in spec::attributes(version) {
            if attr.kind() == AttributeKind::SpecVersion {
                continue;
            }
            match obj.get(attr.name()) {
                None | Some(Value::Null) => {}
                Some(raw) => {
                    let value = EvValue::validate(raw.clone()).map_err(|e| {
                        FormatError::Schema {
                            reason: format!("attribute '{}': {e}", attr.name()),
                        }
                    })?;
                    attr.set(&mut ctx, value)?;
                }
            }
        }

        match version {
            SpecVersion::V01 | SpecVersion::V02 => {
                if let Some(Value::Object(exts)) = obj.get("extensions") {
                    for (name, raw) in exts {
                        ctx.set_extension(name, raw.clone())?;
                    }
                }
            }
            SpecVersion::V03 | SpecVersion::V10 => {
                for (name, raw) in obj {
                    if name.as_str() == "data" || name.as_str() == "data_base64" {
                        continue;
                    }
                    if spec::is_reserved_name(version, name) {
                        continue;
                    }
                    ctx.set_extension(name, raw.clone())?;
                }
            }
        }

        let base64_payload = match version {
            SpecVersion::V03 => ctx
                .attribute(AttributeKind::DataContentEncoding)
                .map(|v| v.to_string_repr() == "base64")
                .unwrap_or(false),
            // Legacy versions carry the marker as a bare wire member.
            SpecVersion::V01 | SpecVersion::V02 => obj
                .get("datacontentencoding")
                .and_then(Value::as_str)
                .map(|v| v == "base64")
                .unwrap_or(false),
            SpecVersion::V10 => false,
        };

        let data = if let Some(Value::String(b64)) = obj.get("data_base64") {
            Some(EventData::Binary(decode_base64(b64)?))
        } else {
            match obj.get("data") {
                None | Some(Value::Null) => None,
                Some(Value::String(s)) if base64_payload => {
                    Some(EventData::Binary(decode_base64(s)?))
                }
                Some(raw) => Some(EventData::Structured(raw.clone())),
            }
        };

        event.context = ctx;
        match data {
            Some(d) => event.set_data(d),
            None => event.clear_data(),
        }
        Ok(())
    }
}

fn decode_base64(s: &str) -> Result<Bytes, FormatError> {
    base64::engine::general_purpose::STANDARD
        .decode(s)
        .map(Bytes::from)
        .map_err(|e| FormatError::Schema {
            reason: format!("invalid base64 payload: {e}"),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample(version: SpecVersion) -> Event {
        let mut event = Event::new(version);
        event.context.set_event_type("com.example.test").unwrap();
        event.context.set_source("urn:test").unwrap();
        event.context.set_id("1").unwrap();
        event
            .context
            .set_time("2024-03-01T12:00:00Z".parse().unwrap())
            .unwrap();
        event.context.set_extension("priority", json!(5)).unwrap();
        event.set_data(json!({"id": 1, "message": "hi"}));
        event
    }

    #[test]
    fn structured_round_trip_all_versions() {
        for version in SpecVersion::all() {
            let event = sample(version);
            let bytes = JSON.marshal(&event).unwrap();
            let mut back = Event::default();
            JSON.unmarshal(&bytes, &mut back).unwrap();
            assert_eq!(back, event, "version {version}");
        }
    }

    #[test]
    fn binary_payload_round_trips_on_v10() {
        let mut event = sample(SpecVersion::V10);
        event.set_data(Bytes::from_static(b"\x00\x01raw"));
        let bytes = JSON.marshal(&event).unwrap();
        let mut back = Event::default();
        JSON.unmarshal(&bytes, &mut back).unwrap();
        assert_eq!(back, event);
    }

    #[test]
    fn binary_payload_round_trips_on_v03_via_content_encoding() {
        let mut event = sample(SpecVersion::V03);
        event.set_data(Bytes::from_static(b"\x00\x01raw"));
        let bytes = JSON.marshal(&event).unwrap();
        let blob: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(blob["datacontentencoding"], json!("base64"));
        let mut back = Event::default();
        JSON.unmarshal(&bytes, &mut back).unwrap();
        assert_eq!(back.data(), event.data());
    }

    #[test]
    fn binary_payload_round_trips_on_legacy_versions() {
        for version in [SpecVersion::V01, SpecVersion::V02] {
            let mut event = sample(version);
            event.set_data(Bytes::from_static(b"\x00\x01raw"));
            let bytes = JSON.marshal(&event).unwrap();
            let blob: Value = serde_json::from_slice(&bytes).unwrap();
            assert_eq!(blob["datacontentencoding"], json!("base64"), "{version}");
            let mut back = Event::default();
            JSON.unmarshal(&bytes, &mut back).unwrap();
            assert_eq!(back, event, "{version}");
        }
    }

    #[test]
    fn v01_uses_legacy_member_names() {
        let event = sample(SpecVersion::V01);
        let blob: Value = serde_json::from_slice(&JSON.marshal(&event).unwrap()).unwrap();
        assert_eq!(blob["cloudEventsVersion"], json!("0.1"));
        assert_eq!(blob["eventType"], json!("com.example.test"));
        assert_eq!(blob["eventID"], json!("1"));
        assert_eq!(blob["extensions"]["priority"], json!(5));
    }

    #[test]
    fn missing_spec_version_is_a_schema_error() {
        let mut event = Event::default();
        let err = JSON.unmarshal(br#"{"type":"t"}"#, &mut event).unwrap_err();
        assert!(matches!(err, FormatError::Schema { .. }));
    }

    #[test]
    fn lookup_matches_media_type_prefix() {
        assert!(lookup("application/cloudevents+json").is_some());
        assert!(lookup("application/cloudevents+json; charset=utf-8").is_some());
        assert!(lookup("application/json").is_none());
    }
}
