//! Per-version context storage.
//!
//! These structs are plain data holders; all mutation goes through the
//! attribute setters on [`EventContext`](super::EventContext) so version
//! invariants (extension naming, value coercion) hold in one place.

use crate::error::{EventError, EventResult};
use crate::spec::AttributeKind;
use crate::value::EvValue;
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use url::Url;

/// Extension map shared by all versions. `BTreeMap` keeps iteration
/// deterministic; keys are stored lowercased.
pub type Extensions = BTreeMap<String, EvValue>;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ContextV01 {
    pub(crate) event_type: Option<String>,
    pub(crate) source: Option<Url>,
    pub(crate) event_id: Option<String>,
    pub(crate) event_time: Option<DateTime<Utc>>,
    pub(crate) schema_url: Option<Url>,
    pub(crate) content_type: Option<String>,
    pub(crate) extensions: Extensions,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ContextV02 {
    pub(crate) event_type: Option<String>,
    pub(crate) source: Option<Url>,
    pub(crate) id: Option<String>,
    pub(crate) time: Option<DateTime<Utc>>,
    pub(crate) schema_url: Option<Url>,
    pub(crate) content_type: Option<String>,
    pub(crate) extensions: Extensions,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ContextV03 {
    pub(crate) event_type: Option<String>,
    pub(crate) source: Option<Url>,
    pub(crate) subject: Option<String>,
    pub(crate) id: Option<String>,
    pub(crate) time: Option<DateTime<Utc>>,
    pub(crate) schema_url: Option<Url>,
    pub(crate) data_content_type: Option<String>,
    pub(crate) data_content_encoding: Option<String>,
    pub(crate) extensions: Extensions,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ContextV10 {
    pub(crate) event_type: Option<String>,
    pub(crate) source: Option<Url>,
    pub(crate) subject: Option<String>,
    pub(crate) id: Option<String>,
    pub(crate) time: Option<DateTime<Utc>>,
    pub(crate) data_schema: Option<Url>,
    pub(crate) data_content_type: Option<String>,
    pub(crate) extensions: Extensions,
}

fn unsupported(kind: AttributeKind, version: crate::spec::SpecVersion) -> EventError {
    EventError::UnsupportedAttribute { kind, version }
}

fn coerce_time(kind: AttributeKind, value: EvValue) -> EventResult<DateTime<Utc>> {
    value
        .to_timestamp()
        .map_err(|source| EventError::AttributeCoercion { kind, source })
}

fn coerce_uri(kind: AttributeKind, value: EvValue) -> EventResult<Url> {
    value
        .to_uri()
        .map_err(|source| EventError::AttributeCoercion { kind, source })
}

impl ContextV01 {
    pub(crate) fn attribute(&self, kind: AttributeKind) -> Option<EvValue> {
        match kind {
            AttributeKind::Type => self.event_type.clone().map(EvValue::String),
            AttributeKind::Source => self.source.clone().map(EvValue::Uri),
            AttributeKind::Id => self.event_id.clone().map(EvValue::String),
            AttributeKind::Time => self.event_time.map(EvValue::Timestamp),
            AttributeKind::SchemaUrl => self.schema_url.clone().map(EvValue::Uri),
            AttributeKind::DataContentType => self.content_type.clone().map(EvValue::String),
            _ => None,
        }
    }

    pub(crate) fn set_attribute(&mut self, kind: AttributeKind, value: EvValue) -> EventResult<()> {
        match kind {
            AttributeKind::Type => self.event_type = Some(value.to_string_repr()),
            AttributeKind::Source => self.source = Some(coerce_uri(kind, value)?),
            AttributeKind::Id => self.event_id = Some(value.to_string_repr()),
            AttributeKind::Time => self.event_time = Some(coerce_time(kind, value)?),
            AttributeKind::SchemaUrl => self.schema_url = Some(coerce_uri(kind, value)?),
            AttributeKind::DataContentType => self.content_type = Some(value.to_string_repr()),
            other => return Err(unsupported(other, crate::spec::SpecVersion::V01)),
        }
        Ok(())
    }
}

impl ContextV02 {
    pub(crate) fn attribute(&self, kind: AttributeKind) -> Option<EvValue> {
        match kind {
            AttributeKind::Type => self.event_type.clone().map(EvValue::String),
            AttributeKind::Source => self.source.clone().map(EvValue::Uri),
            AttributeKind::Id => self.id.clone().map(EvValue::String),
            AttributeKind::Time => self.time.map(EvValue::Timestamp),
            AttributeKind::SchemaUrl => self.schema_url.clone().map(EvValue::Uri),
            AttributeKind::DataContentType => self.content_type.clone().map(EvValue::String),
            _ => None,
        }
    }

    pub(crate) fn set_attribute(&mut self, kind: AttributeKind, value: EvValue) -> EventResult<()> {
        match kind {
            AttributeKind::Type => self.event_type = Some(value.to_string_repr()),
            AttributeKind::Source => self.source = Some(coerce_uri(kind, value)?),
            AttributeKind::Id => self.id = Some(value.to_string_repr()),
            AttributeKind::Time => self.time = Some(coerce_time(kind, value)?),
            AttributeKind::SchemaUrl => self.schema_url = Some(coerce_uri(kind, value)?),
            AttributeKind::DataContentType => self.content_type = Some(value.to_string_repr()),
            other => return Err(unsupported(other, crate::spec::SpecVersion::V02)),
        }
        Ok(())
    }
}

impl ContextV03 {
    pub(crate) fn attribute(&self, kind: AttributeKind) -> Option<EvValue> {
        match kind {
            AttributeKind::Type => self.event_type.clone().map(EvValue::String),
            AttributeKind::Source => self.source.clone().map(EvValue::Uri),
            AttributeKind::Subject => self.subject.clone().map(EvValue::String),
            AttributeKind::Id => self.id.clone().map(EvValue::String),
            AttributeKind::Time => self.time.map(EvValue::Timestamp),
            AttributeKind::SchemaUrl => self.schema_url.clone().map(EvValue::Uri),
            AttributeKind::DataContentType => self.data_content_type.clone().map(EvValue::String),
            AttributeKind::DataContentEncoding => {
                self.data_content_encoding.clone().map(EvValue::String)
            }
            AttributeKind::SpecVersion => None,
        }
    }

    pub(crate) fn set_attribute(&mut self, kind: AttributeKind, value: EvValue) -> EventResult<()> {
        match kind {
            AttributeKind::Type => self.event_type = Some(value.to_string_repr()),
            AttributeKind::Source => self.source = Some(coerce_uri(kind, value)?),
            AttributeKind::Subject => self.subject = Some(value.to_string_repr()),
            AttributeKind::Id => self.id = Some(value.to_string_repr()),
            AttributeKind::Time => self.time = Some(coerce_time(kind, value)?),
            AttributeKind::SchemaUrl => self.schema_url = Some(coerce_uri(kind, value)?),
            AttributeKind::DataContentType => {
                self.data_content_type = Some(value.to_string_repr())
            }
            AttributeKind::DataContentEncoding => {
                self.data_content_encoding = Some(value.to_string_repr().to_lowercase())
            }
            other => return Err(unsupported(other, crate::spec::SpecVersion::V03)),
        }
        Ok(())
    }
}

impl ContextV10 {
    pub(crate) fn attribute(&self, kind: AttributeKind) -> Option<EvValue> {
        match kind {
            AttributeKind::Type => self.event_type.clone().map(EvValue::String),
            AttributeKind::Source => self.source.clone().map(EvValue::Uri),
            AttributeKind::Subject => self.subject.clone().map(EvValue::String),
            AttributeKind::Id => self.id.clone().map(EvValue::String),
            AttributeKind::Time => self.time.map(EvValue::Timestamp),
            AttributeKind::SchemaUrl => self.data_schema.clone().map(EvValue::Uri),
            AttributeKind::DataContentType => self.data_content_type.clone().map(EvValue::String),
            _ => None,
        }
    }

    pub(crate) fn set_attribute(&mut self, kind: AttributeKind, value: EvValue) -> EventResult<()> {
        match kind {
            AttributeKind::Type => self.event_type = Some(value.to_string_repr()),
            AttributeKind::Source => self.source = Some(coerce_uri(kind, value)?),
            AttributeKind::Subject => self.subject = Some(value.to_string_repr()),
            AttributeKind::Id => self.id = Some(value.to_string_repr()),
            AttributeKind::Time => self.time = Some(coerce_time(kind, value)?),
            AttributeKind::SchemaUrl => self.data_schema = Some(coerce_uri(kind, value)?),
            AttributeKind::DataContentType => {
                self.data_content_type = Some(value.to_string_repr())
            }
            other => return Err(unsupported(other, crate::spec::SpecVersion::V10)),
        }
        Ok(())
    }
}
