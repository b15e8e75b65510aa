use crate::binding::{MessageSink, SinkCapabilities};
use crate::error::{BindingError, BindingResult, EventError};
use crate::event::Event;
use crate::format::Format;
use crate::spec::{self, Attribute, AttributeKind, SpecVersion};
use crate::value::EvValue;
use bytes::Bytes;

/// Transient handle over one representation of one event.
///
/// A message is consumed exactly once: `translate` takes it by value, so
/// re-reading after consumption is rejected by the type system rather than
/// at runtime. Cloning is explicit and cheap (payloads are `Bytes`), which
/// is what the converter fallback on the receive path relies on.
#[derive(Debug, Clone)]
pub enum Message {
    /// Already fully parsed.
    Event(Event),
    /// One self-describing blob plus the format that decodes it.
    Structured {
        format: &'static dyn Format,
        bytes: Bytes,
    },
    /// Metadata as discrete fields plus a raw payload.
    Binary(BinaryRecord),
}

impl Message {
    /// Stable name of the native representation, used in errors and logs.
    pub fn representation(&self) -> &'static str {
        match self {
            Message::Event(_) => "event",
            Message::Structured { .. } => "structured",
            Message::Binary(_) => "binary",
        }
    }
}

impl From<Event> for Message {
    fn from(event: Event) -> Self {
        Message::Event(event)
    }
}

/// Binary representation: the source version, its attributes in declaration
/// order, extension pairs, and an optional payload.
#[derive(Debug, Clone)]
pub struct BinaryRecord {
    version: SpecVersion,
    attributes: Vec<(Attribute, EvValue)>,
    extensions: Vec<(String, EvValue)>,
    payload: Option<Bytes>,
}

impl BinaryRecord {
    pub fn new(version: SpecVersion) -> Self {
        BinaryRecord {
            version,
            attributes: Vec::new(),
            extensions: Vec::new(),
            payload: None,
        }
    }

    /// Decompose an event into its binary record (attributes in the source
    /// version's declaration order, spec version first).
    pub fn from_event(event: &Event) -> BindingResult<BinaryRecord> {
        let version = event.context.spec_version();
        let mut record = BinaryRecord::new(version);
        for attr in spec::attributes(version) {
            if let Some(value) = attr.get(&event.context) {
                record.attributes.push((*attr, value));
            }
        }
        for (name, value) in event.context.extensions() {
            record.extensions.push((name.to_string(), value.clone()));
        }
        record.payload = event.data_bytes().map_err(BindingError::Event)?;
        Ok(record)
    }

    #[inline]
    pub fn version(&self) -> SpecVersion {
        self.version
    }

    pub fn attributes(&self) -> &[(Attribute, EvValue)] {
        &self.attributes
    }

    pub fn extensions(&self) -> &[(String, EvValue)] {
        &self.extensions
    }

    pub fn payload(&self) -> Option<&Bytes> {
        self.payload.as_ref()
    }

    pub fn push_attribute(&mut self, attribute: Attribute, value: EvValue) {
        self.attributes.push((attribute, value));
    }

    pub fn push_extension(&mut self, name: impl Into<String>, value: EvValue) {
        self.extensions.push((name.into(), value));
    }

    /// Add an extension from arbitrary JSON, canonicalizing the value.
    /// Used by concrete receivers parsing wire headers.
    pub fn push_extension_json(
        &mut self,
        name: impl Into<String>,
        value: serde_json::Value,
    ) -> BindingResult<()> {
        let name = name.into();
        let value =
            EvValue::validate(value).map_err(|source| EventError::InvalidExtensionValue {
                name: name.clone(),
                source,
            })?;
        self.extensions.push((name, value));
        Ok(())
    }

    pub fn set_payload(&mut self, payload: Bytes) {
        self.payload = Some(payload);
    }
}

/// Binary-only sink that collects the stream back into a [`BinaryRecord`].
///
/// Used by senders that force the binary representation on the wire.
#[derive(Debug, Default)]
pub struct BinaryRecordBuilder {
    version: Option<SpecVersion>,
    attributes: Vec<(Attribute, EvValue)>,
    extensions: Vec<(String, EvValue)>,
    payload: Option<Bytes>,
}

impl BinaryRecordBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn finish(self) -> BindingResult<BinaryRecord> {
        let version = self.version.ok_or(BindingError::Marshal {
            reason: "binary stream carried no spec version attribute".to_string(),
        })?;
        Ok(BinaryRecord {
            version,
            attributes: self.attributes,
            extensions: self.extensions,
            payload: self.payload,
        })
    }
}

impl MessageSink for BinaryRecordBuilder {
    fn capabilities(&self) -> SinkCapabilities {
        SinkCapabilities::BINARY
    }

    fn set_attribute(&mut self, attribute: Attribute, value: EvValue) -> BindingResult<()> {
        if attribute.kind() == AttributeKind::SpecVersion {
            self.version = SpecVersion::parse(&value.to_string_repr());
        }
        self.attributes.push((attribute, value));
        Ok(())
    }

    fn set_extension(&mut self, name: &str, value: EvValue) -> BindingResult<()> {
        self.extensions.push((name.to_string(), value));
        Ok(())
    }

    fn set_data(&mut self, data: Bytes) -> BindingResult<()> {
        self.payload = Some(data);
        Ok(())
    }
}

/// Structured-only sink that captures the blob and its format.
///
/// Used by senders that force the structured representation on the wire.
#[derive(Debug, Default)]
pub struct StructuredBuilder {
    captured: Option<(&'static dyn Format, Bytes)>,
}

impl StructuredBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn finish(self) -> BindingResult<(&'static dyn Format, Bytes)> {
        self.captured.ok_or(BindingError::Marshal {
            reason: "translation produced no structured blob".to_string(),
        })
    }
}

impl MessageSink for StructuredBuilder {
    fn capabilities(&self) -> SinkCapabilities {
        SinkCapabilities::STRUCTURED
    }

    fn set_structured_event(
        &mut self,
        format: &'static dyn Format,
        bytes: Bytes,
    ) -> BindingResult<()> {
        self.captured = Some((format, bytes));
        Ok(())
    }
}
