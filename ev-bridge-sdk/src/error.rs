use crate::spec::{AttributeKind, SpecVersion};
use crate::value::EvValueCastError;
use ev_bridge_error::EvError;
use thiserror::Error;

pub type EventResult<T> = Result<T, EventError>;
pub type BindingResult<T> = Result<T, BindingError>;

/// Context/attribute level errors.
#[derive(Error, Debug)]
pub enum EventError {
    /// Value cannot satisfy the destination attribute's type contract.
    #[error("attribute {kind:?} rejected value: {source}")]
    AttributeCoercion {
        kind: AttributeKind,
        #[source]
        source: EvValueCastError,
    },

    /// Attribute kind does not exist in the context's schema version.
    #[error("attribute {kind:?} is not defined in version {version}")]
    UnsupportedAttribute {
        kind: AttributeKind,
        version: SpecVersion,
    },

    /// Extension name collides with a reserved attribute name of the version.
    #[error("extension name '{name}' is reserved in version {version}")]
    ReservedExtensionName { name: String, version: SpecVersion },

    /// Extension value failed validation.
    #[error("invalid extension value for '{name}': {source}")]
    InvalidExtensionValue {
        name: String,
        #[source]
        source: EvValueCastError,
    },

    /// Lazily-encoded structured payload could not be serialized.
    #[error("payload encode failed: {reason}")]
    DataEncode { reason: String },
}

/// Translation engine errors, tagged by the stage at which failure occurred.
#[derive(Error, Debug)]
pub enum BindingError {
    /// I/O or unmarshal failure while draining structured bytes or payload
    /// (native-decode stage). Recoverable by caller retry.
    #[error("read failure while decoding {representation}: {reason}")]
    ReadFailure {
        representation: &'static str,
        reason: String,
    },

    /// Attribute/extension rejected by the destination context
    /// (sink-encode stage).
    #[error("{0}")]
    Event(#[from] EventError),

    /// A transformer stage failed (transform stage).
    #[error("transformer '{name}' failed: {reason}")]
    Transform { name: &'static str, reason: String },

    /// The sink offered no capability able to absorb this message.
    #[error("sink offers no capability for a {representation} message")]
    NoMatchingCapability { representation: &'static str },

    /// The sink was driven with a call outside its declared capabilities.
    /// Programming error in the sink implementation.
    #[error("sink does not implement the {capability} capability")]
    UnsupportedSink { capability: &'static str },

    /// Structured marshal failure while re-encoding for a structured sink.
    #[error("marshal failure: {reason}")]
    Marshal { reason: String },
}

impl From<EventError> for EvError {
    fn from(err: EventError) -> Self {
        EvError::Event(err.to_string())
    }
}

impl From<BindingError> for EvError {
    fn from(err: BindingError) -> Self {
        EvError::Binding(err.to_string())
    }
}
