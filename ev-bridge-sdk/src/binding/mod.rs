//! Message representations, sink contracts and the translate engine.
//!
//! A [`Message`] is a transient handle over one representation of one event;
//! a [`MessageSink`] declares which representations it can absorb. The
//! [`translate`](translate::translate) engine negotiates between the two,
//! optionally running a [`Transformer`](transformer::Transformer) pipeline
//! in between.

pub mod message;
pub mod to_event;
pub mod transformer;
pub mod translate;
pub mod transport;

pub use message::{BinaryRecord, BinaryRecordBuilder, Message, StructuredBuilder};
pub use to_event::{to_event, EventBuilder};
pub use transformer::{StreamItem, Transformer, TransformerFactory, VersionTranslator};
pub use translate::{translate, TranslateOutcome};
pub use transport::{channel, ChanReceiver, ChanSender, Converter, Receiver, Sender};

use crate::error::{BindingError, BindingResult};
use crate::event::Event;
use crate::format::Format;
use crate::spec::Attribute;
use crate::value::EvValue;
use bytes::Bytes;

/// Which of the three sink contracts a consumer implements.
///
/// The set is closed and small, so negotiation is an explicit match instead
/// of open-ended capability probing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SinkCapabilities {
    pub structured: bool,
    pub binary: bool,
    pub event: bool,
}

impl SinkCapabilities {
    pub const STRUCTURED: SinkCapabilities = SinkCapabilities {
        structured: true,
        binary: false,
        event: false,
    };
    pub const BINARY: SinkCapabilities = SinkCapabilities {
        structured: false,
        binary: true,
        event: false,
    };
    pub const EVENT: SinkCapabilities = SinkCapabilities {
        structured: false,
        binary: false,
        event: true,
    };
    pub const ALL: SinkCapabilities = SinkCapabilities {
        structured: true,
        binary: true,
        event: true,
    };
}

/// Destination contract for a translation.
///
/// A sink implements any subset of the three capabilities and declares the
/// subset up front; the default method bodies reject calls outside it, so a
/// mismatch is a sink programming error, not a silent drop.
///
/// Binary delivery order is fixed: attributes in the source version's
/// declaration order, then extensions, then exactly one `set_data` call or
/// none at all, then `end_binary`.
pub trait MessageSink {
    fn capabilities(&self) -> SinkCapabilities;

    /// Absorb a whole structured blob plus the format that decodes it.
    fn set_structured_event(
        &mut self,
        format: &'static dyn Format,
        bytes: Bytes,
    ) -> BindingResult<()> {
        let _ = (format, bytes);
        Err(BindingError::UnsupportedSink {
            capability: "structured",
        })
    }

    /// Absorb one metadata attribute.
    fn set_attribute(&mut self, attribute: Attribute, value: EvValue) -> BindingResult<()> {
        let _ = (attribute, value);
        Err(BindingError::UnsupportedSink {
            capability: "binary",
        })
    }

    /// Absorb one extension pair.
    fn set_extension(&mut self, name: &str, value: EvValue) -> BindingResult<()> {
        let _ = (name, value);
        Err(BindingError::UnsupportedSink {
            capability: "binary",
        })
    }

    /// Absorb the payload. Called at most once per translation.
    fn set_data(&mut self, data: Bytes) -> BindingResult<()> {
        let _ = data;
        Err(BindingError::UnsupportedSink {
            capability: "binary",
        })
    }

    /// Binary stream is complete. Default is a no-op; sinks that flush on
    /// completion override.
    fn end_binary(&mut self) -> BindingResult<()> {
        Ok(())
    }

    /// Absorb an already-built event.
    fn set_event(&mut self, event: Event) -> BindingResult<()> {
        let _ = event;
        Err(BindingError::UnsupportedSink { capability: "event" })
    }
}
