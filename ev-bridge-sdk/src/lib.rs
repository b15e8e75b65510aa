pub mod binding;
mod error;
pub mod event;
pub mod format;
pub mod spec;
mod value;

pub use binding::{
    channel, to_event, translate, BinaryRecord, BinaryRecordBuilder, ChanReceiver, ChanSender,
    Converter, EventBuilder, Message, MessageSink, Receiver, Sender, SinkCapabilities, StreamItem,
    StructuredBuilder, Transformer, TransformerFactory, TranslateOutcome, VersionTranslator,
};
pub use error::{BindingError, BindingResult, EventError, EventResult};
pub use event::{Event, EventContext, EventData};
pub use format::{Format, FormatError, JsonFormat, JSON, JSON_CONTENT_TYPE};
pub use spec::{Attribute, AttributeKind, SpecVersion};
pub use value::{EvValue, EvValueCastError, ValueKind};
