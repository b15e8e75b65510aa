use crate::binding::message::Message;
use crate::binding::to_event::EventBuilder;
use crate::binding::transformer::{StreamItem, Transformer, TransformerFactory};
use crate::binding::{BinaryRecord, MessageSink};
use crate::error::{BindingError, BindingResult};
use crate::event::Event;
use crate::format::{self, Format};
use crate::spec;
use bytes::Bytes;
use tracing::trace;

/// Which decode path actually ran for the consumed message.
///
/// At most one flag is true; both false means the event path. The flags
/// reflect the *source* decode, not the destination shape, so transport
/// code can make wire-level decisions (e.g. content-type headers) from them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TranslateOutcome {
    pub was_structured: bool,
    pub was_binary: bool,
}

impl TranslateOutcome {
    pub const fn event() -> Self {
        TranslateOutcome {
            was_structured: false,
            was_binary: false,
        }
    }

    pub const fn structured() -> Self {
        TranslateOutcome {
            was_structured: true,
            was_binary: false,
        }
    }

    pub const fn binary() -> Self {
        TranslateOutcome {
            was_structured: false,
            was_binary: true,
        }
    }
}

/// Capability preference order while decomposing, most specific first.
#[derive(Debug, Clone, Copy)]
enum Capability {
    Structured,
    Binary,
    Event,
}

/// Translate a message into whatever representation the sink offers.
///
/// Negotiation prefers the representation requiring zero semantic
/// reinterpretation: an event message goes straight to an event sink, a
/// structured blob passes through to a structured sink (unless a transformer
/// requires decomposition), a binary record streams into a binary sink.
/// Otherwise the message is decomposed into an attribute/extension/payload
/// stream, run through the transformer pipeline in order, and driven into
/// the most specific capability the sink offers.
///
/// The message's payload is consumed exactly once; the message itself is
/// taken by value and cannot be re-read.
pub fn translate(
    message: Message,
    sink: &mut dyn MessageSink,
    factories: &[Box<dyn TransformerFactory>],
) -> BindingResult<TranslateOutcome> {
    let caps = sink.capabilities();
    let needs_decomposition = factories.iter().any(|f| f.requires_decomposition());

    match message {
        Message::Event(event) => {
            let outcome = TranslateOutcome::event();
            if caps.event && factories.is_empty() {
                sink.set_event(event)?;
                return Ok(outcome);
            }
            let items = decompose_event(&event)?;
            deliver_decomposed(
                items,
                sink,
                factories,
                &[Capability::Event, Capability::Binary, Capability::Structured],
                "event",
                &format::JSON,
                outcome,
            )
        }
        Message::Structured { format, bytes } => {
            let outcome = TranslateOutcome::structured();
            if caps.structured && !needs_decomposition {
                sink.set_structured_event(format, bytes)?;
                return Ok(outcome);
            }
            let mut event = Event::default();
            format
                .unmarshal(&bytes, &mut event)
                .map_err(|e| BindingError::ReadFailure {
                    representation: "structured",
                    reason: e.to_string(),
                })?;
            let items = decompose_event(&event)?;
            deliver_decomposed(
                items,
                sink,
                factories,
                &[Capability::Structured, Capability::Binary, Capability::Event],
                "structured",
                format,
                outcome,
            )
        }
        Message::Binary(record) => {
            let outcome = TranslateOutcome::binary();
            let items = record_items(record);
            deliver_decomposed(
                items,
                sink,
                factories,
                &[Capability::Binary, Capability::Event, Capability::Structured],
                "binary",
                &format::JSON,
                outcome,
            )
        }
    }
}

/// Transformer chain over the decomposed stream. Stages consume and re-emit;
/// a `None` from any stage vetoes the item.
struct Pipeline {
    stages: Vec<Box<dyn Transformer>>,
}

impl Pipeline {
    fn new(factories: &[Box<dyn TransformerFactory>]) -> Self {
        Pipeline {
            stages: factories.iter().map(|f| f.transformer()).collect(),
        }
    }

    fn apply(&mut self, item: StreamItem) -> BindingResult<Option<StreamItem>> {
        let mut current = Some(item);
        for stage in &mut self.stages {
            match current.take() {
                Some(item) => current = stage.transform(item)?,
                None => break,
            }
        }
        Ok(current)
    }
}

fn decompose_event(event: &Event) -> BindingResult<Vec<StreamItem>> {
    let version = event.context.spec_version();
    let mut items = Vec::new();
    for attr in spec::attributes(version) {
        if let Some(value) = attr.get(&event.context) {
            items.push(StreamItem::Attribute(*attr, value));
        }
    }
    for (name, value) in event.context.extensions() {
        items.push(StreamItem::Extension(name.to_string(), value.clone()));
    }
    if let Some(bytes) = event.data_bytes().map_err(BindingError::Event)? {
        items.push(StreamItem::Payload(bytes));
    }
    Ok(items)
}

fn record_items(record: BinaryRecord) -> Vec<StreamItem> {
    let mut items = Vec::new();
    for (attr, value) in record.attributes() {
        items.push(StreamItem::Attribute(*attr, value.clone()));
    }
    for (name, value) in record.extensions() {
        items.push(StreamItem::Extension(name.clone(), value.clone()));
    }
    if let Some(payload) = record.payload() {
        items.push(StreamItem::Payload(payload.clone()));
    }
    items
}

fn feed(sink: &mut dyn MessageSink, item: StreamItem) -> BindingResult<()> {
    match item {
        StreamItem::Attribute(attr, value) => sink.set_attribute(attr, value),
        StreamItem::Extension(name, value) => sink.set_extension(&name, value),
        StreamItem::Payload(bytes) => sink.set_data(bytes),
    }
}

fn rebuild(items: Vec<StreamItem>, factories: &[Box<dyn TransformerFactory>]) -> BindingResult<Event> {
    let mut builder = EventBuilder::default();
    let mut pipeline = Pipeline::new(factories);
    for item in items {
        if let Some(item) = pipeline.apply(item)? {
            feed(&mut builder, item)?;
        }
    }
    Ok(builder.into_event())
}

fn deliver_decomposed(
    items: Vec<StreamItem>,
    sink: &mut dyn MessageSink,
    factories: &[Box<dyn TransformerFactory>],
    order: &[Capability],
    representation: &'static str,
    structured_format: &'static dyn Format,
    outcome: TranslateOutcome,
) -> BindingResult<TranslateOutcome> {
    let caps = sink.capabilities();
    for capability in order {
        match capability {
            Capability::Binary if caps.binary => {
                trace!(representation, "decomposing into binary sink");
                let mut pipeline = Pipeline::new(factories);
                for item in items {
                    if let Some(item) = pipeline.apply(item)? {
                        feed(sink, item)?;
                    }
                }
                sink.end_binary()?;
                return Ok(outcome);
            }
            Capability::Event if caps.event => {
                trace!(representation, "rebuilding event for event sink");
                let event = rebuild(items, factories)?;
                sink.set_event(event)?;
                return Ok(outcome);
            }
            Capability::Structured if caps.structured => {
                trace!(representation, "re-marshaling for structured sink");
                let event = rebuild(items, factories)?;
                let bytes =
                    structured_format
                        .marshal(&event)
                        .map_err(|e| BindingError::Marshal {
                            reason: e.to_string(),
                        })?;
                sink.set_structured_event(structured_format, Bytes::from(bytes))?;
                return Ok(outcome);
            }
            _ => {}
        }
    }
    Err(BindingError::NoMatchingCapability { representation })
}
