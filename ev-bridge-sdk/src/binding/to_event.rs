use crate::binding::message::Message;
use crate::binding::transformer::TransformerFactory;
use crate::binding::translate::{translate, TranslateOutcome};
use crate::binding::{MessageSink, SinkCapabilities};
use crate::error::{BindingError, BindingResult};
use crate::event::Event;
use crate::format::Format;
use crate::spec::Attribute;
use crate::value::EvValue;
use bytes::Bytes;

/// All-capability sink that folds any representation back into an [`Event`].
///
/// The receive path ends here: whatever shape arrived on the wire, the
/// handler sees a parsed event.
#[derive(Debug, Default)]
pub struct EventBuilder {
    event: Event,
}

impl EventBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn into_event(self) -> Event {
        self.event
    }
}

impl MessageSink for EventBuilder {
    fn capabilities(&self) -> SinkCapabilities {
        SinkCapabilities::ALL
    }

    fn set_structured_event(
        &mut self,
        format: &'static dyn Format,
        bytes: Bytes,
    ) -> BindingResult<()> {
        format
            .unmarshal(&bytes, &mut self.event)
            .map_err(|e| BindingError::ReadFailure {
                representation: "structured",
                reason: e.to_string(),
            })
    }

    fn set_attribute(&mut self, attribute: Attribute, value: EvValue) -> BindingResult<()> {
        self.event
            .context
            .set_attribute(attribute.kind(), value)
            .map_err(BindingError::Event)
    }

    fn set_extension(&mut self, name: &str, value: EvValue) -> BindingResult<()> {
        self.event
            .context
            .set_extension_value(name, value)
            .map_err(BindingError::Event)
    }

    fn set_data(&mut self, data: Bytes) -> BindingResult<()> {
        // An empty chunk means no payload, not a zero-length one.
        if data.is_empty() {
            return Ok(());
        }
        self.event.set_data(data);
        Ok(())
    }

    fn set_event(&mut self, event: Event) -> BindingResult<()> {
        self.event = event;
        Ok(())
    }
}

/// Fold a message of any representation into an event, reporting which
/// decode path ran.
pub fn to_event(
    message: Message,
    factories: &[Box<dyn TransformerFactory>],
) -> BindingResult<(Event, TranslateOutcome)> {
    let mut builder = EventBuilder::default();
    let outcome = translate(message, &mut builder, factories)?;
    Ok((builder.into_event(), outcome))
}
