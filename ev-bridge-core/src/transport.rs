use ev_bridge_error::transport::TransportError;
use ev_bridge_error::EvResult;
use ev_bridge_sdk::{to_event, Converter, Event, Message, Receiver, Sender, TransformerFactory};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// A send/receive primitive pair composed with the translation layer.
///
/// Outbound messages pass straight to the sender (wrap the sender in an
/// [`EncodingSender`](crate::EncodingSender) to force a wire shape). Inbound
/// messages are folded into events through the transformer pipeline before
/// reaching the handler.
pub struct BindingTransport {
    sender: Arc<dyn Sender>,
    receiver: Arc<dyn Receiver>,
    converter: Option<Arc<dyn Converter>>,
    factories: Vec<Box<dyn TransformerFactory>>,
    receiving: AtomicBool,
}

impl BindingTransport {
    pub fn new(sender: Arc<dyn Sender>, receiver: Arc<dyn Receiver>) -> Self {
        BindingTransport {
            sender,
            receiver,
            converter: None,
            factories: Vec::new(),
            receiving: AtomicBool::new(false),
        }
    }

    /// Install a last-resort decode hook for the receive loop.
    pub fn with_converter(mut self, converter: Arc<dyn Converter>) -> Self {
        self.converter = Some(converter);
        self
    }

    /// Append a transformer stage applied to every received message and to
    /// request/response replies.
    pub fn with_transformer(mut self, factory: Box<dyn TransformerFactory>) -> Self {
        self.factories.push(factory);
        self
    }

    /// Transformer stages applied on the decode path.
    pub fn factories(&self) -> &[Box<dyn TransformerFactory>] {
        &self.factories
    }

    pub fn has_converter(&self) -> bool {
        self.converter.is_some()
    }

    pub async fn send(
        &self,
        cancel: &CancellationToken,
        message: Message,
    ) -> EvResult<Option<Message>> {
        Ok(self.sender.send(cancel, message).await?)
    }

    /// Run the receive loop until cancellation or transport failure.
    ///
    /// Per-message failures (undecodable message, handler error) are logged
    /// and dropped; the loop keeps running. Cancellation and receiver
    /// failures terminate the loop and surface to the caller, so a clean
    /// shutdown returns an error for which
    /// [`EvError::is_cancellation`](ev_bridge_error::EvError::is_cancellation)
    /// holds.
    ///
    /// At most one loop may run per transport instance; a second call fails
    /// with `AlreadyReceiving` while the first is live.
    pub async fn start_receiver<F>(&self, cancel: CancellationToken, mut handler: F) -> EvResult<()>
    where
        F: FnMut(Event) -> EvResult<()> + Send,
    {
        if self
            .receiving
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Err(TransportError::AlreadyReceiving.into());
        }
        let _guard = ReceivingGuard(&self.receiving);

        loop {
            let message = self.receiver.receive(&cancel).await?;
            // Keep the original around only when a converter could still
            // salvage a failed decode.
            let fallback = self.converter.as_ref().map(|_| message.clone());

            let event = match to_event(message, &self.factories) {
                Ok((event, outcome)) => {
                    debug!(
                        was_structured = outcome.was_structured,
                        was_binary = outcome.was_binary,
                        "message decoded"
                    );
                    event
                }
                Err(decode_err) => match (&self.converter, fallback) {
                    (Some(converter), Some(original)) => {
                        match converter.convert(original).await {
                            Ok(event) => event,
                            Err(convert_err) => {
                                warn!(
                                    error = %TransportError::Undecodable {
                                        reason: format!("{decode_err}; converter: {convert_err}"),
                                    },
                                    "dropping message"
                                );
                                continue;
                            }
                        }
                    }
                    _ => {
                        warn!(
                            error = %TransportError::Undecodable {
                                reason: decode_err.to_string(),
                            },
                            "dropping message"
                        );
                        continue;
                    }
                },
            };

            if let Err(err) = handler(event) {
                warn!(error = %err, "event handler failed");
            }
        }
    }
}

struct ReceivingGuard<'a>(&'a AtomicBool);

impl Drop for ReceivingGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}
