use crate::transport::BindingTransport;
use ev_bridge_error::EvResult;
use ev_bridge_sdk::{to_event, Event};
use tokio_util::sync::CancellationToken;

/// Event-level facade over a [`BindingTransport`].
///
/// Callers deal in events only; representation negotiation, transformer
/// pipelines and converter fallback stay inside the transport.
pub struct Client {
    transport: BindingTransport,
}

impl Client {
    pub fn new(transport: BindingTransport) -> Self {
        Client { transport }
    }

    /// Send one event. A request/response transport yields the decoded
    /// reply event; fire-and-forget transports yield `None`.
    pub async fn send(&self, cancel: &CancellationToken, event: Event) -> EvResult<Option<Event>> {
        match self.transport.send(cancel, event.into()).await? {
            Some(reply) => {
                let (event, _) = to_event(reply, self.transport.factories())?;
                Ok(Some(event))
            }
            None => Ok(None),
        }
    }

    /// Run the receive loop, invoking `handler` for every decoded event.
    /// Returns when the token fires or the transport fails.
    pub async fn start_receiver<F>(&self, cancel: CancellationToken, handler: F) -> EvResult<()>
    where
        F: FnMut(Event) -> EvResult<()> + Send,
    {
        self.transport.start_receiver(cancel, handler).await
    }
}
