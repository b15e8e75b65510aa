use crate::binding::message::Message;
use crate::event::Event;
use async_trait::async_trait;
use ev_bridge_error::transport::TransportError;
use ev_bridge_error::TransportResult;
use tokio::sync::{mpsc, Mutex};
use tokio_util::sync::CancellationToken;

/// Outbound message primitive.
///
/// `send` blocks until delivery, cancellation or failure. A request/response
/// transport returns the reply message; fire-and-forget transports return
/// `Ok(None)`. Implementations must be safe to call concurrently.
#[async_trait]
pub trait Sender: Send + Sync {
    async fn send(
        &self,
        cancel: &CancellationToken,
        message: Message,
    ) -> TransportResult<Option<Message>>;
}

/// Inbound message primitive.
///
/// `receive` blocks until the next message arrives, the token fires
/// (`Canceled`) or the source is exhausted (`Closed`).
#[async_trait]
pub trait Receiver: Send + Sync {
    async fn receive(&self, cancel: &CancellationToken) -> TransportResult<Message>;
}

/// Last-resort decode hook for the receive loop.
///
/// Invoked with a clone of the original message after regular translation
/// failed; may produce an event from transport-specific knowledge the
/// bindings lack.
#[async_trait]
pub trait Converter: Send + Sync {
    async fn convert(&self, message: Message) -> TransportResult<Event>;
}

/// Create a connected in-process sender/receiver pair.
///
/// Backs loopback transports and tests; the channel carries whole messages
/// with no re-encoding.
pub fn channel(capacity: usize) -> (ChanSender, ChanReceiver) {
    let (tx, rx) = mpsc::channel(capacity);
    (ChanSender { tx }, ChanReceiver { rx: Mutex::new(rx) })
}

/// Sender half of an in-process message channel. Fire-and-forget.
#[derive(Debug, Clone)]
pub struct ChanSender {
    tx: mpsc::Sender<Message>,
}

impl ChanSender {
    pub fn new(tx: mpsc::Sender<Message>) -> Self {
        ChanSender { tx }
    }
}

#[async_trait]
impl Sender for ChanSender {
    async fn send(
        &self,
        cancel: &CancellationToken,
        message: Message,
    ) -> TransportResult<Option<Message>> {
        tokio::select! {
            _ = cancel.cancelled() => Err(TransportError::Canceled),
            sent = self.tx.send(message) => match sent {
                Ok(()) => Ok(None),
                Err(_) => Err(TransportError::Closed),
            },
        }
    }
}

/// Receiver half of an in-process message channel.
///
/// The inner receiver sits behind a mutex so the trait object can stay
/// `&self`; only one receive loop holds it at a time anyway.
#[derive(Debug)]
pub struct ChanReceiver {
    rx: Mutex<mpsc::Receiver<Message>>,
}

impl ChanReceiver {
    pub fn new(rx: mpsc::Receiver<Message>) -> Self {
        ChanReceiver { rx: Mutex::new(rx) }
    }
}

#[async_trait]
impl Receiver for ChanReceiver {
    async fn receive(&self, cancel: &CancellationToken) -> TransportResult<Message> {
        let mut rx = self.rx.lock().await;
        tokio::select! {
            _ = cancel.cancelled() => Err(TransportError::Canceled),
            received = rx.recv() => received.ok_or(TransportError::Closed),
        }
    }
}
