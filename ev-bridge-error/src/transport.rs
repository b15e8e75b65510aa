use thiserror::Error;

/// Transport composition errors.
///
/// These cover the boundary between a bare send/receive primitive and the
/// receive loop built on top of it. Per-message translation failures are
/// reported as `Undecodable` so the loop's error-continue policy can drop the
/// message without tearing the loop down; `Canceled` and `AlreadyReceiving`
/// are always surfaced to the loop's caller.
#[derive(Error, Debug)]
pub enum TransportError {
    /// Cooperative cancellation was requested while an operation was blocked.
    ///
    /// This is deliberate shutdown, not a fault. It is always surfaced so
    /// callers can distinguish it from transport failure.
    #[error("operation canceled")]
    Canceled,

    /// A second receive loop was started on a transport instance that already
    /// owns one. Programming error; fatal to the call, not to the process.
    #[error("transport is already receiving")]
    AlreadyReceiving,

    /// The received message could not be decoded into any representation and
    /// no converter produced a usable event.
    #[error("undecodable message: {reason}")]
    Undecodable { reason: String },

    /// The underlying send primitive failed.
    #[error("send failed: {reason}")]
    Send { reason: String },

    /// The underlying receive primitive failed. Terminates the receive loop.
    #[error("receive failed: {reason}")]
    Receive { reason: String },

    /// The underlying channel or connection is closed.
    #[error("transport closed")]
    Closed,
}
