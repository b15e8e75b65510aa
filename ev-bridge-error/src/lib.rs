pub mod transport;

use anyhow::Error as AnyhowError;
use serde_json::Error as SerdeJsonError;
use std::{error::Error as StdError, io::Error as IoError};
use thiserror::Error;
use tokio::task::JoinError;
use transport::TransportError;

pub type EvResult<T, E = EvError> = anyhow::Result<T, E>;
pub type TransportResult<T, E = TransportError> = Result<T, E>;

/// Top-level error for callers that compose several ev-bridge layers.
///
/// Layer-specific errors (`BindingError`, `EventError`) live next to the code
/// that produces them in `ev-bridge-sdk`; they fold into this type as strings
/// so this crate stays a leaf dependency.
#[derive(Error, Debug, Default)]
pub enum EvError {
    #[error("service unavailable")]
    #[default]
    ServiceUnavailable,
    #[error("{0}")]
    Transport(#[from] TransportError),
    #[error("binding error: {0}")]
    Binding(String),
    #[error("event error: {0}")]
    Event(String),
    #[error("{0}")]
    Json(#[from] SerdeJsonError),
    #[error("{0}")]
    Io(#[from] IoError),
    #[error("{0}")]
    JoinError(#[from] JoinError),
    #[error("{0}")]
    StdError(#[from] Box<dyn StdError + Send + Sync>),
    #[error("{0}")]
    Anyhow(#[from] AnyhowError),
    #[error("{0}")]
    Msg(String),
}

impl EvError {
    /// Whether this error is a cooperative-shutdown signal rather than a fault.
    pub fn is_cancellation(&self) -> bool {
        matches!(self, EvError::Transport(TransportError::Canceled))
    }
}
