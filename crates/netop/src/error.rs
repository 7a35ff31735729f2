//! Error types for netop.

use std::time::Duration;

use netop_codec::{DecodeError, EncodeError};

use crate::data::OperationState;

/// Misuse of an operation or invalid configuration. Reported synchronously.
#[derive(Debug, thiserror::Error)]
pub enum ConfigurationError {
    #[error("operation is already {0}; configuration is frozen")]
    AlreadyStarted(OperationState),

    #[error("operation is waiting in a queue; configuration is frozen")]
    AlreadySubmitted,

    #[error("invalid URL {url:?}: {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("unsupported HTTP method: {0}")]
    InvalidMethod(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("no tokio runtime available to drive the operation")]
    NoRuntime,
}

/// Failures reported by a transport adapter.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    #[error("connection failed: {0}")]
    Connect(String),

    #[error("network error: {0}")]
    Network(String),

    #[error("response body incomplete: expected {expected} bytes, received {received}")]
    IncompleteBody { expected: u64, received: u64 },

    #[error("transport dropped the request without completing it")]
    Closed,

    #[error("transport unavailable: {0}")]
    Unavailable(String),
}

/// Everything that can end an operation without a response.
#[derive(Debug, thiserror::Error)]
pub enum OperationError {
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    #[error("request body could not be encoded: {0}")]
    Encoding(#[from] EncodeError),

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("timed out {attempts} time(s) after {timeout:?} each; no retries left")]
    TimeoutExceeded { attempts: u32, timeout: Duration },

    #[error("response could not be decoded: {0}")]
    Decode(#[from] DecodeError),

    #[error("operation was cancelled")]
    Cancelled,

    #[error("operation has no response yet (state: {0})")]
    NotFinished(OperationState),
}

impl OperationError {
    pub fn is_timeout(&self) -> bool { matches!(self, Self::TimeoutExceeded { .. }) }

    pub fn is_cancelled(&self) -> bool { matches!(self, Self::Cancelled) }
}

pub type Result<T> = std::result::Result<T, OperationError>;
