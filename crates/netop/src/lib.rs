//! Asynchronous HTTP request operations with timeout retries, cancellation
//! and a bounded concurrency queue.
//!
//! # Architecture
//!
//! This crate follows the three-layer pattern:
//! - [`data`] - Request descriptions, configuration, response records
//! - [`core`] - Pure transformations (request preparation, cookies, backoff)
//! - [`effects`] - Transport adapters, the operation driver and the queue
//!
//! A [`NetworkOperation`] owns one request/response cycle. It is handed to an
//! [`OperationQueue`], which admits it when fewer than the configured number
//! of operations are running. The operation then drives attempts against an
//! injected [`Transport`], retrying only when its timeout fires, and reports
//! progress to an optional [`OperationDelegate`].
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! use netop::{NetworkOperation, OperationQueue, RequestSpec, ReqwestTransport};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let transport = Arc::new(ReqwestTransport::new()?);
//! let spec = RequestSpec::get("https://example.test/ping")?
//!     .timeout(Duration::from_secs(2))
//!     .retries_on_timeout(1);
//!
//! let operation = NetworkOperation::new(spec, transport);
//! operation.submit(&OperationQueue::shared())?;
//!
//! let response = operation.completion().await?;
//! println!("{} {}", response.status_code, response.text()?);
//! # Ok(())
//! # }
//! ```

pub mod core;
pub mod data;
pub mod effects;
mod error;

pub use data::{
    CachePolicy, Cookie, Headers, Method, NetworkConfig, OperationConfig, OperationState, Priority,
    Progress, QueueConfig, RequestSpec, ResponseRecord,
};
pub use crate::core::TransportRequest;
pub use effects::{
    ActiveCounter, NetworkOperation, OperationDelegate, OperationId, OperationQueue, QueueObserver,
    Transport, TransportEvents, TransportHandle,
};
pub use error::{ConfigurationError, OperationError, Result, TransportError};
pub use netop_codec::{
    Attachment, AttachmentKind, DecodeError, EncodeError, MediaEncoder, ParamValue, Params, TextEncoding,
};

#[cfg(feature = "reqwest")]
pub use effects::ReqwestTransport;
