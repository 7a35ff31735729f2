use std::fmt;
use std::sync::Arc;

use bytes::Bytes;

use crate::core::TransportRequest;
use crate::data::Headers;
use crate::error::TransportError;

/// Identifies one in-flight request within a transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TransportHandle(pub u64);

impl fmt::Display for TransportHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "#{}", self.0) }
}

/// Performs the network I/O for an operation.
///
/// `open` must return promptly; progress is reported later through the
/// supplied [`TransportEvents`], from any thread. A request ends with
/// exactly one of `on_complete` or `on_error`, unless it is aborted.
///
/// # Implementations
///
/// - [`ReqwestTransport`](crate::ReqwestTransport): `reqwest` over tokio
/// - Scripted transports in tests
pub trait Transport: Send + Sync {
    fn open(
        &self,
        request: TransportRequest,
        events: Arc<dyn TransportEvents>,
    ) -> Result<TransportHandle, TransportError>;

    /// Stop a request. Events may still arrive afterwards; the receiver
    /// ignores them.
    fn abort(&self, handle: TransportHandle);
}

/// Callbacks a transport delivers for a request opened with
/// [`Transport::open`].
pub trait TransportEvents: Send + Sync {
    fn on_headers(&self, handle: TransportHandle, status: u16, reason: Option<String>, headers: Headers);

    fn on_data(&self, handle: TransportHandle, chunk: Bytes);

    fn on_complete(&self, handle: TransportHandle);

    fn on_error(&self, handle: TransportHandle, error: TransportError);
}
