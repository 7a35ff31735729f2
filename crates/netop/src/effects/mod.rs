//! Side-effecting parts: transports, the operation driver and the queue.

mod counter;
mod delegate;
mod dispatch;
mod operation;
mod queue;
#[cfg(feature = "reqwest")]
mod http;
mod transport;

pub use counter::ActiveCounter;
pub use delegate::{OperationDelegate, QueueObserver};
pub use operation::{NetworkOperation, OperationId};
pub use queue::OperationQueue;
#[cfg(feature = "reqwest")]
pub use http::ReqwestTransport;
pub use transport::{Transport, TransportEvents, TransportHandle};
