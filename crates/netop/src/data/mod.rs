//! Request descriptions, configuration and response records.
//!
//! These types carry no behavior beyond validation and convenience
//! accessors. A [`RequestSpec`] is freely mutable until its operation is
//! submitted; a [`ResponseRecord`] is read-only once produced.

pub mod config;
pub mod progress;
pub mod request;
pub mod response;
pub mod state;

pub use config::{NetworkConfig, OperationConfig, QueueConfig};
pub use progress::Progress;
pub use request::{CachePolicy, Method, Priority, RequestSpec};
pub use response::{Cookie, Headers, ResponseRecord};
pub use state::OperationState;
