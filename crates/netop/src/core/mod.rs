//! Pure transformations used by the operation driver.
//!
//! Nothing in here performs I/O or touches shared state: request
//! preparation, cookie parsing and retry backoff are plain functions of
//! their inputs.

mod cookies;
mod prepare;
mod retry;

pub use cookies::{cookies_from_headers, parse_set_cookie};
pub use prepare::{TransportRequest, prepare_request};
pub use retry::retry_delay;
