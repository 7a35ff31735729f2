use crate::data::{Headers, OperationState, Progress};
use crate::effects::operation::NetworkOperation;
use crate::error::OperationError;

/// Receives lifecycle notifications for an operation.
///
/// Every method defaults to a no-op. Notifications for one operation never
/// overlap, and once [`NetworkOperation::cancel`] returns only `on_cancel`
/// can still arrive. Exactly one of `on_finish`, `on_fail` or `on_cancel`
/// fires per operation.
///
/// Callbacks run on whatever thread drives the operation or calls
/// `cancel`. Calling back into the same operation is allowed.
pub trait OperationDelegate: Send + Sync {
    /// The queue admitted the operation and its first attempt is about to
    /// open. Retries do not fire this again.
    fn on_start(&self, _operation: &NetworkOperation) {}

    fn on_headers_received(&self, _operation: &NetworkOperation, _headers: &Headers) {}

    fn on_progress(&self, _operation: &NetworkOperation, _progress: &Progress) {}

    fn on_finish(&self, _operation: &NetworkOperation) {}

    fn on_fail(&self, _operation: &NetworkOperation, _error: &OperationError) {}

    fn on_cancel(&self, _operation: &NetworkOperation) {}

    /// Once per timer fire, including the fire that exhausts the retries.
    fn on_timeout(&self, _operation: &NetworkOperation) {}
}

/// Receives queue-level events.
pub trait QueueObserver: Send + Sync {
    /// An admitted or backlogged operation reached a terminal state.
    fn on_operation_complete(&self, _operation: &NetworkOperation, _state: OperationState) {}

    /// Nothing is running and nothing is waiting.
    fn on_drained(&self) {}
}
