use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use once_cell::sync::Lazy;

static GLOBAL: Lazy<Arc<ActiveCounter>> = Lazy::new(|| Arc::new(ActiveCounter::new()));

/// Number of operations currently admitted and not yet terminal.
///
/// Queues built with [`OperationQueue::new`](crate::OperationQueue::new)
/// share the process-wide counter; tests can inject an isolated one with
/// [`OperationQueue::with_counter`](crate::OperationQueue::with_counter).
#[derive(Debug, Default)]
pub struct ActiveCounter {
    active: AtomicUsize,
}

impl ActiveCounter {
    pub fn new() -> Self { Self::default() }

    /// The process-wide counter.
    pub fn global() -> Arc<Self> { Arc::clone(&GLOBAL) }

    pub fn get(&self) -> usize { self.active.load(Ordering::SeqCst) }

    pub(crate) fn increment(&self) -> usize { self.active.fetch_add(1, Ordering::SeqCst) + 1 }

    /// Never wraps below zero.
    pub(crate) fn decrement(&self) -> usize {
        match self
            .active
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
        {
            Ok(previous) => previous - 1,
            Err(_) => 0,
        }
    }
}
