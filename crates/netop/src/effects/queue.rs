//! Bounded admission of operations.
//!
//! A queue runs at most `max_concurrent_operations` operations at a time and
//! keeps the rest in a priority-ordered backlog. Admitted operations are
//! counted on an [`ActiveCounter`] which, unless one is injected, is shared
//! by every queue in the process.
//!
//! Lock order is always queue before operation. Operations never call into
//! the queue while holding their own lock.

use std::cmp::{Ordering, Reverse};
use std::collections::{BinaryHeap, HashMap};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use once_cell::sync::Lazy;
use tokio::runtime::Handle;
use tokio::sync::Notify;
use tracing::{debug, trace};

use super::counter::ActiveCounter;
use super::delegate::QueueObserver;
use super::operation::{NetworkOperation, OperationId};
use crate::data::{OperationState, Priority, QueueConfig};
use crate::error::{ConfigurationError, OperationError};

static SHARED: Lazy<OperationQueue> =
    Lazy::new(|| OperationQueue::build(QueueConfig::default(), ActiveCounter::global(), None));

/// A cloneable handle to a bounded operation queue.
#[derive(Clone)]
pub struct OperationQueue {
    shared: Arc<QueueShared>,
}

pub(crate) struct QueueShared {
    counter:  Arc<ActiveCounter>,
    runtime:  Option<Handle>,
    observer: Mutex<Option<Arc<dyn QueueObserver>>>,
    state:    Mutex<QueueState>,
    drained:  Notify,
}

struct QueueState {
    max_concurrent:        usize,
    suspended:             bool,
    cancel_all_on_failure: bool,
    running:               HashMap<OperationId, NetworkOperation>,
    backlog:               BinaryHeap<Pending>,
    next_seq:              u64,
}

/// Backlog entry. Higher priority first, then submission order.
struct Pending {
    priority:  Priority,
    seq:       u64,
    operation: NetworkOperation,
}

impl PartialEq for Pending {
    fn eq(&self, other: &Self) -> bool { self.cmp(other) == Ordering::Equal }
}

impl Eq for Pending {}

impl PartialOrd for Pending {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> { Some(self.cmp(other)) }
}

impl Ord for Pending {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.priority, Reverse(self.seq)).cmp(&(other.priority, Reverse(other.seq)))
    }
}

impl QueueState {
    fn is_drained(&self) -> bool { self.running.is_empty() && self.backlog.is_empty() }
}

impl Default for OperationQueue {
    fn default() -> Self { Self::new() }
}

impl OperationQueue {
    /// A queue with default settings on the process-wide counter.
    pub fn new() -> Self {
        Self::build(QueueConfig::default(), ActiveCounter::global(), Handle::try_current().ok())
    }

    pub fn with_config(config: QueueConfig) -> Result<Self, ConfigurationError> {
        Self::with_counter(config, ActiveCounter::global())
    }

    /// A queue counting its operations on `counter` instead of the
    /// process-wide one.
    pub fn with_counter(config: QueueConfig, counter: Arc<ActiveCounter>) -> Result<Self, ConfigurationError> {
        config.validate()?;
        Ok(Self::build(config, counter, Handle::try_current().ok()))
    }

    fn build(config: QueueConfig, counter: Arc<ActiveCounter>, runtime: Option<Handle>) -> Self {
        Self {
            shared: Arc::new(QueueShared {
                counter,
                runtime,
                observer: Mutex::new(None),
                state: Mutex::new(QueueState {
                    max_concurrent:        config.max_concurrent_operations,
                    suspended:             config.start_suspended,
                    cancel_all_on_failure: config.cancel_all_on_failure,
                    running:               HashMap::new(),
                    backlog:               BinaryHeap::new(),
                    next_seq:              0,
                }),
                drained: Notify::new(),
            }),
        }
    }

    /// The process-wide queue, created on first use.
    ///
    /// It outlives any runtime, so it never falls back to one: submit to it
    /// from inside a tokio runtime.
    pub fn shared() -> Self { SHARED.clone() }

    /// Convenience for [`NetworkOperation::submit`].
    pub fn submit(&self, operation: &NetworkOperation) -> Result<(), OperationError> { operation.submit(self) }

    /// Cancel every waiting and running operation. Waiting ones go straight
    /// from `Idle` to `Cancelled`.
    pub fn cancel_all(&self) { self.shared.cancel_all(); }

    /// Stop admitting. Running operations are unaffected.
    pub fn suspend(&self) {
        debug!("suspending queue");
        self.shared.state().suspended = true;
    }

    pub fn resume(&self) {
        let admitted = {
            let mut state = self.shared.state();
            state.suspended = false;
            self.shared.admit_ready(&mut state)
        };
        debug!(admitted = admitted.len(), "resumed queue");
        launch_all(admitted);
    }

    pub fn is_suspended(&self) -> bool { self.shared.state().suspended }

    pub fn max_concurrent_operations(&self) -> usize { self.shared.state().max_concurrent }

    /// Change the concurrency cap. Raising it admits waiting operations
    /// immediately; lowering it never interrupts running ones.
    pub fn set_max_concurrent_operations(&self, max: usize) -> Result<(), ConfigurationError> {
        if max == 0 {
            return Err(ConfigurationError::InvalidConfig(
                "max_concurrent_operations must be at least 1".to_string(),
            ));
        }
        let admitted = {
            let mut state = self.shared.state();
            state.max_concurrent = max;
            self.shared.admit_ready(&mut state)
        };
        launch_all(admitted);
        Ok(())
    }

    pub fn set_cancel_all_on_failure(&self, enabled: bool) { self.shared.state().cancel_all_on_failure = enabled; }

    pub fn set_observer(&self, observer: Arc<dyn QueueObserver>) { *self.shared.observer() = Some(observer); }

    pub fn clear_observer(&self) { *self.shared.observer() = None; }

    pub fn running_count(&self) -> usize { self.shared.state().running.len() }

    pub fn pending_count(&self) -> usize { self.shared.state().backlog.len() }

    /// Running plus waiting.
    pub fn operation_count(&self) -> usize {
        let state = self.shared.state();
        state.running.len() + state.backlog.len()
    }

    /// Snapshot of running operations followed by waiting ones in admission
    /// order.
    pub fn operations(&self) -> Vec<NetworkOperation> {
        let state = self.shared.state();
        let mut waiting: Vec<&Pending> = state.backlog.iter().collect();
        waiting.sort_by(|a, b| b.cmp(a));
        state
            .running
            .values()
            .cloned()
            .chain(waiting.into_iter().map(|pending| pending.operation.clone()))
            .collect()
    }

    /// Operations running on this queue's counter, across every queue that
    /// shares it.
    pub fn active_operation_count(&self) -> usize { self.shared.counter.get() }

    pub fn counter(&self) -> Arc<ActiveCounter> { Arc::clone(&self.shared.counter) }

    /// Resolves once nothing is running or waiting.
    pub async fn drained(&self) {
        loop {
            let notified = self.shared.drained.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();
            if self.shared.state().is_drained() {
                return;
            }
            notified.await;
        }
    }

    pub(crate) fn runtime(&self) -> Option<Handle> { self.shared.runtime.clone() }

    pub(crate) fn downgrade(&self) -> Weak<QueueShared> { Arc::downgrade(&self.shared) }

    pub(crate) fn enqueue(&self, operation: NetworkOperation) {
        let admitted = {
            let mut state = self.shared.state();
            let seq = state.next_seq;
            state.next_seq += 1;
            trace!(op = %operation.id(), seq, "operation enqueued");
            state.backlog.push(Pending {
                priority: operation.priority(),
                seq,
                operation,
            });
            self.shared.admit_ready(&mut state)
        };
        launch_all(admitted);
    }
}

impl QueueShared {
    /// Admit from the backlog while under the cap. Must be called with the
    /// state lock held; the returned operations are launched after it is
    /// dropped.
    fn admit_ready(self: &Arc<Self>, state: &mut QueueState) -> Vec<NetworkOperation> {
        let mut admitted = Vec::new();
        while !state.suspended && state.running.len() < state.max_concurrent {
            let Some(pending) = state.backlog.pop() else {
                break;
            };
            let operation = pending.operation;
            if !operation.admit(self) {
                trace!(op = %operation.id(), "skipping operation cancelled while waiting");
                continue;
            }
            let active = self.counter.increment();
            debug!(op = %operation.id(), active, running = state.running.len() + 1, "operation admitted");
            state.running.insert(operation.id(), operation.clone());
            admitted.push(operation);
        }
        admitted
    }

    /// An admitted operation reached `state`. Called exactly once per
    /// admitted operation.
    pub(crate) fn release(self: &Arc<Self>, operation: &NetworkOperation, outcome: OperationState) {
        let (admitted, drained, cancel_rest) = {
            let mut state = self.state();
            state.running.remove(&operation.id());
            let active = self.counter.decrement();
            let cancel_rest = outcome == OperationState::Failed && state.cancel_all_on_failure;
            let admitted = if cancel_rest { Vec::new() } else { self.admit_ready(&mut state) };
            debug!(op = %operation.id(), %outcome, active, "operation released");
            (admitted, state.is_drained(), cancel_rest)
        };

        launch_all(admitted);
        if let Some(observer) = self.observer().clone() {
            observer.on_operation_complete(operation, outcome);
        }
        if cancel_rest {
            debug!(op = %operation.id(), "operation failed; cancelling the rest of the queue");
            self.cancel_all();
        }
        if drained {
            self.notify_drained();
        }
    }

    /// A waiting operation was cancelled before admission.
    pub(crate) fn forget(self: &Arc<Self>, operation: &NetworkOperation) {
        let drained = {
            let mut state = self.state();
            state.backlog.retain(|pending| !pending.operation.same_as(operation));
            state.is_drained()
        };
        if let Some(observer) = self.observer().clone() {
            observer.on_operation_complete(operation, OperationState::Cancelled);
        }
        if drained {
            self.notify_drained();
        }
    }

    fn cancel_all(&self) {
        let operations: Vec<NetworkOperation> = {
            let mut state = self.state();
            let mut operations: Vec<NetworkOperation> = state.backlog.drain().map(|p| p.operation).collect();
            operations.extend(state.running.values().cloned());
            operations
        };
        debug!(count = operations.len(), "cancelling all operations");
        for operation in operations {
            operation.cancel();
        }
    }

    fn notify_drained(&self) {
        trace!("queue drained");
        self.drained.notify_waiters();
        if let Some(observer) = self.observer().clone() {
            observer.on_drained();
        }
    }

    fn state(&self) -> MutexGuard<'_, QueueState> { self.state.lock().unwrap_or_else(PoisonError::into_inner) }

    fn observer(&self) -> MutexGuard<'_, Option<Arc<dyn QueueObserver>>> {
        self.observer.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn launch_all(operations: Vec<NetworkOperation>) {
    for operation in operations {
        operation.launch();
    }
}
