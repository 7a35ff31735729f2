use std::sync::{Mutex, MutexGuard, PoisonError};
use std::thread::{self, ThreadId};

/// Serializes delegate notifications for one operation.
///
/// Re-entrant on the owning thread so a delegate may call back into its
/// operation (typically `cancel`) without deadlocking. Never held across an
/// `.await`.
#[derive(Default)]
pub(crate) struct DispatchGate {
    lock:  Mutex<()>,
    owner: Mutex<Option<ThreadId>>,
}

pub(crate) struct GateGuard<'a> {
    gate:  &'a DispatchGate,
    held: Option<MutexGuard<'a, ()>>,
}

impl DispatchGate {
    pub(crate) fn enter(&self) -> GateGuard<'_> {
        let me = thread::current().id();
        if *self.owner() == Some(me) {
            return GateGuard { gate: self, held: None };
        }

        let held = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        *self.owner() = Some(me);
        GateGuard { gate: self, held: Some(held) }
    }

    fn owner(&self) -> MutexGuard<'_, Option<ThreadId>> {
        self.owner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Drop for GateGuard<'_> {
    fn drop(&mut self) {
        if self.held.is_some() {
            *self.gate.owner() = None;
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::time::Duration;

    use super::*;

    #[test]
    fn test_reentrant_on_same_thread() {
        let gate = DispatchGate::default();
        let _outer = gate.enter();
        let _inner = gate.enter();
    }

    #[test]
    fn test_excludes_other_threads() {
        let gate = Arc::new(DispatchGate::default());
        let entered = Arc::new(AtomicBool::new(false));

        let outer = gate.enter();
        let waiter = {
            let gate = Arc::clone(&gate);
            let entered = Arc::clone(&entered);
            thread::spawn(move || {
                let _guard = gate.enter();
                entered.store(true, Ordering::SeqCst);
            })
        };

        thread::sleep(Duration::from_millis(50));
        assert!(!entered.load(Ordering::SeqCst));
        drop(outer);
        waiter.join().unwrap();
        assert!(entered.load(Ordering::SeqCst));
    }
}
