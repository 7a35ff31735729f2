//! One HTTP request/response lifecycle.
//!
//! All mutable state of an operation lives behind a single lock and every
//! transition is a check-then-act under that lock, so the transport, the
//! timer and `cancel` can race freely: whoever takes the lock first wins and
//! the others observe a state they no longer act on.
//!
//! Each attempt gets its own event channel. Events from an abandoned attempt
//! land in a dropped receiver and disappear.

use std::fmt;
use std::future;
use std::mem;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;

use bytes::{Bytes, BytesMut};
use netop_codec::{ParamValue, TextEncoding, charset_from_content_type, decompress, is_gzip_encoding};
use tokio::runtime::Handle;
use tokio::sync::{Notify, mpsc, watch};
use tracing::{debug, trace, warn};

use super::counter::ActiveCounter;
use super::delegate::OperationDelegate;
use super::dispatch::DispatchGate;
use super::queue::{OperationQueue, QueueShared};
use super::transport::{Transport, TransportEvents, TransportHandle};
use crate::core::{TransportRequest, cookies_from_headers, prepare_request, retry_delay};
use crate::data::{Headers, Method, OperationState, Priority, Progress, RequestSpec, ResponseRecord};
use crate::error::{ConfigurationError, OperationError, TransportError};

static NEXT_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique operation identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct OperationId(u64);

impl OperationId {
    fn next() -> Self { Self(NEXT_ID.fetch_add(1, Ordering::Relaxed)) }

    pub fn get(self) -> u64 { self.0 }
}

impl fmt::Display for OperationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "op-{}", self.0) }
}

/// A cloneable handle to one HTTP request/response lifecycle.
///
/// Configure it, [`submit`](Self::submit) it to an [`OperationQueue`], then
/// observe it through an [`OperationDelegate`] or
/// [`completion`](Self::completion). Clones refer to the same operation.
#[derive(Clone)]
pub struct NetworkOperation {
    inner: Arc<Inner>,
}

struct Inner {
    id:        OperationId,
    transport: Arc<dyn Transport>,
    lifecycle: Mutex<Lifecycle>,
    delegate:  Mutex<Option<Arc<dyn OperationDelegate>>>,
    gate:      DispatchGate,
    /// Wakes the driver out of an attempt or a retry wait after `cancel`.
    wake:      Notify,
    /// Flips to true after the terminal transition has been fully processed.
    done:      watch::Sender<bool>,
}

struct Lifecycle {
    state:          OperationState,
    spec:           RequestSpec,
    prepared:       Option<TransportRequest>,
    runtime:        Option<Handle>,
    placement:      Placement,
    retries_left:   u32,
    attempt:        u32,
    timeouts_fired: u32,
    handle:         Option<TransportHandle>,
    partial:        PartialResponse,
    progress:       Progress,
    response:       Option<Arc<ResponseRecord>>,
    error:          Option<Arc<OperationError>>,
}

/// Where the operation stands with respect to its queue. Taken exactly once
/// on the terminal transition so the queue is released exactly once.
enum Placement {
    Unsubmitted,
    Backlog(Weak<QueueShared>),
    Admitted(Arc<QueueShared>),
    Released,
}

#[derive(Default)]
struct PartialResponse {
    status:   Option<u16>,
    reason:   Option<String>,
    headers:  Headers,
    body:     BytesMut,
    received: u64,
}

enum AttemptEvent {
    Headers {
        status:  u16,
        reason:  Option<String>,
        headers: Headers,
    },
    Data(Bytes),
    Complete,
    Error(TransportError),
}

/// Forwards transport callbacks for one attempt to the driver.
struct AttemptSink {
    op: OperationId,
    tx: mpsc::UnboundedSender<AttemptEvent>,
}

impl AttemptSink {
    fn forward(&self, handle: TransportHandle, event: AttemptEvent) {
        if self.tx.send(event).is_err() {
            debug!(op = %self.op, %handle, "ignoring event for an abandoned attempt");
        }
    }
}

impl TransportEvents for AttemptSink {
    fn on_headers(&self, handle: TransportHandle, status: u16, reason: Option<String>, headers: Headers) {
        self.forward(handle, AttemptEvent::Headers { status, reason, headers });
    }

    fn on_data(&self, handle: TransportHandle, chunk: Bytes) { self.forward(handle, AttemptEvent::Data(chunk)); }

    fn on_complete(&self, handle: TransportHandle) { self.forward(handle, AttemptEvent::Complete); }

    fn on_error(&self, handle: TransportHandle, error: TransportError) {
        self.forward(handle, AttemptEvent::Error(error));
    }
}

/// Owned by the spawned driver. Dropping it before the operation ends, as
/// happens when the runtime shuts down or refuses the task, fails the
/// operation so its queue slot and active count are released.
struct DriverGuard(NetworkOperation);

impl Drop for DriverGuard {
    fn drop(&mut self) { self.0.abandon(); }
}

enum AttemptEnd {
    Retry,
    Done,
}

enum TimeoutOutcome {
    Retry(Duration),
    Exhausted(Placement),
}

impl NetworkOperation {
    pub fn new(spec: RequestSpec, transport: Arc<dyn Transport>) -> Self {
        let (done, _) = watch::channel(false);
        Self {
            inner: Arc::new(Inner {
                id: OperationId::next(),
                transport,
                lifecycle: Mutex::new(Lifecycle {
                    state: OperationState::Idle,
                    spec,
                    prepared: None,
                    runtime: None,
                    placement: Placement::Unsubmitted,
                    retries_left: 0,
                    attempt: 0,
                    timeouts_fired: 0,
                    handle: None,
                    partial: PartialResponse::default(),
                    progress: Progress::default(),
                    response: None,
                    error: None,
                }),
                delegate: Mutex::new(None),
                gate: DispatchGate::default(),
                wake: Notify::new(),
                done,
            }),
        }
    }

    pub fn id(&self) -> OperationId { self.inner.id }

    pub fn state(&self) -> OperationState { self.lifecycle().state }

    /// Started or timed out and waiting for a retry.
    pub fn is_executing(&self) -> bool { self.state().is_executing() }

    /// Reached a terminal state.
    pub fn is_finished(&self) -> bool { self.state().is_terminal() }

    pub fn is_cancelled(&self) -> bool { self.state() == OperationState::Cancelled }

    /// Number of attempts started so far.
    pub fn attempts(&self) -> u32 { self.lifecycle().attempt }

    /// Number of times the timeout timer fired.
    pub fn timeouts(&self) -> u32 { self.lifecycle().timeouts_fired }

    pub fn priority(&self) -> Priority { self.lifecycle().spec.priority }

    /// Snapshot of the request description.
    pub fn spec(&self) -> RequestSpec { self.lifecycle().spec.clone() }

    /// The encoded request, available once submitted.
    pub fn prepared_request(&self) -> Option<TransportRequest> { self.lifecycle().prepared.clone() }

    pub fn progress(&self) -> Progress { self.lifecycle().progress }

    pub fn response(&self) -> Option<Arc<ResponseRecord>> { self.lifecycle().response.clone() }

    /// Cause of a `Failed` or `Cancelled` state.
    pub fn error(&self) -> Option<Arc<OperationError>> { self.lifecycle().error.clone() }

    /// Decode the response body with the declared charset, or the configured
    /// default when the server declared none.
    pub fn response_text(&self) -> Result<String, OperationError> {
        let lifecycle = self.lifecycle();
        match &lifecycle.response {
            Some(response) => Ok(response.text()?),
            None => Err(OperationError::NotFinished(lifecycle.state)),
        }
    }

    /// Number of operations running anywhere in the process on the shared
    /// counter.
    pub fn active_operation_count() -> usize { ActiveCounter::global().get() }

    /// Replace the whole request description.
    pub fn configure(&self, spec: RequestSpec) -> Result<(), ConfigurationError> {
        self.configure_with(|current| *current = spec)
    }

    /// Mutate the request description in place.
    pub fn configure_with<F>(&self, f: F) -> Result<(), ConfigurationError>
    where
        F: FnOnce(&mut RequestSpec),
    {
        let mut lifecycle = self.lifecycle();
        lifecycle.ensure_mutable()?;
        f(&mut lifecycle.spec);
        Ok(())
    }

    pub fn add_header(&self, name: impl Into<String>, value: impl Into<String>) -> Result<(), ConfigurationError> {
        self.configure_with(|spec| spec.set_header(name, value))
    }

    pub fn add_param(&self, name: impl Into<String>, value: impl Into<ParamValue>) -> Result<(), ConfigurationError> {
        self.configure_with(|spec| spec.set_param(name, value))
    }

    pub fn set_delegate(&self, delegate: Arc<dyn OperationDelegate>) { *self.delegate_slot() = Some(delegate); }

    pub fn clear_delegate(&self) { *self.delegate_slot() = None; }

    /// Drop the delegate, then cancel. The dropped delegate hears nothing.
    pub fn clear_delegate_and_cancel(&self) {
        self.clear_delegate();
        self.cancel();
    }

    /// Encode the request and hand the operation to `queue`.
    ///
    /// Returns immediately; the operation starts when the queue admits it.
    /// The driver runs on the caller's tokio runtime, or on the one the queue
    /// was created in when called from outside a runtime.
    /// Submitting twice, or submitting a finished operation, is a logged
    /// no-op. Encoding and configuration errors are returned here and leave
    /// the operation idle.
    pub fn submit(&self, queue: &OperationQueue) -> Result<(), OperationError> {
        let spec = {
            let lifecycle = self.lifecycle();
            if !lifecycle.is_unsubmitted() {
                warn!(op = %self.id(), state = %lifecycle.state, "operation already submitted; ignoring");
                return Ok(());
            }
            lifecycle.spec.clone()
        };
        let runtime = Handle::try_current()
            .ok()
            .or_else(|| queue.runtime())
            .ok_or(ConfigurationError::NoRuntime)?;

        spec.config.validate()?;
        let prepared = prepare_request(&spec)?;

        {
            let mut lifecycle = self.lifecycle();
            if !lifecycle.is_unsubmitted() {
                warn!(op = %self.id(), state = %lifecycle.state, "operation submitted concurrently; ignoring");
                return Ok(());
            }
            debug!(
                op = %self.id(),
                method = %prepared.method,
                url = %prepared.url,
                body_bytes = prepared.content_length,
                "submitting operation"
            );
            lifecycle.retries_left = spec.config.number_of_times_to_retry_on_timeout;
            lifecycle.prepared = Some(prepared);
            lifecycle.runtime = Some(runtime);
            lifecycle.placement = Placement::Backlog(queue.downgrade());
        }

        queue.enqueue(self.clone());
        Ok(())
    }

    /// Move any non-terminal operation to `Cancelled`.
    ///
    /// Aborts the in-flight request, stops the timer and leaves the queue.
    /// Once this returns no notification other than `on_cancel` reaches the
    /// delegate. Cancelling a terminal operation does nothing.
    pub fn cancel(&self) {
        let (handle, placement) = {
            let mut lifecycle = self.lifecycle();
            if lifecycle.state.is_terminal() {
                debug!(op = %self.id(), state = %lifecycle.state, "cancel ignored for terminal operation");
                return;
            }
            debug!(op = %self.id(), from = %lifecycle.state, "cancelling operation");
            lifecycle.state = OperationState::Cancelled;
            lifecycle.error = Some(Arc::new(OperationError::Cancelled));
            (lifecycle.handle.take(), lifecycle.take_placement())
        };

        if let Some(handle) = handle {
            self.inner.transport.abort(handle);
        }
        self.inner.wake.notify_one();
        self.settle(placement, OperationState::Cancelled);
    }

    /// Wait for the operation to end.
    ///
    /// Resolves after the queue has been released and the delegate
    /// notified.
    pub async fn completion(&self) -> Result<Arc<ResponseRecord>, Arc<OperationError>> {
        let mut done = self.inner.done.subscribe();
        // The sender lives as long as `self`, so this cannot fail.
        let _ = done.wait_for(|finished| *finished).await;

        let lifecycle = self.lifecycle();
        match (&lifecycle.response, &lifecycle.error) {
            (Some(response), _) => Ok(Arc::clone(response)),
            (None, Some(error)) => Err(Arc::clone(error)),
            (None, None) => Err(Arc::new(OperationError::NotFinished(lifecycle.state))),
        }
    }

    pub(crate) fn same_as(&self, other: &NetworkOperation) -> bool { Arc::ptr_eq(&self.inner, &other.inner) }

    /// Called by the queue under its own lock: `Idle` in the backlog becomes
    /// `Started`. Returns false when the operation was cancelled meanwhile.
    pub(crate) fn admit(&self, queue: &Arc<QueueShared>) -> bool {
        let mut lifecycle = self.lifecycle();
        if lifecycle.state != OperationState::Idle || !matches!(lifecycle.placement, Placement::Backlog(_)) {
            return false;
        }
        lifecycle.state = OperationState::Started;
        lifecycle.placement = Placement::Admitted(Arc::clone(queue));
        lifecycle.attempt = 1;
        lifecycle.reset_attempt();
        true
    }

    /// Spawn the driver for an admitted operation.
    pub(crate) fn launch(&self) {
        let (runtime, request) = {
            let lifecycle = self.lifecycle();
            (lifecycle.runtime.clone(), lifecycle.prepared.clone())
        };
        match (runtime, request) {
            (Some(runtime), Some(request)) => {
                let guard = DriverGuard(self.clone());
                runtime.spawn(async move { guard.0.clone().drive(request).await });
            }
            _ => self.fail(ConfigurationError::NoRuntime.into()),
        }
    }

    async fn drive(self, request: TransportRequest) {
        self.notify(true, |delegate, op| delegate.on_start(op));

        while let AttemptEnd::Retry = self.run_attempt(&request).await {}
    }

    async fn run_attempt(&self, request: &TransportRequest) -> AttemptEnd {
        let (attempt, timeout) = {
            let lifecycle = self.lifecycle();
            if lifecycle.state != OperationState::Started {
                return AttemptEnd::Done;
            }
            let config = &lifecycle.spec.config;
            (lifecycle.attempt, config.should_timeout.then_some(config.timeout_interval))
        };

        let (tx, mut rx) = mpsc::unbounded_channel();
        let sink = Arc::new(AttemptSink { op: self.id(), tx });
        let handle = match self.inner.transport.open(request.clone(), sink) {
            Ok(handle) => handle,
            Err(error) => {
                self.fail(error.into());
                return AttemptEnd::Done;
            }
        };

        {
            let mut lifecycle = self.lifecycle();
            if lifecycle.state != OperationState::Started {
                drop(lifecycle);
                self.inner.transport.abort(handle);
                return AttemptEnd::Done;
            }
            lifecycle.handle = Some(handle);
        }
        trace!(op = %self.id(), %handle, attempt, ?timeout, "attempt started");

        let timer = async {
            match timeout {
                Some(timeout) => tokio::time::sleep(timeout).await,
                None => future::pending().await,
            }
        };
        tokio::pin!(timer);

        loop {
            tokio::select! {
                biased;

                () = self.inner.wake.notified() => {
                    if self.state() != OperationState::Started {
                        return AttemptEnd::Done;
                    }
                }
                event = rx.recv() => match event {
                    Some(AttemptEvent::Headers { status, reason, headers }) => {
                        self.headers_received(status, reason, headers);
                    }
                    Some(AttemptEvent::Data(chunk)) => self.data_received(chunk),
                    Some(AttemptEvent::Complete) => {
                        self.complete();
                        return AttemptEnd::Done;
                    }
                    Some(AttemptEvent::Error(error)) => {
                        self.fail(error.into());
                        return AttemptEnd::Done;
                    }
                    None => {
                        self.fail(TransportError::Closed.into());
                        return AttemptEnd::Done;
                    }
                },
                () = &mut timer => return self.time_out().await,
            }
        }
    }

    fn headers_received(&self, status: u16, reason: Option<String>, headers: Headers) {
        {
            let mut lifecycle = self.lifecycle();
            if lifecycle.state != OperationState::Started {
                return;
            }
            lifecycle.progress.expected_bytes = headers.content_length();
            lifecycle.partial.status = Some(status);
            lifecycle.partial.reason = reason;
            lifecycle.partial.headers = headers.clone();
        }
        trace!(op = %self.id(), status, "headers received");
        self.notify(true, |delegate, op| delegate.on_headers_received(op, &headers));
    }

    fn data_received(&self, chunk: Bytes) {
        let progress = {
            let mut lifecycle = self.lifecycle();
            if lifecycle.state != OperationState::Started {
                return;
            }
            lifecycle.partial.body.extend_from_slice(&chunk);
            lifecycle.partial.received += chunk.len() as u64;
            lifecycle.progress.bytes_received = lifecycle.partial.received;
            lifecycle.progress
        };
        self.notify(true, |delegate, op| delegate.on_progress(op, &progress));
    }

    fn complete(&self) {
        let (placement, state) = {
            let mut lifecycle = self.lifecycle();
            if lifecycle.state != OperationState::Started {
                return;
            }
            let partial = mem::take(&mut lifecycle.partial);
            lifecycle.handle = None;
            match lifecycle.build_response(partial) {
                Ok(record) => {
                    debug!(op = %self.id(), status = record.status_code, bytes = record.body.len(), "operation finished");
                    lifecycle.state = OperationState::Finished;
                    lifecycle.response = Some(Arc::new(record));
                }
                Err(error) => {
                    debug!(op = %self.id(), %error, "response rejected");
                    lifecycle.state = OperationState::Failed;
                    lifecycle.error = Some(Arc::new(error));
                }
            }
            (lifecycle.take_placement(), lifecycle.state)
        };
        self.settle(placement, state);
    }

    /// `Started -> Failed`, unless something else got there first.
    fn fail(&self, error: OperationError) {
        self.fail_when(error, |state, error| {
            if state != OperationState::Started {
                trace!(op = %self.id(), %error, %state, "dropping late failure");
            }
            state == OperationState::Started
        });
    }

    /// The driver is gone. Whatever attempt or retry wait was pending will
    /// never resume.
    fn abandon(&self) {
        self.fail_when(TransportError::Closed.into(), |state, _| {
            if state.is_executing() {
                warn!(op = %self.id(), %state, "driver dropped before the operation ended");
            }
            state.is_executing()
        });
    }

    fn fail_when<F>(&self, error: OperationError, from: F)
    where
        F: FnOnce(OperationState, &OperationError) -> bool,
    {
        let (handle, placement) = {
            let mut lifecycle = self.lifecycle();
            if !from(lifecycle.state, &error) {
                return;
            }
            debug!(op = %self.id(), %error, "operation failed");
            lifecycle.state = OperationState::Failed;
            lifecycle.error = Some(Arc::new(error));
            (lifecycle.handle.take(), lifecycle.take_placement())
        };
        if let Some(handle) = handle {
            self.inner.transport.abort(handle);
        }
        self.settle(placement, OperationState::Failed);
    }

    async fn time_out(&self) -> AttemptEnd {
        let (handle, outcome) = {
            let mut lifecycle = self.lifecycle();
            if lifecycle.state != OperationState::Started {
                return AttemptEnd::Done;
            }
            lifecycle.state = OperationState::TimedOut;
            lifecycle.timeouts_fired += 1;
            let handle = lifecycle.handle.take();
            let timeout = lifecycle.spec.config.timeout_interval;

            let outcome = if lifecycle.retries_left > 0 {
                lifecycle.retries_left -= 1;
                let retry = lifecycle.attempt - 1;
                warn!(op = %self.id(), attempt = lifecycle.attempt, retries_left = lifecycle.retries_left, "attempt timed out; retrying");
                TimeoutOutcome::Retry(retry_delay(retry, lifecycle.spec.config.retry_backoff))
            } else {
                warn!(op = %self.id(), attempts = lifecycle.attempt, ?timeout, "attempt timed out; no retries left");
                lifecycle.state = OperationState::Failed;
                lifecycle.error = Some(Arc::new(OperationError::TimeoutExceeded {
                    attempts: lifecycle.attempt,
                    timeout,
                }));
                TimeoutOutcome::Exhausted(lifecycle.take_placement())
            };
            (handle, outcome)
        };

        if let Some(handle) = handle {
            self.inner.transport.abort(handle);
        }
        self.notify(true, |delegate, op| delegate.on_timeout(op));

        match outcome {
            TimeoutOutcome::Exhausted(placement) => {
                self.settle(placement, OperationState::Failed);
                AttemptEnd::Done
            }
            TimeoutOutcome::Retry(delay) => {
                if !delay.is_zero() {
                    tokio::select! {
                        () = tokio::time::sleep(delay) => {}
                        () = self.inner.wake.notified() => {}
                    }
                }
                let mut lifecycle = self.lifecycle();
                if lifecycle.state != OperationState::TimedOut {
                    return AttemptEnd::Done;
                }
                lifecycle.state = OperationState::Started;
                lifecycle.attempt += 1;
                lifecycle.reset_attempt();
                AttemptEnd::Retry
            }
        }
    }

    /// Everything after a terminal transition: release the queue slot,
    /// notify the delegate, then wake `completion` waiters.
    fn settle(&self, placement: Placement, state: OperationState) {
        match placement {
            Placement::Admitted(queue) => queue.release(self, state),
            Placement::Backlog(queue) => {
                if let Some(queue) = queue.upgrade() {
                    queue.forget(self);
                }
            }
            Placement::Unsubmitted | Placement::Released => {}
        }

        match state {
            OperationState::Finished => self.notify(false, |delegate, op| delegate.on_finish(op)),
            OperationState::Cancelled => self.notify(false, |delegate, op| delegate.on_cancel(op)),
            OperationState::Failed => {
                if let Some(error) = self.error() {
                    self.notify(false, |delegate, op| delegate.on_fail(op, &error));
                }
            }
            _ => {}
        }

        self.inner.done.send_replace(true);
    }

    /// Run `f` against the delegate inside the dispatch gate. Non-terminal
    /// notifications pass `skip_if_cancelled`.
    fn notify<F>(&self, skip_if_cancelled: bool, f: F)
    where
        F: FnOnce(&dyn OperationDelegate, &NetworkOperation),
    {
        let _gate = self.inner.gate.enter();
        if skip_if_cancelled && self.is_cancelled() {
            return;
        }
        let delegate = self.delegate_slot().clone();
        if let Some(delegate) = delegate {
            f(delegate.as_ref(), self);
        }
    }

    fn lifecycle(&self) -> MutexGuard<'_, Lifecycle> {
        self.inner.lifecycle.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn delegate_slot(&self) -> MutexGuard<'_, Option<Arc<dyn OperationDelegate>>> {
        self.inner.delegate.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Lifecycle {
    fn is_unsubmitted(&self) -> bool {
        self.state == OperationState::Idle && matches!(self.placement, Placement::Unsubmitted)
    }

    fn ensure_mutable(&self) -> Result<(), ConfigurationError> {
        if self.state != OperationState::Idle {
            return Err(ConfigurationError::AlreadyStarted(self.state));
        }
        if !matches!(self.placement, Placement::Unsubmitted) {
            return Err(ConfigurationError::AlreadySubmitted);
        }
        Ok(())
    }

    fn take_placement(&mut self) -> Placement { mem::replace(&mut self.placement, Placement::Released) }

    fn reset_attempt(&mut self) {
        self.partial = PartialResponse::default();
        self.progress = Progress {
            bytes_received: 0,
            expected_bytes: None,
            attempt:        self.attempt,
        };
    }

    fn build_response(&self, partial: PartialResponse) -> Result<ResponseRecord, OperationError> {
        let Some(status) = partial.status else {
            return Err(TransportError::Network("request completed without a response status".to_string()).into());
        };
        let headers = partial.headers;
        let config = &self.spec.config;

        let bodyless = self.spec.method == Method::Head || status == 204 || status == 304;
        match headers.content_length() {
            Some(expected) if !bodyless && expected != partial.received => {
                return Err(TransportError::IncompleteBody {
                    expected,
                    received: partial.received,
                }
                .into());
            }
            _ => {}
        }

        let mut body = partial.body.freeze();
        let gzipped = headers.get("content-encoding").is_some_and(is_gzip_encoding);
        if config.allow_compressed_response && gzipped && !body.is_empty() {
            body = Bytes::from(decompress(&body)?);
        }

        let declared = headers
            .get("content-type")
            .and_then(charset_from_content_type)
            .and_then(TextEncoding::from_label);

        Ok(ResponseRecord {
            status_code: status,
            status_message: partial.reason.unwrap_or_default(),
            cookies: cookies_from_headers(&headers, &self.spec.url),
            encoding: declared.unwrap_or(config.default_response_encoding),
            encoding_declared: declared.is_some(),
            content_length: partial.received,
            headers,
            body,
        })
    }
}

impl fmt::Debug for NetworkOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NetworkOperation")
            .field("id", &self.id())
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}
