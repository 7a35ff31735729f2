//! Shared fixtures for the netop integration tests.

#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use bytes::Bytes;
use netop::{
    ActiveCounter, Headers, NetworkOperation, OperationDelegate, OperationError, OperationQueue, Progress,
    QueueConfig, RequestSpec, Transport, TransportError, TransportEvents, TransportHandle, TransportRequest,
};
use tokio::task::JoinHandle;

/// What the transport does with the next request it opens.
#[derive(Debug, Clone)]
pub enum Script {
    /// Deliver headers and body after `delay`, then complete.
    Respond {
        status:  u16,
        headers: Vec<(String, String)>,
        chunks:  Vec<Bytes>,
        delay:   Duration,
    },
    /// Never answer.
    Hang,
    /// Report `error` after `delay`.
    Fail { error: TransportError, delay: Duration },
    /// Refuse synchronously from `open`.
    Refuse(TransportError),
}

impl Script {
    pub fn ok(body: &str) -> Self { Self::status(200, body) }

    pub fn status(status: u16, body: &str) -> Self {
        Self::Respond {
            status,
            headers: vec![("Content-Length".to_string(), body.len().to_string())],
            chunks: vec![Bytes::copy_from_slice(body.as_bytes())],
            delay: Duration::ZERO,
        }
    }

    pub fn fail(error: TransportError) -> Self {
        Self::Fail {
            error,
            delay: Duration::ZERO,
        }
    }

    #[must_use]
    pub fn header(mut self, name: &str, value: &str) -> Self {
        if let Self::Respond { headers, .. } = &mut self {
            headers.retain(|(existing, _)| !existing.eq_ignore_ascii_case(name));
            headers.push((name.to_string(), value.to_string()));
        }
        self
    }

    #[must_use]
    pub fn without_header(mut self, name: &str) -> Self {
        if let Self::Respond { headers, .. } = &mut self {
            headers.retain(|(existing, _)| !existing.eq_ignore_ascii_case(name));
        }
        self
    }

    #[must_use]
    pub fn chunks(mut self, parts: &[&str]) -> Self {
        if let Self::Respond { chunks, .. } = &mut self {
            *chunks = parts.iter().map(|part| Bytes::copy_from_slice(part.as_bytes())).collect();
        }
        self
    }

    #[must_use]
    pub fn raw_body(mut self, body: Vec<u8>) -> Self {
        let len = body.len();
        if let Self::Respond { chunks, .. } = &mut self {
            *chunks = vec![Bytes::from(body)];
        }
        self.header("Content-Length", &len.to_string())
    }

    #[must_use]
    pub fn after(mut self, wait: Duration) -> Self {
        match &mut self {
            Self::Respond { delay, .. } | Self::Fail { delay, .. } => *delay = wait,
            Self::Hang | Self::Refuse(_) => {}
        }
        self
    }
}

struct Live {
    events: Arc<dyn TransportEvents>,
    task:   Option<JoinHandle<()>>,
}

/// A transport that plays back scripts, one per opened request, and falls
/// back to a default script when the list runs out.
pub struct ScriptedTransport {
    scripts:       Mutex<VecDeque<Script>>,
    fallback:      Script,
    next_id:       AtomicU64,
    opened:        Mutex<Vec<TransportRequest>>,
    aborted:       Mutex<Vec<TransportHandle>>,
    live:          Arc<Mutex<HashMap<u64, Live>>>,
    max_in_flight: AtomicUsize,
}

impl ScriptedTransport {
    pub fn new(fallback: Script) -> Arc<Self> { Self::with_scripts(Vec::new(), fallback) }

    pub fn with_scripts(scripts: Vec<Script>, fallback: Script) -> Arc<Self> {
        Arc::new(Self {
            scripts: Mutex::new(scripts.into()),
            fallback,
            next_id: AtomicU64::new(1),
            opened: Mutex::new(Vec::new()),
            aborted: Mutex::new(Vec::new()),
            live: Arc::default(),
            max_in_flight: AtomicUsize::new(0),
        })
    }

    pub fn opened(&self) -> Vec<TransportRequest> { self.opened.lock().unwrap().clone() }

    pub fn open_count(&self) -> usize { self.opened.lock().unwrap().len() }

    pub fn opened_paths(&self) -> Vec<String> {
        self.opened().iter().map(|request| request.url.path().to_string()).collect()
    }

    pub fn abort_count(&self) -> usize { self.aborted.lock().unwrap().len() }

    pub fn in_flight(&self) -> usize { self.live.lock().unwrap().len() }

    pub fn max_in_flight(&self) -> usize { self.max_in_flight.load(Ordering::SeqCst) }
}

impl Transport for ScriptedTransport {
    fn open(
        &self,
        request: TransportRequest,
        events: Arc<dyn TransportEvents>,
    ) -> Result<TransportHandle, TransportError> {
        let script = self.scripts.lock().unwrap().pop_front().unwrap_or_else(|| self.fallback.clone());
        if let Script::Refuse(error) = script {
            return Err(error);
        }

        self.opened.lock().unwrap().push(request);
        let handle = TransportHandle(self.next_id.fetch_add(1, Ordering::SeqCst));

        let mut live = self.live.lock().unwrap();
        let task = match script {
            Script::Hang | Script::Refuse(_) => None,
            Script::Respond {
                status,
                headers,
                chunks,
                delay,
            } => {
                let events = Arc::clone(&events);
                let registry = Arc::clone(&self.live);
                Some(tokio::spawn(async move {
                    tokio::time::sleep(delay).await;
                    events.on_headers(handle, status, None, headers.into_iter().collect::<Headers>());
                    for chunk in chunks {
                        events.on_data(handle, chunk);
                    }
                    events.on_complete(handle);
                    registry.lock().unwrap().remove(&handle.0);
                }))
            }
            Script::Fail { error, delay } => {
                let events = Arc::clone(&events);
                let registry = Arc::clone(&self.live);
                Some(tokio::spawn(async move {
                    tokio::time::sleep(delay).await;
                    events.on_error(handle, error);
                    registry.lock().unwrap().remove(&handle.0);
                }))
            }
        };
        live.insert(handle.0, Live { events, task });
        self.max_in_flight.fetch_max(live.len(), Ordering::SeqCst);

        Ok(handle)
    }

    fn abort(&self, handle: TransportHandle) {
        self.aborted.lock().unwrap().push(handle);
        let entry = self.live.lock().unwrap().remove(&handle.0);
        if let Some(Live { task: Some(task), .. }) = entry {
            task.abort();
        }
    }
}

type Sink = (TransportHandle, Arc<dyn TransportEvents>);

/// A transport that never answers by itself. Tests take the event sink of
/// each opened request and drive it from whatever thread they like.
#[derive(Default)]
pub struct ManualTransport {
    next_id: AtomicU64,
    opened:  Mutex<Vec<Sink>>,
    aborted: AtomicUsize,
}

impl ManualTransport {
    pub fn new() -> Arc<Self> { Arc::new(Self::default()) }

    pub fn sink(&self, attempt: usize) -> Option<Sink> { self.opened.lock().unwrap().get(attempt).cloned() }

    pub fn abort_count(&self) -> usize { self.aborted.load(Ordering::SeqCst) }
}

impl Transport for ManualTransport {
    fn open(
        &self,
        _request: TransportRequest,
        events: Arc<dyn TransportEvents>,
    ) -> Result<TransportHandle, TransportError> {
        let handle = TransportHandle(self.next_id.fetch_add(1, Ordering::SeqCst) + 1);
        self.opened.lock().unwrap().push((handle, events));
        Ok(handle)
    }

    fn abort(&self, _handle: TransportHandle) { self.aborted.fetch_add(1, Ordering::SeqCst); }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    Start,
    Headers(usize),
    Progress(u64),
    Finish,
    Fail(String),
    Cancel,
    Timeout,
}

type Hook = Box<dyn Fn(&NetworkOperation, &Event) + Send + Sync>;

/// Records every notification in order. An optional hook runs after each
/// one is recorded.
#[derive(Default)]
pub struct RecordingDelegate {
    events: Mutex<Vec<Event>>,
    hook:   Option<Hook>,
}

impl RecordingDelegate {
    pub fn new() -> Arc<Self> { Arc::new(Self::default()) }

    pub fn with_hook(hook: impl Fn(&NetworkOperation, &Event) + Send + Sync + 'static) -> Arc<Self> {
        Arc::new(Self {
            events: Mutex::default(),
            hook:   Some(Box::new(hook)),
        })
    }

    pub fn events(&self) -> Vec<Event> { self.events.lock().unwrap().clone() }

    pub fn count(&self, matches: impl Fn(&Event) -> bool) -> usize {
        self.events.lock().unwrap().iter().filter(|event| matches(event)).count()
    }

    pub fn starts(&self) -> usize { self.count(|e| *e == Event::Start) }

    pub fn finishes(&self) -> usize { self.count(|e| *e == Event::Finish) }

    pub fn fails(&self) -> usize { self.count(|e| matches!(e, Event::Fail(_))) }

    pub fn cancels(&self) -> usize { self.count(|e| *e == Event::Cancel) }

    pub fn timeouts(&self) -> usize { self.count(|e| *e == Event::Timeout) }

    pub fn terminals(&self) -> usize { self.finishes() + self.fails() + self.cancels() }

    fn record(&self, operation: &NetworkOperation, event: Event) {
        self.events.lock().unwrap().push(event.clone());
        if let Some(hook) = &self.hook {
            hook(operation, &event);
        }
    }
}

impl OperationDelegate for RecordingDelegate {
    fn on_start(&self, operation: &NetworkOperation) { self.record(operation, Event::Start); }

    fn on_headers_received(&self, operation: &NetworkOperation, headers: &Headers) {
        self.record(operation, Event::Headers(headers.len()));
    }

    fn on_progress(&self, operation: &NetworkOperation, progress: &Progress) {
        self.record(operation, Event::Progress(progress.bytes_received));
    }

    fn on_finish(&self, operation: &NetworkOperation) { self.record(operation, Event::Finish); }

    fn on_fail(&self, operation: &NetworkOperation, error: &OperationError) {
        self.record(operation, Event::Fail(error.to_string()));
    }

    fn on_cancel(&self, operation: &NetworkOperation) { self.record(operation, Event::Cancel); }

    fn on_timeout(&self, operation: &NetworkOperation) { self.record(operation, Event::Timeout); }
}

/// A queue on its own counter so parallel tests do not see each other.
pub fn isolated_queue(max: usize) -> OperationQueue {
    let config = QueueConfig::default().max_concurrent_operations(max);
    OperationQueue::with_counter(config, Arc::new(ActiveCounter::new())).unwrap()
}

pub fn get(url: &str) -> RequestSpec { RequestSpec::get(url).unwrap() }

pub fn operation(spec: RequestSpec, transport: &Arc<ScriptedTransport>) -> NetworkOperation {
    NetworkOperation::new(spec, Arc::clone(transport) as Arc<dyn Transport>)
}

/// Let spawned drivers run until `condition` holds.
pub async fn wait_until(condition: impl Fn() -> bool) {
    for _ in 0..10_000 {
        if condition() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(1)).await;
    }
    panic!("condition not reached");
}
