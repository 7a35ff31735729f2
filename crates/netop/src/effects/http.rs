//! [`Transport`] backed by `reqwest`.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use futures_util::StreamExt;
use tokio::runtime::Handle;
use tokio::task::AbortHandle;
use tracing::{debug, trace};

use super::transport::{Transport, TransportEvents, TransportHandle};
use crate::core::TransportRequest;
use crate::data::{CachePolicy, Headers};
use crate::error::TransportError;

type TaskMap = Arc<Mutex<HashMap<u64, AbortHandle>>>;

/// Runs each request on its own tokio task and streams the body back
/// chunk by chunk.
///
/// Response bodies are passed through untouched; gzip inflation is left to
/// the operation.
pub struct ReqwestTransport {
    client:  reqwest::Client,
    tasks:   TaskMap,
    next_id: AtomicU64,
}

impl ReqwestTransport {
    pub fn new() -> Result<Self, TransportError> {
        let client = reqwest::Client::builder()
            .build()
            .map_err(|e| TransportError::Unavailable(e.to_string()))?;
        Ok(Self::with_client(client))
    }

    pub fn with_client(client: reqwest::Client) -> Self {
        Self {
            client,
            tasks: Arc::default(),
            next_id: AtomicU64::new(1),
        }
    }

    /// Requests currently running.
    pub fn in_flight(&self) -> usize { self.tasks.lock().unwrap_or_else(PoisonError::into_inner).len() }
}

impl Transport for ReqwestTransport {
    fn open(
        &self,
        request: TransportRequest,
        events: Arc<dyn TransportEvents>,
    ) -> Result<TransportHandle, TransportError> {
        let runtime = Handle::try_current()
            .map_err(|_| TransportError::Unavailable("no tokio runtime".to_string()))?;
        let handle = TransportHandle(self.next_id.fetch_add(1, Ordering::Relaxed));
        let client = self.client.clone();
        let tasks = Arc::clone(&self.tasks);

        trace!(%handle, method = %request.method, url = %request.url, "opening request");

        // The task unregisters itself under this lock, so it cannot finish
        // before it is registered.
        let mut registry = self.tasks.lock().unwrap_or_else(PoisonError::into_inner);
        let task = runtime.spawn(async move {
            match execute(&client, request, handle, events.as_ref()).await {
                Ok(()) => events.on_complete(handle),
                Err(error) => events.on_error(handle, error),
            }
            tasks.lock().unwrap_or_else(PoisonError::into_inner).remove(&handle.0);
        });
        registry.insert(handle.0, task.abort_handle());

        Ok(handle)
    }

    fn abort(&self, handle: TransportHandle) {
        let task = self.tasks.lock().unwrap_or_else(PoisonError::into_inner).remove(&handle.0);
        if let Some(task) = task {
            debug!(%handle, "aborting request");
            task.abort();
        }
    }
}

async fn execute(
    client: &reqwest::Client,
    request: TransportRequest,
    handle: TransportHandle,
    events: &dyn TransportEvents,
) -> Result<(), TransportError> {
    let method = reqwest::Method::from_bytes(request.method.as_str().as_bytes())
        .map_err(|e| TransportError::Unavailable(e.to_string()))?;

    let mut builder = client.request(method, request.url);
    for (name, value) in &request.headers {
        builder = builder.header(name.as_str(), value.as_str());
    }
    builder = match request.cache_policy {
        CachePolicy::UseProtocolCachePolicy => builder,
        CachePolicy::ReloadIgnoringLocalCacheData => builder
            .header("Cache-Control", "no-cache")
            .header("Pragma", "no-cache"),
        CachePolicy::ReturnCacheDataElseLoad => builder.header("Cache-Control", "max-stale"),
        CachePolicy::ReturnCacheDataDontLoad => builder.header("Cache-Control", "only-if-cached"),
    };
    if !request.body.is_empty() {
        builder = builder.body(request.body);
    }

    let response = builder.send().await.map_err(map_error)?;

    let status = response.status();
    let headers: Headers = response
        .headers()
        .iter()
        .map(|(name, value)| (name.as_str(), String::from_utf8_lossy(value.as_bytes()).into_owned()))
        .collect();
    events.on_headers(
        handle,
        status.as_u16(),
        status.canonical_reason().map(str::to_string),
        headers,
    );

    let mut body = response.bytes_stream();
    while let Some(chunk) = body.next().await {
        events.on_data(handle, chunk.map_err(map_error)?);
    }
    Ok(())
}

fn map_error(error: reqwest::Error) -> TransportError {
    if error.is_connect() {
        TransportError::Connect(error.to_string())
    } else {
        TransportError::Network(error.to_string())
    }
}
