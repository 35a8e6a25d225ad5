//! Best-effort sinks for activity records.

use crate::api::{ApiClient, ApiError};
use crate::tracker::records::LogEntry;
use std::future::Future;
use std::pin::Pin;

/// Pending result of a single logging call.
pub type SinkFuture = Pin<Box<dyn Future<Output = Result<(), ApiError>> + Send + 'static>>;

/// Destination of tracker records.
///
/// The tracker never awaits a send on the caller's behalf; the returned
/// future runs detached and its error only reaches the diagnostics.
pub trait ActivitySink: Send + Sync + 'static {
    fn send(&self, entry: LogEntry) -> SinkFuture;
}

/// Posts records to the backend logging endpoints.
#[derive(Clone)]
pub struct HttpSink {
    api: ApiClient,
}

impl HttpSink {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }
}

impl ActivitySink for HttpSink {
    fn send(&self, entry: LogEntry) -> SinkFuture {
        let api = self.api.clone();
        Box::pin(async move {
            api.post_and_discard(entry.activity.endpoint(), &entry, true)
                .await
        })
    }
}
