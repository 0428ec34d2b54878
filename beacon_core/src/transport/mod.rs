/**
 * Transport layer — one network attempt per call, classified into a
 * correlation token or a `TransportError`.
 *
 * Everything related to *how* we deliver payloads to the collector:
 * - `http` — blocking `ureq` transport, for worker threads
 * - `cooperative` — `reqwest` transport racing each attempt against a timer
 * - `worker` — background thread, bounded channel, flush signaling
 *
 * Both transports share the same outcome rules:
 * - 2xx → the `Location` response header, or `""` when absent
 * - any other status → `Rejected`, message carries status and body text
 * - no classification before the deadline → `TimedOut`
 * - anything else (DNS, refused connection, invalid header) → `ConnectionFailed`
 *
 * Transports never retry and never log; both are left to the caller.
 */
use std::future::Future;
use std::time::Duration;

use url::Url;

use crate::error::TransportError;
use crate::protocol::headers::Headers;

pub mod cooperative;
pub mod http;
pub mod worker;

pub use cooperative::AsyncHttpTransport;
pub use http::HttpTransport;
pub use worker::{FlushSignal, Job, Worker, WorkerMsg};

/// A synchronous transport, run to completion before returning.
pub trait Transport: Send + Sync {
    /// The collector address every send is POSTed to.
    fn endpoint(&self) -> &Url;

    /**
     * POSTs `payload` with `headers` to the endpoint, giving up after
     * `timeout`. Returns the collector's correlation token on success.
     */
    fn send(
        &self,
        payload: Vec<u8>,
        headers: &Headers,
        timeout: Duration,
    ) -> Result<String, TransportError>;
}

/// A non-blocking transport for cooperative schedulers.
pub trait AsyncTransport: Send + Sync {
    fn endpoint(&self) -> &Url;

    /// Same contract as `Transport::send`; suspends only while awaiting the
    /// response.
    fn send(
        &self,
        payload: Vec<u8>,
        headers: &Headers,
        timeout: Duration,
    ) -> impl Future<Output = Result<String, TransportError>> + Send;
}

pub(crate) fn is_success(status: u16) -> bool {
    (200..300).contains(&status)
}

/// Lossy text of a response header or body.
pub(crate) fn decode(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).into_owned()
}

pub(crate) const UNREADABLE_BODY: &str = "<unreadable body>";
