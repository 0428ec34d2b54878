/**
 * Clients — the objects a host integration hands captured payloads to.
 *
 * A client owns the resolved `Config`, the default header set built from it,
 * and one transport instance. Two implementations ship with the crate, one
 * per scheduling model:
 *
 * - `ThreadedClient` (`"threaded"`) — blocking transport. With `ASYNC_MODE`
 *   on, sends go through a background worker thread so the application's own
 *   threads never wait on the network.
 * - `CooperativeClient` (`"cooperative"`) — async transport. Captures are
 *   spawned as tasks on the running tokio runtime.
 *
 * `Client::capture` is fire-and-forget: delivery failures are logged, never
 * returned. Callers that need the outcome use the concrete `send` methods.
 */
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Condvar, Mutex, PoisonError};
use std::time::Duration;

use crossbeam_channel::{Sender, TrySendError};
use tokio::sync::Notify;

use crate::config::Config;
use crate::error::{Result, TransportError};
use crate::protocol::headers::{default_headers, Headers};
use crate::transport::{
    AsyncHttpTransport, AsyncTransport, FlushSignal, HttpTransport, Job, Transport, Worker,
    WorkerMsg,
};

/// Bounded queue capacity of the threaded client's worker. When full, new
/// captures are dropped.
const QUEUE_CAPACITY: usize = 100;

// ---------------------------------------------------------------------------
// Client trait
// ---------------------------------------------------------------------------

pub trait Client: Send + Sync + 'static {
    /// The implementation identifier this client is registered under.
    fn identifier(&self) -> &str;

    fn config(&self) -> &Config;

    /// Hands a payload off for delivery. Never blocks on the network and
    /// never fails the caller.
    fn capture(&self, payload: Vec<u8>);

    /**
     * Waits up to `timeout` for captures handed off so far to be attempted.
     * Returns `true` if nothing is left pending.
     */
    fn flush(&self, timeout: Duration) -> bool;
}

fn log_outcome(outcome: std::result::Result<String, TransportError>) {
    match outcome {
        Ok(token) => tracing::debug!(location = %token, "event delivered"),
        Err(err) => tracing::warn!(
            kind = ?err.kind(),
            bytes = err.payload().len(),
            "failed to deliver event: {err}"
        ),
    }
}

// ---------------------------------------------------------------------------
// ThreadedClient
// ---------------------------------------------------------------------------

pub struct ThreadedClient {
    config: Config,
    headers: Headers,
    transport: Arc<HttpTransport>,

    /// Worker queue; `None` when `ASYNC_MODE` is off and captures are sent
    /// inline.
    sender: Option<Sender<WorkerMsg>>,
}

impl ThreadedClient {
    pub const IDENTIFIER: &'static str = "threaded";

    /**
     * Builds the blocking transport for the configured endpoint and, in
     * async mode, spawns the `beacon-worker` thread that drains captures.
     */
    pub fn new(config: Config) -> Result<Self> {
        let transport = Arc::new(HttpTransport::new(config.endpoint()?));

        let sender = if config.async_mode {
            let (sender, receiver) = crossbeam_channel::bounded(QUEUE_CAPACITY);
            Worker::spawn(receiver, transport.clone(), config.timeout)?;
            Some(sender)
        } else {
            None
        };

        Ok(Self {
            headers: default_headers(&config),
            config,
            transport,
            sender,
        })
    }

    /// One synchronous attempt on the calling thread, bypassing the worker.
    pub fn send(&self, payload: Vec<u8>) -> std::result::Result<String, TransportError> {
        self.transport
            .send(payload, &self.headers, self.config.timeout)
    }

    pub fn transport(&self) -> &HttpTransport {
        &self.transport
    }
}

impl Client for ThreadedClient {
    fn identifier(&self) -> &str {
        Self::IDENTIFIER
    }

    fn config(&self) -> &Config {
        &self.config
    }

    fn capture(&self, payload: Vec<u8>) {
        let Some(sender) = &self.sender else {
            log_outcome(self.send(payload));
            return;
        };

        let job = Job {
            payload,
            headers: self.headers.clone(),
        };

        match sender.try_send(WorkerMsg::Send(job)) {
            Ok(()) => {}
            Err(TrySendError::Full(_)) => {
                tracing::warn!("event queue is full, dropping event");
            }
            Err(TrySendError::Disconnected(_)) => {
                tracing::warn!("worker thread has shut down, dropping event");
            }
        }
    }

    /*
     * The queue is FIFO, so once the worker reaches the Flush message every
     * capture enqueued before it has been attempted.
     */
    fn flush(&self, timeout: Duration) -> bool {
        let Some(sender) = &self.sender else {
            return true;
        };

        let signal = Arc::new(FlushSignal::new());
        match sender.send_timeout(WorkerMsg::Flush(signal.clone()), timeout) {
            Ok(()) => signal.wait_timeout(timeout),
            Err(_) => false,
        }
    }
}

// ---------------------------------------------------------------------------
// CooperativeClient
// ---------------------------------------------------------------------------

/// Counts spawned sends that have not finished yet.
#[derive(Default)]
struct InFlight {
    count: AtomicUsize,
    lock: Mutex<()>,
    idle_sync: Condvar,
    idle_async: Notify,
}

/// Decrements the in-flight count when the spawned task ends, including
/// when the runtime cancels it.
struct InFlightGuard(Arc<InFlight>);

impl InFlight {
    fn enter(self: &Arc<Self>) -> InFlightGuard {
        self.count.fetch_add(1, Ordering::SeqCst);
        InFlightGuard(self.clone())
    }

    fn is_idle(&self) -> bool {
        self.count.load(Ordering::SeqCst) == 0
    }
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        if self.0.count.fetch_sub(1, Ordering::SeqCst) == 1 {
            let _lock = self.0.lock.lock().unwrap_or_else(PoisonError::into_inner);
            self.0.idle_sync.notify_all();
            self.0.idle_async.notify_waiters();
        }
    }
}

pub struct CooperativeClient {
    config: Config,
    headers: Headers,
    transport: AsyncHttpTransport,
    in_flight: Arc<InFlight>,
}

impl CooperativeClient {
    pub const IDENTIFIER: &'static str = "cooperative";

    pub fn new(config: Config) -> Result<Self> {
        let transport = AsyncHttpTransport::new(config.endpoint()?)?;

        Ok(Self {
            headers: default_headers(&config),
            config,
            transport,
            in_flight: Arc::default(),
        })
    }

    /// One attempt, awaited by the caller.
    pub async fn send(&self, payload: Vec<u8>) -> std::result::Result<String, TransportError> {
        self.transport
            .send(payload, &self.headers, self.config.timeout)
            .await
    }

    pub fn transport(&self) -> &AsyncHttpTransport {
        &self.transport
    }

    /**
     * Async counterpart of `flush`, for use from inside the scheduler.
     * Returns `true` once no spawned send is pending.
     */
    pub async fn drain(&self, timeout: Duration) -> bool {
        let wait_idle = async {
            loop {
                let idle = self.in_flight.idle_async.notified();
                if self.in_flight.is_idle() {
                    return;
                }
                idle.await;
            }
        };

        tokio::time::timeout(timeout, wait_idle).await.is_ok()
    }
}

impl Client for CooperativeClient {
    fn identifier(&self) -> &str {
        Self::IDENTIFIER
    }

    fn config(&self) -> &Config {
        &self.config
    }

    /*
     * Spawns the send on the runtime the caller is running on. Outside a
     * runtime there is nowhere to run it, so the capture is dropped.
     */
    fn capture(&self, payload: Vec<u8>) {
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            tracing::warn!("no tokio runtime is running, dropping event");
            return;
        };

        let transport = self.transport.clone();
        let headers = self.headers.clone();
        let timeout = self.config.timeout;
        let guard = self.in_flight.enter();

        runtime.spawn(async move {
            let _guard = guard;
            log_outcome(transport.send(payload, &headers, timeout).await);
        });
    }

    /**
     * Blocks the calling thread. Must not be called from a thread driving
     * the runtime the sends are spawned on; use `drain` there instead.
     */
    fn flush(&self, timeout: Duration) -> bool {
        let lock = self.in_flight.lock.lock().unwrap_or_else(PoisonError::into_inner);
        let waited = self
            .in_flight
            .idle_sync
            .wait_timeout_while(lock, timeout, |_| !self.in_flight.is_idle());

        match waited {
            Ok((_, result)) => !result.timed_out(),
            Err(_) => self.in_flight.is_idle(),
        }
    }
}
