/**
 * Background worker thread that drains the send queue through a blocking
 * transport.
 *
 * Architecture overview:
 *
 * ```text
 *  ┌──────────────┐     bounded channel     ┌─────────────────┐
 *  │  App code    │ ───── WorkerMsg ──────► │  beacon-worker  │
 *  │  (any thread)│                         │  (single)       │
 *  └──────────────┘                         └───────┬─────────┘
 *                                                   │
 *                                           Transport::send()
 *                                                   │
 *                                           ┌───────▼──────┐
 *                                           │  Collector   │
 *                                           └──────────────┘
 * ```
 *
 * The channel carries `WorkerMsg` variants:
 * - `Send(Job)` — a payload and its headers, sent once.
 * - `Flush(Arc<FlushSignal>)` — notify the caller once all preceding jobs
 *   have been attempted.
 *
 * The worker is the boundary between the transport and the monitored
 * application: failures are logged here and go no further. Nothing is retried.
 *
 * The loop runs until every sender is dropped.
 */
use std::sync::{Arc, Condvar, Mutex};
use std::thread;
use std::time::Duration;

use crossbeam_channel::Receiver;

use super::Transport;
use crate::error::{Error, Result};
use crate::protocol::headers::Headers;

// ---------------------------------------------------------------------------
// WorkerMsg
// ---------------------------------------------------------------------------

/// One queued send attempt.
pub struct Job {
    pub payload: Vec<u8>,
    pub headers: Headers,
}

/**
 * Messages that flow through the bounded channel from producer threads
 * to the single background worker.
 */
pub enum WorkerMsg {
    Send(Job),

    /**
     * A flush request. The worker signals `FlushSignal` once all messages
     * that were in the channel *before* this one have been processed.
     */
    Flush(Arc<FlushSignal>),
}

// ---------------------------------------------------------------------------
// FlushSignal — condvar-based notification for flush completion
// ---------------------------------------------------------------------------

/**
 * Blocks the caller of `flush()` until the worker has drained all pending
 * messages.
 *
 * `Mutex<bool>` starts `false`; the worker flips it and notifies when it
 * reaches the `Flush` message.
 */
pub struct FlushSignal {
    mutex: Mutex<bool>,
    condvar: Condvar,
}

impl FlushSignal {
    pub fn new() -> Self {
        Self {
            mutex: Mutex::new(false),
            condvar: Condvar::new(),
        }
    }

    /// Called by the worker thread once the flush point is reached.
    pub fn notify(&self) {
        if let Ok(mut done) = self.mutex.lock() {
            *done = true;
            self.condvar.notify_all();
        }
    }

    /**
     * Blocks until the worker signals completion or `timeout` elapses.
     *
     * Returns `true` if the flush completed in time.
     */
    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        let Ok(guard) = self.mutex.lock() else {
            return false;
        };

        match self.condvar.wait_timeout_while(guard, timeout, |done| !*done) {
            Ok((_, result)) => !result.timed_out(),
            Err(_) => false,
        }
    }
}

impl Default for FlushSignal {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Worker
// ---------------------------------------------------------------------------

/**
 * Handle to the background worker thread.
 *
 * Messages are processed sequentially, so jobs queued on one client are
 * attempted in order, each with its own `timeout`.
 */
pub struct Worker;

impl Worker {
    /**
     * Spawns the background worker thread.
     *
     * Fire-and-forget: no join handle is kept. Callers that need delivery
     * before shutdown use `flush()`.
     */
    pub fn spawn<T>(receiver: Receiver<WorkerMsg>, transport: Arc<T>, timeout: Duration) -> Result<()>
    where
        T: Transport + ?Sized + 'static,
    {
        thread::Builder::new()
            .name("beacon-worker".into())
            .spawn(move || {
                /*
                 * A panic inside the transport must not take the process down
                 * with it; the thread exits and later jobs are dropped.
                 */
                let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
                    Self::run_loop(&receiver, transport.as_ref(), timeout);
                }));

                if result.is_err() {
                    tracing::error!("worker thread panicked, queued events will be dropped");
                }
            })
            .map(|_| ())
            .map_err(Error::from)
    }

    fn run_loop<T>(receiver: &Receiver<WorkerMsg>, transport: &T, timeout: Duration)
    where
        T: Transport + ?Sized,
    {
        while let Ok(msg) = receiver.recv() {
            match msg {
                WorkerMsg::Send(job) => match transport.send(job.payload, &job.headers, timeout) {
                    Ok(token) => {
                        tracing::debug!(location = %token, "event delivered");
                    }
                    Err(err) => {
                        tracing::warn!(
                            kind = ?err.kind(),
                            bytes = err.payload().len(),
                            "failed to deliver event: {err}"
                        );
                    }
                },
                WorkerMsg::Flush(signal) => signal.notify(),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use url::Url;

    use crate::error::TransportError;

    /// Records payloads instead of touching the network.
    struct Recording {
        endpoint: Url,
        seen: Mutex<Vec<Vec<u8>>>,
        calls: AtomicUsize,
    }

    impl Recording {
        fn new() -> Self {
            Self {
                endpoint: Url::parse("http://localhost:9999").unwrap(),
                seen: Mutex::new(Vec::new()),
                calls: AtomicUsize::new(0),
            }
        }
    }

    impl Transport for Recording {
        fn endpoint(&self) -> &Url {
            &self.endpoint
        }

        fn send(
            &self,
            payload: Vec<u8>,
            _headers: &Headers,
            _timeout: Duration,
        ) -> std::result::Result<String, TransportError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if payload == b"reject" {
                return Err(TransportError::rejected(500, "boom", payload));
            }
            self.seen.lock().unwrap().push(payload);
            Ok(String::new())
        }
    }

    #[test]
    fn test_flush_waits_for_preceding_jobs() {
        let transport = Arc::new(Recording::new());
        let (sender, receiver) = crossbeam_channel::bounded(8);
        Worker::spawn(receiver, transport.clone(), Duration::from_secs(1)).unwrap();

        let payloads: [&[u8]; 3] = [b"one", b"reject", b"two"];
        for payload in payloads {
            let job = Job {
                payload: payload.to_vec(),
                headers: Headers::new(),
            };
            sender.send(WorkerMsg::Send(job)).unwrap();
        }

        let signal = Arc::new(FlushSignal::new());
        sender.send(WorkerMsg::Flush(signal.clone())).unwrap();
        assert!(signal.wait_timeout(Duration::from_secs(5)));

        assert_eq!(transport.calls.load(Ordering::SeqCst), 3);
        assert_eq!(
            *transport.seen.lock().unwrap(),
            vec![b"one".to_vec(), b"two".to_vec()]
        );
    }

    #[test]
    fn test_flush_signal_times_out_without_worker() {
        let signal = FlushSignal::new();
        assert!(!signal.wait_timeout(Duration::from_millis(10)));
    }
}
