//! Shared helpers for integration tests: a stub collector and logging setup.
#![allow(dead_code)]

use std::collections::HashMap;
use std::io::{BufRead, BufReader, Read, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use tracing_subscriber::EnvFilter;
use url::Url;

/// Logs to the test writer, filtered by `RUST_LOG`.
pub fn init_test_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Canned answer served for every request.
#[derive(Clone)]
pub struct StubResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
    pub delay: Duration,

    /// Extra wait between the response head and its body.
    pub body_delay: Duration,
}

impl StubResponse {
    pub fn status(status: u16) -> Self {
        Self {
            status,
            headers: Vec::new(),
            body: Vec::new(),
            delay: Duration::ZERO,
            body_delay: Duration::ZERO,
        }
    }

    pub fn header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn body(mut self, body: &[u8]) -> Self {
        self.body = body.to_vec();
        self
    }

    pub fn delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn body_delay(mut self, delay: Duration) -> Self {
        self.body_delay = delay;
        self
    }
}

/// What the stub saw. Header names are lowercased.
#[derive(Clone, Debug)]
pub struct RecordedRequest {
    pub method: String,
    pub path: String,
    pub headers: HashMap<String, String>,
    pub body: Vec<u8>,
}

/**
 * Minimal HTTP/1.1 collector on a random local port.
 *
 * Each connection is served on its own thread: one request is read and
 * recorded, then the canned response is written after `delay` and the
 * connection is closed.
 *
 * When `delay` is set, the stub checks whether the client hung up while it
 * was waiting and counts such connections as abandoned.
 */
pub struct StubServer {
    url: Url,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
    abandoned: Arc<AtomicUsize>,
}

impl StubServer {
    pub fn start(response: StubResponse) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind stub server");
        let port = listener.local_addr().expect("local addr").port();
        let requests = Arc::new(Mutex::new(Vec::new()));
        let abandoned = Arc::new(AtomicUsize::new(0));

        let recorded = requests.clone();
        let hung_up = abandoned.clone();
        thread::spawn(move || {
            for stream in listener.incoming() {
                let Ok(stream) = stream else { continue };
                let response = response.clone();
                let recorded = recorded.clone();
                let hung_up = hung_up.clone();
                thread::spawn(move || serve(stream, &response, &recorded, &hung_up));
            }
        });

        Self {
            url: Url::parse(&format!("http://127.0.0.1:{port}")).expect("stub url"),
            requests,
            abandoned,
        }
    }

    pub fn url(&self) -> Url {
        self.url.clone()
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }

    /// Connections the client closed before the delayed response was sent.
    pub fn abandoned(&self) -> usize {
        self.abandoned.load(Ordering::SeqCst)
    }
}

/// True when the peer has closed its side: EOF or a reset on read.
fn peer_closed(stream: &mut TcpStream) -> bool {
    if stream.set_read_timeout(Some(Duration::from_millis(50))).is_err() {
        return false;
    }
    let mut peek = [0u8; 1];
    match stream.read(&mut peek) {
        Ok(0) => true,
        Ok(_) => false,
        Err(e) => !matches!(
            e.kind(),
            std::io::ErrorKind::WouldBlock | std::io::ErrorKind::TimedOut
        ),
    }
}

fn serve(
    stream: TcpStream,
    response: &StubResponse,
    recorded: &Mutex<Vec<RecordedRequest>>,
    abandoned: &AtomicUsize,
) {
    let mut reader = BufReader::new(stream);

    let mut request_line = String::new();
    if reader.read_line(&mut request_line).is_err() {
        return;
    }
    let mut parts = request_line.split_whitespace();
    let method = parts.next().unwrap_or_default().to_string();
    let path = parts.next().unwrap_or_default().to_string();

    let mut headers = HashMap::new();
    loop {
        let mut line = String::new();
        match reader.read_line(&mut line) {
            Ok(0) | Err(_) => return,
            Ok(_) => {}
        }
        let line = line.trim_end();
        if line.is_empty() {
            break;
        }
        if let Some((name, value)) = line.split_once(':') {
            headers.insert(name.trim().to_ascii_lowercase(), value.trim().to_string());
        }
    }

    let length = headers
        .get("content-length")
        .and_then(|v| v.parse::<usize>().ok())
        .unwrap_or(0);
    let mut body = vec![0; length];
    if reader.read_exact(&mut body).is_err() {
        return;
    }

    recorded.lock().unwrap().push(RecordedRequest {
        method,
        path,
        headers,
        body,
    });

    let mut stream = reader.into_inner();

    if !response.delay.is_zero() {
        thread::sleep(response.delay);
        if peer_closed(&mut stream) {
            abandoned.fetch_add(1, Ordering::SeqCst);
            return;
        }
    }

    let mut head = format!(
        "HTTP/1.1 {} Stub\r\nContent-Length: {}\r\nConnection: close\r\n",
        response.status,
        response.body.len()
    );
    for (name, value) in &response.headers {
        head.push_str(&format!("{name}: {value}\r\n"));
    }
    head.push_str("\r\n");

    let _ = stream.write_all(head.as_bytes());
    let _ = stream.flush();
    thread::sleep(response.body_delay);
    let _ = stream.write_all(&response.body);
    let _ = stream.flush();
}

/// An address nothing is listening on.
pub fn unreachable_url() -> Url {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let port = listener.local_addr().expect("local addr").port();
    drop(listener);
    Url::parse(&format!("http://127.0.0.1:{port}")).expect("url")
}

pub fn headers(pairs: &[(&str, &str)]) -> beacon_core::Headers {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}
