/*!
 * Blocking HTTP transport.
 *
 * Uses `ureq` — a pure-Rust blocking HTTP client with no async runtime.
 * It is meant to run on a dedicated worker thread, so blocking I/O never
 * stalls a cooperative scheduler sharing the process.
 */

use std::io;
use std::time::Duration;

use ureq::Agent;
use url::Url;

use super::{decode, is_success, Transport, UNREADABLE_BODY};
use crate::error::TransportError;
use crate::protocol::constants::CORRELATION_HEADER;
use crate::protocol::headers::Headers;

/**
 * Thin wrapper around `ureq::Agent`.
 *
 * The agent is created once and reused for every send, so connection pooling
 * and keep-alive are handled by `ureq` internally. Each request gets its own
 * global timeout from the `send` call.
 */
pub struct HttpTransport {
    agent: Agent,
    endpoint: Url,
}

impl HttpTransport {
    pub fn new(endpoint: Url) -> Self {
        /*
         * Redirects are not followed: a 3xx is a rejection like any other
         * non-2xx, and a send never issues more than one request.
         */
        let agent: Agent = Agent::config_builder()
            .http_status_as_error(false)
            .max_redirects(0)
            .max_redirects_will_error(false)
            .build()
            .into();

        Self { agent, endpoint }
    }
}

impl Transport for HttpTransport {
    fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    fn send(
        &self,
        payload: Vec<u8>,
        headers: &Headers,
        timeout: Duration,
    ) -> Result<String, TransportError> {
        let mut request = self
            .agent
            .post(self.endpoint.as_str())
            .config()
            .timeout_global(Some(timeout))
            .build();

        for (name, value) in headers {
            request = request.header(name.as_str(), value.as_str());
        }

        let mut response = match request.send(payload.as_slice()) {
            Ok(response) => response,
            Err(err) if is_timeout(&err) => return Err(TransportError::timed_out(payload)),
            Err(err) => return Err(TransportError::connection_failed(err, payload)),
        };

        let status = response.status().as_u16();
        if is_success(status) {
            let token = response
                .headers()
                .get(CORRELATION_HEADER)
                .map(|value| decode(value.as_bytes()))
                .unwrap_or_default();
            return Ok(token);
        }

        /*
         * The deadline also covers reading the rejection body.
         */
        let body = match response.body_mut().read_to_vec() {
            Ok(bytes) => decode(&bytes),
            Err(err) if is_timeout(&err) => return Err(TransportError::timed_out(payload)),
            Err(_) => UNREADABLE_BODY.to_string(),
        };

        Err(TransportError::rejected(status, &body, payload))
    }
}

fn is_timeout(err: &ureq::Error) -> bool {
    match err {
        ureq::Error::Timeout(_) => true,
        ureq::Error::Io(io_err) => io_err.kind() == io::ErrorKind::TimedOut,
        _ => false,
    }
}
