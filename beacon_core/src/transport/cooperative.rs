/*!
 * Cooperative HTTP transport for single-threaded async schedulers.
 *
 * `send` suspends at exactly one point: awaiting whichever finishes first,
 * the response (status, headers and body) or the deadline timer. The two are
 * raced with `tokio::time::timeout`; whichever loses is dropped. Dropping the
 * request future aborts the in-flight request and hands its connection back
 * to the session, so nothing leaks when the timer wins.
 */

use std::time::Duration;

use url::Url;

use super::{decode, is_success, AsyncTransport, UNREADABLE_BODY};
use crate::error::{Error, Result, TransportError};
use crate::protocol::constants::CORRELATION_HEADER;
use crate::protocol::headers::Headers;

/**
 * Owns one `reqwest::Client` session for its whole lifetime.
 *
 * The session pools connections across sends and is never shared with other
 * transport instances. It does not follow redirects, so one send is one
 * request. Concurrent `send` calls on the same instance are fine;
 * each carries its own deadline.
 */
#[derive(Clone)]
pub struct AsyncHttpTransport {
    session: reqwest::Client,
    endpoint: Url,
}

/// What a single attempt produced, before the payload is attached.
enum Outcome {
    Accepted(String),
    Rejected(u16, String),
    Unreachable(reqwest::Error),
}

impl AsyncHttpTransport {
    pub fn new(endpoint: Url) -> Result<Self> {
        let session = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .map_err(|e| Error::Http(format!("failed to create HTTP session: {e}")))?;

        Ok(Self { session, endpoint })
    }

    async fn attempt(&self, body: Vec<u8>, headers: &Headers) -> Outcome {
        let mut request = self.session.post(self.endpoint.clone()).body(body);
        for (name, value) in headers {
            request = request.header(name.as_str(), value.as_str());
        }

        let response = match request.send().await {
            Ok(response) => response,
            Err(err) => return Outcome::Unreachable(err),
        };

        let status = response.status().as_u16();
        if is_success(status) {
            let token = response
                .headers()
                .get(CORRELATION_HEADER)
                .map(|value| decode(value.as_bytes()))
                .unwrap_or_default();
            return Outcome::Accepted(token);
        }

        let text = match response.bytes().await {
            Ok(bytes) => decode(&bytes),
            Err(_) => UNREADABLE_BODY.to_string(),
        };
        Outcome::Rejected(status, text)
    }
}

impl AsyncTransport for AsyncHttpTransport {
    fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    async fn send(
        &self,
        payload: Vec<u8>,
        headers: &Headers,
        timeout: Duration,
    ) -> std::result::Result<String, TransportError> {
        let attempt = self.attempt(payload.clone(), headers);

        match tokio::time::timeout(timeout, attempt).await {
            Err(_elapsed) => Err(TransportError::timed_out(payload)),
            Ok(Outcome::Accepted(token)) => Ok(token),
            Ok(Outcome::Rejected(status, text)) => {
                Err(TransportError::rejected(status, &text, payload))
            }
            Ok(Outcome::Unreachable(err)) if err.is_timeout() => {
                Err(TransportError::timed_out(payload))
            }
            Ok(Outcome::Unreachable(err)) => Err(TransportError::connection_failed(err, payload)),
        }
    }
}
