/**
 * Request headers that accompany a payload.
 *
 * Transports pass `Headers` through unchanged; this module only knows how to
 * build the agent's default set from a `Config`.
 */
use std::collections::BTreeMap;

use crate::config::Config;
use crate::protocol::constants::AGENT_VERSION;

/// Header name → header value, sent as-is with a single request.
pub type Headers = BTreeMap<String, String>;

/**
 * Builds the headers every capture carries:
 * - `User-Agent` — agent name and version
 * - `Content-Type` — payloads are opaque bytes to the transport
 * - `Authorization` — bearer secret token, only when one is configured
 */
pub fn default_headers(config: &Config) -> Headers {
    let mut headers = Headers::new();
    headers.insert("User-Agent".into(), AGENT_VERSION.into());
    headers.insert("Content-Type".into(), "application/octet-stream".into());

    if let Some(token) = config.secret_token.as_deref().filter(|t| !t.is_empty()) {
        headers.insert("Authorization".into(), format!("Bearer {token}"));
    }

    headers
}
