/**
 * Agent configuration.
 *
 * `Config` is the flat record that a host integration resolves from its own
 * settings and passes into client construction. Keys follow the host's
 * settings dictionary (`SERVERS`, `TIMEOUT`, `SECRET_TOKEN`, ...), so a
 * settings document can be deserialized directly.
 *
 * Only four fields are consumed by the delivery core: `client`, the first
 * entry of `servers`, `timeout`, and `secret_token`. The rest travels with
 * the client for the benefit of payload producers.
 *
 * # Example
 * ```ignore
 * let config = beacon_core::Config::from_json(r#"{
 *     "SERVERS": ["https://intake.example.com"],
 *     "SECRET_TOKEN": "s3cret",
 *     "TIMEOUT": 2.5
 * }"#)?;
 * ```
 */
use std::time::Duration;

use serde::{Deserialize, Deserializer};
use url::Url;

use crate::error::{Error, Result};
use crate::protocol::constants::{DEFAULT_CLIENT, DEFAULT_TIMEOUT};

#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "SCREAMING_SNAKE_CASE")]
pub struct Config {
    /// Collector base addresses. The first one receives every send.
    #[serde(deserialize_with = "null_as_default")]
    pub servers: Vec<String>,

    #[serde(deserialize_with = "null_as_default")]
    pub include_paths: Vec<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub exclude_paths: Vec<String>,

    /// Per-attempt deadline, given in (possibly fractional) seconds.
    /// `null` means the default deadline.
    #[serde(deserialize_with = "deserialize_secs")]
    pub timeout: Duration,

    pub hostname: Option<String>,
    pub auto_log_stacks: bool,

    #[serde(rename = "MAX_LENGTH_STRING")]
    pub string_max_length: usize,

    #[serde(rename = "MAX_LENGTH_LIST")]
    pub list_max_length: usize,

    pub organization_id: Option<String>,
    pub app_id: Option<String>,

    /// Sent as a bearer token on every request.
    pub secret_token: Option<String>,

    /// Client implementation identifier, resolved by `ClientRegistry`.
    pub client: Option<String>,

    pub transport_class: Option<String>,

    #[serde(deserialize_with = "null_as_default")]
    pub processors: Vec<String>,

    #[serde(rename = "TRACES_SEND_FREQ_SEC")]
    pub traces_send_freq_secs: u64,

    /// When true, the threaded client hands sends to its background worker.
    pub async_mode: bool,

    pub instrument_middleware: bool,

    /// Report events even while the host runs in debug mode.
    pub debug: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            servers: Vec::new(),
            include_paths: Vec::new(),
            exclude_paths: Vec::new(),
            timeout: DEFAULT_TIMEOUT,
            hostname: None,
            auto_log_stacks: true,
            string_max_length: 200,
            list_max_length: 50,
            organization_id: None,
            app_id: None,
            secret_token: None,
            client: None,
            transport_class: None,
            processors: Vec::new(),
            traces_send_freq_secs: 60,
            async_mode: true,
            instrument_middleware: true,
            debug: false,
        }
    }
}

impl Config {
    /**
     * Parses a JSON settings document.
     *
     * Absent and `null` keys take their defaults. The deprecated `ASYNC` key
     * is still honoured, with a warning, and overrides `ASYNC_MODE`.
     */
    pub fn from_json(document: &str) -> Result<Self> {
        let mut settings: serde_json::Value = serde_json::from_str(document)?;

        if let Some(map) = settings.as_object_mut() {
            map.retain(|_, value| !value.is_null());

            if let Some(value) = map.remove("ASYNC") {
                tracing::warn!("the ASYNC setting is deprecated, use ASYNC_MODE");
                map.insert("ASYNC_MODE".into(), value);
            }
        }

        Ok(serde_json::from_value(settings)?)
    }

    /// The collector endpoint: the first configured server, parsed.
    pub fn endpoint(&self) -> Result<Url> {
        let server = self
            .servers
            .first()
            .ok_or_else(|| Error::Config("SERVERS must contain at least one address".into()))?;

        Url::parse(server).map_err(|e| Error::Config(format!("invalid server address {server:?}: {e}")))
    }

    /// The configured client identifier, or the default one when unset.
    pub fn client_identifier(&self) -> &str {
        self.client.as_deref().unwrap_or(DEFAULT_CLIENT)
    }

    /// True when the host runs in debug mode and `DEBUG` does not opt back in.
    pub fn disabled_in_debug(&self, host_debug: bool) -> bool {
        host_debug && !self.debug
    }
}

fn deserialize_secs<'de, D>(deserializer: D) -> std::result::Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<f64>::deserialize(deserializer)? {
        Some(secs) => Duration::try_from_secs_f64(secs).map_err(serde::de::Error::custom),
        None => Ok(DEFAULT_TIMEOUT),
    }
}

fn null_as_default<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
