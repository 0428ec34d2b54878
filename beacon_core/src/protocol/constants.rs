/**
 * Agent-wide constants.
 *
 * These values identify the agent to the collector and appear in every
 * user-facing transport error.
 */
use std::time::Duration;

/// Name of the remote service, used in transport error messages.
pub const SERVICE_NAME: &str = "Beacon";

/// Agent version string sent as `User-Agent` on every request.
/// Derived at compile time from the `beacon_core` package version in `Cargo.toml`.
pub const AGENT_VERSION: &str = concat!("beacon-rust/", env!("CARGO_PKG_VERSION"));

/// Per-attempt deadline used when the settings do not specify `TIMEOUT`.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(20);

/// Client implementation used when the settings do not specify `CLIENT`.
pub const DEFAULT_CLIENT: &str = "threaded";

/// Response header carrying the collector's correlation token.
pub const CORRELATION_HEADER: &str = "location";
