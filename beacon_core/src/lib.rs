/*!
 * Beacon Core — delivery of monitoring events to the Beacon collector.
 *
 * A host integration serializes an event, hands the bytes to a client, and
 * the client's transport makes exactly one HTTP attempt to deliver them.
 *
 * # Module structure
 *
 * - `error` — `TransportError` taxonomy and the crate `Error`
 * - `config` — the flat settings record consumed by clients
 * - `protocol/` — constants and request headers
 * - `transport/` — transport contracts, blocking and cooperative HTTP
 *   transports, background worker
 * - `client` — `ThreadedClient` and `CooperativeClient`
 * - `registry` — resolves and caches the active client
 * - `handler` — boundary that keeps delivery failures away from the app
 *
 * # Quick start
 *
 * ```ignore
 * let registry = beacon_core::ClientRegistry::new(|| beacon_core::Config {
 *     servers: vec!["https://intake.example.com".into()],
 *     ..Default::default()
 * });
 *
 * beacon_core::handle(&registry, beacon_core::Captured::new(payload));
 * ```
 */

pub mod client;
pub mod config;
pub mod error;
pub mod handler;
pub mod protocol;
pub mod registry;
pub mod transport;

// ---------------------------------------------------------------------------
// Re-exports
// ---------------------------------------------------------------------------

pub use client::{Client, CooperativeClient, ThreadedClient};
pub use config::Config;
pub use error::{Error, Result, TransportError, TransportErrorKind};
pub use handler::{handle, Captured};
pub use protocol::constants::{AGENT_VERSION, DEFAULT_CLIENT, SERVICE_NAME};
pub use protocol::headers::Headers;
pub use registry::{ClientFactory, ClientRegistry};
pub use transport::{AsyncHttpTransport, AsyncTransport, HttpTransport, Transport};
