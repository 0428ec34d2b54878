/**
 * Boundary between the monitored application and the delivery core.
 *
 * Host integrations (request-exception hooks, task-queue signals, panic
 * hooks) call `handle` with whatever they captured. Nothing that goes wrong
 * past this point reaches the application: resolution errors and panics are
 * logged and swallowed.
 */
use std::panic::{catch_unwind, AssertUnwindSafe};

use crate::registry::ClientRegistry;

/// A captured event, already serialized by the host integration.
#[derive(Debug, Clone)]
pub struct Captured {
    pub payload: Vec<u8>,

    /// Set when the captured error opted out of reporting.
    pub skip: bool,

    /// The host framework was running in debug mode.
    pub debug: bool,
}

impl Captured {
    pub fn new(payload: Vec<u8>) -> Self {
        Self {
            payload,
            skip: false,
            debug: false,
        }
    }
}

/**
 * Forwards `captured` to the registry's active client.
 *
 * Events raised while the host is in debug mode are dropped unless the
 * settings set `DEBUG`.
 */
pub fn handle(registry: &ClientRegistry, captured: Captured) {
    if captured.skip {
        return;
    }

    let result = catch_unwind(AssertUnwindSafe(|| {
        if captured.debug && registry.settings().disabled_in_debug(true) {
            tracing::debug!("host is in debug mode, event not reported");
            return Ok(());
        }

        registry
            .get_client(None)
            .map(|client| client.capture(captured.payload))
    }));

    match result {
        Ok(Ok(())) => {}
        Ok(Err(err)) => {
            tracing::error!("unable to process captured event: {err}");
        }
        Err(_) => {
            tracing::error!("capturing an event panicked, event dropped");
        }
    }
}
