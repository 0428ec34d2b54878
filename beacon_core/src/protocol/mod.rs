/*!
 * Protocol layer — constants and headers.
 *
 * Everything related to *what* accompanies a payload on the wire:
 * - `constants` — SERVICE_NAME, AGENT_VERSION, defaults
 * - `headers` — the `Headers` map and the agent's default header set
 */

pub mod constants;
pub mod headers;
