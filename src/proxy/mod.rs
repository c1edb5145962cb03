//! L4 TCP relay with SNI-based routing.
//!
//! ```text
//! Client -> Listener -> SNI probe -> Router -> Relay -> Backend
//! ```
//!
//! The listener accepts connections and spawns a task per connection;
//! the task captures an initial probe, extracts the SNI hostname,
//! asks the router for a destination, replays the probe to the backend
//! and copies bytes both ways until either side closes.

mod listener;
mod relay;
mod router;
mod sni;

pub use listener::{Listener, SESSION_DEADLINE};
pub use relay::relay;
pub use router::{RouteDecision, Router, SharedRouter, FORWARD_PORT};
pub use sni::{extract_sni, read_probe, MAX_PROBE_BYTES};
