//! SNI-routing TLS passthrough relay.
//!
//! Inspects the plaintext SNI field of the TLS ClientHello on freshly
//! accepted TCP connections, without terminating TLS, and relays the
//! connection to `<hostname>:443` when the operator's rules (or the
//! allow-all flag) permit it.

pub mod config;
pub mod logging;
pub mod proxy;
pub mod server;

pub use config::Config;
pub use proxy::{
    extract_sni, read_probe, Listener, RouteDecision, Router, SharedRouter, FORWARD_PORT,
    MAX_PROBE_BYTES, SESSION_DEADLINE,
};
