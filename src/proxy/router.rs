//! Routing policy: decide whether and where to forward a connection.

use std::sync::Arc;

use crate::config::Config;

/// Destination port for every backend dial.
pub const FORWARD_PORT: u16 = 443;

/// Outcome of a routing decision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteDecision {
    /// Forward the connection to `target` (host:port).
    Forward { target: String },
    /// Close the connection without forwarding.
    Drop,
}

/// Routing policy built once at startup and shared read-only across
/// all connection tasks.
#[derive(Debug)]
pub struct Router {
    allow_all_hosts: bool,
    rules: Vec<String>,
    forward_port: u16,
}

impl Router {
    pub fn new(allow_all_hosts: bool, rules: Vec<String>, forward_port: u16) -> Self {
        Self {
            allow_all_hosts,
            rules,
            forward_port,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.allow_all_hosts, config.rules.clone(), FORWARD_PORT)
    }

    /// Decide forwarding for an extracted hostname.
    ///
    /// With allow-all enabled every hostname is forwarded. Otherwise
    /// rules are evaluated in configured order as case-sensitive
    /// substring containment, and the first match wins so a hostname
    /// matching several rules still forwards exactly once.
    pub fn decide(&self, server_name: &str) -> RouteDecision {
        if self.allow_all_hosts {
            return self.forward(server_name);
        }
        for rule in &self.rules {
            if server_name.contains(rule.as_str()) {
                return self.forward(server_name);
            }
        }
        RouteDecision::Drop
    }

    fn forward(&self, server_name: &str) -> RouteDecision {
        RouteDecision::Forward {
            target: format!("{}:{}", server_name, self.forward_port),
        }
    }
}

/// Shared router reference.
pub type SharedRouter = Arc<Router>;

#[cfg(test)]
mod tests {
    use super::*;

    fn forward_to(target: &str) -> RouteDecision {
        RouteDecision::Forward {
            target: target.to_string(),
        }
    }

    #[test]
    fn allow_all_forwards_everything() {
        let router = Router::new(true, vec![], FORWARD_PORT);
        assert_eq!(router.decide("example.com"), forward_to("example.com:443"));
        assert_eq!(router.decide("bb.com"), forward_to("bb.com:443"));
    }

    #[test]
    fn allow_all_ignores_rules() {
        let router = Router::new(true, vec!["aa.com".to_string()], FORWARD_PORT);
        assert_eq!(router.decide("bb.com"), forward_to("bb.com:443"));
    }

    #[test]
    fn rule_matches_by_containment() {
        let router = Router::new(false, vec!["aa.com".to_string()], FORWARD_PORT);
        assert_eq!(router.decide("www.aa.com"), forward_to("www.aa.com:443"));
        assert_eq!(router.decide("shop.aa.com"), forward_to("shop.aa.com:443"));
        assert_eq!(router.decide("bb.com"), RouteDecision::Drop);
    }

    #[test]
    fn matching_is_case_sensitive() {
        let router = Router::new(false, vec!["aa.com".to_string()], FORWARD_PORT);
        assert_eq!(router.decide("www.AA.com"), RouteDecision::Drop);
    }

    #[test]
    fn overlapping_rules_forward_once() {
        let router = Router::new(
            false,
            vec!["aa.com".to_string(), "www".to_string()],
            FORWARD_PORT,
        );
        assert_eq!(router.decide("www.aa.com"), forward_to("www.aa.com:443"));
    }

    #[test]
    fn forward_port_is_configurable_for_the_router() {
        let router = Router::new(true, vec![], 8443);
        assert_eq!(router.decide("example.com"), forward_to("example.com:8443"));
    }
}
