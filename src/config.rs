//! YAML configuration file loading and validation.

use std::fs;
use std::path::Path;

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use tracing::info;

/// Operator configuration, read once at startup and immutable after.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Hostname fragments; a connection is forwarded when its SNI
    /// hostname contains one of them.
    pub rules: Vec<String>,

    /// Address to listen on (host:port).
    pub listen_addr: String,

    /// Front SOCKS5 proxy toggle. Accepted for config-file
    /// compatibility; the relay path does not use it.
    pub enable_socks5: bool,

    /// Front SOCKS5 proxy address. See `enable_socks5`.
    pub socks_addr: String,

    /// Forward every hostname, bypassing rule matching.
    pub allow_all_hosts: bool,
}

impl Config {
    /// Read and parse the config file, then validate it. Any failure
    /// here is fatal for the process.
    pub fn load(path: &Path) -> Result<Self> {
        let data = fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        let config: Config = serde_yaml::from_str(&data)
            .with_context(|| format!("failed to parse config file {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.rules.is_empty() && !self.allow_all_hosts {
            bail!("rules must not be empty unless allow_all_hosts is true");
        }
        Ok(())
    }

    /// One line per loaded rule plus the operating flags.
    pub fn log_startup(&self, debug_enabled: bool) {
        for rule in &self.rules {
            info!(rule = %rule, "loaded forward rule");
        }
        info!(enabled = debug_enabled, "debug mode");
        info!(enabled = self.enable_socks5, "front proxy");
        info!(enabled = self.allow_all_hosts, "allow all hosts");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_config(yaml: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(yaml.as_bytes()).unwrap();
        file
    }

    #[test]
    fn parses_full_config() {
        let file = write_config(
            "listen_addr: 0.0.0.0:443\n\
             rules:\n  - aa.com\n  - bb.org\n\
             enable_socks5: true\n\
             socks_addr: 127.0.0.1:1080\n\
             allow_all_hosts: false\n",
        );

        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.listen_addr, "0.0.0.0:443");
        assert_eq!(config.rules, vec!["aa.com", "bb.org"]);
        assert!(config.enable_socks5);
        assert_eq!(config.socks_addr, "127.0.0.1:1080");
        assert!(!config.allow_all_hosts);
    }

    #[test]
    fn missing_fields_default() {
        let file = write_config("listen_addr: 0.0.0.0:443\nallow_all_hosts: true\n");

        let config = Config::load(file.path()).unwrap();
        assert!(config.rules.is_empty());
        assert!(!config.enable_socks5);
        assert!(config.socks_addr.is_empty());
    }

    #[test]
    fn empty_rules_without_allow_all_is_rejected() {
        let file = write_config("listen_addr: 0.0.0.0:443\n");
        assert!(Config::load(file.path()).is_err());
    }

    #[test]
    fn empty_rules_with_allow_all_is_accepted() {
        let file = write_config("listen_addr: 0.0.0.0:443\nallow_all_hosts: true\n");
        assert!(Config::load(file.path()).is_ok());
    }

    #[test]
    fn unreadable_file_is_an_error() {
        assert!(Config::load(Path::new("/nonexistent/config.yaml")).is_err());
    }

    #[test]
    fn invalid_yaml_is_an_error() {
        let file = write_config("rules: [unterminated\n");
        assert!(Config::load(file.path()).is_err());
    }
}
