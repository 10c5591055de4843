//! Configuration for the planning server
//!
//! Loaded from a TOML file; every section falls back to its default when
//! omitted.

use crate::common::ServerResult;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::broker::local::DEFAULT_QUEUE_CAPACITY;
use crate::broker::NamePath;

/// Top-level server configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerConfig {
    pub logging: LoggingConfig,
    pub naming: NamingConfig,
    pub domain: DomainConfig,
    pub broker: BrokerConfig,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default log level (trace, debug, info, warn, error), overridden by
    /// `RUST_LOG`
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: "info".to_string() }
    }
}

/// Naming context under which the service objects are bound
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct NamingConfig {
    pub context_id: String,
    pub context_kind: String,
}

impl NamingConfig {
    pub fn context_path(&self) -> NamePath {
        NamePath::single(self.context_id.clone(), self.context_kind.clone())
    }
}

impl Default for NamingConfig {
    fn default() -> Self {
        Self {
            context_id: "hpp".to_string(),
            context_kind: "corbaserver".to_string(),
        }
    }
}

/// Serving domain
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DomainConfig {
    /// Name of the child adapter hosting the service objects
    pub name: String,
}

impl Default for DomainConfig {
    fn default() -> Self {
        Self { name: "child".to_string() }
    }
}

/// In-process broker
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct BrokerConfig {
    /// Calls that may wait for dispatch before callers get `QueueFull`
    pub queue_capacity: usize,
}

impl Default for BrokerConfig {
    fn default() -> Self {
        Self { queue_capacity: DEFAULT_QUEUE_CAPACITY }
    }
}

impl ServerConfig {
    /// Load configuration from TOML file
    ///
    /// # Example
    /// ```no_run
    /// use planner_server::config::ServerConfig;
    ///
    /// let config = ServerConfig::from_file("planner-server.toml")?;
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn from_file<P: AsRef<Path>>(path: P) -> ServerResult<Self> {
        let contents = fs::read_to_string(path)?;
        let config: ServerConfig = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Save configuration to TOML file
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> ServerResult<()> {
        let contents = toml::to_string_pretty(self)?;
        fs::write(path, contents)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::ServerError;

    #[test]
    fn test_default_config() {
        let config = ServerConfig::default();
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.naming.context_id, "hpp");
        assert_eq!(config.naming.context_kind, "corbaserver");
        assert_eq!(config.domain.name, "child");
        assert_eq!(config.broker.queue_capacity, 64);
        assert_eq!(config.naming.context_path().to_string(), "hpp.corbaserver");
    }

    #[test]
    fn test_toml_serialization() {
        let config = ServerConfig::default();
        let toml_string = toml::to_string_pretty(&config).unwrap();

        assert!(toml_string.contains("[logging]"));
        assert!(toml_string.contains("[naming]"));
        assert!(toml_string.contains("[domain]"));
        assert!(toml_string.contains("[broker]"));
        assert!(toml_string.contains("context_kind = \"corbaserver\""));
        assert!(toml_string.contains("queue_capacity = 64"));
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let toml_content = r#"
[logging]
level = "debug"

[naming]
context_id = "planner"
"#;

        let config: ServerConfig = toml::from_str(toml_content).unwrap();
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.naming.context_id, "planner");
        assert_eq!(config.naming.context_kind, "corbaserver");
        assert_eq!(config.domain.name, "child");
    }

    #[test]
    fn test_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("server.toml");
        let mut config = ServerConfig::default();
        config.broker.queue_capacity = 8;
        config.to_file(&path).unwrap();

        let loaded = ServerConfig::from_file(&path).unwrap();
        assert_eq!(loaded.broker.queue_capacity, 8);
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = ServerConfig::from_file(dir.path().join("absent.toml"));
        assert!(matches!(result, Err(ServerError::Io(_))));
    }

    #[test]
    fn test_malformed_file_is_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.toml");
        fs::write(&path, "[broker]\nqueue_capacity = \"many\"\n").unwrap();
        assert!(matches!(ServerConfig::from_file(&path), Err(ServerError::Config(_))));
    }
}
