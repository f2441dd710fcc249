//! Configuration for ReelDB
//!
//! Centralized configuration with sensible defaults.

use std::path::PathBuf;
use std::time::Duration;

use crate::error::{ReelError, Result};

/// Main configuration for a ReelDB server
#[derive(Debug, Clone)]
pub struct Config {
    // -------------------------------------------------------------------------
    // Store Configuration
    // -------------------------------------------------------------------------
    /// SQLite database file shared by every connection.
    /// Each worker opens its own handle on it.
    pub db_path: PathBuf,

    /// How long a store handle waits on a locked database before failing
    /// (milliseconds)
    pub busy_timeout_ms: u64,

    // -------------------------------------------------------------------------
    // Network Configuration
    // -------------------------------------------------------------------------
    /// TCP listen address
    pub listen_addr: String,

    /// Max concurrent client connections (0 = unbounded)
    pub max_connections: usize,

    /// Connection read timeout (milliseconds, 0 = block forever)
    pub read_timeout_ms: u64,

    /// How often the accept loop checks for shutdown (milliseconds)
    pub accept_poll_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from("streaming.db"),
            busy_timeout_ms: 5000,
            listen_addr: "0.0.0.0:7080".to_string(),
            max_connections: 1024,
            read_timeout_ms: 0,
            accept_poll_ms: 50,
        }
    }
}

impl Config {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Check the values that would otherwise fail late, at bind or open time
    pub fn validate(&self) -> Result<()> {
        if self.listen_addr.trim().is_empty() {
            return Err(ReelError::Config("listen address is empty".to_string()));
        }
        if self.busy_timeout_ms == 0 {
            return Err(ReelError::Config(
                "busy timeout must be positive, concurrent writers would fail immediately"
                    .to_string(),
            ));
        }
        if self.accept_poll_ms == 0 {
            return Err(ReelError::Config("accept poll interval must be positive".to_string()));
        }
        Ok(())
    }

    pub fn busy_timeout(&self) -> Duration {
        Duration::from_millis(self.busy_timeout_ms)
    }

    /// Read deadline for connections, if any
    pub fn read_timeout(&self) -> Option<Duration> {
        (self.read_timeout_ms > 0).then(|| Duration::from_millis(self.read_timeout_ms))
    }

    pub fn accept_poll(&self) -> Duration {
        Duration::from_millis(self.accept_poll_ms)
    }
}

/// Builder for Config
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Set the database file path
    pub fn db_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.db_path = path.into();
        self
    }

    /// Set the store busy timeout (in milliseconds)
    pub fn busy_timeout_ms(mut self, ms: u64) -> Self {
        self.config.busy_timeout_ms = ms;
        self
    }

    /// Set the TCP listen address
    pub fn listen_addr(mut self, addr: impl Into<String>) -> Self {
        self.config.listen_addr = addr.into();
        self
    }

    /// Set the maximum number of concurrent connections
    pub fn max_connections(mut self, count: usize) -> Self {
        self.config.max_connections = count;
        self
    }

    /// Set the read timeout (in milliseconds)
    pub fn read_timeout_ms(mut self, ms: u64) -> Self {
        self.config.read_timeout_ms = ms;
        self
    }

    /// Set the accept loop poll interval (in milliseconds)
    pub fn accept_poll_ms(mut self, ms: u64) -> Self {
        self.config.accept_poll_ms = ms;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.read_timeout(), None);
    }

    #[test]
    fn test_builder_overrides() {
        let config = Config::builder()
            .listen_addr("127.0.0.1:0")
            .max_connections(4)
            .read_timeout_ms(250)
            .build();

        assert_eq!(config.listen_addr, "127.0.0.1:0");
        assert_eq!(config.max_connections, 4);
        assert_eq!(config.read_timeout(), Some(Duration::from_millis(250)));
    }

    #[test]
    fn test_validate_rejects_zero_busy_timeout() {
        let config = Config::builder().busy_timeout_ms(0).build();
        assert!(matches!(config.validate(), Err(ReelError::Config(_))));
    }
}
