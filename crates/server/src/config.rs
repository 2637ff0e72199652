//! Server configuration.
//!
//! Loaded from a TOML file, every field optional:
//!
//! ```toml
//! bind = "0.0.0.0:8080"
//! sink_capacity = 100
//! sector_delay_ms = 300
//! trial_delay_ms = 200
//! seed = 42
//! log_filter = "warn,pitlane=info"
//! ```
//!
//! Command-line flags override file values through the `with_*` setters.

use crate::error::ServerError;
use pitlane_core::{PacingConfig, SimEnv, DEFAULT_SINK_CAPACITY};
use serde::Deserialize;
use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;

fn default_bind() -> SocketAddr {
    SocketAddr::from(([0, 0, 0, 0], 8080))
}

fn default_sink_capacity() -> usize {
    DEFAULT_SINK_CAPACITY
}

fn default_sector_delay_ms() -> u64 {
    300
}

fn default_trial_delay_ms() -> u64 {
    200
}

fn default_log_filter() -> String {
    "warn,pitlane=info".to_string()
}

/// Configuration of the observer server.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    /// Address to listen on.
    #[serde(default = "default_bind")]
    pub bind: SocketAddr,

    /// Capacity of each connection's event conduit.
    #[serde(default = "default_sink_capacity")]
    pub sink_capacity: usize,

    /// Simulated transit time per ring sector.
    #[serde(default = "default_sector_delay_ms")]
    pub sector_delay_ms: u64,

    /// Simulated time per parallel trial.
    #[serde(default = "default_trial_delay_ms")]
    pub trial_delay_ms: u64,

    /// Fixed seed for reproducible durations. Fresh entropy when absent.
    #[serde(default)]
    pub seed: Option<u64>,

    /// `tracing` filter directives, used when `RUST_LOG` is unset.
    #[serde(default = "default_log_filter")]
    pub log_filter: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            sink_capacity: default_sink_capacity(),
            sector_delay_ms: default_sector_delay_ms(),
            trial_delay_ms: default_trial_delay_ms(),
            seed: None,
            log_filter: default_log_filter(),
        }
    }
}

impl ServerConfig {
    /// Load and validate a configuration file.
    pub fn load(path: &Path) -> Result<Self, ServerError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ServerError::ReadConfig {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&contents)
    }

    /// Parse and validate TOML text.
    pub fn from_toml(contents: &str) -> Result<Self, ServerError> {
        let config: Self = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Check invariants the deserializer cannot express.
    pub fn validate(&self) -> Result<(), ServerError> {
        if self.sink_capacity == 0 {
            return Err(ServerError::InvalidConfig(
                "sink_capacity must be >= 1".to_string(),
            ));
        }
        Ok(())
    }

    pub fn with_bind(mut self, bind: SocketAddr) -> Self {
        self.bind = bind;
        self
    }

    pub fn with_sink_capacity(mut self, capacity: usize) -> Self {
        self.sink_capacity = capacity;
        self
    }

    pub fn with_sector_delay(mut self, delay: Duration) -> Self {
        self.sector_delay_ms = delay.as_millis() as u64;
        self
    }

    pub fn with_trial_delay(mut self, delay: Duration) -> Self {
        self.trial_delay_ms = delay.as_millis() as u64;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_log_filter(mut self, filter: impl Into<String>) -> Self {
        self.log_filter = filter.into();
        self
    }

    pub fn pacing(&self) -> PacingConfig {
        PacingConfig::default()
            .with_sector_delay(Duration::from_millis(self.sector_delay_ms))
            .with_trial_delay(Duration::from_millis(self.trial_delay_ms))
    }

    /// The simulation environment shared by every connection.
    pub fn sim_env(&self) -> SimEnv {
        let env = match self.seed {
            Some(seed) => SimEnv::seeded(seed),
            None => SimEnv::realtime(),
        };
        env.with_pacing(self.pacing())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_file_is_default() {
        assert_eq!(ServerConfig::from_toml("").unwrap(), ServerConfig::default());
    }

    #[test]
    fn test_partial_file() {
        let config = ServerConfig::from_toml(
            r#"
            bind = "127.0.0.1:9000"
            sector_delay_ms = 50
            seed = 7
            "#,
        )
        .unwrap();

        assert_eq!(config.bind, "127.0.0.1:9000".parse::<SocketAddr>().unwrap());
        assert_eq!(config.sector_delay_ms, 50);
        assert_eq!(config.trial_delay_ms, 200);
        assert_eq!(config.seed, Some(7));
        assert_eq!(config.pacing().sector_delay, Duration::from_millis(50));
    }

    #[test]
    fn test_unknown_field_is_rejected() {
        assert!(matches!(
            ServerConfig::from_toml("port = 80"),
            Err(ServerError::ParseConfig(_))
        ));
    }

    #[test]
    fn test_zero_capacity_is_rejected() {
        assert!(matches!(
            ServerConfig::from_toml("sink_capacity = 0"),
            Err(ServerError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_setters_override() {
        let config = ServerConfig::default()
            .with_sink_capacity(8)
            .with_trial_delay(Duration::from_millis(5))
            .with_seed(3)
            .with_log_filter("debug");

        assert_eq!(config.sink_capacity, 8);
        assert_eq!(config.pacing().trial_delay, Duration::from_millis(5));
        assert_eq!(config.seed, Some(3));
        assert_eq!(config.log_filter, "debug");
    }

    #[test]
    fn test_missing_file() {
        let err = ServerConfig::load(Path::new("/nonexistent/pitlane.toml")).unwrap_err();
        assert!(matches!(err, ServerError::ReadConfig { .. }));
    }
}
