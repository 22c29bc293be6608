//! Runtime Configuration
//!
//! Each thread owns its own runtime, so configuration is installed per thread
//! with [`Runtime::configure`](crate::Runtime::configure).

use serde::{Deserialize, Serialize};

/// Default bound on propagation passes within one batch.
pub const DEFAULT_MAX_ITERATIONS: usize = 100_000;

/// Tunables for the propagation engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Passes allowed in one batch before [`Error::Runaway`](crate::Error::Runaway)
    /// is raised.
    pub max_iterations: usize,

    /// Emit a warning when a computation or cleanup is registered with no
    /// owner able to dispose of it.
    pub warn_unowned: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_iterations: DEFAULT_MAX_ITERATIONS,
            warn_unowned: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_take_defaults() {
        let config: Config = serde_json::from_str(r#"{ "max_iterations": 50 }"#).unwrap();
        assert_eq!(config.max_iterations, 50);
        assert!(config.warn_unowned);
    }

    #[test]
    fn round_trips_through_json() {
        let config = Config {
            max_iterations: 12,
            warn_unowned: false,
        };
        let json = serde_json::to_string(&config).unwrap();
        assert_eq!(serde_json::from_str::<Config>(&json).unwrap(), config);
    }
}
