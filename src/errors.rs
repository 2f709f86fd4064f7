// src/errors.rs

// error handling for the code usage tracker

// dependencies
use thiserror::Error;

use crate::clock::ClockError;
use crate::config::ConfigError;

/// Error type for CodeUsageTracker operations.
///
/// A replayed code is not an error: `use_code` reports it as `Ok(false)`.
/// Every variant here means the replay status could not be determined, and
/// callers must not authenticate the user on that path.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum TrackerError {
    /// The TOTP period could not be read from the configuration provider.
    #[error("TOTP period is unavailable: {0}")]
    ConfigurationUnavailable(#[source] ConfigError),
    /// The tracker configuration was rejected at construction.
    #[error("invalid tracker configuration: {0}")]
    Config(#[source] ConfigError),
    #[error("clock error occurred: {0}")]
    Clock(#[from] ClockError),
    /// The background eviction worker could not be started.
    #[error("failed to start eviction sweeper: {0}")]
    Sweeper(#[source] std::io::Error),
}
