// src/config.rs

//! Configuration types for the code usage tracker

// dependencies
use std::env::{self, VarError};
use std::time::Duration;
use thiserror::Error;

/// Environment variable holding the TOTP period in seconds.
pub const PERIOD_ENV_VAR: &str = "TOTP_PERIOD";

/// Period used when the environment does not override it.
pub const DEFAULT_PERIOD_SECONDS: u64 = 30;

/// Interval between background eviction runs.
pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(60);

#[non_exhaustive]
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("configuration unavailable: {0}")]
    Unavailable(String),
    #[error("invalid integer in env var {0}")]
    ParseInt(String),
    #[error("TOTP period must be positive")]
    InvalidPeriod,
    #[error("sweep interval must be non-zero")]
    InvalidSweepInterval,
}

/// Source of the TOTP time-step length.
///
/// The tracker asks for the period on every `use_code` call, so providers
/// backed by reloadable configuration are picked up without a restart.
pub trait PeriodProvider: Send + Sync {
    /// Returns the TOTP period in seconds.
    fn period(&self) -> Result<u64, ConfigError>;
}

impl<F> PeriodProvider for F
where
    F: Fn() -> Result<u64, ConfigError> + Send + Sync,
{
    fn period(&self) -> Result<u64, ConfigError> {
        self()
    }
}

/// Static TOTP settings, the usual period provider.
#[derive(Debug, Clone)]
pub struct TotpSettings {
    period_seconds: u64,
}

impl TotpSettings {
    pub fn new(period_seconds: u64) -> Self {
        Self { period_seconds }
    }

    /// Reads the period from `TOTP_PERIOD`, falling back to 30 seconds only
    /// when the variable is unset.
    pub fn from_env() -> Result<Self, ConfigError> {
        let raw = match env::var(PERIOD_ENV_VAR) {
            Ok(raw) => Some(raw),
            Err(VarError::NotPresent) => None,
            Err(VarError::NotUnicode(_)) => {
                return Err(ConfigError::ParseInt(PERIOD_ENV_VAR.to_string()));
            }
        };
        let settings = Self::from_raw(raw)?;
        settings.validate()?;
        Ok(settings)
    }

    fn from_raw(raw: Option<String>) -> Result<Self, ConfigError> {
        let period_seconds = match raw {
            Some(raw) => raw
                .trim()
                .parse::<u64>()
                .map_err(|_| ConfigError::ParseInt(PERIOD_ENV_VAR.to_string()))?,
            None => DEFAULT_PERIOD_SECONDS,
        };
        Ok(Self { period_seconds })
    }

    /// Validate the settings
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.period_seconds == 0 {
            return Err(ConfigError::InvalidPeriod);
        }
        Ok(())
    }
}

impl Default for TotpSettings {
    fn default() -> Self {
        Self::new(DEFAULT_PERIOD_SECONDS)
    }
}

impl PeriodProvider for TotpSettings {
    fn period(&self) -> Result<u64, ConfigError> {
        self.validate()?;
        Ok(self.period_seconds)
    }
}

/// Configuration for tracker behavior
#[derive(Debug, Clone)]
pub struct TrackerConfig {
    pub(crate) sweep_interval: Duration,
}

impl TrackerConfig {
    pub fn new() -> Self {
        Self {
            sweep_interval: DEFAULT_SWEEP_INTERVAL,
        }
    }

    /// Builder-style: set how often the background sweeper runs
    pub fn sweep_interval(mut self, sweep_interval: Duration) -> Self {
        self.sweep_interval = sweep_interval;
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.sweep_interval.is_zero() {
            return Err(ConfigError::InvalidSweepInterval);
        }
        Ok(())
    }
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self::new()
    }
}
