// src/lib.rs

//! # TOTP Replay Guard
//!
//! Per-user replay protection for time-based one-time passwords. Once a code
//! has been accepted for a user, resubmitting the same code is rejected for
//! two TOTP periods, after which the underlying algorithm would no longer
//! validate it anyway.
//!
//! Validating the code against the user's secret is the caller's job; the
//! tracker only decides whether an otherwise-valid code is being replayed.
//!
//! ## Quick Example
//!
//! ```rust
//! use totp_replay_guard::{CodeUsageTracker, TotpSettings};
//!
//! let tracker = CodeUsageTracker::new(TotpSettings::new(30))?;
//!
//! assert!(tracker.use_code("alice", "123456")?);
//! assert!(!tracker.use_code("alice", "123456")?); // replay
//! assert!(tracker.use_code("bob", "123456")?);
//!
//! // during application teardown
//! tracker.shutdown();
//! # Ok::<(), totp_replay_guard::TrackerError>(())
//! ```

// private modules
mod clock;
mod config;
mod errors;
mod sweeper;
mod tracker;

// public API exports
pub use clock::{Clock, ClockError, SystemClock};
pub use config::{
    ConfigError, DEFAULT_PERIOD_SECONDS, DEFAULT_SWEEP_INTERVAL, PERIOD_ENV_VAR, PeriodProvider,
    TotpSettings, TrackerConfig,
};
pub use errors::TrackerError;
pub use tracker::{BLOCKING_PERIODS, CodeUsageTracker};
