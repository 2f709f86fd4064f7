// src/tracker.rs

// totp-replay-guard: rejects reuse of TOTP codes within their validity window.

// dependencies
use crate::clock::{Clock, SystemClock};
use crate::config::{ConfigError, PeriodProvider, TotpSettings, TrackerConfig};
use crate::errors::TrackerError;
use crate::sweeper::{self, EvictionSweeper};
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use std::sync::Arc;
use tracing::{debug, trace};

/// Number of periods during which a previously-used code stays unusable.
/// After that the code may be accepted again, provided the secret key
/// legitimately generates it.
pub const BLOCKING_PERIODS: u64 = 2;

/// Store of used codes, each mapped to the timestamp (milliseconds since the
/// Unix epoch) from which the record no longer blocks anything.
pub(crate) type UsedCodes = DashMap<UsedCode, u64>;

/// A valid TOTP code previously given by a particular user.
/// Equal iff both username and code are equal (exact, case-sensitive).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(crate) struct UsedCode {
    username: String,
    code: String,
}

impl UsedCode {
    pub(crate) fn new(username: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            code: code.into(),
        }
    }
}

/// Tracks TOTP codes that have already been accepted, per user.
///
/// C is the clock type, defaulting to SystemClock.
/// P supplies the TOTP period, defaulting to TotpSettings.
///
/// A background sweeper is started on construction. Call [`shutdown`] once
/// during application teardown; dropping the tracker also stops it.
///
/// [`shutdown`]: CodeUsageTracker::shutdown
#[derive(Debug)]
pub struct CodeUsageTracker<C = SystemClock, P = TotpSettings>
where
    C: Clock + 'static,
    P: PeriodProvider,
{
    used_codes: Arc<UsedCodes>,
    clock: Arc<C>,
    period: P,
    sweeper: EvictionSweeper,
}

impl<P> CodeUsageTracker<SystemClock, P>
where
    P: PeriodProvider,
{
    /// Creates a tracker using the system clock and the default sweep interval.
    pub fn new(period: P) -> Result<Self, TrackerError> {
        Self::with_config(TrackerConfig::default(), period, SystemClock)
    }
}

// methods for the CodeUsageTracker type
impl<C, P> CodeUsageTracker<C, P>
where
    C: Clock + 'static,
    P: PeriodProvider,
{
    // method to create a new tracker from a config object
    pub fn with_config(config: TrackerConfig, period: P, clock: C) -> Result<Self, TrackerError> {
        config.validate().map_err(TrackerError::Config)?;

        let used_codes = Arc::new(DashMap::new());
        let clock = Arc::new(clock);
        let sweeper = EvictionSweeper::spawn(
            Arc::clone(&used_codes),
            Arc::clone(&clock),
            config.sweep_interval,
        )
        .map_err(TrackerError::Sweeper)?;

        Ok(Self {
            used_codes,
            clock,
            period,
            sweeper,
        })
    }

    /// Attempts to mark the given code as used by the given user.
    ///
    /// The code MUST already have been validated against the user's secret
    /// key; this only decides whether it is being replayed. Returns `Ok(true)`
    /// if the code had not been used by this user within the blocking window
    /// and is now recorded as used, `Ok(false)` if it is a replay.
    ///
    /// Fails if the period or the current time cannot be determined. Callers
    /// must treat an error as a rejection.
    pub fn use_code(&self, username: &str, code: &str) -> Result<bool, TrackerError> {
        let used_code = UsedCode::new(username, code);

        // Repeat until a definitive accept or reject. A stale record is
        // removed only if nobody refreshed it meanwhile, then we retry.
        loop {
            let now = self.clock.now()?;
            let invalid_until = now.saturating_add(self.blocking_window_millis()?);

            // The entry guard holds the shard lock; it must be released
            // before `remove_if` below touches the same shard.
            let expires = match self.used_codes.entry(used_code.clone()) {
                Entry::Vacant(entry) => {
                    entry.insert(invalid_until);
                    return Ok(true);
                }
                Entry::Occupied(entry) => *entry.get(),
            };

            if expires > now {
                debug!(username, "rejected reuse of a previously used TOTP code");
                return Ok(false);
            }

            if self
                .used_codes
                .remove_if(&used_code, |_, current| *current == expires)
                .is_some()
            {
                trace!(username, "reclaimed stale TOTP code record");
            }
        }
    }

    // 2 periods, in milliseconds; a zero period would disable protection entirely
    fn blocking_window_millis(&self) -> Result<u64, TrackerError> {
        let period = self
            .period
            .period()
            .map_err(TrackerError::ConfigurationUnavailable)?;
        if period == 0 {
            return Err(TrackerError::ConfigurationUnavailable(
                ConfigError::InvalidPeriod,
            ));
        }
        Ok(period.saturating_mul(1000).saturating_mul(BLOCKING_PERIODS))
    }

    /// Runs one eviction pass immediately, returning the number of records
    /// removed. The background sweeper calls the same routine.
    pub fn evict_expired(&self) -> Result<usize, TrackerError> {
        Ok(sweeper::evict_expired(&self.used_codes, self.clock.as_ref())?)
    }

    /// Number of records currently held, stale or not.
    pub fn tracked_codes(&self) -> usize {
        self.used_codes.len()
    }

    /// Whether a record exists for the pair. Stale records that have not yet
    /// been evicted still count.
    pub fn is_tracked(&self, username: &str, code: &str) -> bool {
        self.used_codes.contains_key(&UsedCode::new(username, code))
    }

    /// Stops the background sweeper. Intended to be called exactly once during
    /// application teardown; does not wait for an in-flight pass to finish.
    ///
    /// `use_code` remains correct afterwards, since stale records are also
    /// reclaimed lazily; only memory reclamation stops.
    pub fn shutdown(&self) {
        if self.sweeper.cancel() {
            debug!("TOTP code usage tracker shut down");
        } else {
            debug!("TOTP code usage tracker was already shut down");
        }
    }
}
