// src/sweeper.rs

// background eviction of used codes whose blocking window has elapsed

// dependencies
use crate::clock::{Clock, ClockError};
use crate::tracker::UsedCodes;
use std::io;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use tokio::sync::watch;
use tokio::time::{self, MissedTickBehavior};
use tracing::{debug, error};

/// Name given to the worker thread, visible in debuggers and panic messages.
pub(crate) const SWEEPER_THREAD_NAME: &str = "totp-code-sweeper";

/// Removes every record whose `invalid_until` is at or before the moment the
/// pass started. Returns the number of records removed.
///
/// Runs concurrently with `use_code`. `DashMap::retain` locks one shard at a
/// time, so records inserted or removed elsewhere during the pass may or may
/// not be observed.
pub(crate) fn evict_expired<C: Clock + ?Sized>(
    store: &UsedCodes,
    clock: &C,
) -> Result<usize, ClockError> {
    let started = Instant::now();
    let check_start = clock.now()?;

    let mut evicted = 0usize;
    store.retain(|_, invalid_until| {
        let keep = *invalid_until > check_start;
        if !keep {
            evicted += 1;
        }
        keep
    });

    debug!(
        evicted,
        remaining = store.len(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "TOTP code usage cleanup completed"
    );
    Ok(evicted)
}

// one scheduled pass; failures are logged and never escape into the timer loop
fn run_once<C: Clock + ?Sized>(store: &UsedCodes, clock: &C) {
    match panic::catch_unwind(AssertUnwindSafe(|| evict_expired(store, clock))) {
        Ok(Ok(_)) => {}
        Ok(Err(err)) => error!(error = %err, "TOTP code usage cleanup failed"),
        Err(_) => error!("TOTP code usage cleanup panicked"),
    }
}

/// Handle to the periodic eviction worker.
///
/// The worker is a dedicated OS thread driving a single-threaded tokio
/// runtime, so it does not depend on (or compete with) any runtime of the
/// hosting application. Dropping the handle stops the worker.
#[derive(Debug)]
pub(crate) struct EvictionSweeper {
    shutdown_tx: watch::Sender<bool>,
}

impl EvictionSweeper {
    /// Starts the worker. The first pass runs one `interval` after this call.
    pub(crate) fn spawn<C>(
        store: Arc<UsedCodes>,
        clock: Arc<C>,
        interval: Duration,
    ) -> io::Result<Self>
    where
        C: Clock + 'static,
    {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_time()
            .build()?;
        let (shutdown_tx, mut shutdown_rx) = watch::channel(false);

        thread::Builder::new()
            .name(SWEEPER_THREAD_NAME.to_string())
            .spawn(move || {
                runtime.block_on(async move {
                    let mut ticker = time::interval_at(time::Instant::now() + interval, interval);
                    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

                    loop {
                        tokio::select! {
                            // explicit shutdown, or the handle was dropped
                            _ = shutdown_rx.changed() => break,
                            _ = ticker.tick() => run_once(&store, clock.as_ref()),
                        }
                    }
                });
                debug!("TOTP code usage sweeper stopped");
            })?;

        debug!(
            interval_ms = interval.as_millis() as u64,
            "TOTP code usage sweeper started"
        );
        Ok(Self { shutdown_tx })
    }

    /// Signals the worker to stop without waiting for it. Returns `false` if
    /// the sweeper had already been cancelled.
    pub(crate) fn cancel(&self) -> bool {
        !self.shutdown_tx.send_replace(true)
    }
}
