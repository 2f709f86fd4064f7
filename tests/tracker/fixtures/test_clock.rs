// tests/tracker/fixtures/test_clock.rs

// dependencies
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use totp_replay_guard::{Clock, ClockError};

// Test clock implementation
#[derive(Debug, Clone)]
pub struct TestClock {
    time: Arc<AtomicU64>, // Store as millis
    should_fail: Arc<AtomicBool>,
    should_panic: Arc<AtomicBool>,
}

impl TestClock {
    pub fn new(initial_seconds: u64) -> Self {
        Self {
            time: Arc::new(AtomicU64::new(initial_seconds * 1000)),
            should_fail: Arc::new(AtomicBool::new(false)),
            should_panic: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn advance(&self, seconds: u64) {
        self.time.fetch_add(seconds * 1000, Ordering::Relaxed);
    }

    pub fn set_time(&self, seconds: u64) {
        self.time.store(seconds * 1000, Ordering::Relaxed);
    }

    pub fn set_millis(&self, millis: u64) {
        self.time.store(millis, Ordering::Relaxed);
    }

    // Make the next call to `now()` return an error
    pub fn fail_next_call(&self) {
        self.should_fail.store(true, Ordering::Relaxed);
    }

    // Make the next call to `now()` panic
    pub fn panic_next_call(&self) {
        self.should_panic.store(true, Ordering::Relaxed);
    }

    // Whether a requested failure has not been consumed yet
    pub fn failure_pending(&self) -> bool {
        self.should_fail.load(Ordering::Relaxed)
    }

    pub fn panic_pending(&self) -> bool {
        self.should_panic.load(Ordering::Relaxed)
    }

    // Number of live clones sharing this clock's time
    pub fn holders(&self) -> usize {
        Arc::strong_count(&self.time)
    }
}

impl Clock for TestClock {
    fn now(&self) -> Result<u64, ClockError> {
        if self.should_panic.swap(false, Ordering::Relaxed) {
            panic!("test clock asked to panic");
        }
        if self.should_fail.swap(false, Ordering::Relaxed) {
            Err(ClockError::SystemTimeError)
        } else {
            Ok(self.time.load(Ordering::Relaxed))
        }
    }
}
