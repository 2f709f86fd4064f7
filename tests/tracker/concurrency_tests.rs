// tests/tracker/concurrency_tests.rs

#[cfg(test)]
mod tests {

    use crate::fixtures::quiet_tracker;
    use crate::fixtures::test_clock::TestClock;
    use crate::fixtures::test_period::TestPeriod;
    use std::sync::Barrier;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::thread;

    const RACERS: usize = 32;

    // Runs `use_code(username, code)` from RACERS threads released together,
    // returning how many were accepted.
    fn race<F>(use_code: F) -> usize
    where
        F: Fn() -> bool + Sync,
    {
        let barrier = Barrier::new(RACERS);
        let accepted = AtomicUsize::new(0);

        thread::scope(|scope| {
            for _ in 0..RACERS {
                scope.spawn(|| {
                    barrier.wait();
                    if use_code() {
                        accepted.fetch_add(1, Ordering::Relaxed);
                    }
                });
            }
        });

        accepted.into_inner()
    }

    #[test]
    fn exactly_one_concurrent_use_is_accepted() {
        let clock = TestClock::new(0);
        let tracker = quiet_tracker(&clock, &TestPeriod::new(30));

        let accepted = race(|| tracker.use_code("alice", "123456").unwrap());

        assert_eq!(accepted, 1);
        assert_eq!(tracker.tracked_codes(), 1);
    }

    #[test]
    fn exactly_one_racer_reclaims_a_stale_record() {
        let clock = TestClock::new(0);
        let tracker = quiet_tracker(&clock, &TestPeriod::new(30));

        assert!(tracker.use_code("alice", "123456").unwrap());
        clock.set_time(61);

        let accepted = race(|| tracker.use_code("alice", "123456").unwrap());

        assert_eq!(accepted, 1);
        assert_eq!(tracker.tracked_codes(), 1);
    }

    #[test]
    fn distinct_users_never_contend() {
        let clock = TestClock::new(0);
        let tracker = quiet_tracker(&clock, &TestPeriod::new(30));
        let next_user = AtomicUsize::new(0);

        let accepted = race(|| {
            let user = format!("user{}", next_user.fetch_add(1, Ordering::Relaxed));
            tracker.use_code(&user, "123456").unwrap()
        });

        assert_eq!(accepted, RACERS);
        assert_eq!(tracker.tracked_codes(), RACERS);
    }

    #[test]
    fn eviction_runs_safely_alongside_use() {
        let clock = TestClock::new(0);
        let tracker = quiet_tracker(&clock, &TestPeriod::new(30));

        for i in 0..1000 {
            assert!(tracker.use_code(&format!("old{}", i), "123456").unwrap());
        }
        clock.set_time(61);

        thread::scope(|scope| {
            scope.spawn(|| {
                for _ in 0..10 {
                    tracker.evict_expired().unwrap();
                }
            });
            scope.spawn(|| {
                for i in 0..1000 {
                    assert!(tracker.use_code(&format!("new{}", i), "123456").unwrap());
                }
            });
        });

        tracker.evict_expired().unwrap();
        assert_eq!(tracker.tracked_codes(), 1000);
        assert!(!tracker.use_code("new0", "123456").unwrap());
    }
}
