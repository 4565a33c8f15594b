#![cfg(any(test, feature = "test-support"))]

use std::sync::Arc;
use std::sync::atomic::{AtomicI64, Ordering};

use super::WallClock;

/// Time only moves when [`set`](MockClock::set) or
/// [`advance`](MockClock::advance) is called. Clones share the reading.
#[derive(Debug, Clone, Default)]
pub struct MockClock {
    now: Arc<AtomicI64>,
}

impl MockClock {
    pub fn at(unix_timestamp: i64) -> Self {
        let clock = Self::default();
        clock.set(unix_timestamp);
        clock
    }

    pub fn set(&self, unix_timestamp: i64) {
        self.now.store(unix_timestamp, Ordering::SeqCst);
    }

    pub fn advance(&self, secs: i64) {
        self.now.fetch_add(secs, Ordering::SeqCst);
    }
}

impl WallClock for MockClock {
    fn unix_timestamp(&self) -> i64 {
        self.now.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_where_told() {
        assert_eq!(MockClock::at(1_700_000_000).unix_timestamp(), 1_700_000_000);
    }

    #[test]
    fn advance_moves_every_clone() {
        let clock = MockClock::at(100);
        let handle = clock.clone();
        handle.advance(301);
        assert_eq!(clock.unix_timestamp(), 401);
    }
}
