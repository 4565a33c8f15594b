mod mock;
mod system;

#[cfg(any(test, feature = "test-support"))]
pub use mock::MockClock;
pub use system::SystemClock;

/// Seconds since the Unix epoch, as used by request-signing schemes.
pub trait WallClock: Send + Sync + 'static {
    fn unix_timestamp(&self) -> i64;
}
