//! Process-boundary abstractions shared by the bridge crates.
//!
//! | Concern | Trait | Production | Test |
//! |---------|-------|------------|------|
//! | Env vars | [`ReadEnv`] | [`SystemEnv`] | [`InMemoryEnv`]* |
//! | Wall-clock time | [`WallClock`] | [`SystemClock`] | [`MockClock`]* |
//!
//! *Available with `#[cfg(test)]` or the `"test-support"` feature.
//!
//! All types here are `Send + Sync`, so test doubles can be moved into
//! handlers that run on a multi-threaded tokio runtime.

pub mod env;
pub mod time;

pub use env::{ReadEnv, SystemEnv};
pub use time::{SystemClock, WallClock};

#[cfg(any(test, feature = "test-support"))]
pub use env::InMemoryEnv;
#[cfg(any(test, feature = "test-support"))]
pub use time::MockClock;
