//! # bridge-nats
//!
//! NATS plumbing for the Slack ⇄ Dify bridge:
//! - connection settings and credentials resolved from `NATS_*` variables
//! - connect with automatic reconnection and connection-event logging
//! - per-operation publish traits, so handlers are generic over the client
//!   and tests can swap in [`MockNatsClient`] (with `test-support`)
//! - JetStream work-queue stream and durable pull consumer provisioning
//!
//! ```rust,no_run
//! use bridge_nats::{JetStreamPublishClient, NatsConfig, connect};
//! use bridge_std::SystemEnv;
//! use std::time::Duration;
//!
//! pub struct Receiver<Q: JetStreamPublishClient> {
//!     queue: Q,
//! }
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let client = connect(&NatsConfig::from_env(&SystemEnv), Duration::from_secs(10)).await?;
//! let receiver = Receiver { queue: async_nats::jetstream::new(client) };
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod config;
pub mod connect;
pub mod queue;

#[cfg(any(test, feature = "test-support"))]
pub mod mocks;

pub use client::{JetStreamPublishClient, PublishClient};
pub use config::{NatsAuth, NatsConfig};
pub use connect::{ConnectError, connect};
pub use queue::{WorkQueueConfig, ensure_work_stream, work_consumer};

#[cfg(any(test, feature = "test-support"))]
pub use mocks::{MockError, MockNatsClient};
