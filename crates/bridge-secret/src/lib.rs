//! Shared-secret authorization for bridge endpoints.
//!
//! The reference secret lives in a [`SecretStore`] as a JSON blob with an
//! `api_key` field. [`SecretGate`] re-reads it on every request, so a rotated
//! key takes effect without a restart.
//!
//! ```rust
//! use bridge_secret::{MemorySecretStore, SecretGate};
//!
//! # #[tokio::main]
//! # async fn main() {
//! let store = MemorySecretStore::new();
//! store.insert("dify/webhook", r#"{"api_key":"s3cret"}"#);
//!
//! let gate = SecretGate::new(store, "dify/webhook");
//! assert!(gate.authorize(Some("s3cret")).await.is_authorized);
//! assert!(!gate.authorize(Some("guess")).await.is_authorized);
//! # }
//! ```

pub mod backends;
pub mod gate;
pub mod store;

pub use backends::hashicorp::{HashicorpSecretError, HashicorpSecretStore};
pub use backends::memory::{MemorySecretError, MemorySecretStore};
pub use gate::{Authorization, SECRET_KEY_HEADER, SecretGate};
pub use store::SecretStore;
