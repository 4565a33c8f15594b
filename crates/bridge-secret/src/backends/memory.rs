//! In-process [`SecretStore`] for tests and local runs.

use crate::store::SecretStore;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

#[derive(Debug, thiserror::Error)]
#[error("memory secret store unavailable")]
pub struct MemorySecretError;

/// `Clone` shares the same map, so a test can rotate a secret after handing
/// the store to a gate.
#[derive(Clone, Default)]
pub struct MemorySecretStore {
    secrets: Arc<Mutex<HashMap<String, String>>>,
    unavailable: Arc<AtomicBool>,
}

impl MemorySecretStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, secret_id: impl Into<String>, value: impl Into<String>) {
        self.secrets
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .insert(secret_id.into(), value.into());
    }

    /// While set, every fetch fails as if the backend were down.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }
}

impl SecretStore for MemorySecretStore {
    type Error = MemorySecretError;

    async fn fetch(&self, secret_id: &str) -> Result<Option<String>, Self::Error> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(MemorySecretError);
        }
        Ok(self
            .secrets
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .get(secret_id)
            .cloned())
    }
}
