use serde::{Deserialize, Serialize};
use subtle::ConstantTimeEq;
use tracing::{info, warn};

use crate::store::SecretStore;

/// Header carrying the caller's copy of the shared secret.
pub const SECRET_KEY_HEADER: &str = "x-dify-secret-key";

/// Serializes to the `{"isAuthorized": bool}` shape expected by request
/// authorizers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Authorization {
    #[serde(rename = "isAuthorized")]
    pub is_authorized: bool,
}

impl Authorization {
    pub const ALLOW: Self = Self { is_authorized: true };
    pub const DENY: Self = Self { is_authorized: false };
}

#[derive(Deserialize)]
struct ReferenceSecret {
    api_key: String,
}

#[derive(Debug, thiserror::Error)]
enum Denial {
    #[error("secret store error: {0}")]
    Store(String),
    #[error("reference secret not found")]
    NotFound,
    #[error("reference secret is not a JSON object with an api_key")]
    Malformed,
    #[error("no key presented")]
    MissingKey,
    #[error("presented key does not match")]
    Mismatch,
}

/// Compares a presented key with the `api_key` of a stored secret.
pub struct SecretGate<S> {
    store: S,
    secret_id: String,
}

impl<S: SecretStore> SecretGate<S> {
    pub fn new(store: S, secret_id: impl Into<String>) -> Self {
        Self {
            store,
            secret_id: secret_id.into(),
        }
    }

    /// Never fails: any problem reading or parsing the reference secret
    /// yields [`Authorization::DENY`].
    pub async fn authorize(&self, presented: Option<&str>) -> Authorization {
        match self.check(presented).await {
            Ok(()) => {
                info!(secret_id = %self.secret_id, "Authorization granted");
                Authorization::ALLOW
            }
            Err(reason) => {
                warn!(secret_id = %self.secret_id, reason = %reason, "Authorization denied");
                Authorization::DENY
            }
        }
    }

    async fn check(&self, presented: Option<&str>) -> Result<(), Denial> {
        let raw = self
            .store
            .fetch(&self.secret_id)
            .await
            .map_err(|e| Denial::Store(e.to_string()))?
            .ok_or(Denial::NotFound)?;
        let reference: ReferenceSecret =
            serde_json::from_str(&raw).map_err(|_| Denial::Malformed)?;

        let presented = presented
            .filter(|key| !key.is_empty())
            .ok_or(Denial::MissingKey)?;
        if bool::from(presented.as_bytes().ct_eq(reference.api_key.as_bytes())) {
            Ok(())
        } else {
            Err(Denial::Mismatch)
        }
    }
}
