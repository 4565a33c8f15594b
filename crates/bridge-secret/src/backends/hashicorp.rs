//! HashiCorp Vault (and OpenBao) KV v2 backend for [`SecretStore`].
//!
//! A secret id is a path below the mount:
//! ```text
//! dify/webhook  →  GET {addr}/v1/{mount}/data/dify/webhook
//! ```
//! The returned secret is the JSON object at `.data.data`.

use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;

use crate::store::SecretStore;

#[derive(Debug, thiserror::Error)]
pub enum HashicorpSecretError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Vault API error ({status}): {}", .errors.join(", "))]
    Api { status: u16, errors: Vec<String> },
    #[error("missing .data.data in Vault response")]
    MissingData,
}

/// Static-token KV v2 client.
#[derive(Clone)]
pub struct HashicorpSecretStore {
    client: Client,
    vault_addr: String,
    mount: String,
    token: String,
}

#[derive(Deserialize, Default)]
struct VaultErrors {
    #[serde(default)]
    errors: Vec<String>,
}

impl HashicorpSecretStore {
    pub fn new(
        client: Client,
        vault_addr: impl Into<String>,
        mount: impl Into<String>,
        token: impl Into<String>,
    ) -> Self {
        Self {
            client,
            vault_addr: vault_addr.into().trim_end_matches('/').to_string(),
            mount: mount.into().trim_matches('/').to_string(),
            token: token.into(),
        }
    }

    fn data_url(&self, secret_id: &str) -> String {
        format!(
            "{}/v1/{}/data/{}",
            self.vault_addr,
            self.mount,
            secret_id.trim_start_matches('/')
        )
    }
}

impl SecretStore for HashicorpSecretStore {
    type Error = HashicorpSecretError;

    async fn fetch(&self, secret_id: &str) -> Result<Option<String>, Self::Error> {
        let resp = self
            .client
            .get(self.data_url(secret_id))
            .header("X-Vault-Token", &self.token)
            .send()
            .await?;

        let status = resp.status();
        if status.as_u16() == 404 {
            return Ok(None);
        }
        if !status.is_success() {
            let errors = resp.json::<VaultErrors>().await.unwrap_or_default().errors;
            return Err(HashicorpSecretError::Api {
                status: status.as_u16(),
                errors,
            });
        }

        let body: Value = resp.json().await?;
        let data = body
            .pointer("/data/data")
            .filter(|data| data.is_object())
            .ok_or(HashicorpSecretError::MissingData)?;
        Ok(Some(data.to_string()))
    }
}
