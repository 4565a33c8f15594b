use std::future::Future;

/// Read-only access to named secrets.
pub trait SecretStore: Send + Sync + 'static {
    type Error: std::error::Error + Send + Sync;

    /// Fetch the raw secret string stored under `secret_id`.
    ///
    /// `Ok(None)` means the store answered and the secret does not exist.
    fn fetch(
        &self,
        secret_id: &str,
    ) -> impl Future<Output = Result<Option<String>, Self::Error>> + Send;
}
