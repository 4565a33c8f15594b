mod in_memory;
mod system;

use std::env::VarError;

#[cfg(any(test, feature = "test-support"))]
pub use in_memory::InMemoryEnv;
pub use system::SystemEnv;

/// Read access to process configuration.
///
/// Config loaders take `&impl ReadEnv` so tests never touch the real
/// process environment.
pub trait ReadEnv {
    fn var(&self, key: &str) -> Result<String, VarError>;

    /// Same as [`var`](Self::var) but treats blank values as absent.
    fn non_empty_var(&self, key: &str) -> Option<String> {
        self.var(key).ok().filter(|value| !value.trim().is_empty())
    }
}
