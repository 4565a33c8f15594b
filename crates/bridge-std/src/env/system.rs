use std::env::{self, VarError};

use super::ReadEnv;

/// Zero-sized; reads `std::env`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemEnv;

impl ReadEnv for SystemEnv {
    #[inline]
    fn var(&self, key: &str) -> Result<String, VarError> {
        env::var(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delegates_to_process_environment() {
        assert_eq!(std::env::var("PATH").is_ok(), SystemEnv.var("PATH").is_ok());
    }

    #[test]
    fn missing_variable_is_not_present() {
        let result = SystemEnv.var("BRIDGE_STD_SURELY_UNSET_VARIABLE");
        assert_eq!(result, Err(VarError::NotPresent));
        assert_eq!(SystemEnv.non_empty_var("BRIDGE_STD_SURELY_UNSET_VARIABLE"), None);
    }
}
