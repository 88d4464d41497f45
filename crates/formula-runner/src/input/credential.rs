//! Credential-typed inputs are never typed in or passed as flags; they come
//! from the credential store, which is the host environment.

use formula_core::config::env_keys::runner::CREDENTIAL_PREFIX;
use formula_core::formula::Input;

use crate::error::{Result, RunnerError};

pub trait CredentialResolver: Send + Sync {
    fn resolve(&self, input: &Input) -> Result<String>;
}

/// Reads `FORMULA_CREDENTIAL_<NAME>` from the environment.
#[derive(Debug, Clone)]
pub struct EnvCredentialResolver {
    prefix: String,
}

impl Default for EnvCredentialResolver {
    fn default() -> Self {
        Self::with_prefix(CREDENTIAL_PREFIX)
    }
}

impl EnvCredentialResolver {
    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    pub fn variable_for(&self, input: &Input) -> String {
        format!("{}{}", self.prefix, input.env_name())
    }
}

impl CredentialResolver for EnvCredentialResolver {
    fn resolve(&self, input: &Input) -> Result<String> {
        let key = self.variable_for(input);
        match std::env::var(&key) {
            Ok(v) if !v.is_empty() => Ok(v),
            _ => Err(RunnerError::input(
                &input.name,
                format!("credential is not set; export {}", key),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::test_support::input;
    use formula_core::formula::InputKind;

    #[test]
    fn test_env_credential_lookup() {
        let resolver = EnvCredentialResolver::with_prefix("FORMULA_TEST_CRED_LOOKUP_");
        let token = input("api_token", InputKind::Credential);
        assert_eq!(resolver.variable_for(&token), "FORMULA_TEST_CRED_LOOKUP_API_TOKEN");

        std::env::remove_var("FORMULA_TEST_CRED_LOOKUP_API_TOKEN");
        let err = resolver.resolve(&token).unwrap_err();
        assert!(err.to_string().contains("FORMULA_TEST_CRED_LOOKUP_API_TOKEN"));

        std::env::set_var("FORMULA_TEST_CRED_LOOKUP_API_TOKEN", "abc");
        assert_eq!(resolver.resolve(&token).unwrap(), "abc");
        std::env::remove_var("FORMULA_TEST_CRED_LOOKUP_API_TOKEN");
    }
}
