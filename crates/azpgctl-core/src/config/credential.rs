//! Credential resolution for the service principal
//!
//! A credential value is resolved in this order:
//! 1. the environment variable named for it (`AZURE_CLIENT_SECRET`, ...)
//! 2. a `keyring:<entry>` reference in the config file (needs `secure-storage`)
//! 3. the plaintext value in the config file

use super::error::{ConfigError, Result};
use std::env;

/// Prefix that indicates a value should be retrieved from the keyring
const KEYRING_PREFIX: &str = "keyring:";

/// Service name for keyring entries
#[cfg(feature = "secure-storage")]
const SERVICE_NAME: &str = "azpgctl";

/// Resolves configured credential values against env and keyring
#[derive(Debug, Default, Clone, Copy)]
pub struct CredentialStore;

impl CredentialStore {
    pub fn new() -> Self {
        Self
    }

    /// Resolve a required credential.
    ///
    /// `name` is only used for the error message when nothing is found.
    pub fn resolve(&self, name: &str, configured: Option<&str>, env_var: &str) -> Result<String> {
        if let Ok(value) = env::var(env_var)
            && !value.is_empty()
        {
            tracing::debug!("Using {} from environment variable {}", name, env_var);
            return Ok(value);
        }

        match configured.map(str::trim) {
            Some(value) if !value.is_empty() && !is_unexpanded(value) => {
                self.read_value(value)
            }
            _ => Err(ConfigError::MissingCredential {
                name: name.to_string(),
                env_var: env_var.to_string(),
            }),
        }
    }

    fn read_value(&self, value: &str) -> Result<String> {
        let Some(entry) = value.strip_prefix(KEYRING_PREFIX) else {
            return Ok(value.to_string());
        };

        #[cfg(feature = "secure-storage")]
        {
            let keyring_entry = keyring::Entry::new(SERVICE_NAME, entry)
                .map_err(|e| ConfigError::KeyringError(e.to_string()))?;
            keyring_entry.get_password().map_err(|e| {
                ConfigError::KeyringError(format!(
                    "Failed to retrieve credential '{}' from keyring: {}",
                    entry, e
                ))
            })
        }
        #[cfg(not(feature = "secure-storage"))]
        {
            Err(ConfigError::CredentialError(format!(
                "Credential references keyring entry '{}' but secure-storage feature is not enabled",
                entry
            )))
        }
    }
}

/// `${VAR}` left in place by env expansion means the variable was unset
fn is_unexpanded(value: &str) -> bool {
    value.starts_with("${") && value.ends_with('}')
}
