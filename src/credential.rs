//! Credential providers.
//!
//! The orchestrator never reads API keys from ambient state. It asks an
//! injected [`CredentialProvider`] for the current key at the start of every
//! call, so a key changed by the host between calls is picked up immediately.

use crate::error::{Result, StillMotionError};
use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use std::fmt;
use std::sync::{Arc, RwLock};

/// Environment variables consulted by [`EnvCredential::default`], in order.
pub const DEFAULT_KEY_ENV_VARS: &[&str] = &["GOOGLE_API_KEY", "API_KEY"];

/// An API key. The value is never shown by `Debug`.
#[derive(Clone)]
pub struct ApiKey(SecretString);

impl ApiKey {
    /// Wraps a raw key.
    pub fn new(key: impl Into<String>) -> Self {
        Self(SecretString::from(key.into()))
    }

    /// Returns the raw key for placing into a request.
    pub fn expose(&self) -> &str {
        self.0.expose_secret()
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApiKey([REDACTED])")
    }
}

/// Source of the API key used for job submission, polling and download.
#[async_trait]
pub trait CredentialProvider: Send + Sync {
    /// Returns true if a credential is currently available.
    fn has_credential(&self) -> bool;

    /// Lets the user pick or enter a credential.
    ///
    /// Hosts with an interactive key picker override this. The default only
    /// checks that a credential is already present.
    async fn select_credential(&self) -> Result<()> {
        if self.has_credential() {
            Ok(())
        } else {
            Err(StillMotionError::MissingCredential(
                "no credential configured and this provider cannot prompt for one".into(),
            ))
        }
    }

    /// Returns the current API key.
    fn api_key(&self) -> Result<ApiKey>;
}

/// A fixed API key.
#[derive(Debug, Clone)]
pub struct StaticCredential {
    key: ApiKey,
}

impl StaticCredential {
    /// Creates a provider that always returns `key`.
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: ApiKey::new(key),
        }
    }
}

impl CredentialProvider for StaticCredential {
    fn has_credential(&self) -> bool {
        !self.key.expose().is_empty()
    }

    fn api_key(&self) -> Result<ApiKey> {
        if self.has_credential() {
            Ok(self.key.clone())
        } else {
            Err(StillMotionError::MissingCredential("API key is empty".into()))
        }
    }
}

/// Reads the API key from environment variables on every access.
#[derive(Debug, Clone)]
pub struct EnvCredential {
    vars: Vec<String>,
}

impl Default for EnvCredential {
    fn default() -> Self {
        Self::from_vars(DEFAULT_KEY_ENV_VARS.iter().copied())
    }
}

impl EnvCredential {
    /// Reads the key from a single variable.
    pub fn new(var: impl Into<String>) -> Self {
        Self {
            vars: vec![var.into()],
        }
    }

    /// Reads the key from the first non-empty variable in `vars`.
    pub fn from_vars<I, S>(vars: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            vars: vars.into_iter().map(Into::into).collect(),
        }
    }

    fn lookup(&self) -> Option<String> {
        self.vars
            .iter()
            .filter_map(|var| std::env::var(var).ok())
            .find(|value| !value.trim().is_empty())
    }
}

impl CredentialProvider for EnvCredential {
    fn has_credential(&self) -> bool {
        self.lookup().is_some()
    }

    fn api_key(&self) -> Result<ApiKey> {
        self.lookup().map(ApiKey::new).ok_or_else(|| {
            StillMotionError::MissingCredential(format!("set one of: {}", self.vars.join(", ")))
        })
    }
}

/// A key the host can set, replace or clear at any time.
///
/// Clones share the same slot.
#[derive(Debug, Clone, Default)]
pub struct SharedCredential {
    slot: Arc<RwLock<Option<ApiKey>>>,
}

impl SharedCredential {
    /// Creates an empty slot.
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `key`, replacing any previous one.
    pub fn set(&self, key: impl Into<String>) {
        let mut slot = self.slot.write().unwrap_or_else(|e| e.into_inner());
        *slot = Some(ApiKey::new(key));
    }

    /// Removes the stored key.
    pub fn clear(&self) {
        let mut slot = self.slot.write().unwrap_or_else(|e| e.into_inner());
        *slot = None;
    }
}

impl CredentialProvider for SharedCredential {
    fn has_credential(&self) -> bool {
        self.slot
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .as_ref()
            .is_some_and(|key| !key.expose().is_empty())
    }

    fn api_key(&self) -> Result<ApiKey> {
        self.slot
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
            .filter(|key| !key.expose().is_empty())
            .ok_or_else(|| StillMotionError::MissingCredential("no API key selected".into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_key_debug_is_redacted() {
        let key = ApiKey::new("super-secret");
        let debug = format!("{:?}", key);
        assert!(!debug.contains("super-secret"));
        assert_eq!(key.expose(), "super-secret");
    }

    #[test]
    fn test_static_credential() {
        let provider = StaticCredential::new("abc");
        assert!(provider.has_credential());
        assert_eq!(provider.api_key().unwrap().expose(), "abc");

        let empty = StaticCredential::new("");
        assert!(!empty.has_credential());
        assert!(empty.api_key().unwrap_err().is_credential_error());
    }

    #[test]
    fn test_env_credential_reads_first_non_empty_var() {
        let first = "STILLMOTION_TEST_KEY_FIRST_8F3A";
        let second = "STILLMOTION_TEST_KEY_SECOND_8F3A";
        std::env::set_var(first, "   ");
        std::env::set_var(second, "from-second");

        let provider = EnvCredential::from_vars([first, second]);
        assert!(provider.has_credential());
        assert_eq!(provider.api_key().unwrap().expose(), "from-second");

        std::env::remove_var(first);
        std::env::remove_var(second);
    }

    #[test]
    fn test_env_credential_missing() {
        let provider = EnvCredential::new("STILLMOTION_TEST_KEY_UNSET_8F3A");
        assert!(!provider.has_credential());
        let err = provider.api_key().unwrap_err();
        assert!(err.to_string().contains("STILLMOTION_TEST_KEY_UNSET_8F3A"));
    }

    #[test]
    fn test_shared_credential_updates_are_visible_to_clones() {
        let host = SharedCredential::new();
        let orchestrator_side = host.clone();
        assert!(!orchestrator_side.has_credential());

        host.set("first");
        assert_eq!(orchestrator_side.api_key().unwrap().expose(), "first");

        host.set("second");
        assert_eq!(orchestrator_side.api_key().unwrap().expose(), "second");

        host.clear();
        assert!(orchestrator_side.api_key().is_err());
    }

    #[tokio::test]
    async fn test_default_select_credential() {
        assert!(StaticCredential::new("k").select_credential().await.is_ok());
        let err = SharedCredential::new().select_credential().await.unwrap_err();
        assert!(err.is_credential_error());
    }
}
