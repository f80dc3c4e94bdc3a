//! API key lookup: environment first, then the system keyring.

use std::fmt;

use thiserror::Error;
use tracing::{debug, warn};

pub const KEYRING_SERVICE: &str = "palaver";
pub const KEYRING_ACCOUNT: &str = "gemini";

/// Environment variables consulted in order.
pub const API_KEY_ENV_VARS: [&str; 2] = ["GEMINI_API_KEY", "GOOGLE_API_KEY"];

/// Failures when accessing the system keyring.
///
/// Recoverable errors mean the backend was temporarily unavailable, for
/// example a locked keychain.
#[derive(Debug, Error)]
pub enum KeyringAccessError {
    #[error("keyring unavailable: {0}")]
    Recoverable(keyring::Error),
    #[error("keyring error: {0}")]
    Permanent(keyring::Error),
}

impl KeyringAccessError {
    pub fn is_recoverable(&self) -> bool {
        matches!(self, KeyringAccessError::Recoverable(_))
    }
}

impl From<keyring::Error> for KeyringAccessError {
    fn from(err: keyring::Error) -> Self {
        match err {
            keyring::Error::PlatformFailure(_) | keyring::Error::NoStorageAccess(_) => {
                KeyringAccessError::Recoverable(err)
            }
            other => KeyringAccessError::Permanent(other),
        }
    }
}

#[derive(Debug, Error)]
pub enum CredentialError {
    #[error(
        "No API key found. Set GEMINI_API_KEY (or GOOGLE_API_KEY), or store one in the system keyring with `palaver auth`."
    )]
    Missing,
    #[error("The API key is empty")]
    Empty,
    #[error(transparent)]
    Keyring(#[from] KeyringAccessError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeySource {
    Env(&'static str),
    Keyring,
}

impl fmt::Display for KeySource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeySource::Env(var) => write!(f, "environment variable {var}"),
            KeySource::Keyring => f.write_str("system keyring"),
        }
    }
}

/// A resolved key. `Debug` never prints the secret.
#[derive(Clone, PartialEq, Eq)]
pub struct ApiKey {
    value: String,
    source: KeySource,
}

impl ApiKey {
    pub fn expose(&self) -> &str {
        &self.value
    }

    pub fn source(&self) -> KeySource {
        self.source
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiKey")
            .field("value", &"<redacted>")
            .field("source", &self.source)
            .finish()
    }
}

fn entry() -> Result<keyring::Entry, KeyringAccessError> {
    Ok(keyring::Entry::new(KEYRING_SERVICE, KEYRING_ACCOUNT)?)
}

fn keyring_lookup() -> Result<Option<String>, KeyringAccessError> {
    match entry()?.get_password() {
        Ok(value) => Ok(Some(value)),
        Err(keyring::Error::NoEntry) => Ok(None),
        Err(err) => Err(err.into()),
    }
}

pub fn resolve_api_key() -> Result<ApiKey, CredentialError> {
    resolve_with(|var| std::env::var(var).ok(), keyring_lookup)
}

fn resolve_with<E, K>(env: E, keyring: K) -> Result<ApiKey, CredentialError>
where
    E: Fn(&str) -> Option<String>,
    K: FnOnce() -> Result<Option<String>, KeyringAccessError>,
{
    for var in API_KEY_ENV_VARS {
        if let Some(value) = env(var).map(|v| v.trim().to_string()) {
            if !value.is_empty() {
                debug!(source = var, "using API key from environment");
                return Ok(ApiKey {
                    value,
                    source: KeySource::Env(var),
                });
            }
        }
    }

    let stored = match keyring() {
        Ok(stored) => stored,
        Err(err) if err.is_recoverable() => {
            warn!(error = %err, "keyring unavailable, treating API key as missing");
            None
        }
        Err(err) => return Err(err.into()),
    };

    match stored {
        Some(value) if !value.trim().is_empty() => {
            debug!("using API key from keyring");
            Ok(ApiKey {
                value: value.trim().to_string(),
                source: KeySource::Keyring,
            })
        }
        _ => Err(CredentialError::Missing),
    }
}

pub fn store_api_key(key: &str) -> Result<(), CredentialError> {
    let key = key.trim();
    if key.is_empty() {
        return Err(CredentialError::Empty);
    }
    entry()?
        .set_password(key)
        .map_err(KeyringAccessError::from)?;
    Ok(())
}

/// Returns false when there was nothing stored.
pub fn remove_api_key() -> Result<bool, CredentialError> {
    match entry()?.delete_credential() {
        Ok(()) => Ok(true),
        Err(keyring::Error::NoEntry) => Ok(false),
        Err(err) => Err(KeyringAccessError::from(err).into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |var| map.get(var).cloned()
    }

    #[test]
    fn gemini_variable_wins_over_google_and_keyring() {
        let key = resolve_with(
            env_from(&[("GEMINI_API_KEY", "g1"), ("GOOGLE_API_KEY", "g2")]),
            || panic!("keyring should not be consulted"),
        )
        .unwrap();
        assert_eq!(key.expose(), "g1");
        assert_eq!(key.source(), KeySource::Env("GEMINI_API_KEY"));
    }

    #[test]
    fn blank_variables_fall_through_to_keyring() {
        let key = resolve_with(env_from(&[("GEMINI_API_KEY", "  ")]), || {
            Ok(Some("from-keyring\n".to_string()))
        })
        .unwrap();
        assert_eq!(key.expose(), "from-keyring");
        assert_eq!(key.source(), KeySource::Keyring);
    }

    #[test]
    fn nothing_configured_is_missing() {
        let err = resolve_with(env_from(&[]), || Ok(None)).unwrap_err();
        assert!(matches!(err, CredentialError::Missing));
        assert!(err.to_string().contains("GEMINI_API_KEY"));
    }

    #[test]
    fn unavailable_keyring_reads_as_missing() {
        let err = resolve_with(env_from(&[]), || {
            Err(keyring::Error::NoStorageAccess("keychain locked".into()).into())
        })
        .unwrap_err();
        assert!(matches!(err, CredentialError::Missing));
    }

    #[test]
    fn permanent_keyring_errors_propagate() {
        let err = resolve_with(env_from(&[]), || {
            Err(KeyringAccessError::Permanent(keyring::Error::NoEntry))
        })
        .unwrap_err();
        assert!(matches!(
            err,
            CredentialError::Keyring(KeyringAccessError::Permanent(_))
        ));
    }

    #[test]
    fn debug_output_redacts_the_secret() {
        let key = resolve_with(env_from(&[("GOOGLE_API_KEY", "super-secret")]), || Ok(None))
            .unwrap();
        let rendered = format!("{key:?}");
        assert!(!rendered.contains("super-secret"));
        assert!(rendered.contains("GOOGLE_API_KEY"));
    }

    #[test]
    fn storing_an_empty_key_is_rejected() {
        assert!(matches!(store_api_key("   "), Err(CredentialError::Empty)));
    }
}
