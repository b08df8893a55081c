//! Static shared keys gating the endpoints

use std::fmt;
use std::sync::Arc;

use constant_time_eq::constant_time_eq;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Deserializer};

/// Compare two tokens without leaking the mismatch position through timing
pub fn tokens_match(presented: &[u8], expected: &[u8]) -> bool {
    constant_time_eq(presented, expected)
}

/// A configured shared secret, e.g. the support upload key
#[derive(Clone)]
pub struct SharedKey(Arc<SecretString>);

impl SharedKey {
    pub fn new(value: impl Into<String>) -> Self {
        Self(Arc::new(SecretString::from(value.into())))
    }

    /// True when `presented` equals this key
    pub fn matches(&self, presented: &str) -> bool {
        tokens_match(presented.as_bytes(), self.0.expose_secret().as_bytes())
    }
}

impl fmt::Debug for SharedKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SharedKey([REDACTED])")
    }
}

impl<'de> Deserialize<'de> for SharedKey {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        if s.is_empty() {
            return Err(serde::de::Error::custom("shared key must not be empty"));
        }
        Ok(SharedKey::new(s))
    }
}

/// Check an optional presented key against an optional configured key.
///
/// An unconfigured key rejects everything.
pub fn key_accepted(configured: Option<&SharedKey>, presented: Option<&str>) -> bool {
    match (configured, presented) {
        (Some(key), Some(presented)) => key.matches(presented),
        _ => false,
    }
}
