//! Canonical identity keys.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Canonical identity of one texture set.
///
/// Hyphens are stripped and letters lowercased, so `"0F1E-..."` and
/// `"0f1e..."` name the same identity. The canonical form only contains
/// `[0-9a-z]` and is safe to embed in storage keys.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Identity(String);

impl Identity {
    /// Maximum canonical length (a hyphen-less UUID).
    pub const MAX_LEN: usize = 32;

    /// Parse and canonicalize a raw identity string.
    pub fn parse(raw: &str) -> crate::Result<Self> {
        let canonical: String = raw
            .chars()
            .filter(|c| *c != '-')
            .map(|c| c.to_ascii_lowercase())
            .collect();

        if canonical.is_empty() {
            return Err(crate::Error::InvalidIdentity(
                "identity cannot be empty".to_string(),
            ));
        }
        if canonical.len() > Self::MAX_LEN {
            return Err(crate::Error::InvalidIdentity(format!(
                "identity must be at most {} chars, got {}",
                Self::MAX_LEN,
                canonical.len()
            )));
        }
        for c in canonical.chars() {
            if !matches!(c, '0'..='9' | 'a'..='z') {
                return Err(crate::Error::InvalidIdentity(format!(
                    "invalid character in identity: {c}"
                )));
            }
        }
        Ok(Self(canonical))
    }

    /// Whether this identity is a canonical 32-hex-digit UUID.
    pub fn is_uuid(&self) -> bool {
        self.0.len() == 32 && self.0.chars().all(|c| c.is_ascii_hexdigit())
    }

    /// Get the canonical string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Identity({self})")
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for Identity {
    type Err = crate::Error;

    fn from_str(s: &str) -> crate::Result<Self> {
        Self::parse(s)
    }
}
