//! SHA256 hash newtype used by manifests and the index.

use serde::{Deserialize, Serialize};

/// Newtype for a SHA256 hash string (64 hex characters).
///
/// A manifest carries an empty hash between its creation and the moment its
/// archive is sealed, so the unchecked constructor accepts any string and
/// [`Sha256Hash::is_sealed`] tells the two states apart.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(transparent)]
pub struct Sha256Hash(String);

impl Sha256Hash {
    /// Create a new `Sha256Hash` without validation (for index/deserialized data).
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// The empty hash of a manifest whose archive has not been sealed yet.
    pub fn unsealed() -> Self {
        Self(String::new())
    }

    /// Build a hash from a finished digest (raw bytes, hex-encoded lowercase).
    pub fn from_digest(bytes: &[u8]) -> Self {
        Self(hex::encode(bytes))
    }

    /// Whether the hash holds a digest (as opposed to the empty placeholder).
    pub fn is_sealed(&self) -> bool {
        !self.0.is_empty()
    }

    /// Return the inner hex string as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Sha256Hash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for Sha256Hash {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<String> for Sha256Hash {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl From<&str> for Sha256Hash {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}
