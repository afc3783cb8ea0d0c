//! Newtypes that make up a package manifest.

/// A package name as it appears in the repository and the local ledger.
///
/// Names are kept verbatim: the index documents are shared with other tools
/// that compare names byte-for-byte, so no case folding happens here.
///
/// # Example
///
/// ```
/// use pger_schema::PackageName;
///
/// let name = PackageName::new("demo");
/// assert_eq!(name.as_str(), "demo");
/// ```
#[derive(
    Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize,
)]
#[serde(transparent)]
pub struct PackageName(String);

impl PackageName {
    /// Create a new package name.
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Get the package name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether the name is empty (never true for a valid manifest).
    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl std::fmt::Display for PackageName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::ops::Deref for PackageName {
    type Target = str;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl AsRef<str> for PackageName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl PartialEq<str> for PackageName {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for PackageName {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

impl From<&str> for PackageName {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for PackageName {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

/// A version string.
///
/// Versions are usually semver-shaped (`1.0.0`) but are only required to be
/// non-empty; they are never parsed or ordered. "Latest" in the repository
/// means most recently published, not highest.
#[derive(
    Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize,
)]
#[serde(transparent)]
pub struct Version(String);

impl Version {
    /// Version assigned when the publisher does not supply one.
    pub const DEFAULT: &'static str = "1.0.0";

    /// Create a new version.
    pub fn new(version: impl Into<String>) -> Self {
        Self(version.into())
    }

    /// Get the version as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether the version is empty (never true for a valid manifest).
    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl Default for Version {
    fn default() -> Self {
        Self::new(Self::DEFAULT)
    }
}

impl std::fmt::Display for Version {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for Version {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl PartialEq<&str> for Version {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

impl From<&str> for Version {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for Version {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

/// Composite key of a manifest in the full-history index: `"{name}-{version}"`.
///
/// Also the stem of the archive file name (`{name}-{version}.pger`).
pub fn package_id(name: &PackageName, version: &Version) -> String {
    format!("{name}-{version}")
}

/// Whether `value` can stand alone as a file name directly inside a
/// directory.
///
/// Package names and versions end up in archive file names and in download
/// URLs, so separators, parent references and characters that cannot appear
/// in a quoted header value are rejected.
///
/// ```
/// use pger_schema::is_plain_file_name;
///
/// assert!(is_plain_file_name("demo-1.0.0.pger"));
/// assert!(!is_plain_file_name("../list.xml"));
/// ```
pub fn is_plain_file_name(value: &str) -> bool {
    !value.is_empty()
        && value != "."
        && !value.contains("..")
        && !value
            .chars()
            .any(|c| matches!(c, '/' | '\\' | '"') || c.is_control())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_are_not_case_folded() {
        let name = PackageName::new("Demo");
        assert_eq!(name.as_str(), "Demo");
        assert_ne!(name, PackageName::new("demo"));
    }

    #[test]
    fn default_version_is_one_oh() {
        assert_eq!(Version::default(), "1.0.0");
    }

    #[test]
    fn package_id_joins_with_dash() {
        let id = package_id(&PackageName::new("demo"), &Version::new("2.0.0"));
        assert_eq!(id, "demo-2.0.0");
    }

    #[test]
    fn blank_names_count_as_empty() {
        assert!(PackageName::new("  ").is_empty());
        assert!(Version::new("").is_empty());
    }

    #[test]
    fn plain_file_names_are_accepted() {
        assert!(is_plain_file_name("demo-1.0.0.pger"));
        assert!(is_plain_file_name("a.b"));
    }

    #[test]
    fn traversal_and_separators_are_rejected() {
        for value in ["", ".", "..", "../list.xml", "a/b", r"a\b", "x..y", "q\"uote", "nl\n"] {
            assert!(!is_plain_file_name(value), "{value:?}");
        }
    }
}
