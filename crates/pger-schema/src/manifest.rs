//! The package manifest: metadata describing one published package version.
//!
//! A manifest has two serialized forms:
//!
//! - a structured XML document (`<manifest>` root, camel-case field tags),
//!   the format operators author and inspect by hand;
//! - a flat key-value JSON object (snake_case keys), the snapshot embedded
//!   in every archive as `manifest.json`.
//!
//! Both forms round-trip without loss. An absent `builder` and empty lists
//! are written as absent/empty rather than as placeholders. Both parsers
//! trim text and drop blank values, so the two forms read alike.

use std::path::{Path, PathBuf};

use chrono::{Local, NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};

use crate::hash::Sha256Hash;
use crate::types::{PackageName, Version, is_plain_file_name, package_id};
use crate::xml::{Element, XmlError};

/// Render format of `creationDate`, second precision, local time.
pub const CREATION_DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// OS list assigned when the publisher does not supply one.
pub const DEFAULT_OS: &str = "linux";

/// Architecture list assigned when the publisher does not supply one.
pub const DEFAULT_ARCH: &str = "x86_64";

/// Errors produced while parsing or mutating a [`Manifest`].
///
/// Every parse failure is fatal to the operation that needed the manifest;
/// no partially populated manifest is ever returned.
#[derive(Debug, thiserror::Error)]
pub enum ManifestError {
    /// The manifest file could not be read.
    #[error("Failed to read manifest {}: {source}", path.display())]
    Read {
        /// Path that was being read.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The XML form is not well-formed.
    #[error("Malformed manifest XML: {0}")]
    Xml(#[from] XmlError),

    /// The JSON form is not well-formed or has wrongly typed fields.
    #[error("Malformed manifest JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// A required field is absent.
    #[error("Manifest is missing required field '{0}'")]
    MissingField(&'static str),

    /// A required field is present but blank.
    #[error("Manifest field '{0}' must not be empty")]
    EmptyField(&'static str),

    /// A field would not make a plain archive file name (path separators,
    /// `..`, quotes or control characters).
    #[error("Manifest field '{field}' has invalid value {value:?}")]
    InvalidField {
        /// Field name.
        field: &'static str,
        /// Offending value.
        value: String,
    },

    /// `creationDate` does not match [`CREATION_DATE_FORMAT`].
    #[error("Invalid creation date '{0}': expected YYYY-MM-DD HH:MM:SS")]
    InvalidDate(String),

    /// The digest of a sealed manifest cannot be replaced.
    #[error("Manifest for {0} is already sealed")]
    AlreadySealed(String),
}

/// Metadata record for one published package version.
///
/// Identity is `(name, version)`. The `sha256` field stays empty from
/// construction until the archive is sealed (see [`Manifest::seal`]); after
/// that it is the SHA-256 of the exact archive bytes shipped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
    /// Package name, non-empty.
    pub name: PackageName,
    /// Package version, non-empty.
    pub version: Version,
    /// Publish time, immutable once set.
    #[serde(with = "creation_date_format")]
    pub creation_date: NaiveDateTime,
    /// Archive digest; empty until sealed.
    #[serde(default)]
    pub sha256: Sha256Hash,
    /// Names of packages this one depends on, in display order.
    #[serde(default)]
    pub dependencies: Vec<String>,
    /// Supported operating system tags.
    #[serde(default)]
    pub supported_os: Vec<String>,
    /// Supported architecture tags.
    #[serde(default)]
    pub supported_arch: Vec<String>,
    /// Free-text attribution of whoever built the package.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub builder: Option<String>,
}

mod creation_date_format {
    use chrono::NaiveDateTime;
    use serde::{Deserialize, Deserializer, Serializer};

    use super::CREATION_DATE_FORMAT;

    pub(super) fn serialize<S: Serializer>(
        date: &NaiveDateTime,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&date.format(CREATION_DATE_FORMAT).to_string())
    }

    pub(super) fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<NaiveDateTime, D::Error> {
        let raw = String::deserialize(deserializer)?;
        NaiveDateTime::parse_from_str(&raw, CREATION_DATE_FORMAT).map_err(serde::de::Error::custom)
    }
}

/// Current local time truncated to whole seconds, the precision the
/// serialized forms carry.
pub fn creation_timestamp() -> NaiveDateTime {
    let now = Local::now().naive_local();
    now.with_nanosecond(0).unwrap_or(now)
}

/// Parse a `creationDate` string.
///
/// # Errors
///
/// Returns [`ManifestError::InvalidDate`] if `raw` does not match
/// [`CREATION_DATE_FORMAT`].
pub fn parse_creation_date(raw: &str) -> Result<NaiveDateTime, ManifestError> {
    NaiveDateTime::parse_from_str(raw.trim(), CREATION_DATE_FORMAT)
        .map_err(|_| ManifestError::InvalidDate(raw.to_string()))
}

/// Render a `creationDate` for the serialized forms.
pub fn format_creation_date(date: &NaiveDateTime) -> String {
    date.format(CREATION_DATE_FORMAT).to_string()
}

/// Values gathered by a front end (CLI flags, prompts, config, API request)
/// before a manifest exists.
///
/// [`ManifestFields::into_manifest`] is the single place publish-time
/// defaults are applied.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ManifestFields {
    /// Package name.
    pub name: String,
    /// Version, defaults to [`Version::DEFAULT`] when absent or blank.
    pub version: Option<String>,
    /// Dependency names.
    pub dependencies: Vec<String>,
    /// OS tags, defaults to `[DEFAULT_OS]` when empty.
    pub supported_os: Vec<String>,
    /// Architecture tags, defaults to `[DEFAULT_ARCH]` when empty.
    pub supported_arch: Vec<String>,
    /// Builder attribution; blank means none.
    pub builder: Option<String>,
}

impl ManifestFields {
    /// Start from a package name with every other field defaulted.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Build an unsealed manifest stamped with `created`.
    ///
    /// Blank list items are dropped and surrounding whitespace is trimmed.
    ///
    /// # Errors
    ///
    /// Returns [`ManifestError::EmptyField`] if the name is blank and
    /// [`ManifestError::InvalidField`] if the name or version could not be
    /// used as part of an archive file name.
    pub fn into_manifest(self, created: NaiveDateTime) -> Result<Manifest, ManifestError> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err(ManifestError::EmptyField("name"));
        }
        if !is_plain_file_name(name) {
            return Err(ManifestError::InvalidField {
                field: "name",
                value: name.to_string(),
            });
        }

        let version = self
            .version
            .as_deref()
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map_or_else(Version::default, Version::new);
        if !is_plain_file_name(version.as_str()) {
            return Err(ManifestError::InvalidField {
                field: "version",
                value: version.to_string(),
            });
        }

        let mut supported_os = clean_list(self.supported_os);
        if supported_os.is_empty() {
            supported_os.push(DEFAULT_OS.to_string());
        }
        let mut supported_arch = clean_list(self.supported_arch);
        if supported_arch.is_empty() {
            supported_arch.push(DEFAULT_ARCH.to_string());
        }

        Ok(Manifest {
            name: PackageName::new(name),
            version,
            creation_date: created,
            sha256: Sha256Hash::unsealed(),
            dependencies: clean_list(self.dependencies),
            supported_os,
            supported_arch,
            builder: non_blank(self.builder.as_deref()),
        })
    }
}

fn clean_list(items: Vec<String>) -> Vec<String> {
    items
        .into_iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

impl Manifest {
    /// Composite id used as the full-history index key and archive stem.
    pub fn id(&self) -> String {
        package_id(&self.name, &self.version)
    }

    /// Archive file name, `{name}-{version}.pger`.
    pub fn archive_file_name(&self) -> String {
        format!("{}.{}", self.id(), crate::PACKAGE_EXTENSION)
    }

    /// Whether the archive digest has been recorded.
    pub fn is_sealed(&self) -> bool {
        self.sha256.is_sealed()
    }

    /// Record the digest of the sealed archive.
    ///
    /// # Errors
    ///
    /// Returns [`ManifestError::AlreadySealed`] if a digest is already set.
    pub fn seal(&mut self, digest: Sha256Hash) -> Result<(), ManifestError> {
        if self.is_sealed() {
            return Err(ManifestError::AlreadySealed(self.id()));
        }
        self.sha256 = digest;
        Ok(())
    }

    /// Trim text fields, drop blank list items and blank builders, then
    /// check the required fields. Both parsers end here so the two forms
    /// read the same values back.
    fn normalized(self) -> Result<Self, ManifestError> {
        let manifest = Self {
            name: PackageName::new(self.name.as_str().trim()),
            version: Version::new(self.version.as_str().trim()),
            creation_date: self.creation_date,
            sha256: Sha256Hash::new(self.sha256.as_str().trim()),
            dependencies: clean_list(self.dependencies),
            supported_os: clean_list(self.supported_os),
            supported_arch: clean_list(self.supported_arch),
            builder: non_blank(self.builder.as_deref()),
        };
        manifest.validate()
    }

    fn validate(self) -> Result<Self, ManifestError> {
        if self.name.is_empty() {
            return Err(ManifestError::EmptyField("name"));
        }
        if self.version.is_empty() {
            return Err(ManifestError::EmptyField("version"));
        }
        Ok(self)
    }

    // ------------------------------------------------------------------
    // Structured document form (XML)
    // ------------------------------------------------------------------

    /// Build a manifest from an element whose children are the manifest
    /// fields. The root tag name is not checked.
    ///
    /// Both tag spellings in circulation are accepted: the camel-case names
    /// of standalone manifests (`creationDate`, `supportedOS`,
    /// `supportedArch`) and the snake_case names used inside
    /// `full_list.xml`.
    ///
    /// # Errors
    ///
    /// Returns [`ManifestError::MissingField`] if `name`, `version` or the
    /// creation date is absent, [`ManifestError::EmptyField`] if name or
    /// version is blank, and [`ManifestError::InvalidDate`] for a malformed
    /// date.
    pub fn from_element(element: &Element) -> Result<Self, ManifestError> {
        let name = element
            .child_text("name")
            .ok_or(ManifestError::MissingField("name"))?;
        let version = element
            .child_text("version")
            .ok_or(ManifestError::MissingField("version"))?;
        let created = element
            .child_text_any(&["creationDate", "creation_date"])
            .ok_or(ManifestError::MissingField("creationDate"))?;

        let os_list = if element.child("supportedOS").is_some() {
            element.list_texts("supportedOS", "os")
        } else {
            element.list_texts("supported_os", "os")
        };
        let arch_list = if element.child("supportedArch").is_some() {
            element.list_texts("supportedArch", "arch")
        } else {
            element.list_texts("supported_arch", "arch")
        };

        Self {
            name: PackageName::new(name),
            version: Version::new(version),
            creation_date: parse_creation_date(created)?,
            sha256: Sha256Hash::new(element.child_text("sha256").unwrap_or_default()),
            dependencies: element.list_texts("dependencies", "dependency"),
            supported_os: os_list,
            supported_arch: arch_list,
            builder: element.child_text("builder").map(str::to_string),
        }
        .normalized()
    }

    /// Render the structured form as a `<manifest>` element.
    pub fn to_element(&self) -> Element {
        let mut root = Element::new("manifest");
        root.push_text("name", self.name.as_str());
        root.push_text("version", self.version.as_str());
        root.push_text("creationDate", format_creation_date(&self.creation_date));
        root.push_text("sha256", self.sha256.as_str());
        root.push_list("dependencies", "dependency", &self.dependencies);
        root.push_list("supportedOS", "os", &self.supported_os);
        root.push_list("supportedArch", "arch", &self.supported_arch);
        if let Some(builder) = &self.builder {
            root.push_text("builder", builder.as_str());
        }
        root
    }

    /// Parse the structured form from a string.
    ///
    /// # Errors
    ///
    /// Returns [`ManifestError`] if the document is malformed or a required
    /// field is missing.
    pub fn from_xml_str(xml: &str) -> Result<Self, ManifestError> {
        let root = Element::parse(xml)?;
        Self::from_element(&root)
    }

    /// Serialize the structured form as a complete XML document.
    ///
    /// # Errors
    ///
    /// Returns [`ManifestError::Xml`] if serialization fails.
    pub fn to_xml(&self) -> Result<Vec<u8>, ManifestError> {
        Ok(self.to_element().to_document()?)
    }

    /// Load the structured form from a file.
    ///
    /// # Errors
    ///
    /// Returns [`ManifestError::Read`] if the file is missing or unreadable,
    /// otherwise any parse error from [`Manifest::from_xml_str`].
    pub fn from_xml_file(path: &Path) -> Result<Self, ManifestError> {
        Self::from_xml_str(&read(path)?)
    }

    // ------------------------------------------------------------------
    // Key-value form (JSON)
    // ------------------------------------------------------------------

    /// Parse the key-value form from a JSON string.
    ///
    /// # Errors
    ///
    /// Returns [`ManifestError::Json`] for malformed JSON or missing keys and
    /// [`ManifestError::EmptyField`] for a blank name or version.
    pub fn from_json(json: &str) -> Result<Self, ManifestError> {
        let manifest: Self = serde_json::from_str(json)?;
        manifest.normalized()
    }

    /// Build a manifest from an already-decoded key-value map.
    ///
    /// # Errors
    ///
    /// Same as [`Manifest::from_json`].
    pub fn from_value(value: serde_json::Value) -> Result<Self, ManifestError> {
        let manifest: Self = serde_json::from_value(value)?;
        manifest.normalized()
    }

    /// The key-value form as a JSON value.
    ///
    /// # Errors
    ///
    /// Returns [`ManifestError::Json`] if serialization fails.
    pub fn to_value(&self) -> Result<serde_json::Value, ManifestError> {
        Ok(serde_json::to_value(self)?)
    }

    /// The key-value form as pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// Returns [`ManifestError::Json`] if serialization fails.
    pub fn to_json(&self) -> Result<String, ManifestError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Load a manifest file, choosing the form by extension: `.json` is the
    /// key-value form, anything else is parsed as XML.
    ///
    /// # Errors
    ///
    /// Returns [`ManifestError`] if the file cannot be read or parsed.
    pub fn from_file(path: &Path) -> Result<Self, ManifestError> {
        let content = read(path)?;
        if path.extension().is_some_and(|e| e.eq_ignore_ascii_case("json")) {
            Self::from_json(&content)
        } else {
            Self::from_xml_str(&content)
        }
    }
}

fn read(path: &Path) -> Result<String, ManifestError> {
    std::fs::read_to_string(path).map_err(|source| ManifestError::Read {
        path: path.to_path_buf(),
        source,
    })
}
