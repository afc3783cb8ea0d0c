//! Repository index documents.
//!
//! Two independent views are derived from published manifests:
//!
//! - [`LatestIndex`] (`list.xml`): one summary per package name, always the
//!   most recently published version. Replacing an entry drops the old one.
//! - [`FullIndex`] (`full_list.xml`): one complete record per
//!   `{name}-{version}` id. Re-publishing an id overwrites its record.
//!
//! Both are `<packages>` documents whose entries keep insertion order. A
//! missing or unparsable document loads as an empty index so a fresh or
//! damaged repository can always be bootstrapped; I/O errors other than
//! absence still propagate. Entries this crate cannot interpret are carried
//! through untouched and written back exactly as read.

use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;
use pger_schema::manifest::{format_creation_date, parse_creation_date};
use pger_schema::{Element, Manifest, PackageName, Version};

use crate::document::{Loaded, read_document, write_document};

/// Root tag of both index documents.
pub const INDEX_ROOT: &str = "packages";

/// Tag of each entry in both index documents.
pub const ENTRY_TAG: &str = "package";

/// Errors raised while loading or persisting an index.
#[derive(Debug, thiserror::Error)]
pub enum IndexError {
    /// Reading the document failed for a reason other than absence.
    #[error("Failed to read index {}: {source}", path.display())]
    Read {
        /// Index document path.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Writing the document failed.
    #[error("Failed to write index {}: {source}", path.display())]
    Write {
        /// Index document path.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
}

/// An entry type stored in one of the index documents.
pub trait IndexEntry: Sized {
    /// Short label used in log output.
    const LABEL: &'static str;

    /// Key the entry is unique by within its document.
    fn key(&self) -> &str;

    /// Entry describing `manifest`.
    fn from_manifest(manifest: &Manifest) -> Self;

    /// Decode an entry element, or `None` if it is not interpretable.
    fn from_element(element: &Element) -> Option<Self>;

    /// Key of an entry element that [`IndexEntry::from_element`] rejected,
    /// read straight from the raw element.
    fn raw_key(element: &Element) -> Option<String>;

    /// Encode as an entry element.
    fn to_element(&self) -> Element;
}

/// Summary kept in `list.xml`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LatestEntry {
    /// Package name, the key of this document.
    pub name: PackageName,
    /// Most recently published version.
    pub version: Version,
    /// Publish time of that version.
    pub creation_date: NaiveDateTime,
    /// Dependencies of that version.
    pub dependencies: Vec<String>,
}

impl IndexEntry for LatestEntry {
    const LABEL: &'static str = "list.xml";

    fn key(&self) -> &str {
        self.name.as_str()
    }

    fn from_manifest(manifest: &Manifest) -> Self {
        Self {
            name: manifest.name.clone(),
            version: manifest.version.clone(),
            creation_date: manifest.creation_date,
            dependencies: manifest.dependencies.clone(),
        }
    }

    fn from_element(element: &Element) -> Option<Self> {
        let name = element.child_text("name")?.trim();
        let version = element.child_text("version")?.trim();
        if name.is_empty() || version.is_empty() {
            return None;
        }
        let created = element.child_text_any(&["creation_date", "creationDate"])?;
        Some(Self {
            name: PackageName::new(name),
            version: Version::new(version),
            creation_date: parse_creation_date(created).ok()?,
            dependencies: element.list_texts("dependencies", "dependency"),
        })
    }

    fn raw_key(element: &Element) -> Option<String> {
        element.child_text("name").map(|name| name.trim().to_string())
    }

    fn to_element(&self) -> Element {
        let mut element = Element::new(ENTRY_TAG);
        element.push_text("name", self.name.as_str());
        element.push_text("version", self.version.as_str());
        element.push_text("creation_date", format_creation_date(&self.creation_date));
        element.push_list("dependencies", "dependency", &self.dependencies);
        element
    }
}

/// Complete record kept in `full_list.xml`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FullEntry {
    /// Value of the `id` attribute, normally `{name}-{version}`.
    pub id: String,
    /// The sealed manifest.
    pub manifest: Manifest,
}

impl IndexEntry for FullEntry {
    const LABEL: &'static str = "full_list.xml";

    fn key(&self) -> &str {
        &self.id
    }

    fn from_manifest(manifest: &Manifest) -> Self {
        Self {
            id: manifest.id(),
            manifest: manifest.clone(),
        }
    }

    fn from_element(element: &Element) -> Option<Self> {
        let manifest = Manifest::from_element(element).ok()?;
        let id = element
            .attribute("id")
            .map_or_else(|| manifest.id(), str::to_string);
        Some(Self { id, manifest })
    }

    fn raw_key(element: &Element) -> Option<String> {
        if let Some(id) = element.attribute("id") {
            return Some(id.to_string());
        }
        let name = element.child_text("name")?.trim();
        let version = element.child_text("version")?.trim();
        Some(format!("{name}-{version}"))
    }

    fn to_element(&self) -> Element {
        let m = &self.manifest;
        let mut element = Element::new(ENTRY_TAG).with_attribute("id", self.id.as_str());
        element.push_text("name", m.name.as_str());
        element.push_text("version", m.version.as_str());
        element.push_text("creation_date", format_creation_date(&m.creation_date));
        element.push_text("sha256", m.sha256.as_str());
        element.push_list("dependencies", "dependency", &m.dependencies);
        element.push_list("supported_os", "os", &m.supported_os);
        element.push_list("supported_arch", "arch", &m.supported_arch);
        if let Some(builder) = &m.builder {
            element.push_text("builder", builder.as_str());
        }
        element
    }
}

/// One `<package>` element of an index document.
#[derive(Debug, Clone)]
enum Slot<E> {
    Parsed(E),
    /// Kept verbatim so saving never loses it.
    Raw(Element),
}

impl<E: IndexEntry> Slot<E> {
    fn matches(&self, key: &str) -> bool {
        match self {
            Slot::Parsed(entry) => entry.key() == key,
            Slot::Raw(element) => E::raw_key(element).as_deref() == Some(key),
        }
    }
}

/// An index document held in memory, bound to its backing file.
#[derive(Debug, Clone)]
pub struct RepoIndex<E> {
    path: PathBuf,
    slots: Vec<Slot<E>>,
}

/// `list.xml`: latest version per package name.
pub type LatestIndex = RepoIndex<LatestEntry>;

/// `full_list.xml`: every published `(name, version)`.
pub type FullIndex = RepoIndex<FullEntry>;

impl<E: IndexEntry> RepoIndex<E> {
    /// An empty index bound to `path` (nothing is written).
    pub fn empty(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            slots: Vec::new(),
        }
    }

    /// Load the document at `path`.
    ///
    /// A missing document, one that is not well-formed, or one whose root is
    /// not `<packages>` loads as empty. Entries that cannot be interpreted
    /// are hidden from lookups but kept, and saved back unchanged.
    ///
    /// # Errors
    ///
    /// Returns [`IndexError::Read`] for I/O failures other than absence
    /// (permission denied, path is a directory, ...).
    pub fn load(path: impl Into<PathBuf>) -> Result<Self, IndexError> {
        let path = path.into();
        let loaded = read_document(&path).map_err(|source| IndexError::Read {
            path: path.clone(),
            source,
        })?;

        let root = match loaded {
            Loaded::Parsed(root) if root.name == INDEX_ROOT => root,
            Loaded::Parsed(root) => {
                tracing::warn!(
                    "{} has root <{}>, expected <{INDEX_ROOT}>; starting from an empty index",
                    path.display(),
                    root.name
                );
                return Ok(Self::empty(path));
            }
            Loaded::Corrupt(e) => {
                tracing::warn!(
                    "{} is unreadable ({e}); starting from an empty index",
                    path.display()
                );
                return Ok(Self::empty(path));
            }
            Loaded::Missing => return Ok(Self::empty(path)),
        };

        let slots = root
            .children_named(ENTRY_TAG)
            .map(|element| match E::from_element(element) {
                Some(entry) => Slot::Parsed(entry),
                None => {
                    tracing::warn!(
                        "Keeping uninterpretable entry {:?} in {} as is",
                        E::raw_key(element).unwrap_or_default(),
                        path.display()
                    );
                    Slot::Raw(element.clone())
                }
            })
            .collect();
        Ok(Self { path, slots })
    }

    /// Create an empty document at `path` if none exists. Returns whether a
    /// document was created.
    ///
    /// # Errors
    ///
    /// Returns [`IndexError::Write`] if the empty document cannot be written.
    pub fn ensure_exists(path: &Path) -> Result<bool, IndexError> {
        if path.exists() {
            return Ok(false);
        }
        Self::empty(path).save()?;
        tracing::info!("Created empty {}", path.display());
        Ok(true)
    }

    /// Backing document path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Interpretable entries in document order.
    pub fn entries(&self) -> impl Iterator<Item = &E> {
        self.slots.iter().filter_map(|slot| match slot {
            Slot::Parsed(entry) => Some(entry),
            Slot::Raw(_) => None,
        })
    }

    /// Number of interpretable entries.
    pub fn len(&self) -> usize {
        self.entries().count()
    }

    /// Whether the index has no interpretable entries.
    pub fn is_empty(&self) -> bool {
        self.entries().next().is_none()
    }

    /// Number of entries kept verbatim because they could not be read.
    pub fn unreadable(&self) -> usize {
        self.slots.len() - self.len()
    }

    /// First interpretable entry with the given key.
    pub fn get(&self, key: &str) -> Option<&E> {
        self.entries().find(|e| e.key() == key)
    }

    /// Fold `manifest` in: drop the first entry sharing its key, append the
    /// new entry, and rewrite the document.
    ///
    /// Only the first match is removed; duplicates already present in the
    /// document are left as they are. An uninterpretable entry matches by
    /// its raw key, so a republish replaces it too.
    ///
    /// # Errors
    ///
    /// Returns [`IndexError::Write`] if the document cannot be persisted.
    /// The in-memory index is updated either way.
    pub fn upsert(&mut self, manifest: &Manifest) -> Result<(), IndexError> {
        let entry = E::from_manifest(manifest);
        if let Some(pos) = self.slots.iter().position(|s| s.matches(entry.key())) {
            self.slots.remove(pos);
            tracing::debug!("Replacing {} in {}", entry.key(), E::LABEL);
        }
        self.slots.push(Slot::Parsed(entry));
        self.save()
    }

    /// Serialize the whole document back to its path.
    ///
    /// # Errors
    ///
    /// Returns [`IndexError::Write`] if writing fails.
    pub fn save(&self) -> Result<(), IndexError> {
        let mut root = Element::new(INDEX_ROOT);
        for slot in &self.slots {
            match slot {
                Slot::Parsed(entry) => root.push(entry.to_element()),
                Slot::Raw(element) => root.push(element.clone()),
            }
        }
        write_document(&self.path, &root).map_err(|source| IndexError::Write {
            path: self.path.clone(),
            source,
        })
    }
}

impl LatestIndex {
    /// Latest summary for a package name.
    pub fn find(&self, name: &str) -> Option<&LatestEntry> {
        self.get(name)
    }
}

impl FullIndex {
    /// Full record for a `(name, version)` pair.
    pub fn find(&self, name: &str, version: &str) -> Option<&Manifest> {
        self.get(&format!("{name}-{version}")).map(|e| &e.manifest)
    }

    /// Every recorded version of a package, in publish order.
    pub fn versions_of<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Manifest> {
        self.entries()
            .map(|e| &e.manifest)
            .filter(move |m| m.name == name)
    }
}

/// Load `list.xml` at `path`, fold `manifest` in, and persist.
///
/// # Errors
///
/// Returns [`IndexError`] if the document cannot be read or written.
pub fn upsert_latest(path: &Path, manifest: &Manifest) -> Result<LatestIndex, IndexError> {
    let mut index = LatestIndex::load(path)?;
    index.upsert(manifest)?;
    tracing::info!("Updated {} with {} {}", LatestEntry::LABEL, manifest.name, manifest.version);
    Ok(index)
}

/// Load `full_list.xml` at `path`, fold `manifest` in, and persist.
///
/// # Errors
///
/// Returns [`IndexError`] if the document cannot be read or written.
pub fn upsert_full(path: &Path, manifest: &Manifest) -> Result<FullIndex, IndexError> {
    let mut index = FullIndex::load(path)?;
    index.upsert(manifest)?;
    tracing::info!("Updated {} with {}", FullEntry::LABEL, manifest.id());
    Ok(index)
}
