//! Per-machine package state ledger (`pges.xml`).
//!
//! Each local package name maps to a small set of lifecycle flags. The
//! document looks like:
//!
//! ```xml
//! <?xml version='1.0' encoding='utf-8'?>
//! <pges><pge>demo<in_cache>True</in_cache><installed>False</installed><built>False</built></pge></pges>
//! ```
//!
//! The `<pge>` text is the package name. `built` exists only for packages
//! that need a local build step. Every mutating call rewrites the whole
//! document before returning.

use std::path::{Path, PathBuf};

use pger_schema::{Element, XmlError};

use crate::document::{Loaded, read_document, write_document};
use crate::paths::ledger_path;

const LEDGER_ROOT: &str = "pges";
const ENTRY_TAG: &str = "pge";
const IN_CACHE_TAG: &str = "in_cache";
const INSTALLED_TAG: &str = "installed";
const BUILT_TAG: &str = "built";

/// Errors raised by [`Ledger`].
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    /// The named package is not registered.
    #[error("Package '{0}' is not in the ledger")]
    EntryNotFound(String),

    /// Reading the ledger failed for a reason other than absence.
    #[error("Failed to read ledger {}: {source}", path.display())]
    Read {
        /// Ledger path.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Writing the ledger failed.
    #[error("Failed to write ledger {}: {source}", path.display())]
    Write {
        /// Ledger path.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The ledger exists but is not a valid `<pges>` document.
    #[error("Ledger {} is malformed: {source}", path.display())]
    Malformed {
        /// Ledger path.
        path: PathBuf,
        /// Parse failure.
        #[source]
        source: XmlError,
    },
}

/// Whether a package tracks a local build step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BuildState {
    /// No build step; the entry has no `built` flag.
    #[default]
    NotRequired,
    /// Build step required; `built` records whether it has run.
    Tracked {
        /// Whether the package has been built.
        built: bool,
    },
}

impl BuildState {
    /// The `built` flag, or `None` when not tracked.
    pub fn built(self) -> Option<bool> {
        match self {
            Self::NotRequired => None,
            Self::Tracked { built } => Some(built),
        }
    }
}

/// Snapshot of one package's flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PackageState {
    /// Archive is present in the local cache.
    pub in_cache: bool,
    /// Package is installed.
    pub installed: bool,
    /// Build tracking.
    pub build: BuildState,
}

impl PackageState {
    /// Fresh state for a newly registered package: every present flag false.
    pub fn registered(needs_build: bool) -> Self {
        Self {
            in_cache: false,
            installed: false,
            build: if needs_build {
                BuildState::Tracked { built: false }
            } else {
                BuildState::NotRequired
            },
        }
    }

    /// The `built` flag, or `None` when not tracked.
    pub fn built(&self) -> Option<bool> {
        self.build.built()
    }
}

/// Partial flag update. Unset fields leave the stored flag untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StateUpdate {
    /// New `in_cache` value.
    pub in_cache: Option<bool>,
    /// New `installed` value.
    pub installed: Option<bool>,
    /// New `built` value; ignored for packages that do not track builds.
    pub built: Option<bool>,
}

impl StateUpdate {
    /// An update that changes nothing.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set `in_cache`.
    pub fn in_cache(mut self, value: bool) -> Self {
        self.in_cache = Some(value);
        self
    }

    /// Set `installed`.
    pub fn installed(mut self, value: bool) -> Self {
        self.installed = Some(value);
        self
    }

    /// Set `built`.
    pub fn built(mut self, value: bool) -> Self {
        self.built = Some(value);
        self
    }

    /// Whether no flag is set.
    pub fn is_empty(&self) -> bool {
        self.in_cache.is_none() && self.installed.is_none() && self.built.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct LedgerEntry {
    name: String,
    state: PackageState,
}

impl LedgerEntry {
    fn from_element(element: &Element) -> Self {
        let flag = |tag: &str| element.child_text(tag).map(parse_flag);
        Self {
            name: element.text.trim().to_string(),
            state: PackageState {
                in_cache: flag(IN_CACHE_TAG).unwrap_or(false),
                installed: flag(INSTALLED_TAG).unwrap_or(false),
                build: flag(BUILT_TAG)
                    .map_or(BuildState::NotRequired, |built| BuildState::Tracked { built }),
            },
        }
    }

    fn to_element(&self) -> Element {
        let mut element = Element::with_text(ENTRY_TAG, self.name.as_str());
        element.push_text(IN_CACHE_TAG, format_flag(self.state.in_cache));
        element.push_text(INSTALLED_TAG, format_flag(self.state.installed));
        if let Some(built) = self.state.built() {
            element.push_text(BUILT_TAG, format_flag(built));
        }
        element
    }
}

fn parse_flag(text: &str) -> bool {
    text.trim().eq_ignore_ascii_case("true")
}

fn format_flag(value: bool) -> &'static str {
    if value { "True" } else { "False" }
}

/// The package state ledger, loaded in memory and bound to its file.
#[derive(Debug, Clone)]
pub struct Ledger {
    path: PathBuf,
    entries: Vec<LedgerEntry>,
}

impl Ledger {
    /// Open `pges.xml` inside `cache_dir`, creating an empty ledger if absent.
    ///
    /// # Errors
    ///
    /// See [`Ledger::open_at`].
    pub fn open(cache_dir: &Path) -> Result<Self, LedgerError> {
        Self::open_at(ledger_path(cache_dir))
    }

    /// Open the ledger document at `path`, creating an empty one if absent.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::Malformed`] if the file exists but does not
    /// parse or has a root other than `<pges>`, [`LedgerError::Read`] for
    /// other read failures and [`LedgerError::Write`] if the empty ledger
    /// cannot be created.
    pub fn open_at(path: impl Into<PathBuf>) -> Result<Self, LedgerError> {
        let path = path.into();
        let loaded = read_document(&path).map_err(|source| LedgerError::Read {
            path: path.clone(),
            source,
        })?;

        match loaded {
            Loaded::Missing => {
                let ledger = Self {
                    path,
                    entries: Vec::new(),
                };
                ledger.save()?;
                tracing::info!("Created empty ledger at {}", ledger.path.display());
                Ok(ledger)
            }
            Loaded::Corrupt(source) => Err(LedgerError::Malformed { path, source }),
            Loaded::Parsed(root) if root.name != LEDGER_ROOT => Err(LedgerError::Malformed {
                path,
                source: XmlError::Malformed("ledger root must be <pges>"),
            }),
            Loaded::Parsed(root) => {
                let entries = root
                    .children_named(ENTRY_TAG)
                    .map(LedgerEntry::from_element)
                    .collect();
                Ok(Self { path, entries })
            }
        }
    }

    /// Backing document path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Number of registered packages.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no package is registered.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Registered packages and their flags, in document order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &PackageState)> {
        self.entries.iter().map(|e| (e.name.as_str(), &e.state))
    }

    /// Whether `name` is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    /// Current flags for `name`, or `None` if unregistered.
    pub fn get(&self, name: &str) -> Option<PackageState> {
        self.position(name).map(|i| self.entries[i].state)
    }

    /// Register `name` with every flag false. `built` is tracked iff
    /// `needs_build`.
    ///
    /// Returns `false` without touching the ledger if `name` is blank or
    /// already registered.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::Write`] if the ledger cannot be persisted.
    pub fn register(&mut self, name: &str, needs_build: bool) -> Result<bool, LedgerError> {
        let name = name.trim();
        if name.is_empty() {
            tracing::warn!("Refusing to register a blank package name");
            return Ok(false);
        }
        if self.contains(name) {
            tracing::warn!("Package '{name}' is already in the ledger");
            return Ok(false);
        }
        self.entries.push(LedgerEntry {
            name: name.to_string(),
            state: PackageState::registered(needs_build),
        });
        self.save()?;
        tracing::debug!("Registered '{name}' (needs build: {needs_build})");
        Ok(true)
    }

    /// Apply a partial update to `name` and return the new flags.
    ///
    /// A `built` value for a package that does not track builds is ignored
    /// with a warning; use [`Ledger::ensure_built_flag`] first.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::EntryNotFound`] if `name` is unregistered (the
    /// ledger is left unchanged), or [`LedgerError::Write`] if persisting
    /// fails.
    pub fn update(&mut self, name: &str, update: StateUpdate) -> Result<PackageState, LedgerError> {
        let Some(i) = self.position(name) else {
            tracing::warn!("Package '{name}' is not in the ledger");
            return Err(LedgerError::EntryNotFound(name.to_string()));
        };

        let state = &mut self.entries[i].state;
        if let Some(v) = update.in_cache {
            state.in_cache = v;
        }
        if let Some(v) = update.installed {
            state.installed = v;
        }
        if let Some(v) = update.built {
            match &mut state.build {
                BuildState::Tracked { built } => *built = v,
                BuildState::NotRequired => {
                    tracing::warn!("Package '{name}' does not track a build flag; ignoring built={v}");
                }
            }
        }
        let snapshot = *state;

        self.save()?;
        Ok(snapshot)
    }

    /// Remove `name`. Returns `false` if it was not registered.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::Write`] if the ledger cannot be persisted.
    pub fn remove(&mut self, name: &str) -> Result<bool, LedgerError> {
        let Some(i) = self.position(name) else {
            tracing::warn!("Package '{name}' is not in the ledger");
            return Ok(false);
        };
        self.entries.remove(i);
        self.save()?;
        Ok(true)
    }

    /// Start tracking `built = false` for a package that did not need a
    /// build step before.
    ///
    /// Returns `true` only if the flag was added. Already-tracking and
    /// unregistered packages are left as they are.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::Write`] if the ledger cannot be persisted.
    pub fn ensure_built_flag(&mut self, name: &str) -> Result<bool, LedgerError> {
        let Some(i) = self.position(name) else {
            tracing::warn!("Package '{name}' is not in the ledger");
            return Ok(false);
        };
        let state = &mut self.entries[i].state;
        if state.build != BuildState::NotRequired {
            return Ok(false);
        }
        state.build = BuildState::Tracked { built: false };
        self.save()?;
        Ok(true)
    }

    fn position(&self, name: &str) -> Option<usize> {
        let name = name.trim();
        self.entries.iter().position(|e| e.name == name)
    }

    fn save(&self) -> Result<(), LedgerError> {
        let mut root = Element::new(LEDGER_ROOT);
        for entry in &self.entries {
            root.push(entry.to_element());
        }
        write_document(&self.path, &root).map_err(|source| LedgerError::Write {
            path: self.path.clone(),
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::{TempDir, tempdir};

    fn open() -> (TempDir, Ledger) {
        let tmp = tempdir().unwrap();
        let ledger = Ledger::open(tmp.path()).unwrap();
        (tmp, ledger)
    }

    fn reopen(ledger: &Ledger) -> Ledger {
        Ledger::open_at(ledger.path()).unwrap()
    }

    #[test]
    fn open_creates_empty_document() {
        let (tmp, ledger) = open();
        assert!(ledger.is_empty());

        let content = std::fs::read_to_string(tmp.path().join("pges.xml")).unwrap();
        assert_eq!(content, "<?xml version='1.0' encoding='utf-8'?>\n<pges/>");
    }

    #[test]
    fn register_without_build_step() {
        let (_tmp, mut ledger) = open();
        assert!(ledger.register("p", false).unwrap());

        let state = ledger.get("p").unwrap();
        assert!(!state.in_cache);
        assert!(!state.installed);
        assert_eq!(state.built(), None);
    }

    #[test]
    fn register_with_build_step() {
        let (_tmp, mut ledger) = open();
        ledger.register("p", true).unwrap();

        assert_eq!(ledger.get("p").unwrap(), PackageState::registered(true));
        assert_eq!(reopen(&ledger).get("p").unwrap().built(), Some(false));
    }

    #[test]
    fn blank_names_are_not_registered() {
        let (tmp, mut ledger) = open();

        assert!(!ledger.register("", false).unwrap());
        assert!(!ledger.register("   ", true).unwrap());
        assert!(ledger.is_empty());

        let content = std::fs::read_to_string(tmp.path().join("pges.xml")).unwrap();
        assert_eq!(content, "<?xml version='1.0' encoding='utf-8'?>\n<pges/>");
    }

    #[test]
    fn register_twice_is_a_noop() {
        let (_tmp, mut ledger) = open();
        ledger.register("p", false).unwrap();
        ledger.update("p", StateUpdate::new().installed(true)).unwrap();

        assert!(!ledger.register("p", true).unwrap());
        assert_eq!(ledger.len(), 1);
        let state = ledger.get("p").unwrap();
        assert!(state.installed);
        assert_eq!(state.built(), None);
    }

    #[test]
    fn partial_update_keeps_other_flags() {
        let (_tmp, mut ledger) = open();
        ledger.register("p", true).unwrap();
        ledger.update("p", StateUpdate::new().installed(true)).unwrap();

        let state = ledger.update("p", StateUpdate::new().in_cache(true)).unwrap();
        assert!(state.in_cache);
        assert!(state.installed);
        assert_eq!(state.built(), Some(false));

        assert_eq!(reopen(&ledger).get("p"), Some(state));
    }

    #[test]
    fn update_missing_fails_and_leaves_ledger_unchanged() {
        let (_tmp, mut ledger) = open();
        ledger.register("p", false).unwrap();
        let before = std::fs::read(ledger.path()).unwrap();

        let err = ledger
            .update("missing", StateUpdate::new().in_cache(true))
            .unwrap_err();
        assert!(matches!(err, LedgerError::EntryNotFound(ref n) if n == "missing"));
        assert!(!ledger.contains("missing"));
        assert_eq!(std::fs::read(ledger.path()).unwrap(), before);
    }

    #[test]
    fn built_update_is_ignored_when_untracked() {
        let (_tmp, mut ledger) = open();
        ledger.register("p", false).unwrap();

        let state = ledger.update("p", StateUpdate::new().built(true)).unwrap();
        assert_eq!(state.built(), None);
    }

    #[test]
    fn remove_then_get_is_none() {
        let (_tmp, mut ledger) = open();
        ledger.register("p", false).unwrap();

        assert!(ledger.remove("p").unwrap());
        assert!(ledger.get("p").is_none());
        assert!(reopen(&ledger).get("p").is_none());

        assert!(!ledger.remove("p").unwrap());
    }

    #[test]
    fn ensure_built_flag_is_idempotent() {
        let (_tmp, mut ledger) = open();
        ledger.register("p", false).unwrap();

        assert!(ledger.ensure_built_flag("p").unwrap());
        assert_eq!(ledger.get("p").unwrap().built(), Some(false));

        ledger.update("p", StateUpdate::new().built(true)).unwrap();
        assert!(!ledger.ensure_built_flag("p").unwrap());
        assert_eq!(ledger.get("p").unwrap().built(), Some(true));

        assert!(!ledger.ensure_built_flag("absent").unwrap());
        assert!(!ledger.contains("absent"));
    }

    #[test]
    fn document_shape_matches_existing_ledgers() {
        let (_tmp, mut ledger) = open();
        ledger.register("demo", true).unwrap();
        ledger.update("demo", StateUpdate::new().in_cache(true)).unwrap();

        let content = std::fs::read_to_string(ledger.path()).unwrap();
        assert!(content.ends_with(
            "<pges><pge>demo<in_cache>True</in_cache><installed>False</installed><built>False</built></pge></pges>"
        ));
    }

    #[test]
    fn reads_flags_case_insensitively() {
        let tmp = tempdir().unwrap();
        let path = tmp.path().join("pges.xml");
        std::fs::write(
            &path,
            "<pges>\n  <pge>\n    tool\n    <in_cache>true</in_cache>\n    <installed>False</installed>\n    <built>false</built>\n  </pge>\n</pges>",
        )
        .unwrap();

        let ledger = Ledger::open_at(&path).unwrap();
        let state = ledger.get("tool").unwrap();
        assert!(state.in_cache);
        assert!(!state.installed);
        assert_eq!(state.built(), Some(false));
    }

    #[test]
    fn corrupt_ledger_is_an_error() {
        let tmp = tempdir().unwrap();
        let path = tmp.path().join("pges.xml");

        std::fs::write(&path, "<pges><pge>").unwrap();
        assert!(matches!(
            Ledger::open_at(&path).unwrap_err(),
            LedgerError::Malformed { .. }
        ));

        std::fs::write(&path, "<packages/>").unwrap();
        assert!(matches!(
            Ledger::open_at(&path).unwrap_err(),
            LedgerError::Malformed { .. }
        ));
    }
}
