use dirs::home_dir;
use std::path::{Path, PathBuf};

use pger_schema::Manifest;

/// Environment variable overriding the repository root.
pub const REPOSITORY_ENV: &str = "PGER_REPOSITORY";

/// Environment variable overriding the local cache directory (ledger home).
pub const CACHE_ENV: &str = "PGER_CACHE";

/// Environment variable overriding the pger home directory (`~/.pger`).
pub const HOME_ENV: &str = "PGER_HOME";

/// Repository root used when nothing else is configured.
pub const DEFAULT_REPOSITORY_ROOT: &str = "/repository";

/// Latest-version index file name.
pub const LATEST_INDEX_FILE: &str = "list.xml";

/// Full-history index file name.
pub const FULL_INDEX_FILE: &str = "full_list.xml";

/// Archive directory name under the repository root.
pub const PACKAGES_DIR: &str = "packages";

/// Ledger file name under the cache directory.
pub const LEDGER_FILE: &str = "pges.xml";

/// Returns the pger home directory, or None if the user's home cannot be resolved.
pub fn try_pger_home() -> Option<PathBuf> {
    if let Ok(val) = std::env::var(HOME_ENV) {
        return Some(PathBuf::from(val));
    }
    home_dir().map(|h| h.join(".pger"))
}

/// Local cache directory holding the ledger: `$PGER_CACHE`, else `~/.pger/cache`.
pub fn try_cache_path() -> Option<PathBuf> {
    if let Ok(val) = std::env::var(CACHE_ENV) {
        return Some(PathBuf::from(val));
    }
    try_pger_home().map(|h| h.join("cache"))
}

/// Ledger document path inside a cache directory.
pub fn ledger_path(cache_dir: &Path) -> PathBuf {
    cache_dir.join(LEDGER_FILE)
}

/// On-disk layout of a package repository.
///
/// ```text
/// <root>/
/// ├── list.xml        # latest version of every package
/// ├── full_list.xml   # every published version
/// └── packages/       # {name}-{version}.pger archives
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryLayout {
    root: PathBuf,
}

impl RepositoryLayout {
    /// Layout rooted at `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Layout rooted at `$PGER_REPOSITORY`, else [`DEFAULT_REPOSITORY_ROOT`].
    pub fn from_env() -> Self {
        let root = std::env::var(REPOSITORY_ENV)
            .map_or_else(|_| PathBuf::from(DEFAULT_REPOSITORY_ROOT), PathBuf::from);
        Self::new(root)
    }

    /// Repository root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// `<root>/list.xml`
    pub fn latest_index_path(&self) -> PathBuf {
        self.root.join(LATEST_INDEX_FILE)
    }

    /// `<root>/full_list.xml`
    pub fn full_index_path(&self) -> PathBuf {
        self.root.join(FULL_INDEX_FILE)
    }

    /// `<root>/packages`
    pub fn packages_dir(&self) -> PathBuf {
        self.root.join(PACKAGES_DIR)
    }

    /// Where the archive for `manifest` is written.
    pub fn archive_path(&self, manifest: &Manifest) -> PathBuf {
        self.packages_dir().join(manifest.archive_file_name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pger_schema::ManifestFields;

    #[test]
    fn layout_paths_hang_off_the_root() {
        let layout = RepositoryLayout::new("/srv/repo");
        assert_eq!(layout.latest_index_path(), PathBuf::from("/srv/repo/list.xml"));
        assert_eq!(layout.full_index_path(), PathBuf::from("/srv/repo/full_list.xml"));
        assert_eq!(layout.packages_dir(), PathBuf::from("/srv/repo/packages"));
    }

    #[test]
    fn archive_path_uses_name_and_version() {
        let layout = RepositoryLayout::new("/srv/repo");
        let manifest = ManifestFields::new("demo")
            .into_manifest(pger_schema::manifest::creation_timestamp())
            .unwrap();
        assert_eq!(
            layout.archive_path(&manifest),
            PathBuf::from("/srv/repo/packages/demo-1.0.0.pger")
        );
    }

    #[test]
    fn ledger_lives_in_cache_dir() {
        assert_eq!(
            ledger_path(Path::new("/var/cache/pger")),
            PathBuf::from("/var/cache/pger/pges.xml")
        );
    }
}
