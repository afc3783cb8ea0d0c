//! Package publish pipeline.
//!
//! Turns a content directory into a sealed archive under `packages/` and
//! folds its manifest into both repository indexes:
//!
//! 1. make sure `list.xml` and `full_list.xml` exist
//! 2. build the manifest from the gathered fields
//! 3. check the content directory exists (nothing is written if not)
//! 4. archive the directory together with a `manifest.json` snapshot
//! 5. digest the archive and seal the manifest with it
//! 6. upsert the sealed manifest into both indexes
//! 7. report the archive path and digest
//!
//! A failure aborts the remaining steps. Earlier steps are not rolled back
//! and a partially written archive stays on disk.
//!
//! The snapshot inside the archive is taken before the digest exists, so its
//! `sha256` is always empty. Only the index copy carries the digest.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;
use pger_schema::manifest::creation_timestamp;
use pger_schema::{ARCHIVE_MANIFEST_NAME, Manifest, ManifestError, ManifestFields, Sha256Hash};

use crate::index::{self, FullIndex, IndexError, LatestIndex};
use crate::io::{ArchiveError, Archiver, ContentDigest, Sha256Digester, TarGzArchiver};
use crate::paths::RepositoryLayout;
use crate::reporter::Reporter;

/// Errors that abort a publish.
#[derive(Debug, thiserror::Error)]
pub enum PublishError {
    /// The content directory does not exist.
    #[error("Content directory not found: {}", .0.display())]
    ContentNotFound(PathBuf),

    /// The manifest could not be built or serialized.
    #[error(transparent)]
    Manifest(#[from] ManifestError),

    /// Archive creation failed.
    #[error(transparent)]
    Archive(#[from] ArchiveError),

    /// The archive could not be read back for digesting.
    #[error("Failed to digest {}: {source}", path.display())]
    Digest {
        /// Archive path.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// An index document could not be read or written.
    #[error(transparent)]
    Index(#[from] IndexError),
}

/// Result of a successful publish.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishOutcome {
    /// Where the archive was written.
    pub archive_path: PathBuf,
    /// The sealed manifest as recorded in the indexes.
    pub manifest: Manifest,
}

impl PublishOutcome {
    /// Digest of the archive.
    pub fn digest(&self) -> &Sha256Hash {
        &self.manifest.sha256
    }
}

/// Publishes content directories into a repository.
pub struct Publisher<'a, A = TarGzArchiver, D = Sha256Digester> {
    layout: &'a RepositoryLayout,
    archiver: A,
    digester: D,
    reporter: &'a dyn Reporter,
}

impl<A, D> std::fmt::Debug for Publisher<'_, A, D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Publisher")
            .field("layout", &self.layout)
            .finish_non_exhaustive()
    }
}

impl<'a> Publisher<'a> {
    /// Publisher writing `.tar.gz` archives digested with SHA-256.
    pub fn new(layout: &'a RepositoryLayout, reporter: &'a dyn Reporter) -> Self {
        Self::with_collaborators(layout, TarGzArchiver::default(), Sha256Digester, reporter)
    }
}

impl<'a, A: Archiver, D: ContentDigest> Publisher<'a, A, D> {
    /// Publisher with explicit archive and digest collaborators.
    pub fn with_collaborators(
        layout: &'a RepositoryLayout,
        archiver: A,
        digester: D,
        reporter: &'a dyn Reporter,
    ) -> Self {
        Self {
            layout,
            archiver,
            digester,
            reporter,
        }
    }

    /// Publish `content_dir`, stamping the manifest with the current time.
    ///
    /// # Errors
    ///
    /// See [`Publisher::publish_at`].
    pub fn publish(
        &self,
        content_dir: &Path,
        fields: ManifestFields,
    ) -> Result<PublishOutcome, PublishError> {
        self.publish_at(content_dir, fields, creation_timestamp())
    }

    /// Publish `content_dir` with an explicit creation time.
    ///
    /// # Errors
    ///
    /// Returns [`PublishError::ContentNotFound`] before anything is archived
    /// if `content_dir` is missing. Any later failure is returned as is and
    /// also reported through the reporter.
    pub fn publish_at(
        &self,
        content_dir: &Path,
        fields: ManifestFields,
        created: NaiveDateTime,
    ) -> Result<PublishOutcome, PublishError> {
        let result = self.run(content_dir, fields, created);
        if let Err(e) = &result {
            tracing::error!("Publish failed: {e}");
            self.reporter.error(&e.to_string());
        }
        result
    }

    fn run(
        &self,
        content_dir: &Path,
        fields: ManifestFields,
        created: NaiveDateTime,
    ) -> Result<PublishOutcome, PublishError> {
        // 1. Indexes
        let latest_path = self.layout.latest_index_path();
        let full_path = self.layout.full_index_path();
        if LatestIndex::ensure_exists(&latest_path)? {
            self.reporter.info(&format!("Created {}", latest_path.display()));
        }
        if FullIndex::ensure_exists(&full_path)? {
            self.reporter.info(&format!("Created {}", full_path.display()));
        }

        // 2. Manifest
        let mut manifest = fields.into_manifest(created)?;
        self.reporter
            .section(&format!("Publishing {} {}", manifest.name, manifest.version));

        // 3. Content
        if !content_dir.is_dir() {
            return Err(PublishError::ContentNotFound(content_dir.to_path_buf()));
        }

        // 4. Archive
        let snapshot = manifest.to_json()?.into_bytes();
        let extras = BTreeMap::from([(ARCHIVE_MANIFEST_NAME.to_string(), snapshot)]);
        let dest = self.layout.archive_path(&manifest);
        let archive_path = self
            .archiver
            .create_archive(content_dir, &extras, &dest)
            .map_err(|e| match e {
                ArchiveError::SourceNotFound(p) => PublishError::ContentNotFound(p),
                other => PublishError::Archive(other),
            })?;
        self.reporter
            .info(&format!("Archived {} -> {}", content_dir.display(), archive_path.display()));

        // 5. Seal
        let digest = self
            .digester
            .digest(&archive_path)
            .map_err(|source| PublishError::Digest {
                path: archive_path.clone(),
                source,
            })?;
        manifest.seal(digest)?;
        tracing::debug!("Sealed {} with {}", manifest.id(), manifest.sha256);

        // 6. Index
        index::upsert_latest(&latest_path, &manifest)?;
        index::upsert_full(&full_path, &manifest)?;

        // 7. Report
        self.reporter.success(&format!(
            "Published {} ({})",
            archive_path.display(),
            manifest.sha256
        ));
        tracing::info!("Published {} at {}", manifest.id(), archive_path.display());

        Ok(PublishOutcome {
            archive_path,
            manifest,
        })
    }
}
