//! Package archive creation (gzip-compressed tar).
//!
//! An archive holds the content directory under its own base name plus any
//! extra in-memory files (the manifest snapshot) at the archive root:
//!
//! ```text
//! demo-1.0.0.pger
//! ├── demo_src/...     # content directory
//! └── manifest.json    # snapshot, digest field empty
//! ```

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use flate2::Compression;
use flate2::write::GzEncoder;

/// Fallback entry name when the content directory has no base name (`/`).
const FALLBACK_CONTENT_NAME: &str = "content";

/// Errors raised while assembling an archive.
///
/// A failure after the output file has been created leaves the partial file
/// in place for inspection.
#[derive(Debug, thiserror::Error)]
pub enum ArchiveError {
    /// The directory to archive does not exist.
    #[error("Source directory not found: {}", .0.display())]
    SourceNotFound(PathBuf),

    /// Creating or writing the archive failed.
    #[error("Failed to write archive {}: {source}", path.display())]
    Io {
        /// Archive being written.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
}

/// Builds an archive from a directory plus extra files.
pub trait Archiver {
    /// Write an archive of `source_dir` and `extra_files` (archive name →
    /// bytes) to `dest`, returning the path written.
    ///
    /// # Errors
    ///
    /// Returns [`ArchiveError::SourceNotFound`] if `source_dir` is not a
    /// directory, or [`ArchiveError::Io`] if writing fails.
    fn create_archive(
        &self,
        source_dir: &Path,
        extra_files: &BTreeMap<String, Vec<u8>>,
        dest: &Path,
    ) -> Result<PathBuf, ArchiveError>;
}

/// [`Archiver`] producing `.tar.gz` data.
#[derive(Debug, Clone, Copy, Default)]
pub struct TarGzArchiver {
    level: Compression,
}

impl TarGzArchiver {
    /// Archiver with an explicit gzip level (0-9).
    pub fn with_level(level: u32) -> Self {
        Self {
            level: Compression::new(level.min(9)),
        }
    }
}

impl Archiver for TarGzArchiver {
    fn create_archive(
        &self,
        source_dir: &Path,
        extra_files: &BTreeMap<String, Vec<u8>>,
        dest: &Path,
    ) -> Result<PathBuf, ArchiveError> {
        if !source_dir.is_dir() {
            return Err(ArchiveError::SourceNotFound(source_dir.to_path_buf()));
        }
        let io_err = |source: std::io::Error| ArchiveError::Io {
            path: dest.to_path_buf(),
            source,
        };

        let source = source_dir.canonicalize().map_err(io_err)?;
        let content_name = source
            .file_name()
            .map_or_else(|| FALLBACK_CONTENT_NAME.into(), |n| n.to_os_string());

        if let Some(parent) = dest.parent() {
            std::fs::create_dir_all(parent).map_err(io_err)?;
        }

        let file = File::create(dest).map_err(io_err)?;
        let gz_encoder = GzEncoder::new(BufWriter::new(file), self.level);
        let mut tar_builder = tar::Builder::new(gz_encoder);

        // Keep symlinks as links; following them would duplicate content and
        // fail outright on dangling links.
        tar_builder.follow_symlinks(false);

        tar_builder
            .append_dir_all(&content_name, &source)
            .map_err(io_err)?;

        let mtime = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_or(0, |d| d.as_secs());
        for (name, bytes) in extra_files {
            let mut header = tar::Header::new_gnu();
            header.set_size(bytes.len() as u64);
            header.set_mode(0o644);
            header.set_mtime(mtime);
            tar_builder
                .append_data(&mut header, name, bytes.as_slice())
                .map_err(io_err)?;
        }

        tar_builder.finish().map_err(io_err)?;
        let mut writer = tar_builder
            .into_inner()
            .map_err(io_err)?
            .finish()
            .map_err(io_err)?;
        writer.flush().map_err(io_err)?;

        tracing::debug!("Wrote archive {}", dest.display());
        Ok(dest.to_path_buf())
    }
}
