//! Shared types and wire formats for the pger package repository.
//!
//! Everything in here is pure data: the [`Manifest`] record that describes
//! one published package version, the newtypes it is built from, and the
//! small XML element tree used to read and write the repository documents
//! (`list.xml`, `full_list.xml`, `pges.xml`).

pub mod hash;
pub mod manifest;
pub mod types;
pub mod xml;

// Re-exports
pub use hash::*;
pub use manifest::{Manifest, ManifestError, ManifestFields};
pub use types::*;
pub use xml::{Element, XmlError};

/// File extension of package archives produced by the publish pipeline.
pub const PACKAGE_EXTENSION: &str = "pger";

/// Name of the manifest snapshot stored at the root of every archive.
pub const ARCHIVE_MANIFEST_NAME: &str = "manifest.json";
