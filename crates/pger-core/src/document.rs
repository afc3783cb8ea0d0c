//! Whole-document persistence shared by the index and ledger files.
//!
//! Each document is read in full, mutated in memory and rewritten in full.
//! Writes go through a sibling temp file and a rename so readers never see
//! a half-written document.

use std::io::ErrorKind;
use std::path::Path;

use pger_schema::{Element, XmlError};

/// Outcome of reading a document from disk.
#[derive(Debug)]
pub(crate) enum Loaded {
    /// No file at the path.
    Missing,
    /// File parsed; holds the root element.
    Parsed(Element),
    /// File exists but is not a well-formed document.
    Corrupt(XmlError),
}

/// Read and parse a document. Absence and corruption are outcomes, not
/// errors; only I/O failures unrelated to absence are returned as `Err`.
pub(crate) fn read_document(path: &Path) -> std::io::Result<Loaded> {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Loaded::Missing),
        Err(e) if e.kind() == ErrorKind::InvalidData => {
            return Ok(Loaded::Corrupt(XmlError::Io(e)));
        }
        Err(e) => return Err(e),
    };

    Ok(match Element::parse(&content) {
        Ok(root) => Loaded::Parsed(root),
        Err(e) => Loaded::Corrupt(e),
    })
}

/// Serialize `root` and replace the document at `path`.
pub(crate) fn write_document(path: &Path, root: &Element) -> std::io::Result<()> {
    let bytes = root.to_document().map_err(std::io::Error::other)?;

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let mut tmp_name = path.file_name().unwrap_or_default().to_os_string();
    tmp_name.push(".tmp");
    let tmp_path = path.with_file_name(tmp_name);

    std::fs::write(&tmp_path, &bytes)?;
    std::fs::rename(&tmp_path, path)?;

    tracing::debug!("Wrote {} ({} bytes)", path.display(), bytes.len());
    Ok(())
}
