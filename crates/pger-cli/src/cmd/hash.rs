//! Hash command

use anyhow::{Context, Result};
use pger_core::io::{ContentDigest, Sha256Digester};
use std::path::PathBuf;

/// Compute SHA256 hash of files, with the same digester publishing uses
pub fn hash(files: &[PathBuf]) -> Result<()> {
    for file in files {
        let hash = Sha256Digester
            .digest(file)
            .with_context(|| format!("Failed to hash {}", file.display()))?;
        println!("{hash} {}", file.display());
    }
    Ok(())
}
