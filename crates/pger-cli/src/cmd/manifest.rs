//! Manifest command
use std::path::Path;

use anyhow::{Context, Result};
use crossterm::style::Stylize;
use pger_schema::Manifest;
use pger_schema::manifest::format_creation_date;

use crate::ui::list::join_or_dash;

/// Parse a manifest file and print it.
pub fn show(path: &Path, json: bool) -> Result<()> {
    let manifest = Manifest::from_file(path)
        .with_context(|| format!("Failed to load manifest {}", path.display()))?;

    if json {
        println!("{}", manifest.to_json()?);
        return Ok(());
    }

    let sha256 = if manifest.is_sealed() {
        manifest.sha256.to_string()
    } else {
        "(unsealed)".to_string()
    };
    let rows = [
        ("name", manifest.name.to_string()),
        ("version", manifest.version.to_string()),
        ("created", format_creation_date(&manifest.creation_date)),
        ("sha256", sha256),
        ("depends", join_or_dash(&manifest.dependencies)),
        ("os", join_or_dash(&manifest.supported_os)),
        ("arch", join_or_dash(&manifest.supported_arch)),
        ("builder", manifest.builder.clone().unwrap_or_else(|| "-".to_string())),
    ];

    println!();
    for (label, value) in rows {
        println!("  {} {}", format!("{label:<9}").dark_grey(), value);
    }
    Ok(())
}
