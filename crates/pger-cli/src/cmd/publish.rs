//! Publish command
use std::io::{BufRead, Write};
use std::path::Path;

use anyhow::{Context, Result};
use crossterm::style::Stylize;
use pger_core::{Publisher, RepositoryLayout};
use pger_schema::manifest::{DEFAULT_ARCH, DEFAULT_OS};
use pger_schema::{ManifestFields, Version};

use crate::ui::Output;

/// Archive `content` as package `fields.name` and index it.
pub fn publish(
    layout: &RepositoryLayout,
    content: &Path,
    mut fields: ManifestFields,
    interactive: bool,
    output: &Output,
) -> Result<()> {
    if interactive {
        let stdin = std::io::stdin();
        let mut stdout = std::io::stdout();
        fields = prompt_fields(&fields.name, &mut stdin.lock(), &mut stdout)
            .context("Failed to read manifest fields")?;
        tracing::debug!("Interactive fields for {}: {fields:?}", fields.name);
    }

    let outcome = Publisher::new(layout, output).publish(content, fields)?;

    if output.is_quiet() {
        println!("{}", outcome.digest());
    } else {
        println!();
        println!("  {}{}", format!("{:<9}", "archive").dark_grey(), outcome.archive_path.display());
        println!("  {}{}", format!("{:<9}", "sha256").dark_grey(), outcome.digest());
    }
    Ok(())
}

/// Ask for every manifest field except the name.
///
/// Empty answers (or end of input) take the bracketed default; list answers
/// are comma separated.
pub fn prompt_fields<R: BufRead, W: Write>(
    name: &str,
    input: &mut R,
    out: &mut W,
) -> std::io::Result<ManifestFields> {
    writeln!(out)?;
    writeln!(out, "=== Manifest for '{name}' ===")?;

    let version = ask(input, out, "Version", Some(Version::DEFAULT))?;
    let dependencies = split_list(&ask(input, out, "Dependencies (comma separated)", None)?);
    let supported_os = split_list(&ask(input, out, "Supported OS", Some(DEFAULT_OS))?);
    let supported_arch = split_list(&ask(input, out, "Supported architectures", Some(DEFAULT_ARCH))?);
    let builder = ask(input, out, "Builder", None)?;

    Ok(ManifestFields {
        name: name.to_string(),
        version: Some(version),
        dependencies,
        supported_os,
        supported_arch,
        builder: Some(builder).filter(|b| !b.is_empty()),
    })
}

fn ask<R: BufRead, W: Write>(
    input: &mut R,
    out: &mut W,
    label: &str,
    default: Option<&str>,
) -> std::io::Result<String> {
    match default {
        Some(d) => write!(out, "{label} [{d}]: ")?,
        None => write!(out, "{label}: ")?,
    }
    out.flush()?;

    let mut line = String::new();
    input.read_line(&mut line)?;
    let answer = line.trim();
    Ok(if answer.is_empty() {
        default.unwrap_or_default().to_string()
    } else {
        answer.to_string()
    })
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
