//! State commands - the local package state ledger (`pges.xml`)
use std::path::Path;

use anyhow::{Context, Result, bail};
use crossterm::style::Stylize;
use pger_core::{Ledger, PackageState, StateUpdate};

use crate::ui::Output;
use crate::ui::list::{flag_cell, print_footer, print_state_header, print_state_row};

fn open(cache: &Path) -> Result<Ledger> {
    let ledger = Ledger::open(cache).context("Failed to open package state ledger")?;
    tracing::debug!("Opened {} ({} entries)", ledger.path().display(), ledger.len());
    Ok(ledger)
}

/// Register a package. An already registered name is a notice, not a failure.
pub fn register(cache: &Path, name: &str, build: bool, output: &Output) -> Result<()> {
    if name.trim().is_empty() {
        bail!("Package name must not be blank");
    }
    let mut ledger = open(cache)?;
    if ledger.register(name, build)? {
        output.success(&format!("Registered {name}"));
    } else {
        output.warning(&format!("Package '{name}' is already registered"));
    }
    Ok(())
}

/// Print the flags of one package.
pub fn show(cache: &Path, name: &str) -> Result<()> {
    let ledger = open(cache)?;
    let Some(state) = ledger.get(name) else {
        bail!("Package '{name}' is not in the ledger");
    };
    print_state(name, &state);
    Ok(())
}

/// Apply a partial flag update.
pub fn set(cache: &Path, name: &str, update: StateUpdate, output: &Output) -> Result<()> {
    if update.is_empty() {
        bail!("Nothing to change; pass --in-cache, --installed or --built");
    }
    let mut ledger = open(cache)?;
    if update.built.is_some() && ledger.get(name).is_some_and(|s| s.built().is_none()) {
        output.warning(&format!(
            "Package '{name}' does not track a build flag; run `pger state require-build {name}` first"
        ));
    }
    let state = ledger.update(name, update)?;
    output.success(&format!("Updated {name}"));
    if !output.is_quiet() {
        print_state(name, &state);
    }
    Ok(())
}

/// Stop tracking a package. Removing an unknown name is a notice.
pub fn remove(cache: &Path, name: &str, output: &Output) -> Result<()> {
    let mut ledger = open(cache)?;
    if ledger.remove(name)? {
        output.success(&format!("Removed {name}"));
    } else {
        output.warning(&format!("Package '{name}' is not in the ledger"));
    }
    Ok(())
}

/// Start tracking `built` for a package.
pub fn require_build(cache: &Path, name: &str, output: &Output) -> Result<()> {
    let mut ledger = open(cache)?;
    if ledger.ensure_built_flag(name)? {
        output.success(&format!("{name} now tracks its build state"));
    } else if ledger.contains(name) {
        output.info(&format!("{name} already tracks its build state"));
    } else {
        output.warning(&format!("Package '{name}' is not in the ledger"));
    }
    Ok(())
}

/// List every tracked package.
pub fn list(cache: &Path, output: &Output) -> Result<()> {
    let ledger = open(cache)?;
    if ledger.is_empty() {
        output.info("No packages tracked.");
        return Ok(());
    }

    let theme = output.theme();
    print_state_header(theme);
    for (name, state) in ledger.iter() {
        print_state_row(theme, name, state.in_cache, state.installed, state.built());
    }
    print_footer(&format!("{} packages", ledger.len()));
    Ok(())
}

fn print_state(name: &str, state: &PackageState) {
    let theme = crate::ui::Theme::default();
    println!();
    println!("  {}", name.with(theme.colors.package_name));
    println!("    {} {}", format!("{:<10}", "in_cache").dark_grey(), flag_cell(&theme, Some(state.in_cache)));
    println!("    {} {}", format!("{:<10}", "installed").dark_grey(), flag_cell(&theme, Some(state.installed)));
    println!("    {} {}", format!("{:<10}", "built").dark_grey(), flag_cell(&theme, state.built()));
}
