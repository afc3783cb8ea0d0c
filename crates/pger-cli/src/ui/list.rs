//! Column-aligned rendering for `pger list` and `pger state list`.

use crossterm::style::Stylize;

use super::theme::Theme;

/// Abbreviate a digest for display; unsealed digests show as `-`.
pub fn short_digest(digest: &str, width: usize) -> String {
    if digest.is_empty() {
        "-".to_string()
    } else {
        digest.chars().take(width).collect()
    }
}

/// Comma-joined list, `-` when empty.
pub fn join_or_dash(items: &[String]) -> String {
    if items.is_empty() {
        "-".to_string()
    } else {
        items.join(", ")
    }
}

/// Print column headers for `pger list`
pub fn print_latest_header(theme: &Theme) {
    let header = format!(
        "  {:<nw$} {:<vw$} {:<dw$}   {}",
        "name",
        "version",
        "created",
        "dependencies",
        nw = theme.layout.name_width,
        vw = theme.layout.version_width,
        dw = theme.layout.date_width,
    );
    println!();
    println!("{}", header.dark_grey());
}

/// Print a single row for `pger list`
pub fn print_latest_row(theme: &Theme, name: &str, version: &str, created: &str, deps: &str) {
    let name_part = format!("{name:<width$}", width = theme.layout.name_width);
    let version_part = format!("{version:<width$}", width = theme.layout.version_width);
    let date_part = format!("{created:<width$}", width = theme.layout.date_width);

    println!(
        "  {} {} {}   {}",
        name_part.with(theme.colors.package_name),
        version_part.with(theme.colors.version),
        date_part.with(theme.colors.secondary),
        deps.with(theme.colors.secondary)
    );
}

/// Print column headers for `pger list --full`
pub fn print_full_header(theme: &Theme) {
    let header = format!(
        "  {:<nw$} {:<vw$} {:<dw$} {:<gw$} {:>sw$}   {}",
        "name",
        "version",
        "created",
        "sha256",
        "size",
        "platforms",
        nw = theme.layout.name_width,
        vw = theme.layout.version_width,
        dw = theme.layout.date_width,
        gw = theme.layout.digest_width,
        sw = theme.layout.size_width,
    );
    println!();
    println!("{}", header.dark_grey());
}

/// One `pger list --full` row.
#[derive(Debug)]
pub struct FullRow<'a> {
    pub name: &'a str,
    pub version: &'a str,
    pub created: &'a str,
    pub digest: &'a str,
    /// Archive size, `None` when the archive is not on disk.
    pub size: Option<u64>,
    pub platforms: &'a str,
}

/// Print a single row for `pger list --full`
pub fn print_full_row(theme: &Theme, row: &FullRow<'_>) {
    let layout = &theme.layout;
    let name_part = format!("{:<width$}", row.name, width = layout.name_width);
    let version_part = format!("{:<width$}", row.version, width = layout.version_width);
    let date_part = format!("{:<width$}", row.created, width = layout.date_width);
    let digest_part = format!(
        "{:<width$}",
        short_digest(row.digest, layout.digest_width),
        width = layout.digest_width
    );
    let size_part = format!(
        "{:>width$}",
        row.size.map(super::theme::format_size).unwrap_or_default(),
        width = layout.size_width
    );

    println!(
        "  {} {} {} {} {}   {}",
        name_part.with(theme.colors.package_name),
        version_part.with(theme.colors.version),
        date_part.with(theme.colors.secondary),
        digest_part.with(theme.colors.secondary),
        size_part.with(theme.colors.secondary),
        row.platforms.with(theme.colors.secondary)
    );
}

/// Print column headers for `pger state list`
pub fn print_state_header(theme: &Theme) {
    let header = format!(
        "  {:<nw$} {:<fw$} {:<fw$} {}",
        "name",
        "in_cache",
        "installed",
        "built",
        nw = theme.layout.name_width,
        fw = theme.layout.flag_width,
    );
    println!();
    println!("{}", header.dark_grey());
}

/// Render one ledger flag: icon plus `True`/`False`, or `-` when untracked.
pub fn flag_cell(theme: &Theme, flag: Option<bool>) -> String {
    match flag {
        Some(true) => format!("{} True", theme.icons.on),
        Some(false) => format!("{} False", theme.icons.off),
        None => "-".to_string(),
    }
}

/// Print a single row for `pger state list`
pub fn print_state_row(theme: &Theme, name: &str, in_cache: bool, installed: bool, built: Option<bool>) {
    let fw = theme.layout.flag_width;
    let name_part = format!("{name:<width$}", width = theme.layout.name_width);
    let cache_part = format!("{:<fw$}", flag_cell(theme, Some(in_cache)));
    let installed_part = format!("{:<fw$}", flag_cell(theme, Some(installed)));

    println!(
        "  {} {} {} {}",
        name_part.with(theme.colors.package_name),
        cache_part,
        installed_part,
        flag_cell(theme, built).with(theme.colors.secondary)
    );
}

/// Print a dim summary line under a listing.
pub fn print_footer(msg: &str) {
    println!();
    println!("  {}", msg.dark_grey());
}
