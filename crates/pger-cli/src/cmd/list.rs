//! List command
use std::path::Path;

use anyhow::Result;
use pger_core::{FullIndex, LatestIndex, RepositoryLayout};
use pger_schema::manifest::format_creation_date;

use crate::ui::Output;
use crate::ui::list::{
    FullRow, join_or_dash, print_footer, print_full_header, print_full_row, print_latest_header,
    print_latest_row,
};

/// List published packages from `list.xml`, or `full_list.xml` with `full`.
pub fn list(layout: &RepositoryLayout, full: bool, output: &Output) -> Result<()> {
    if full {
        list_full(layout, output)
    } else {
        list_latest(layout, output)
    }
}

fn list_latest(layout: &RepositoryLayout, output: &Output) -> Result<()> {
    let index = LatestIndex::load(layout.latest_index_path())?;
    warn_unreadable(index.unreadable(), index.path(), output);
    if index.is_empty() {
        output.info("No packages published.");
        return Ok(());
    }

    let theme = output.theme();
    print_latest_header(theme);
    for entry in index.entries() {
        print_latest_row(
            theme,
            entry.name.as_str(),
            entry.version.as_str(),
            &format_creation_date(&entry.creation_date),
            &join_or_dash(&entry.dependencies),
        );
    }
    print_footer(&format!("{} packages", index.len()));
    Ok(())
}

fn list_full(layout: &RepositoryLayout, output: &Output) -> Result<()> {
    let index = FullIndex::load(layout.full_index_path())?;
    warn_unreadable(index.unreadable(), index.path(), output);
    if index.is_empty() {
        output.info("No packages published.");
        return Ok(());
    }

    let theme = output.theme();
    let mut total_size = 0;
    print_full_header(theme);
    for entry in index.entries() {
        let m = &entry.manifest;
        let size = std::fs::metadata(layout.archive_path(m)).ok().map(|md| md.len());
        total_size += size.unwrap_or(0);

        let platforms = format!(
            "{} / {}",
            join_or_dash(&m.supported_os),
            join_or_dash(&m.supported_arch)
        );
        print_full_row(
            theme,
            &FullRow {
                name: m.name.as_str(),
                version: m.version.as_str(),
                created: &format_creation_date(&m.creation_date),
                digest: m.sha256.as_str(),
                size,
                platforms: &platforms,
            },
        );
    }
    print_footer(&format!(
        "{} versions, {}",
        index.len(),
        crate::ui::theme::format_size(total_size)
    ));
    Ok(())
}

fn warn_unreadable(count: usize, path: &Path, output: &Output) {
    if count > 0 {
        output.warning(&format!(
            "{count} unreadable entries in {} are not listed",
            path.display()
        ));
    }
}
