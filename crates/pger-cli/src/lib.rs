//! pger - minimal package repository tooling
#![allow(missing_docs)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::doc_markdown)]
//!
//! Publishes content directories as `.pger` archives into a repository,
//! inspects the repository indexes and manages the local package state
//! ledger.
//!
//! # Directory Layout
//!
//! ```text
//! $PGER_REPOSITORY/         (default /repository)
//! ├── list.xml              # latest version of every package
//! ├── full_list.xml         # every published version
//! └── packages/             # {name}-{version}.pger archives
//!
//! $PGER_CACHE/              (default ~/.pger/cache)
//! └── pges.xml              # local package state ledger
//! ```

pub mod cmd;
pub mod ui;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use pger_core::{CACHE_ENV, DEFAULT_REPOSITORY_ROOT, REPOSITORY_ENV, RepositoryLayout};

#[derive(Debug, Parser)]
#[command(name = "pger")]
#[command(author, version, about = "pger - publish packages and track local package state")]
pub struct Cli {
    /// Repository root holding list.xml, full_list.xml and packages/
    #[arg(long, global = true, env = REPOSITORY_ENV, default_value = DEFAULT_REPOSITORY_ROOT)]
    pub repository: PathBuf,

    /// Directory holding the local state ledger (pges.xml)
    #[arg(long, global = true, env = CACHE_ENV)]
    pub cache: Option<PathBuf>,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Repository layout rooted at `--repository`.
    pub fn layout(&self) -> RepositoryLayout {
        RepositoryLayout::new(&self.repository)
    }

    /// Ledger directory: `--cache`, else the default cache path.
    pub fn cache_dir(&self) -> Result<PathBuf> {
        self.cache
            .clone()
            .or_else(pger_core::try_cache_path)
            .context("Could not determine cache directory; set PGER_CACHE or --cache")
    }
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Archive a content directory and add it to the repository indexes
    Publish {
        /// Directory whose contents make up the package
        content: PathBuf,
        /// Package name
        name: String,
        /// Package version [default: 1.0.0]
        #[arg(long)]
        version: Option<String>,
        /// Dependencies (comma separated or repeated)
        #[arg(long = "depends", short = 'd', value_delimiter = ',')]
        dependencies: Vec<String>,
        /// Supported operating systems [default: linux]
        #[arg(long = "os", value_delimiter = ',')]
        supported_os: Vec<String>,
        /// Supported architectures [default: x86_64]
        #[arg(long = "arch", value_delimiter = ',')]
        supported_arch: Vec<String>,
        /// Who built the package
        #[arg(long)]
        builder: Option<String>,
        /// Prompt for manifest fields instead of taking them from flags
        #[arg(short, long)]
        interactive: bool,
    },
    /// List published packages
    List {
        /// Show every published version instead of the latest of each
        #[arg(long)]
        full: bool,
    },
    /// Print a manifest file (XML, or JSON by .json extension)
    Manifest {
        /// Manifest file
        path: PathBuf,
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
    /// Compute SHA256 digests of files
    Hash {
        /// Files to hash
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
    /// Manage the local package state ledger
    State {
        #[command(subcommand)]
        command: StateCommands,
    },
}

#[derive(Debug, Subcommand)]
pub enum StateCommands {
    /// Start tracking a package
    Register {
        /// Package name
        name: String,
        /// The package needs a local build step
        #[arg(long)]
        build: bool,
    },
    /// Show the flags of a package
    Show {
        /// Package name
        name: String,
    },
    /// Change flags of a package; unspecified flags keep their value
    Set {
        /// Package name
        name: String,
        /// Archive present in the local cache
        #[arg(long, value_name = "BOOL")]
        in_cache: Option<bool>,
        /// Package installed
        #[arg(long, value_name = "BOOL")]
        installed: Option<bool>,
        /// Package built (only for packages that track builds)
        #[arg(long, value_name = "BOOL")]
        built: Option<bool>,
    },
    /// Stop tracking a package
    Remove {
        /// Package name
        name: String,
    },
    /// Start tracking the build flag for an existing package
    RequireBuild {
        /// Package name
        name: String,
    },
    /// List every tracked package
    List,
}
