//! pger - minimal package repository CLI

use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;
use pger_core::PublishError;
use tracing_subscriber::EnvFilter;

use pger_cli::cmd;
use pger_cli::ui::Output;
use pger_cli::{Cli, Commands, StateCommands};

fn main() -> ExitCode {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let output = Output::new(cli.quiet);

    match run(&cli, &output) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            // The publish pipeline reports its own failures.
            if e.downcast_ref::<PublishError>().is_none() {
                output.error(&format!("{e:#}"));
            }
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli, output: &Output) -> Result<()> {
    tracing::debug!("Repository root: {}", cli.repository.display());
    match &cli.command {
        Commands::Publish {
            content,
            name,
            version,
            dependencies,
            supported_os,
            supported_arch,
            builder,
            interactive,
        } => {
            let fields = pger_schema::ManifestFields {
                name: name.clone(),
                version: version.clone(),
                dependencies: dependencies.clone(),
                supported_os: supported_os.clone(),
                supported_arch: supported_arch.clone(),
                builder: builder.clone(),
            };
            cmd::publish::publish(&cli.layout(), content, fields, *interactive, output)
        }
        Commands::List { full } => cmd::list::list(&cli.layout(), *full, output),
        Commands::Manifest { path, json } => cmd::manifest::show(path, *json),
        Commands::Hash { files } => cmd::hash::hash(files),
        Commands::State { command } => {
            let cache = cli.cache_dir()?;
            tracing::debug!("Ledger directory: {}", cache.display());
            match command {
                StateCommands::Register { name, build } => {
                    cmd::state::register(&cache, name, *build, output)
                }
                StateCommands::Show { name } => cmd::state::show(&cache, name),
                StateCommands::Set {
                    name,
                    in_cache,
                    installed,
                    built,
                } => {
                    let update = pger_core::StateUpdate {
                        in_cache: *in_cache,
                        installed: *installed,
                        built: *built,
                    };
                    cmd::state::set(&cache, name, update, output)
                }
                StateCommands::Remove { name } => cmd::state::remove(&cache, name, output),
                StateCommands::RequireBuild { name } => {
                    cmd::state::require_build(&cache, name, output)
                }
                StateCommands::List => cmd::state::list(&cache, output),
            }
        }
    }
}
