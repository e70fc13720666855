pub mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::env;
use std::path::PathBuf;
use std::process::exit;

use crate::presentation::cli::commands::{
    archive::ArchiveCommand, freeze::FreezeCommand, revert::RevertCommand, status::StatusCommand,
    sync::SyncCommand,
};

/// Output format options for status and freeze commands
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text output (default)
    Text,
    /// JSON output
    Json,
}

/// adsync - converge application addon working copies
#[derive(Parser)]
#[command(name = "adsync")]
#[command(about = "Converge application addon working copies across VCS backends")]
#[command(version)]
#[command(long_version = concat!(
    env!("CARGO_PKG_VERSION"),
    " (",
    env!("GIT_HASH"),
    ", built ",
    env!("BUILD_DATE"),
    ")"
))]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Working directory (defaults to current directory)
    #[arg(short = 'C', long, global = true)]
    pub directory: Option<String>,

    /// Manifest file describing the workspace
    #[arg(short, long, global = true, default_value = "adsync.yml")]
    pub manifest: PathBuf,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Converge every working copy described in the manifest
    Sync {
        /// Forbid network operations; fail entries that would need one
        #[arg(long)]
        offline: bool,

        /// Clear stale VCS lock files before operating
        #[arg(long)]
        clear_locks: bool,
    },

    /// Show the state of every working copy
    Status {
        /// Output format (text, json)
        #[arg(short, long, value_enum, default_value = "text")]
        output: OutputFormat,
    },

    /// Print pinned revisions for every versioned working copy
    Freeze {
        /// Output format (text, json)
        #[arg(short, long, value_enum, default_value = "text")]
        output: OutputFormat,
    },

    /// Export a clean snapshot of one working copy
    Archive {
        /// Manifest destination to export
        dest: String,

        /// Directory to export into
        target: PathBuf,
    },

    /// Force one working copy to exactly match a revision
    Revert {
        /// Manifest destination to revert
        dest: String,

        /// Revision to revert to (empty: current revision)
        #[arg(default_value = "")]
        revision: String,
    },
}

/// CLI application runner
pub struct CliApp {
    cli: Cli,
}

impl CliApp {
    pub fn new() -> Self {
        Self { cli: Cli::parse() }
    }

    pub async fn run(self) -> Result<()> {
        if self.cli.no_color {
            colored::control::set_override(false);
        }

        // Change directory if specified
        if let Some(ref dir) = self.cli.directory {
            env::set_current_dir(dir)?;
        }

        match self.handle_command().await {
            Ok(_) => Ok(()),
            Err(e) => {
                eprintln!("{} {}", "Error:".red().bold(), e);
                exit(1);
            }
        }
    }

    async fn handle_command(&self) -> Result<()> {
        let manifest = self.cli.manifest.clone();
        match &self.cli.command {
            Commands::Sync {
                offline,
                clear_locks,
            } => {
                let command =
                    SyncCommand::new(manifest, *offline, *clear_locks, self.cli.verbose);
                command.execute().await?;
            }
            Commands::Status { output } => {
                let command = StatusCommand::new(manifest, *output);
                command.execute().await?;
            }
            Commands::Freeze { output } => {
                let command = FreezeCommand::new(manifest, *output);
                command.execute().await?;
            }
            Commands::Archive { dest, target } => {
                let command = ArchiveCommand::new(manifest, dest.clone(), target.clone());
                command.execute().await?;
            }
            Commands::Revert { dest, revision } => {
                let command = RevertCommand::new(manifest, dest.clone(), revision.clone());
                command.execute().await?;
            }
        }
        Ok(())
    }
}
