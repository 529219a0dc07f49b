//! CLI module - Command-line interface definitions and handlers
//!
//! Uses clap v4 with derive macros for argument parsing.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

pub use output::OutputFormat;

pub mod commands;
pub mod output;
pub mod progress;

/// Vendor and manage LLM skills from a central repository
#[derive(Parser, Debug)]
#[command(name = "skill")]
#[command(author, about, long_about = None)]
#[command(version = concat!("version ", env!("CARGO_PKG_VERSION")))]
#[command(propagate_version = true)]
pub struct Cli {
    /// Project directory (default: nearest directory with skill.toml)
    #[arg(short = 'C', long = "project", global = true, env = "SKILL_PROJECT", value_name = "DIR")]
    pub project: Option<PathBuf>,

    /// Config file path (replaces the global and project config files)
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Output format (human, json, plain)
    #[arg(long, short = 'O', global = true, value_enum)]
    pub output_format: Option<OutputFormat>,

    /// Machine-readable JSON output (shorthand for --output-format=json)
    #[arg(long, short = 'm', global = true)]
    pub machine: bool,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Effective output format. An explicit `--output-format` wins over
    /// `--machine`.
    #[must_use]
    pub fn output_format(&self) -> OutputFormat {
        if let Some(fmt) = self.output_format {
            return fmt;
        }
        if self.machine {
            return OutputFormat::Json;
        }
        OutputFormat::Human
    }
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create skill.toml in the project directory
    Init(commands::init::InitArgs),

    /// Add a skill to the manifest, or change its version constraint
    Add(commands::add::AddArgs),

    /// Remove a skill from the manifest
    Remove(commands::remove::RemoveArgs),

    /// Resolve the manifest and write skill.lock
    Lock(commands::lock::LockArgs),

    /// Install the locked skills into the vendor directory
    #[command(visible_alias = "sync")]
    Install(commands::install::InstallArgs),

    /// Compare manifest, lockfile and vendor directory
    Status(commands::status::StatusArgs),

    /// List published versions of a skill
    Versions(commands::versions::VersionsArgs),

    /// Inspect and maintain the artifact cache
    Cache(commands::cache::CacheArgs),
}
