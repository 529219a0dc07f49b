//! CLI command implementations
//!
//! Each subcommand has its own module with:
//! - Args struct for command-line arguments
//! - `run()` function to execute the command

use std::process::ExitCode;

use crate::app::AppContext;
use crate::cli::Commands;
use crate::error::Result;

pub mod add;
pub mod cache;
pub mod init;
pub mod install;
pub mod lock;
pub mod remove;
pub mod status;
pub mod versions;

/// Run a parsed command. Commands that can partially succeed report that
/// through the exit code rather than an error.
pub fn run(ctx: &AppContext, command: &Commands) -> Result<ExitCode> {
    match command {
        Commands::Init(args) => init::run(ctx, args).map(|()| ExitCode::SUCCESS),
        Commands::Add(args) => add::run(ctx, args).map(|()| ExitCode::SUCCESS),
        Commands::Remove(args) => remove::run(ctx, args).map(|()| ExitCode::SUCCESS),
        Commands::Lock(args) => lock::run(ctx, args).map(|()| ExitCode::SUCCESS),
        Commands::Install(args) => install::run(ctx, args),
        Commands::Status(args) => status::run(ctx, args),
        Commands::Versions(args) => versions::run(ctx, args).map(|()| ExitCode::SUCCESS),
        Commands::Cache(args) => cache::run(ctx, args).map(|()| ExitCode::SUCCESS),
    }
}
