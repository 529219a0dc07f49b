//! skill cache - Inspect and maintain the artifact cache

use clap::{Args, Subcommand};
use colored::Colorize;
use serde_json::json;

use crate::app::AppContext;
use crate::cli::output::{emit_formatted, HumanLayout};
use crate::engine;
use crate::error::Result;

#[derive(Args, Debug)]
pub struct CacheArgs {
    #[command(subcommand)]
    pub command: CacheCommand,
}

#[derive(Subcommand, Debug)]
pub enum CacheCommand {
    /// Print the cache directory
    Dir,

    /// Delete artifacts the lockfile no longer references
    Prune,

    /// Re-hash every cached artifact and evict corrupted ones
    Verify,
}

pub fn run(ctx: &AppContext, args: &CacheArgs) -> Result<()> {
    match args.command {
        CacheCommand::Dir => dir(ctx),
        CacheCommand::Prune => prune(ctx),
        CacheCommand::Verify => verify(ctx),
    }
}

fn dir(ctx: &AppContext) -> Result<()> {
    let path = ctx.cache_dir().display().to_string();
    emit_formatted(
        &json!({ "dir": path }),
        ctx.output_format,
        |_| {
            let mut layout = HumanLayout::new();
            layout.push_line(path.clone());
            layout
        },
        |_| vec![path.clone()],
    )
}

fn prune(ctx: &AppContext) -> Result<()> {
    let cache = ctx.cache()?;
    let report = engine::cache_prune(&ctx.project, &cache)?;
    if ctx.quiet && !ctx.robot_mode() {
        return Ok(());
    }
    emit_formatted(
        &report,
        ctx.output_format,
        |report| {
            let mut layout = HumanLayout::new();
            layout.push_line(format!(
                "{} {} artifact(s), freed {} bytes; {} kept",
                "Pruned".green().bold(),
                report.removed.len(),
                report.freed_bytes,
                report.kept
            ));
            if report.stale_temp_files > 0 {
                layout.push_line(format!(
                    "Removed {} stale temporary file(s)",
                    report.stale_temp_files
                ));
            }
            layout
        },
        |report| report.removed.iter().map(ToString::to_string).collect(),
    )
}

fn verify(ctx: &AppContext) -> Result<()> {
    let cache = ctx.cache()?;
    let report = engine::cache_verify(&cache)?;
    if ctx.quiet && !ctx.robot_mode() && report.corrupted.is_empty() {
        return Ok(());
    }
    emit_formatted(
        &report,
        ctx.output_format,
        |report| {
            let mut layout = HumanLayout::new();
            if report.corrupted.is_empty() {
                layout.push_line(format!(
                    "{} {} artifact(s), all intact",
                    "Verified".green().bold(),
                    report.checked
                ));
            } else {
                layout.push_line(format!(
                    "{} {} of {} artifact(s) were corrupted and evicted",
                    "Warning:".yellow().bold(),
                    report.corrupted.len(),
                    report.checked
                ));
                for digest in &report.corrupted {
                    layout.bullet(digest.as_str());
                }
            }
            layout
        },
        |report| report.corrupted.iter().map(ToString::to_string).collect(),
    )
}
