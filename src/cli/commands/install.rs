//! skill install - Bring the vendor directory in line with the manifest

use std::process::ExitCode;
use std::sync::Arc;

use clap::Args;
use colored::Colorize;

use crate::app::AppContext;
use crate::cli::output::{emit_json, robot_ok, robot_partial};
use crate::cli::progress::{ProgressMode, SyncProgressBar};
use crate::cli::OutputFormat;
use crate::engine::{self, InstallOptions, InstallOutcome};
use crate::error::Result;
use crate::registry::RegistryClient;
use crate::vendor::SyncOptions;

#[derive(Args, Debug, Default)]
pub struct InstallArgs {
    /// Install exactly what skill.lock names; fail if it is missing or stale
    #[arg(long)]
    pub frozen: bool,

    /// Reinstall skills even when the installed copy matches the lockfile
    #[arg(long)]
    pub force: bool,
}

pub fn run(ctx: &AppContext, args: &InstallArgs) -> Result<ExitCode> {
    let registry = ctx.optional_registry()?;
    let cache = ctx.cache()?;
    let transport = ctx.transport()?;

    let progress = Arc::new(SyncProgressBar::new(
        ProgressMode::detect(ctx.robot_mode(), ctx.quiet),
        "Installing skills",
    ));
    let options = InstallOptions {
        frozen: args.frozen,
        resolve: ctx.resolve_options(),
        sync: SyncOptions {
            force: args.force,
            cancel: ctx.cancel.clone(),
            progress: Some(progress.clone()),
        },
        retry: ctx.retry(),
    };

    let outcome = engine::install(
        &ctx.project,
        registry.as_ref().map(|r| r as &dyn RegistryClient),
        &cache,
        &transport,
        &options,
    );
    progress.finish();
    let outcome = outcome?;

    let success = outcome.report.is_success();
    render(ctx, &outcome)?;
    Ok(if success {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

fn render(ctx: &AppContext, outcome: &InstallOutcome) -> Result<()> {
    let report = &outcome.report;
    match ctx.output_format {
        OutputFormat::Json if report.is_success() => emit_json(&robot_ok(outcome)),
        OutputFormat::Json => {
            let completed = report.installed.len() + report.updated.len() + report.removed.len();
            emit_json(&robot_partial(outcome, completed, report.failed.len()))
        }
        OutputFormat::Plain => {
            for change in &report.installed {
                println!("installed\t{}\t{}", change.name, change.version);
            }
            for update in &report.updated {
                println!("updated\t{}\t{}", update.name, update.to);
            }
            for change in &report.removed {
                println!("removed\t{}\t{}", change.name, change.version);
            }
            for failure in &report.failed {
                println!("failed\t{}\t{}", failure.name, failure.message);
            }
            Ok(())
        }
        OutputFormat::Human => {
            if !ctx.quiet {
                if outcome.lockfile_written {
                    println!("{} {}", "Locked".green().bold(), ctx.project.lockfile_path.display());
                }
                for change in &report.installed {
                    println!("  {} {} {}", "+".green(), change.name, change.version.dimmed());
                }
                for update in &report.updated {
                    println!(
                        "  {} {} {} -> {}",
                        "~".yellow(),
                        update.name,
                        update.from.dimmed(),
                        update.to
                    );
                }
                for change in &report.removed {
                    println!("  {} {} {}", "-".red(), change.name, change.version.dimmed());
                }
            }
            for failure in &report.failed {
                eprintln!(
                    "  {} {}: {} [{}]",
                    "✗".red(),
                    failure.name.bold(),
                    failure.message,
                    failure.code
                );
            }
            if !ctx.quiet || !report.is_success() {
                let summary = report.summary_line();
                if report.is_success() {
                    println!("{}", summary.green());
                } else {
                    eprintln!("{}", summary.red());
                }
            }
            Ok(())
        }
    }
}
