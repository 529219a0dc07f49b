//! skill lock - Resolve the manifest into skill.lock

use clap::Args;
use colored::Colorize;
use serde::Serialize;

use crate::app::AppContext;
use crate::cli::output::{emit_formatted, HumanLayout};
use crate::engine;
use crate::error::Result;
use crate::registry::ResolvedArtifact;

#[derive(Args, Debug, Default)]
pub struct LockArgs {}

#[derive(Serialize)]
struct LockView<'a> {
    lockfile: String,
    written: bool,
    skills: &'a [ResolvedArtifact],
}

pub fn run(ctx: &AppContext, _args: &LockArgs) -> Result<()> {
    let registry = ctx.registry()?;
    let outcome = engine::lock(&ctx.project, &registry, &ctx.resolve_options())?;
    if ctx.quiet && !ctx.robot_mode() {
        return Ok(());
    }

    let view = LockView {
        lockfile: ctx.project.lockfile_path.display().to_string(),
        written: outcome.written,
        skills: outcome.lockfile.entries(),
    };
    emit_formatted(
        &view,
        ctx.output_format,
        |view| {
            let mut layout = HumanLayout::new();
            for entry in view.skills {
                layout.push_line(format!(
                    "{} {} {}",
                    entry.name.bold(),
                    entry.version,
                    entry.digest.short().dimmed()
                ));
            }
            if view.written {
                layout.push_line(format!("{} {}", "Wrote".green().bold(), view.lockfile));
            } else {
                layout.push_line(format!("{} is up to date", view.lockfile));
            }
            layout
        },
        |view| {
            view.skills
                .iter()
                .map(|e| format!("{}\t{}\t{}", e.name, e.version, e.digest))
                .collect()
        },
    )
}
