//! skill init - Create skill.toml

use clap::Args;
use colored::Colorize;
use serde_json::json;

use crate::app::AppContext;
use crate::cli::output::{emit_json, robot_ok};
use crate::cli::OutputFormat;
use crate::engine;
use crate::error::Result;

#[derive(Args, Debug, Default)]
pub struct InitArgs {}

pub fn run(ctx: &AppContext, _args: &InitArgs) -> Result<()> {
    std::fs::create_dir_all(&ctx.project.root)?;
    let created = engine::init(&ctx.project)?;
    let path = ctx.project.manifest_path.display().to_string();

    match ctx.output_format {
        OutputFormat::Json => emit_json(&robot_ok(json!({ "manifest": path, "created": created })))?,
        OutputFormat::Plain => println!("{path}"),
        OutputFormat::Human if ctx.quiet => {}
        OutputFormat::Human => {
            if created {
                println!("{} {}", "Created".green().bold(), path);
            } else {
                println!("{} {} already exists", "Skipped".yellow().bold(), path);
            }
        }
    }
    Ok(())
}
