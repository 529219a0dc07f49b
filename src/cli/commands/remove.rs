//! skill remove - Drop a requirement

use clap::Args;
use colored::Colorize;
use serde_json::json;

use crate::app::AppContext;
use crate::cli::output::{emit_json, robot_ok};
use crate::cli::OutputFormat;
use crate::engine;
use crate::error::{suggest_similar_skills, Result, SkillError};

#[derive(Args, Debug)]
pub struct RemoveArgs {
    /// Skill name
    pub name: String,
}

pub fn run(ctx: &AppContext, args: &RemoveArgs) -> Result<()> {
    let removed = match engine::remove(&ctx.project, &args.name) {
        Ok(removed) => removed,
        Err(err @ SkillError::NotInManifest(_)) => {
            if ctx.output_format == OutputFormat::Human {
                hint_similar(ctx, &args.name);
            }
            return Err(err);
        }
        Err(err) => return Err(err),
    };
    let constraints: Vec<String> = removed.iter().map(|r| r.version.to_string()).collect();

    match ctx.output_format {
        OutputFormat::Json => emit_json(&robot_ok(json!({
            "name": args.name,
            "removed_constraints": constraints,
        })))?,
        OutputFormat::Plain => println!("{}", args.name),
        OutputFormat::Human if ctx.quiet => {}
        OutputFormat::Human => {
            println!("{} {}", "Removed".green().bold(), args.name);
            println!("Run `skill install` to update the vendor directory.");
        }
    }
    Ok(())
}

fn hint_similar(ctx: &AppContext, name: &str) {
    let Ok(manifest) = ctx.project.load_manifest() else {
        return;
    };
    let names: Vec<&str> = manifest.requirements().iter().map(|r| r.name.as_str()).collect();
    let similar = suggest_similar_skills(name, &names, 3);
    if !similar.is_empty() {
        eprintln!("Did you mean: {}?", similar.join(", "));
    }
}
