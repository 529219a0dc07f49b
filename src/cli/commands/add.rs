//! skill add - Add or update a requirement

use clap::Args;
use colored::Colorize;
use serde_json::json;

use crate::app::AppContext;
use crate::cli::output::{emit_json, robot_ok};
use crate::cli::OutputFormat;
use crate::core::VersionConstraint;
use crate::engine;
use crate::error::Result;
use crate::storage::AddOutcome;

#[derive(Args, Debug)]
pub struct AddArgs {
    /// Skill name
    pub name: String,

    /// Version constraint: `latest`, an exact version, or a semver range
    #[arg(id = "version_constraint", value_name = "VERSION", default_value = "latest")]
    pub version: String,
}

pub fn run(ctx: &AppContext, args: &AddArgs) -> Result<()> {
    let constraint = VersionConstraint::parse(&args.version)?;
    let outcome = engine::add(&ctx.project, &args.name, constraint.clone())?;

    let (action, previous) = match &outcome {
        AddOutcome::Added => ("added", None),
        AddOutcome::Replaced(previous) => ("updated", Some(previous.to_string())),
        AddOutcome::Unchanged => ("unchanged", None),
    };

    match ctx.output_format {
        OutputFormat::Json => emit_json(&robot_ok(json!({
            "name": args.name,
            "version": constraint.to_string(),
            "action": action,
            "previous": previous,
        })))?,
        OutputFormat::Plain => println!("{action}\t{}\t{constraint}", args.name),
        OutputFormat::Human if ctx.quiet => {}
        OutputFormat::Human => {
            match &outcome {
                AddOutcome::Added => println!(
                    "{} {} {}",
                    "Added".green().bold(),
                    args.name,
                    constraint.to_string().dimmed()
                ),
                AddOutcome::Replaced(previous) => println!(
                    "{} {} {} -> {}",
                    "Updated".green().bold(),
                    args.name,
                    previous,
                    constraint
                ),
                AddOutcome::Unchanged => println!("{} already requires {constraint}", args.name),
            }
            if outcome != AddOutcome::Unchanged {
                println!("Run `skill install` to update the vendor directory.");
            }
        }
    }
    Ok(())
}
