//! skill versions - List published versions of a skill

use clap::Args;
use serde::Serialize;

use crate::app::AppContext;
use crate::cli::output::{emit_formatted, HumanLayout};
use crate::error::Result;
use crate::registry::RegistryClient;

#[derive(Args, Debug)]
pub struct VersionsArgs {
    /// Skill name
    pub name: String,
}

#[derive(Serialize)]
struct VersionsView {
    name: String,
    versions: Vec<String>,
}

pub fn run(ctx: &AppContext, args: &VersionsArgs) -> Result<()> {
    let registry = ctx.registry()?;
    let versions = registry.list_versions(&args.name)?;
    let view = VersionsView {
        name: args.name.clone(),
        versions: versions.iter().rev().map(ToString::to_string).collect(),
    };

    emit_formatted(
        &view,
        ctx.output_format,
        |view| {
            let mut layout = HumanLayout::new();
            layout.title(&view.name);
            if view.versions.is_empty() {
                layout.push_line("no published versions");
            }
            for version in &view.versions {
                layout.bullet(version);
            }
            layout
        },
        |view| view.versions.clone(),
    )
}
