//! skill status - Compare manifest, lockfile and vendor directory

use std::process::ExitCode;

use clap::Args;
use colored::Colorize;

use crate::app::AppContext;
use crate::cli::output::{emit_formatted, HumanLayout};
use crate::engine::{self, LockfileState, SkillState, SkillStatus, StatusReport};
use crate::error::Result;

#[derive(Args, Debug, Default)]
pub struct StatusArgs {
    /// Exit with status 1 unless everything is installed and up to date
    #[arg(long)]
    pub check: bool,
}

pub fn run(ctx: &AppContext, args: &StatusArgs) -> Result<ExitCode> {
    let cache = ctx.cache()?;
    let report = engine::status(&ctx.project, &cache)?;
    let clean = report.is_clean();

    if !(ctx.quiet && !ctx.robot_mode()) {
        emit_formatted(&report, ctx.output_format, human, plain)?;
    }

    Ok(if args.check && !clean {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    })
}

fn human(report: &StatusReport) -> HumanLayout {
    let mut layout = HumanLayout::new();
    layout.title(&format!("skill {}", report.tool_version));

    let lockfile = match report.lockfile {
        LockfileState::Missing => "missing".red().to_string(),
        LockfileState::Current => "up to date".green().to_string(),
        LockfileState::Satisfied => "satisfies manifest".green().to_string(),
        LockfileState::Stale => format!("{} ({})", "stale".yellow(), report.stale.join(", ")),
    };
    layout.kv("Lockfile", &lockfile);

    if report.skills.is_empty() {
        layout.kv("Skills", "none");
        return layout;
    }

    layout.blank();
    layout.section("Skills");
    for skill in &report.skills {
        layout.push_line(skill_line(skill));
    }
    if !report.is_clean() {
        layout.blank();
        layout.push_line("Run `skill install` to update the vendor directory.");
    }
    layout
}

fn skill_line(skill: &SkillStatus) -> String {
    let state = match skill.state {
        SkillState::Installed => "installed".green(),
        SkillState::Missing => "missing".red(),
        SkillState::Outdated => "outdated".yellow(),
        SkillState::Modified => "modified".yellow(),
        SkillState::Extraneous => "extraneous".dimmed(),
    };
    let version = match (&skill.locked, &skill.installed) {
        (Some(locked), Some(installed)) if locked != installed => format!("{installed} -> {locked}"),
        (Some(locked), _) => locked.clone(),
        (None, Some(installed)) => installed.clone(),
        (None, None) => String::new(),
    };
    format!("{:<24} {:<12} {version}", skill.name, state)
}

fn plain(report: &StatusReport) -> Vec<String> {
    report
        .skills
        .iter()
        .map(|skill| {
            format!(
                "{}\t{}\t{}",
                skill.name,
                state_str(skill.state),
                skill.locked.as_deref().or(skill.installed.as_deref()).unwrap_or("-")
            )
        })
        .collect()
}

const fn state_str(state: SkillState) -> &'static str {
    match state {
        SkillState::Installed => "installed",
        SkillState::Missing => "missing",
        SkillState::Outdated => "outdated",
        SkillState::Modified => "modified",
        SkillState::Extraneous => "extraneous",
    }
}
