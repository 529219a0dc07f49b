//! skill - Vendor and manage LLM skills from a central repository.

use std::process::ExitCode;

use clap::Parser;
use tracing::debug;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use skill::app::AppContext;
use skill::cli::output::{emit_json, robot_error_structured};
use skill::cli::Cli;
use skill::core::CancellationToken;
use skill::Result;

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(&cli);

    let cancel = CancellationToken::new();
    install_interrupt_handler(cancel.clone());

    match run(&cli, cancel) {
        Ok(code) => code,
        Err(e) => {
            if cli.output_format().is_machine_readable() {
                // Robot mode: JSON error output to stdout
                if emit_json(&robot_error_structured(&e)).is_err() {
                    eprintln!("Error: {e}");
                }
            } else {
                eprintln!("Error: {e}");
                let structured = e.to_structured();
                if !structured.suggestion.is_empty() {
                    eprintln!("Hint: {}", structured.suggestion);
                }
            }
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli, cancel: CancellationToken) -> Result<ExitCode> {
    let ctx = AppContext::from_cli(cli, cancel)?;
    skill::cli::commands::run(&ctx, &cli.command)
}

/// Ctrl-C flips the token; work already committed stays committed.
fn install_interrupt_handler(cancel: CancellationToken) {
    let spawned = std::thread::Builder::new()
        .name("skill-signal".to_string())
        .spawn(move || {
            let runtime = match tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
            {
                Ok(runtime) => runtime,
                Err(err) => {
                    debug!("signal handler unavailable: {err}");
                    return;
                }
            };
            runtime.block_on(async {
                if tokio::signal::ctrl_c().await.is_ok() {
                    eprintln!("Interrupted; finishing in-flight work");
                    cancel.cancel();
                }
            });
        });
    if let Err(err) = spawned {
        debug!("failed to spawn signal thread: {err}");
    }
}

fn init_tracing(cli: &Cli) {
    if cli.quiet {
        return;
    }

    let filter = match cli.verbose {
        0 => "warn,skill=info",
        1 => "info,skill=debug",
        2 => "debug,skill=trace",
        _ => "trace",
    };

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(filter));

    if cli.output_format().is_machine_readable() {
        // JSON logging for robot mode
        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}
