// dqx/src/main.rs

mod cli;
mod commands;

use clap::Parser;
use miette::Diagnostic;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

use dqx_core::DqxError;
use dqx_core::infrastructure::error::InfrastructureError;

use crate::cli::Cli;

fn main() -> ExitCode {
    // RUST_LOG=dqx_core=debug dqx populate 3
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match commands::dispatch(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            report(&err);
            ExitCode::FAILURE
        }
    }
}

/// Prints the error chain, plus the diagnostic help line when a cause is one
/// of ours.
fn report(err: &anyhow::Error) {
    eprintln!("❌ {:#}", err);
    if let Some(help) = err.chain().find_map(help_of) {
        eprintln!("👉 {}", help);
    }
}

fn help_of(cause: &(dyn std::error::Error + 'static)) -> Option<String> {
    let help = if let Some(e) = cause.downcast_ref::<DqxError>() {
        e.help()
    } else if let Some(e) = cause.downcast_ref::<InfrastructureError>() {
        e.help()
    } else {
        None
    };
    help.map(|h| h.to_string())
}
