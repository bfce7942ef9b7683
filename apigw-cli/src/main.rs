//! apigw: reconcile API gateway resources from flags or a declaration file.
//!
//! Prints one JSON report per reconciled resource on stdout. On a fatal
//! error prints `{"failed": true, "msg": ..., "kind": ...}` and exits 1.

use std::process::ExitCode;

use clap::Parser;
use tracing::error;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

mod cli;
mod commands;
mod output;

use cli::Cli;
use output::Failure;

fn init_logging(verbose: bool) {
    let default = if verbose {
        "apigw=debug,apigw_reconcile=debug"
    } else {
        "apigw=info,apigw_reconcile=info"
    };
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| default.into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match commands::run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{:#}", e);
            let failure = Failure::from_error(&e);
            if let Err(e) = output::print(&failure) {
                error!("Failed to write report: {}", e);
            }
            ExitCode::FAILURE
        }
    }
}
