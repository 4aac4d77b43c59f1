//! CLI entry point for buildfetch.

use std::process::ExitCode;

use clap::Parser;

mod app;
mod app_config;
mod cli;

use cli::Args;

#[tokio::main]
async fn main() -> ExitCode {
    // Parse CLI arguments first (before tracing, so --help works without logs)
    let args = Args::parse();

    tokio::select! {
        result = app::runtime::run_buildfetch(args) => match result {
            Ok(()) => ExitCode::SUCCESS,
            Err(err) => {
                eprintln!("Error: {err:#}");
                ExitCode::FAILURE
            }
        },
        () = interrupted() => {
            eprintln!("Download interrupted");
            ExitCode::SUCCESS
        }
    }
}

/// Completes on Ctrl-C; never completes when the handler cannot be installed.
async fn interrupted() {
    if tokio::signal::ctrl_c().await.is_err() {
        std::future::pending::<()>().await;
    }
}
