//! rmmsync — three-way synchronizer for an RMM script library.
//!
//! # Usage
//!
//! ```text
//! rmmsync sync [--dry-run]    run the full reconciliation pipeline
//! rmmsync check               preflight checks only, mutate nothing
//! ```
//!
//! All configuration comes from the environment; see `rmmsync-core`'s
//! config module for the recognized variables.

mod commands;

use std::io::Write as _;

use anyhow::Result;
use clap::{Parser, Subcommand};

use commands::{check::CheckArgs, sync::SyncArgs};

#[derive(Parser, Debug)]
#[command(
    name = "rmmsync",
    version,
    about = "Reconcile RMM scripts between the API, a local mirror, and Git",
    long_about = None,
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the sync pipeline: pull, writeback, fetch, prune, push.
    Sync(SyncArgs),

    /// Run the preflight gate and report, without syncing anything.
    Check(CheckArgs),
}

fn main() -> Result<()> {
    // The run narrative goes to stdout as bare lines; this tool's "log" is
    // its user interface, cron captures it as the run report.
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .target(env_logger::Target::Stdout)
        .format(|buf, record| writeln!(buf, "{}", record.args()))
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Sync(args) => args.run(),
        Commands::Check(args) => args.run(),
    }
}
