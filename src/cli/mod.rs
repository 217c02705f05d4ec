//! Command-line parsing.
//!
//! Kept apart from the lifecycle code so `app` only deals with resolved options.

use clap::{Parser, Subcommand};

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(
    name = "grid-ingest",
    version,
    about = "Polls the AESO supply/demand report and writes it to InfluxDB"
)]
pub struct Cli {
    /// Defaults to `run` when omitted.
    #[command(subcommand)]
    pub command: Option<Command>,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run cycles on a fixed cadence until SIGINT/SIGTERM.
    Run(RunArgs),
    /// Run a single cycle, close the writer and exit.
    Once(OnceArgs),
}

#[derive(Debug, Parser, Clone, Default)]
pub struct RunArgs {
    /// Seconds between cycles (overrides INGEST_INTERVAL_SECS).
    #[arg(long, value_name = "SECS", value_parser = clap::value_parser!(u64).range(1..))]
    pub interval: Option<u64>,

    /// Start the first cycle immediately instead of waiting for the next interval boundary.
    #[arg(long)]
    pub no_align: bool,
}

#[derive(Debug, Parser, Clone, Default)]
pub struct OnceArgs {
    /// Print the line protocol to stdout instead of writing to InfluxDB.
    #[arg(long)]
    pub dry_run: bool,
}
