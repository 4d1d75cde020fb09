// Copyright (c) 2026 ALAS Technology. MIT License.
// See LICENSE for details.

//! # Tvrbo Operator Tool
//!
//! Entry point for the `tvrbo` binary. Parses CLI arguments, initializes
//! logging, and dispatches to one of three subcommands:
//!
//! - `replay`  — run a call script against a fresh ledger and sale
//! - `inspect` — query a state file written by `replay`
//! - `version` — print build version information
//!
//! Reports go to stdout as JSON; logs go to stderr.

mod cli;
mod logging;
mod script;

use anyhow::{Context, Result};
use clap::Parser;
use serde::Serialize;
use std::fs;

use tvrbo_protocol::storage::{load_json, save_json};

use cli::{Commands, TvrboCli};
use script::{Replay, Script, StateFile};

fn main() -> Result<()> {
    let cli = TvrboCli::parse();

    match cli.command {
        Commands::Replay(args) => {
            logging::init_logging(&cli.log_level, cli.log_format);
            replay(args)
        }
        Commands::Inspect(args) => {
            logging::init_logging(&cli.log_level, cli.log_format);
            inspect(args)
        }
        Commands::Version => {
            print_version();
            Ok(())
        }
    }
}

/// Replays a call script and prints the report.
fn replay(args: cli::ReplayArgs) -> Result<()> {
    let raw = fs::read_to_string(&args.script)
        .with_context(|| format!("failed to read script {}", args.script.display()))?;
    let script: Script = serde_json::from_str(&raw)
        .with_context(|| format!("failed to parse script {}", args.script.display()))?;

    tracing::info!(script = %args.script.display(), "replaying");
    let (report, state) = Replay::run(&script, args.events)?;

    if let Some(path) = &args.state_out {
        save_json(path, &state)
            .with_context(|| format!("failed to write state to {}", path.display()))?;
        tracing::info!(path = %path.display(), "state saved");
    }

    print_json(&report)
}

/// Prints one account's view of a saved state.
fn inspect(args: cli::InspectArgs) -> Result<()> {
    let state: StateFile = load_json(&args.state)
        .with_context(|| format!("failed to load state from {}", args.state.display()))?;
    state
        .ledger
        .check_integrity()
        .with_context(|| format!("state {} is corrupt", args.state.display()))?;

    let view = state.inspect(&args.account, args.at);
    if view.point > view.head {
        tracing::warn!(point = %view.point, head = %view.head, "point is past the ledger head");
    }
    print_json(&view)
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let out = serde_json::to_string_pretty(value).context("failed to encode report")?;
    println!("{out}");
    Ok(())
}

/// Prints version information to stdout.
fn print_version() {
    println!("tvrbo     {}", env!("CARGO_PKG_VERSION"));
    println!("protocol  {}", tvrbo_protocol::config::PROTOCOL_VERSION);
    println!("token     {}", tvrbo_protocol::config::TOKEN_VERSION_TAG);
}
