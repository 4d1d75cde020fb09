//! # CLI Interface
//!
//! Defines the command-line argument structure for `tvrbo` using `clap`
//! derive. Three subcommands: `replay`, `inspect`, and `version`.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::logging::LogFormat;

/// Default log filter when neither `--log-level` nor `RUST_LOG` is given.
pub const DEFAULT_LOG_FILTER: &str = "tvrbo=info,tvrbo_contracts=info,tvrbo_protocol=warn";

/// Tvrbo token sale operator tool.
///
/// Replays recorded call logs against a fresh ledger and sale, and
/// inspects saved state. Every run is deterministic: the same script
/// always produces the same report and state.
#[derive(Parser, Debug)]
#[command(
    name = "tvrbo",
    about = "Tvrbo token sale operator tool",
    version,
    propagate_version = true
)]
pub struct TvrboCli {
    /// Log output format.
    #[arg(long, global = true, value_enum, env = "TVRBO_LOG_FORMAT", default_value_t = LogFormat::Pretty)]
    pub log_format: LogFormat,

    /// Log filter directives (overridden by `RUST_LOG`).
    #[arg(long, global = true, env = "TVRBO_LOG", default_value = DEFAULT_LOG_FILTER)]
    pub log_level: String,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level subcommands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Replay a call script and print the outcome report as JSON.
    Replay(ReplayArgs),
    /// Query a saved state file.
    Inspect(InspectArgs),
    /// Print version information and exit.
    Version,
}

/// Arguments for the `replay` subcommand.
#[derive(Parser, Debug)]
pub struct ReplayArgs {
    /// Path to the call script (JSON).
    #[arg(long, short = 's', env = "TVRBO_SCRIPT")]
    pub script: PathBuf,

    /// Where to write the resulting state. Nothing is written when omitted.
    #[arg(long, short = 'o', env = "TVRBO_STATE")]
    pub state_out: Option<PathBuf>,

    /// Include the ledger event journal in the report.
    #[arg(long)]
    pub events: bool,
}

/// Arguments for the `inspect` subcommand.
#[derive(Parser, Debug)]
pub struct InspectArgs {
    /// Path to a state file written by `replay --state-out`.
    #[arg(long, env = "TVRBO_STATE")]
    pub state: PathBuf,

    /// Account label (as used in the script) or 64-char hex identity.
    #[arg(long, short = 'a')]
    pub account: String,

    /// Sequence point to query. Defaults to the ledger head.
    #[arg(long)]
    pub at: Option<u64>,
}
