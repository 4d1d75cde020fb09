//! JSON snapshot files.
//!
//! Writes go to a sibling temporary file first and are then renamed over
//! the destination, so a crash mid-write never leaves a truncated snapshot
//! behind.

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs;
use std::path::Path;
use thiserror::Error;
use tracing::debug;

use crate::ledger::{CheckpointLedger, IntegrityError};

/// Errors that can occur while saving or loading snapshots.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Filesystem failure.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// The file is not valid JSON for the expected type.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The file parsed, but its contents violate ledger invariants.
    #[error("corrupt snapshot: {0}")]
    Corrupt(#[from] IntegrityError),
}

/// Serializes `value` as pretty JSON to `path`, replacing any existing file.
pub fn save_json<T: Serialize>(path: &Path, value: &T) -> Result<(), StorageError> {
    let bytes = serde_json::to_vec_pretty(value)?;
    let tmp = path.with_extension("tmp");
    fs::write(&tmp, &bytes)?;
    fs::rename(&tmp, path)?;
    debug!(path = %path.display(), bytes = bytes.len(), "snapshot written");
    Ok(())
}

/// Reads a JSON snapshot from `path`.
pub fn load_json<T: DeserializeOwned>(path: &Path) -> Result<T, StorageError> {
    let bytes = fs::read(path)?;
    let value = serde_json::from_slice(&bytes)?;
    debug!(path = %path.display(), bytes = bytes.len(), "snapshot read");
    Ok(value)
}

/// Reads a ledger snapshot and checks its invariants before handing it out.
pub fn load_ledger(path: &Path) -> Result<CheckpointLedger, StorageError> {
    let ledger: CheckpointLedger = load_json(path)?;
    ledger.check_integrity()?;
    Ok(ledger)
}
