//! # Storage Module
//!
//! File persistence for ledger and sale state. The core itself is purely
//! in-memory; this module is how operators move state between runs.
//!
//! ```text
//! snapshot.rs — JSON snapshot files with atomic replace and integrity checks
//! ```
//!
//! JSON was chosen over a binary encoding because snapshots are read by
//! humans as often as by tools, and identities render as hex.

pub mod snapshot;

pub use snapshot::{load_json, load_ledger, save_json, StorageError};
