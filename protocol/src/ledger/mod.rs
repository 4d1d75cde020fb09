//! # Ledger Module — Checkpointed Token Accounting
//!
//! Tvrbo's token is a ledger that remembers. Every balance and the total
//! supply are append-only timelines of checkpoints keyed by a single
//! ledger-wide sequence counter, so any past state can be read back
//! without storing a full snapshot per point.
//!
//! ```text
//! checkpoint.rs — SequencePoint, Checkpoint, History (binary-searched timeline)
//! token.rs      — CheckpointLedger: mint/destroy/transfer, allowances, forks
//! event.rs      — journal of applied mutations
//! error.rs      — LedgerError, IntegrityError
//! ```
//!
//! ## Design Principles
//!
//! 1. **Amounts are `u128`.** Checked arithmetic everywhere; overflow is an
//!    error, never a wrap.
//! 2. **Append, never overwrite.** History is immutable once written.
//! 3. **All-or-nothing.** A failed call leaves the ledger byte-for-byte
//!    unchanged.

pub mod checkpoint;
pub mod error;
pub mod event;
pub mod token;

pub use checkpoint::{Amount, Checkpoint, History, SequencePoint};
pub use error::{IntegrityError, LedgerError};
pub use event::LedgerEvent;
pub use token::{CheckpointLedger, ForkOrigin, TokenMetadata};
