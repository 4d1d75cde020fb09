//! # Tvrbo Contracts
//!
//! Application logic that runs on top of the checkpoint ledger:
//!
//! - **Token Sale** — a time-boxed, hard-capped campaign that mints tokens
//!   for contributed value and emits vault-forward obligations.
//! - **Settlement** — the transport seam that carries those obligations out.
//!
//! ## Design Principles
//!
//! 1. All monetary operations are checked. `checked_add`/`checked_mul`
//!    everywhere; an overflow is an error, never a wrap.
//! 2. State transitions are explicit enum variants, evaluated against the
//!    caller's clock rather than stored.
//! 3. Capabilities gate every privileged operation: the ledger controller
//!    for minting, the sale owner for administration.
//! 4. Every public type is serializable (serde) for reports and snapshots.

pub mod settlement;
pub mod token_sale;
