//! # Identity Module
//!
//! Every participant in Tvrbo (token holders, the sale, its owner, the
//! vault) is addressed by an [`AccountId`]: a 32-byte BLAKE3 digest,
//! rendered as lowercase hex.
//!
//! Authentication is not this module's job. The execution environment
//! tells the core *who* is calling; the core only compares identities.

pub mod account_id;

pub use account_id::{AccountId, AccountIdError};
