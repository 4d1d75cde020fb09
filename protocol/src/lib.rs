// Copyright (c) 2026 ALAS Technology. MIT License.
// See LICENSE for details.

//! # Tvrbo Protocol — Core Library
//!
//! The accounting half of Tvrbo's capital-raising stack: a token ledger that
//! can answer "what did this account hold at that moment" for any moment in
//! its history, and the capability guards that decide who may change it.
//!
//! ## Architecture
//!
//! - **identity** — 32-byte account identities (BLAKE3, hex on the wire).
//! - **guard** — the Controller and Owner capabilities.
//! - **ledger** — the checkpointed token: histories, mutations, forks.
//! - **storage** — JSON snapshot persistence for ledger state.
//! - **config** — protocol constants and defaults.
//!
//! ## Execution Model
//!
//! The core is synchronous and deterministic. It never reads a clock,
//! never authenticates anyone, and never moves external value: callers
//! hand in "who", "when" and "how much", and get back state changes and
//! obligations. Replaying the same calls with the same inputs produces the
//! same ledger, byte for byte.

pub mod config;
pub mod guard;
pub mod identity;
pub mod ledger;
pub mod storage;
