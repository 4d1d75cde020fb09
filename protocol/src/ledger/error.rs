//! Error types for the checkpoint ledger.
//!
//! Every ledger operation either applies completely or fails with one of
//! these and leaves the ledger exactly as it was.

use thiserror::Error;

use super::checkpoint::{Amount, SequencePoint};
use crate::guard::Unauthorized;
use crate::identity::AccountId;

/// Errors returned by [`CheckpointLedger`](super::CheckpointLedger) mutations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    /// The caller does not hold the controller capability.
    #[error(transparent)]
    Unauthorized(#[from] Unauthorized),

    /// A debit exceeds the account's current balance.
    #[error("insufficient balance: {account} has {available}, requested {requested}")]
    InsufficientBalance {
        /// The account being debited.
        account: AccountId,
        /// Its current balance.
        available: Amount,
        /// The amount that was requested.
        requested: Amount,
    },

    /// A credit would push a balance or the total supply past `u128::MAX`,
    /// or the sequence counter is exhausted.
    #[error("arithmetic overflow")]
    Overflow,

    /// Holder-initiated transfers are switched off by the controller.
    #[error("transfers are disabled")]
    TransfersDisabled,

    /// A delegated transfer exceeds the remaining allowance.
    #[error(
        "insufficient allowance: {spender} may move {available} of {owner}'s tokens, requested {requested}"
    )]
    InsufficientAllowance {
        /// The holder whose tokens would move.
        owner: AccountId,
        /// The delegate attempting the move.
        spender: AccountId,
        /// Remaining allowance.
        available: Amount,
        /// The amount that was requested.
        requested: Amount,
    },

    /// Changing a non-zero allowance directly to another non-zero value.
    /// The allowance must be reset to zero first.
    #[error("approval race: allowance for {spender} on {owner} is {current}, reset to zero first")]
    ApprovalRace {
        /// The holder granting the allowance.
        owner: AccountId,
        /// The delegate.
        spender: AccountId,
        /// The allowance currently in place.
        current: Amount,
    },
}

/// Structural defects found by
/// [`CheckpointLedger::check_integrity`](super::CheckpointLedger::check_integrity).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IntegrityError {
    /// An account's checkpoints are not strictly ascending by point.
    #[error("history of {account} is not strictly ordered")]
    UnorderedHistory {
        /// The account whose history is broken.
        account: AccountId,
    },

    /// The total supply checkpoints are not strictly ascending by point.
    #[error("total supply history is not strictly ordered")]
    UnorderedSupply,

    /// An account has a checkpoint the ledger head has not reached.
    #[error("history of {account} has a checkpoint at {point} beyond head {head}")]
    BalanceBeyondHead {
        /// The account holding the stray checkpoint.
        account: AccountId,
        /// Point of its last checkpoint.
        point: SequencePoint,
        /// The ledger head.
        head: SequencePoint,
    },

    /// The total supply has a checkpoint the ledger head has not reached.
    #[error("total supply has a checkpoint at {point} beyond head {head}")]
    SupplyBeyondHead {
        /// Point of the last supply checkpoint.
        point: SequencePoint,
        /// The ledger head.
        head: SequencePoint,
    },

    /// Current balances do not fit in an [`Amount`] when added up.
    #[error("balances overflow when summed")]
    BalanceOverflow,

    /// Current balances and current supply disagree.
    #[error("balances sum to {balances} but total supply is {supply}")]
    SupplyMismatch {
        /// Sum of current balances.
        balances: Amount,
        /// Current total supply.
        supply: Amount,
    },
}
