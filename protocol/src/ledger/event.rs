//! Ledger event journal entries.
//!
//! The journal is an ordered record of what the ledger did, for indexers
//! and replay reports. It is derived data: balances are answered from
//! checkpoints, never by re-reading the journal.

use serde::{Deserialize, Serialize};

use super::checkpoint::{Amount, SequencePoint};
use crate::identity::AccountId;

/// One applied ledger mutation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LedgerEvent {
    /// Balance movement. A mint has no `from`; a destroy has no `to`.
    Transfer {
        /// Debited account, `None` for a mint.
        from: Option<AccountId>,
        /// Credited account, `None` for a destroy.
        to: Option<AccountId>,
        /// Amount moved.
        amount: Amount,
        /// Point at which the checkpoints were written.
        point: SequencePoint,
    },
    /// An allowance was set.
    Approval {
        /// The holder.
        owner: AccountId,
        /// The delegate.
        spender: AccountId,
        /// The new allowance.
        amount: Amount,
    },
    /// The controller capability moved (or was renounced).
    ControllerChanged {
        /// Previous holder.
        previous: Option<AccountId>,
        /// New holder, `None` when renounced.
        current: Option<AccountId>,
    },
    /// Holder transfers were switched on or off.
    TransfersToggled {
        /// The new setting.
        enabled: bool,
    },
}
