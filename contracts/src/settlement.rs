//! # Vault Settlement
//!
//! The sale never moves value itself. Each accepted contribution carries a
//! [`VaultForward`] obligation, and a [`ValueTransport`] is the external
//! mechanism that carries it out. A contribution counts as committed only
//! once its forward has settled.
//!
//! [`RecordingTransport`] is the in-process transport used by the replay
//! tool and tests: it tallies what each vault has received.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;
use tracing::debug;

use crate::token_sale::VaultForward;
use tvrbo_protocol::identity::AccountId;
use tvrbo_protocol::ledger::Amount;

/// Moves contributed value to a vault.
pub trait ValueTransport {
    /// Transport-specific failure.
    type Error: std::error::Error;

    /// Executes one forward obligation.
    fn settle(&mut self, forward: &VaultForward) -> Result<(), Self::Error>;
}

/// Errors from [`RecordingTransport`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SettlementError {
    /// The vault's received total would overflow.
    #[error("vault {0} received total overflows")]
    Overflow(AccountId),
}

/// In-memory transport that records settled value per vault.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordingTransport {
    received: BTreeMap<AccountId, Amount>,
    settled: u64,
}

impl RecordingTransport {
    /// An empty transport.
    pub fn new() -> Self {
        Self::default()
    }

    /// Total value forwarded to `vault` so far.
    pub fn received_by(&self, vault: &AccountId) -> Amount {
        self.received.get(vault).copied().unwrap_or(0)
    }

    /// Per-vault totals.
    pub fn received(&self) -> &BTreeMap<AccountId, Amount> {
        &self.received
    }

    /// Number of forwards settled.
    pub fn settled_count(&self) -> u64 {
        self.settled
    }
}

impl ValueTransport for RecordingTransport {
    type Error = SettlementError;

    fn settle(&mut self, forward: &VaultForward) -> Result<(), SettlementError> {
        let current = self.received_by(&forward.vault);
        let total = current
            .checked_add(forward.amount)
            .ok_or(SettlementError::Overflow(forward.vault))?;
        self.received.insert(forward.vault, total);
        self.settled += 1;
        debug!(vault = %forward.vault.short(), amount = forward.amount, total, "forward settled");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tallies_per_vault() {
        let v1 = AccountId::from_label("v1");
        let v2 = AccountId::from_label("v2");
        let mut t = RecordingTransport::new();
        t.settle(&VaultForward { vault: v1, amount: 10 }).unwrap();
        t.settle(&VaultForward { vault: v2, amount: 3 }).unwrap();
        t.settle(&VaultForward { vault: v1, amount: 5 }).unwrap();
        assert_eq!(t.received_by(&v1), 15);
        assert_eq!(t.received_by(&v2), 3);
        assert_eq!(t.settled_count(), 3);
    }

    #[test]
    fn overflow_is_rejected_without_change() {
        let v = AccountId::from_label("v");
        let mut t = RecordingTransport::new();
        t.settle(&VaultForward { vault: v, amount: Amount::MAX }).unwrap();
        assert_eq!(
            t.settle(&VaultForward { vault: v, amount: 1 }),
            Err(SettlementError::Overflow(v))
        );
        assert_eq!(t.received_by(&v), Amount::MAX);
        assert_eq!(t.settled_count(), 1);
    }
}
