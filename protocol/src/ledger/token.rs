//! # Checkpoint Ledger
//!
//! The fungible token at the heart of Tvrbo. Balances and total supply are
//! kept as [`History`] timelines rather than plain counters, so the ledger
//! can answer "what did X hold at point P" for any point it has ever
//! passed through.
//!
//! ## Sequencing
//!
//! The ledger owns one global [`SequencePoint`] counter (`head`). Every
//! applied mutation takes the next point and writes *all* of its
//! checkpoints there: a transfer debits and credits at the same point, a
//! mint credits the recipient and total supply at the same point. Because
//! the counter is shared, "balance of A and balance of B at point P" is a
//! consistent cross-account snapshot.
//!
//! ## Atomicity
//!
//! Every mutation validates and computes all new values first, and only
//! then touches state. A returned error therefore guarantees that nothing
//! changed: not the head, not a history, not the journal.
//!
//! ## Capabilities
//!
//! Minting, destroying, toggling transfers and handing over control are
//! gated by the ledger's [`Controller`]. Transfers are gated by balance
//! (and by the transfers-enabled flag for non-controllers).

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, info};

use super::checkpoint::{Amount, History, SequencePoint};
use super::error::{IntegrityError, LedgerError};
use super::event::LedgerEvent;
use crate::config::{
    DEFAULT_TOKEN_DECIMALS, DEFAULT_TOKEN_NAME, DEFAULT_TOKEN_SYMBOL, TOKEN_VERSION_TAG,
};
use crate::guard::Controller;
use crate::identity::AccountId;

// ---------------------------------------------------------------------------
// Metadata
// ---------------------------------------------------------------------------

/// Descriptive token properties. None of these affect arithmetic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenMetadata {
    /// Human-readable name (e.g., "Tvrbo Token").
    pub name: String,
    /// Ticker symbol (e.g., "TTK").
    pub symbol: String,
    /// Display precision.
    pub decimals: u8,
    /// Layout/version tag.
    pub version: String,
}

impl TokenMetadata {
    /// Metadata with the current version tag.
    pub fn new(name: impl Into<String>, symbol: impl Into<String>, decimals: u8) -> Self {
        Self {
            name: name.into(),
            symbol: symbol.into(),
            decimals,
            version: TOKEN_VERSION_TAG.to_string(),
        }
    }
}

impl Default for TokenMetadata {
    fn default() -> Self {
        Self::new(DEFAULT_TOKEN_NAME, DEFAULT_TOKEN_SYMBOL, DEFAULT_TOKEN_DECIMALS)
    }
}

/// Where a forked ledger's genesis balances came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForkOrigin {
    /// Symbol of the source ledger.
    pub source_symbol: String,
    /// Point in the source ledger whose balances seeded the fork.
    pub point: SequencePoint,
}

// ---------------------------------------------------------------------------
// CheckpointLedger
// ---------------------------------------------------------------------------

/// Snapshot-capable fungible token ledger.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckpointLedger {
    metadata: TokenMetadata,
    controller: Controller,
    /// Point of the most recently applied mutation.
    head: SequencePoint,
    balances: BTreeMap<AccountId, History>,
    total_supply: History,
    /// `owner -> spender -> remaining allowance`.
    allowances: BTreeMap<AccountId, BTreeMap<AccountId, Amount>>,
    transfers_enabled: bool,
    origin: Option<ForkOrigin>,
    events: Vec<LedgerEvent>,
}

impl CheckpointLedger {
    /// Creates a ledger at genesis: zero supply, no checkpoints, transfers
    /// enabled, and `controller` holding the controller capability.
    pub fn new(metadata: TokenMetadata, controller: AccountId) -> Self {
        Self {
            metadata,
            controller: Controller::new(controller),
            head: SequencePoint::GENESIS,
            balances: BTreeMap::new(),
            total_supply: History::new(),
            allowances: BTreeMap::new(),
            transfers_enabled: true,
            origin: None,
            events: Vec::new(),
        }
    }

    // -- queries ------------------------------------------------------------

    /// Token metadata.
    pub fn metadata(&self) -> &TokenMetadata {
        &self.metadata
    }

    /// The current controller, `None` if renounced.
    pub fn controller(&self) -> Option<AccountId> {
        self.controller.holder()
    }

    /// Point of the most recently applied mutation.
    pub fn head(&self) -> SequencePoint {
        self.head
    }

    /// Whether holders may transfer and approve.
    pub fn transfers_enabled(&self) -> bool {
        self.transfers_enabled
    }

    /// Provenance if this ledger was produced by [`fork_at`](Self::fork_at).
    pub fn origin(&self) -> Option<&ForkOrigin> {
        self.origin.as_ref()
    }

    /// Balance of `account` at `point`.
    ///
    /// Zero before the account's first checkpoint. Points past the head
    /// return the latest balance.
    pub fn balance_at(&self, account: &AccountId, point: SequencePoint) -> Amount {
        self.balances
            .get(account)
            .map(|h| h.value_at(point))
            .unwrap_or(0)
    }

    /// Balance of `account` at the head.
    pub fn current_balance(&self, account: &AccountId) -> Amount {
        self.balances.get(account).map(History::latest).unwrap_or(0)
    }

    /// Total supply at `point`.
    pub fn total_supply_at(&self, point: SequencePoint) -> Amount {
        self.total_supply.value_at(point)
    }

    /// Total supply at the head.
    pub fn total_supply(&self) -> Amount {
        self.total_supply.latest()
    }

    /// Full checkpoint history of `account`, if it ever held a balance.
    pub fn history(&self, account: &AccountId) -> Option<&History> {
        self.balances.get(account)
    }

    /// Every account that has a checkpoint, with its current balance.
    pub fn holders(&self) -> impl Iterator<Item = (AccountId, Amount)> + '_ {
        self.balances.iter().map(|(id, h)| (*id, h.latest()))
    }

    /// Remaining amount `spender` may move out of `owner`'s balance.
    pub fn allowance(&self, owner: &AccountId, spender: &AccountId) -> Amount {
        self.allowances
            .get(owner)
            .and_then(|m| m.get(spender))
            .copied()
            .unwrap_or(0)
    }

    /// Journal of applied mutations, oldest first.
    pub fn events(&self) -> &[LedgerEvent] {
        &self.events
    }

    // -- controller-gated ---------------------------------------------------

    /// Creates `amount` new tokens for `recipient`.
    ///
    /// Returns the point the checkpoints were written at (the unchanged
    /// head for a zero amount).
    ///
    /// # Errors
    ///
    /// [`LedgerError::Unauthorized`] if `caller` is not the controller,
    /// [`LedgerError::Overflow`] if the recipient's balance or the supply
    /// would exceed `u128::MAX`.
    pub fn mint(
        &mut self,
        caller: &AccountId,
        recipient: &AccountId,
        amount: Amount,
    ) -> Result<SequencePoint, LedgerError> {
        self.controller.require(caller)?;
        if amount == 0 {
            return Ok(self.head);
        }

        let supply = self
            .total_supply
            .latest()
            .checked_add(amount)
            .ok_or(LedgerError::Overflow)?;
        let balance = self
            .current_balance(recipient)
            .checked_add(amount)
            .ok_or(LedgerError::Overflow)?;
        let point = self.next_point()?;

        self.total_supply.record(point, supply);
        self.balances.entry(*recipient).or_default().record(point, balance);
        self.commit(
            point,
            LedgerEvent::Transfer {
                from: None,
                to: Some(*recipient),
                amount,
                point,
            },
        );

        debug!(%point, recipient = %recipient.short(), amount, supply, "minted");
        Ok(point)
    }

    /// Removes `amount` tokens from `holder`.
    ///
    /// # Errors
    ///
    /// [`LedgerError::Unauthorized`] if `caller` is not the controller,
    /// [`LedgerError::InsufficientBalance`] if `holder` has less than `amount`.
    pub fn destroy(
        &mut self,
        caller: &AccountId,
        holder: &AccountId,
        amount: Amount,
    ) -> Result<SequencePoint, LedgerError> {
        self.controller.require(caller)?;

        let available = self.current_balance(holder);
        if amount > available {
            return Err(LedgerError::InsufficientBalance {
                account: *holder,
                available,
                requested: amount,
            });
        }
        if amount == 0 {
            return Ok(self.head);
        }

        let supply = self
            .total_supply
            .latest()
            .checked_sub(amount)
            .ok_or(LedgerError::Overflow)?;
        let point = self.next_point()?;

        self.total_supply.record(point, supply);
        self.balances
            .entry(*holder)
            .or_default()
            .record(point, available - amount);
        self.commit(
            point,
            LedgerEvent::Transfer {
                from: Some(*holder),
                to: None,
                amount,
                point,
            },
        );

        debug!(%point, holder = %holder.short(), amount, supply, "destroyed");
        Ok(point)
    }

    /// Switches holder transfers and approvals on or off.
    pub fn enable_transfers(
        &mut self,
        caller: &AccountId,
        enabled: bool,
    ) -> Result<(), LedgerError> {
        self.controller.require(caller)?;
        if self.transfers_enabled != enabled {
            self.transfers_enabled = enabled;
            self.events.push(LedgerEvent::TransfersToggled { enabled });
            info!(enabled, "transfers toggled");
        }
        Ok(())
    }

    /// Hands the controller capability to `new_controller`.
    ///
    /// Effective immediately: the very next call is checked against the
    /// new holder.
    pub fn set_controller(
        &mut self,
        caller: &AccountId,
        new_controller: AccountId,
    ) -> Result<(), LedgerError> {
        self.change_controller(caller, Some(new_controller))
    }

    /// Drops the controller capability. Nobody can mint or destroy again.
    pub fn renounce_controller(&mut self, caller: &AccountId) -> Result<(), LedgerError> {
        self.change_controller(caller, None)
    }

    fn change_controller(
        &mut self,
        caller: &AccountId,
        next: Option<AccountId>,
    ) -> Result<(), LedgerError> {
        let previous = self.controller.hand_over(caller, next)?;
        self.events.push(LedgerEvent::ControllerChanged {
            previous,
            current: next,
        });
        info!(
            previous = ?previous.map(|id| id.short()),
            current = ?next.map(|id| id.short()),
            "controller changed"
        );
        Ok(())
    }

    // -- holder operations --------------------------------------------------

    /// Moves `amount` from `from` (the authenticated caller) to `to`.
    ///
    /// Both checkpoints are written at the same point; total supply is
    /// untouched.
    ///
    /// # Errors
    ///
    /// [`LedgerError::TransfersDisabled`] while transfers are off,
    /// [`LedgerError::InsufficientBalance`] if `from` holds less than `amount`.
    pub fn transfer(
        &mut self,
        from: &AccountId,
        to: &AccountId,
        amount: Amount,
    ) -> Result<SequencePoint, LedgerError> {
        if !self.transfers_enabled {
            return Err(LedgerError::TransfersDisabled);
        }
        self.move_balance(from, to, amount)
    }

    /// Sets the allowance `spender` may draw from `owner`'s balance.
    ///
    /// A non-zero allowance can only be replaced after resetting it to zero.
    pub fn approve(
        &mut self,
        owner: &AccountId,
        spender: &AccountId,
        amount: Amount,
    ) -> Result<(), LedgerError> {
        if !self.transfers_enabled {
            return Err(LedgerError::TransfersDisabled);
        }
        let current = self.allowance(owner, spender);
        if amount != 0 && current != 0 {
            return Err(LedgerError::ApprovalRace {
                owner: *owner,
                spender: *spender,
                current,
            });
        }

        self.allowances
            .entry(*owner)
            .or_default()
            .insert(*spender, amount);
        self.events.push(LedgerEvent::Approval {
            owner: *owner,
            spender: *spender,
            amount,
        });
        debug!(owner = %owner.short(), spender = %spender.short(), amount, "approved");
        Ok(())
    }

    /// Moves `amount` from `from` to `to` on behalf of `caller`.
    ///
    /// The controller may move any balance, ignoring allowances and the
    /// transfers-enabled flag. Anyone else spends down their allowance.
    pub fn transfer_from(
        &mut self,
        caller: &AccountId,
        from: &AccountId,
        to: &AccountId,
        amount: Amount,
    ) -> Result<SequencePoint, LedgerError> {
        if self.controller.is_held_by(caller) {
            return self.move_balance(from, to, amount);
        }
        if !self.transfers_enabled {
            return Err(LedgerError::TransfersDisabled);
        }

        let available = self.allowance(from, caller);
        if amount > available {
            return Err(LedgerError::InsufficientAllowance {
                owner: *from,
                spender: *caller,
                available,
                requested: amount,
            });
        }

        let point = self.move_balance(from, to, amount)?;
        if amount > 0 {
            self.allowances
                .entry(*from)
                .or_default()
                .insert(*caller, available - amount);
        }
        Ok(point)
    }

    fn move_balance(
        &mut self,
        from: &AccountId,
        to: &AccountId,
        amount: Amount,
    ) -> Result<SequencePoint, LedgerError> {
        let available = self.current_balance(from);
        if amount > available {
            return Err(LedgerError::InsufficientBalance {
                account: *from,
                available,
                requested: amount,
            });
        }
        if amount == 0 || from == to {
            return Ok(self.head);
        }

        let credited = self
            .current_balance(to)
            .checked_add(amount)
            .ok_or(LedgerError::Overflow)?;
        let point = self.next_point()?;

        self.balances
            .entry(*from)
            .or_default()
            .record(point, available - amount);
        self.balances.entry(*to).or_default().record(point, credited);
        self.commit(
            point,
            LedgerEvent::Transfer {
                from: Some(*from),
                to: Some(*to),
                amount,
                point,
            },
        );

        debug!(%point, from = %from.short(), to = %to.short(), amount, "transferred");
        Ok(point)
    }

    // -- snapshots ----------------------------------------------------------

    /// Produces an independent ledger seeded with this ledger's balances as
    /// of `point`.
    ///
    /// Every account with a non-zero balance at `point`, and the total
    /// supply, get a single checkpoint at point 1 of the fork. The fork has
    /// its own controller, metadata and counter; later activity on either
    /// ledger does not affect the other.
    pub fn fork_at(
        &self,
        point: SequencePoint,
        controller: AccountId,
        metadata: TokenMetadata,
    ) -> CheckpointLedger {
        let snapshot_point = point.min(self.head);
        let mut fork = CheckpointLedger::new(metadata, controller);
        fork.origin = Some(ForkOrigin {
            source_symbol: self.metadata.symbol.clone(),
            point: snapshot_point,
        });

        let supply = self.total_supply_at(snapshot_point);
        if supply == 0 {
            return fork;
        }

        let seed = SequencePoint::new(1);
        for (account, history) in &self.balances {
            let value = history.value_at(snapshot_point);
            if value == 0 {
                continue;
            }
            fork.balances.entry(*account).or_default().record(seed, value);
            fork.events.push(LedgerEvent::Transfer {
                from: None,
                to: Some(*account),
                amount: value,
                point: seed,
            });
        }
        fork.total_supply.record(seed, supply);
        fork.head = seed;

        info!(
            source = %self.metadata.symbol,
            fork = %fork.metadata.symbol,
            point = %snapshot_point,
            supply,
            "ledger forked"
        );
        fork
    }

    /// Checks the structural invariants of a ledger that came from outside
    /// (e.g., a snapshot file): ordered histories, nothing beyond the head,
    /// and current balances summing to the current supply.
    pub fn check_integrity(&self) -> Result<(), IntegrityError> {
        for (account, history) in &self.balances {
            if !history.is_well_ordered() {
                return Err(IntegrityError::UnorderedHistory { account: *account });
            }
            if let Some(last) = history.checkpoints().last() {
                if last.point > self.head {
                    return Err(IntegrityError::BalanceBeyondHead {
                        account: *account,
                        point: last.point,
                        head: self.head,
                    });
                }
            }
        }

        if !self.total_supply.is_well_ordered() {
            return Err(IntegrityError::UnorderedSupply);
        }
        if let Some(last) = self.total_supply.checkpoints().last() {
            if last.point > self.head {
                return Err(IntegrityError::SupplyBeyondHead {
                    point: last.point,
                    head: self.head,
                });
            }
        }

        let mut balances: Amount = 0;
        for (_, balance) in self.holders() {
            balances = balances
                .checked_add(balance)
                .ok_or(IntegrityError::BalanceOverflow)?;
        }
        let supply = self.total_supply();
        if balances != supply {
            return Err(IntegrityError::SupplyMismatch { balances, supply });
        }
        Ok(())
    }

    // -- internals ----------------------------------------------------------

    fn next_point(&self) -> Result<SequencePoint, LedgerError> {
        self.head.next().ok_or(LedgerError::Overflow)
    }

    fn commit(&mut self, point: SequencePoint, event: LedgerEvent) {
        self.head = point;
        self.events.push(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::guard::Role;

    fn id(label: &str) -> AccountId {
        AccountId::from_label(label)
    }

    fn ledger() -> CheckpointLedger {
        CheckpointLedger::new(TokenMetadata::default(), id("ctrl"))
    }

    #[test]
    fn genesis_ledger_is_empty() {
        let l = ledger();
        assert_eq!(l.head(), SequencePoint::GENESIS);
        assert_eq!(l.total_supply(), 0);
        assert_eq!(l.current_balance(&id("a")), 0);
        assert!(l.transfers_enabled());
        assert_eq!(l.controller(), Some(id("ctrl")));
        assert!(l.events().is_empty());
    }

    #[test]
    fn mint_appends_checkpoints_for_recipient_and_supply() {
        let mut l = ledger();
        let before = l.head();
        let point = l.mint(&id("ctrl"), &id("a"), 100).unwrap();
        assert_eq!(point, SequencePoint::new(1));
        assert_eq!(l.current_balance(&id("a")), 100);
        assert_eq!(l.balance_at(&id("a"), before), 0);
        assert_eq!(l.total_supply_at(before), 0);
        assert_eq!(l.total_supply_at(point), 100);
    }

    #[test]
    fn mint_by_non_controller_is_unauthorized() {
        let mut l = ledger();
        let err = l.mint(&id("a"), &id("a"), 1).unwrap_err();
        match err {
            LedgerError::Unauthorized(u) => assert_eq!(u.role, Role::Controller),
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(l.head(), SequencePoint::GENESIS);
    }

    #[test]
    fn mint_overflow_leaves_state_untouched() {
        let mut l = ledger();
        l.mint(&id("ctrl"), &id("a"), u128::MAX).unwrap();
        let head = l.head();
        assert_eq!(l.mint(&id("ctrl"), &id("b"), 1), Err(LedgerError::Overflow));
        assert_eq!(l.head(), head);
        assert_eq!(l.current_balance(&id("b")), 0);
        assert!(l.history(&id("b")).is_none());
    }

    #[test]
    fn zero_mint_is_a_no_op() {
        let mut l = ledger();
        assert_eq!(l.mint(&id("ctrl"), &id("a"), 0).unwrap(), SequencePoint::GENESIS);
        assert!(l.history(&id("a")).is_none());
        assert!(l.events().is_empty());
    }

    #[test]
    fn destroy_reduces_balance_and_supply() {
        let mut l = ledger();
        l.mint(&id("ctrl"), &id("a"), 100).unwrap();
        l.destroy(&id("ctrl"), &id("a"), 30).unwrap();
        assert_eq!(l.current_balance(&id("a")), 70);
        assert_eq!(l.total_supply(), 70);
        assert_eq!(l.balance_at(&id("a"), SequencePoint::new(1)), 100);
    }

    #[test]
    fn destroy_more_than_balance_fails() {
        let mut l = ledger();
        l.mint(&id("ctrl"), &id("a"), 10).unwrap();
        let err = l.destroy(&id("ctrl"), &id("a"), 11).unwrap_err();
        assert_eq!(
            err,
            LedgerError::InsufficientBalance {
                account: id("a"),
                available: 10,
                requested: 11
            }
        );
        assert_eq!(l.current_balance(&id("a")), 10);
        assert_eq!(l.total_supply(), 10);
    }

    #[test]
    fn transfer_writes_both_sides_at_same_point() {
        let mut l = ledger();
        l.mint(&id("ctrl"), &id("a"), 50).unwrap();
        let point = l.transfer(&id("a"), &id("b"), 20).unwrap();
        assert_eq!(l.balance_at(&id("a"), point), 30);
        assert_eq!(l.balance_at(&id("b"), point), 20);
        assert_eq!(l.balance_at(&id("b"), point.prev()), 0);
        assert_eq!(l.total_supply(), 50);
    }

    #[test]
    fn transfer_insufficient_balance() {
        let mut l = ledger();
        l.mint(&id("ctrl"), &id("a"), 5).unwrap();
        assert!(matches!(
            l.transfer(&id("a"), &id("b"), 6),
            Err(LedgerError::InsufficientBalance { .. })
        ));
        assert_eq!(l.head(), SequencePoint::new(1));
    }

    #[test]
    fn self_transfer_is_checked_but_changes_nothing() {
        let mut l = ledger();
        l.mint(&id("ctrl"), &id("a"), 5).unwrap();
        assert!(l.transfer(&id("a"), &id("a"), 6).is_err());
        assert_eq!(l.transfer(&id("a"), &id("a"), 5).unwrap(), SequencePoint::new(1));
        assert_eq!(l.current_balance(&id("a")), 5);
        assert_eq!(l.history(&id("a")).map(History::len), Some(1));
    }

    #[test]
    fn disabled_transfers_block_holders_but_not_controller() {
        let mut l = ledger();
        l.mint(&id("ctrl"), &id("a"), 10).unwrap();
        l.enable_transfers(&id("ctrl"), false).unwrap();
        assert_eq!(
            l.transfer(&id("a"), &id("b"), 1),
            Err(LedgerError::TransfersDisabled)
        );
        assert_eq!(
            l.approve(&id("a"), &id("b"), 1),
            Err(LedgerError::TransfersDisabled)
        );
        l.transfer_from(&id("ctrl"), &id("a"), &id("b"), 4).unwrap();
        assert_eq!(l.current_balance(&id("b")), 4);
    }

    #[test]
    fn enable_transfers_requires_controller() {
        let mut l = ledger();
        assert!(l.enable_transfers(&id("a"), false).is_err());
        assert!(l.transfers_enabled());
    }

    #[test]
    fn allowance_is_spent_down() {
        let mut l = ledger();
        l.mint(&id("ctrl"), &id("a"), 100).unwrap();
        l.approve(&id("a"), &id("spender"), 60).unwrap();
        l.transfer_from(&id("spender"), &id("a"), &id("c"), 25).unwrap();
        assert_eq!(l.allowance(&id("a"), &id("spender")), 35);
        assert_eq!(l.current_balance(&id("c")), 25);

        let err = l
            .transfer_from(&id("spender"), &id("a"), &id("c"), 36)
            .unwrap_err();
        assert!(matches!(err, LedgerError::InsufficientAllowance { available: 35, .. }));
    }

    #[test]
    fn failed_delegated_transfer_keeps_allowance() {
        let mut l = ledger();
        l.mint(&id("ctrl"), &id("a"), 10).unwrap();
        l.approve(&id("a"), &id("s"), 50).unwrap();
        assert!(matches!(
            l.transfer_from(&id("s"), &id("a"), &id("b"), 20),
            Err(LedgerError::InsufficientBalance { .. })
        ));
        assert_eq!(l.allowance(&id("a"), &id("s")), 50);
    }

    #[test]
    fn approval_race_is_rejected() {
        let mut l = ledger();
        l.approve(&id("a"), &id("s"), 10).unwrap();
        assert!(matches!(
            l.approve(&id("a"), &id("s"), 20),
            Err(LedgerError::ApprovalRace { current: 10, .. })
        ));
        l.approve(&id("a"), &id("s"), 0).unwrap();
        l.approve(&id("a"), &id("s"), 20).unwrap();
        assert_eq!(l.allowance(&id("a"), &id("s")), 20);
    }

    #[test]
    fn set_controller_takes_effect_on_next_call() {
        let mut l = ledger();
        l.set_controller(&id("ctrl"), id("sale")).unwrap();
        assert!(l.mint(&id("ctrl"), &id("a"), 1).is_err());
        l.mint(&id("sale"), &id("a"), 1).unwrap();
        assert!(l.set_controller(&id("ctrl"), id("ctrl")).is_err());
    }

    #[test]
    fn renounced_controller_freezes_supply() {
        let mut l = ledger();
        l.mint(&id("ctrl"), &id("a"), 9).unwrap();
        l.renounce_controller(&id("ctrl")).unwrap();
        assert_eq!(l.controller(), None);
        assert!(l.mint(&id("ctrl"), &id("a"), 1).is_err());
        assert!(l.destroy(&id("ctrl"), &id("a"), 1).is_err());
        // Holders keep trading.
        l.transfer(&id("a"), &id("b"), 4).unwrap();
    }

    #[test]
    fn journal_records_mint_transfer_destroy() {
        let mut l = ledger();
        l.mint(&id("ctrl"), &id("a"), 10).unwrap();
        l.transfer(&id("a"), &id("b"), 3).unwrap();
        l.destroy(&id("ctrl"), &id("b"), 1).unwrap();
        let kinds: Vec<_> = l
            .events()
            .iter()
            .map(|e| match e {
                LedgerEvent::Transfer { from, to, .. } => (from.is_some(), to.is_some()),
                _ => panic!("unexpected event"),
            })
            .collect();
        assert_eq!(kinds, vec![(false, true), (true, true), (true, false)]);
    }

    #[test]
    fn fork_copies_balances_at_point() {
        let mut l = ledger();
        l.mint(&id("ctrl"), &id("a"), 100).unwrap();
        let snap = l.transfer(&id("a"), &id("b"), 40).unwrap();
        l.transfer(&id("b"), &id("c"), 40).unwrap();

        let fork = l.fork_at(snap, id("ctrl2"), TokenMetadata::new("Fork", "FRK", 18));
        assert_eq!(fork.current_balance(&id("a")), 60);
        assert_eq!(fork.current_balance(&id("b")), 40);
        assert_eq!(fork.current_balance(&id("c")), 0);
        assert_eq!(fork.total_supply(), 100);
        assert_eq!(fork.balance_at(&id("a"), SequencePoint::GENESIS), 0);
        assert_eq!(fork.origin().map(|o| o.point), Some(snap));
        assert_eq!(fork.controller(), Some(id("ctrl2")));
        assert!(fork.check_integrity().is_ok());
    }

    #[test]
    fn fork_of_empty_point_is_empty() {
        let mut l = ledger();
        l.mint(&id("ctrl"), &id("a"), 100).unwrap();
        let fork = l.fork_at(SequencePoint::GENESIS, id("c"), TokenMetadata::default());
        assert_eq!(fork.head(), SequencePoint::GENESIS);
        assert_eq!(fork.total_supply(), 0);
    }

    #[test]
    fn integrity_detects_supply_mismatch() {
        let mut l = ledger();
        l.mint(&id("ctrl"), &id("a"), 100).unwrap();
        assert!(l.check_integrity().is_ok());
        l.total_supply.record(SequencePoint::new(2), 7);
        l.head = SequencePoint::new(2);
        assert_eq!(
            l.check_integrity(),
            Err(IntegrityError::SupplyMismatch {
                balances: 100,
                supply: 7
            })
        );
    }

    #[test]
    fn integrity_detects_checkpoints_past_head() {
        let mut l = ledger();
        l.mint(&id("ctrl"), &id("a"), 100).unwrap();
        l.head = SequencePoint::GENESIS;
        assert_eq!(
            l.check_integrity(),
            Err(IntegrityError::BalanceBeyondHead {
                account: id("a"),
                point: SequencePoint::new(1),
                head: SequencePoint::GENESIS,
            })
        );
    }
}
