//! # Token Sale Contract
//!
//! A time-boxed, hard-capped fundraising campaign. Contributors send value
//! in; the sale mints ledger tokens to them at a fixed exchange rate and
//! tells the caller to forward the value to the vault.
//!
//! ## Lifecycle
//!
//! ```text
//!             start_time                 end_time
//!  Pending ──────┼──────── Active ──────────┼──── Closed
//!                          │ total == hard_cap ─┘
//! ```
//!
//! State is never stored, it is *evaluated* against the caller's `now`:
//!
//! - **Pending** — `now < start_time`. A sale without a start time is
//!   never pending.
//! - **Active** — inside the window and below the cap.
//! - **Closed** — `now >= end_time`, the cap is reached, or the sale was
//!   finalized. Terminal.
//!
//! ## Minting Rights
//!
//! The sale mints by presenting its own `address` to the ledger as the
//! controller. Deploying a sale does not grant that; whoever controls the
//! ledger hands the capability over with `set_controller`. Once the sale
//! is closed, its owner can pass the capability on (or renounce it) with
//! [`TokenSale::release_control`].
//!
//! ## Ledger Reference
//!
//! The sale holds a `Weak` handle to the ledger: it never keeps the ledger
//! alive. If the ledger is gone, every call that needs it fails with
//! [`SaleError::LedgerUnavailable`] instead of touching freed state.

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::{Arc, Weak};
use thiserror::Error;
use tracing::{debug, info, warn};

use tvrbo_protocol::config::DEFAULT_EXCHANGE_RATE;
use tvrbo_protocol::guard::{Ownership, Unauthorized};
use tvrbo_protocol::identity::AccountId;
use tvrbo_protocol::ledger::{Amount, CheckpointLedger, LedgerError, SequencePoint};

/// Shared handle to a ledger, as held by whoever owns it.
pub type SharedLedger = Arc<RwLock<CheckpointLedger>>;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors that can occur during sale operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SaleError {
    /// The sale is not accepting contributions right now.
    #[error("sale is not active: currently {state}")]
    NotActive {
        /// The evaluated state at the time of the call.
        state: SaleState,
    },

    /// The operation needs a closed sale, but it is still running.
    #[error("sale is still open: currently {state}")]
    StillOpen {
        /// The evaluated state at the time of the call.
        state: SaleState,
    },

    /// Zero-value contribution.
    #[error("invalid amount: contributions must be non-zero")]
    InvalidAmount,

    /// The contribution would push the running total past the hard cap.
    /// Contributions are never partially filled.
    #[error("hard cap exceeded: collected {total_collected}, attempted {attempted}, cap {hard_cap}")]
    CapExceeded {
        /// Running total before the rejected contribution.
        total_collected: Amount,
        /// The rejected contribution.
        attempted: Amount,
        /// The sale's hard cap.
        hard_cap: Amount,
    },

    /// `value * exchange_rate` does not fit in an [`Amount`].
    #[error("arithmetic overflow computing minted amount")]
    Overflow,

    /// The caller is not the sale owner.
    #[error(transparent)]
    Unauthorized(#[from] Unauthorized),

    /// Sale parameters failed validation at deploy time.
    #[error("invalid sale parameters: {0}")]
    InvalidParams(String),

    /// The ledger this sale was deployed against no longer exists.
    #[error("ledger is no longer available")]
    LedgerUnavailable,

    /// The ledger rejected the operation (e.g., the sale is not its controller).
    #[error("ledger error: {0}")]
    Ledger(#[from] LedgerError),
}

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Evaluated lifecycle state of a sale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SaleState {
    /// Before the funding window opens.
    Pending,
    /// Accepting contributions.
    Active,
    /// Window elapsed, cap reached, or finalized. Terminal.
    Closed,
}

impl fmt::Display for SaleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SaleState::Pending => write!(f, "Pending"),
            SaleState::Active => write!(f, "Active"),
            SaleState::Closed => write!(f, "Closed"),
        }
    }
}

/// Fixed parameters of a sale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaleParams {
    /// Opening time. `None` means open from deployment.
    pub start_time: Option<DateTime<Utc>>,
    /// Closing time (exclusive).
    pub end_time: DateTime<Utc>,
    /// Maximum cumulative value the sale accepts. Must be non-zero.
    pub hard_cap: Amount,
    /// Beneficiary of forwarded value.
    pub vault: AccountId,
}

impl SaleParams {
    fn validate(&self) -> Result<(), SaleError> {
        if let Some(start) = self.start_time {
            if start >= self.end_time {
                return Err(SaleError::InvalidParams(format!(
                    "start_time {start} is not before end_time {}",
                    self.end_time
                )));
            }
        }
        if self.hard_cap == 0 {
            return Err(SaleError::InvalidParams("hard_cap must be non-zero".into()));
        }
        Ok(())
    }
}

/// Tunable sale configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaleConfig {
    /// Ledger units minted per unit of contributed value.
    pub exchange_rate: u128,
}

impl Default for SaleConfig {
    fn default() -> Self {
        Self {
            exchange_rate: DEFAULT_EXCHANGE_RATE,
        }
    }
}

/// Obligation to move contributed value to the vault.
///
/// The sale only records that the value is owed. The value transport must
/// execute it before the contribution is acknowledged as committed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VaultForward {
    /// Where the value goes.
    pub vault: AccountId,
    /// How much.
    pub amount: Amount,
}

/// Receipt for an accepted contribution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contribution {
    /// 1-based ordinal of this contribution within the sale.
    pub id: u64,
    /// Who contributed and received the tokens.
    pub contributor: AccountId,
    /// Value received.
    pub value: Amount,
    /// Tokens minted to the contributor.
    pub minted: Amount,
    /// Ledger point of the mint.
    pub point: SequencePoint,
    /// Value the transport must forward.
    pub forward: VaultForward,
}

/// Serializable view of a sale, without the ledger handle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaleRecord {
    /// The sale's own identity on the ledger.
    pub address: AccountId,
    /// Current owner.
    pub owner: AccountId,
    /// Sale parameters.
    pub params: SaleParams,
    /// Sale configuration.
    pub config: SaleConfig,
    /// Running total of accepted value.
    pub total_collected: Amount,
    /// Number of accepted contributions.
    pub contribution_count: u64,
    /// Ledger point just before the first sale mint.
    pub opening_point: Option<SequencePoint>,
    /// Whether the terminal state was latched.
    pub finalized: bool,
}

// ---------------------------------------------------------------------------
// TokenSale
// ---------------------------------------------------------------------------

/// A fundraising campaign minting into a [`CheckpointLedger`].
#[derive(Debug)]
pub struct TokenSale {
    address: AccountId,
    ownership: Ownership,
    params: SaleParams,
    config: SaleConfig,
    total_collected: Amount,
    contribution_count: u64,
    opening_point: Option<SequencePoint>,
    finalized: bool,
    ledger: Weak<RwLock<CheckpointLedger>>,
}

impl TokenSale {
    /// Deploys a sale at `address`, owned by `owner`, minting into `ledger`.
    ///
    /// # Errors
    ///
    /// Returns [`SaleError::InvalidParams`] if the window is empty or
    /// inverted, the cap is zero, or the exchange rate is zero.
    pub fn deploy(
        address: AccountId,
        owner: AccountId,
        params: SaleParams,
        config: SaleConfig,
        ledger: &SharedLedger,
    ) -> Result<Self, SaleError> {
        params.validate()?;
        if config.exchange_rate == 0 {
            return Err(SaleError::InvalidParams(
                "exchange_rate must be non-zero".into(),
            ));
        }

        info!(
            address = %address.short(),
            owner = %owner.short(),
            vault = %params.vault.short(),
            hard_cap = params.hard_cap,
            exchange_rate = config.exchange_rate,
            end_time = %params.end_time,
            "sale deployed"
        );

        Ok(Self {
            address,
            ownership: Ownership::new(owner),
            params,
            config,
            total_collected: 0,
            contribution_count: 0,
            opening_point: None,
            finalized: false,
            ledger: Arc::downgrade(ledger),
        })
    }

    /// Rebuilds a sale from a [`SaleRecord`], re-attaching it to `ledger`.
    pub fn restore(record: SaleRecord, ledger: &SharedLedger) -> Result<Self, SaleError> {
        record.params.validate()?;
        if record.config.exchange_rate == 0 {
            return Err(SaleError::InvalidParams(
                "exchange_rate must be non-zero".into(),
            ));
        }
        if record.total_collected > record.params.hard_cap {
            return Err(SaleError::InvalidParams(format!(
                "total_collected {} exceeds hard_cap {}",
                record.total_collected, record.params.hard_cap
            )));
        }
        Ok(Self {
            address: record.address,
            ownership: Ownership::new(record.owner),
            params: record.params,
            config: record.config,
            total_collected: record.total_collected,
            contribution_count: record.contribution_count,
            opening_point: record.opening_point,
            finalized: record.finalized,
            ledger: Arc::downgrade(ledger),
        })
    }

    /// Serializable view of the current sale state.
    pub fn record(&self) -> SaleRecord {
        SaleRecord {
            address: self.address,
            owner: self.ownership.owner(),
            params: self.params.clone(),
            config: self.config,
            total_collected: self.total_collected,
            contribution_count: self.contribution_count,
            opening_point: self.opening_point,
            finalized: self.finalized,
        }
    }

    // -- queries ------------------------------------------------------------

    /// Evaluates the lifecycle state at `now`.
    pub fn state(&self, now: DateTime<Utc>) -> SaleState {
        if self.finalized
            || now >= self.params.end_time
            || self.total_collected >= self.params.hard_cap
        {
            SaleState::Closed
        } else if self.params.start_time.map_or(false, |start| now < start) {
            SaleState::Pending
        } else {
            SaleState::Active
        }
    }

    /// Running total of accepted value.
    pub fn total_collected(&self) -> Amount {
        self.total_collected
    }

    /// Value still accepted before the cap is hit.
    pub fn remaining_capacity(&self) -> Amount {
        self.params.hard_cap.saturating_sub(self.total_collected)
    }

    /// Number of accepted contributions.
    pub fn contribution_count(&self) -> u64 {
        self.contribution_count
    }

    /// The sale's identity on the ledger.
    pub fn address(&self) -> AccountId {
        self.address
    }

    /// Current owner.
    pub fn owner(&self) -> AccountId {
        self.ownership.owner()
    }

    /// Sale parameters.
    pub fn params(&self) -> &SaleParams {
        &self.params
    }

    /// Sale configuration.
    pub fn config(&self) -> SaleConfig {
        self.config
    }

    /// Whether the terminal state has been latched.
    pub fn is_finalized(&self) -> bool {
        self.finalized
    }

    /// Ledger point immediately before the sale's first mint, once there
    /// has been one.
    pub fn opening_point(&self) -> Option<SequencePoint> {
        self.opening_point
    }

    /// What `account` held on the ledger before the sale minted anything.
    ///
    /// Before the first contribution this is simply the current balance.
    pub fn balance_before_sale(&self, account: &AccountId) -> Result<Amount, SaleError> {
        let ledger = self.ledger()?;
        let ledger = ledger.read();
        Ok(match self.opening_point {
            Some(point) => ledger.balance_at(account, point),
            None => ledger.current_balance(account),
        })
    }

    // -- contributions ------------------------------------------------------

    /// Accepts `value` from `contributor` at `now`.
    ///
    /// On success the contributor has been credited `value * exchange_rate`
    /// tokens, the running total includes `value`, and the returned receipt
    /// carries the vault-forward obligation. On failure nothing changed,
    /// except that a call which finds the sale closed latches it closed.
    ///
    /// # Errors
    ///
    /// In check order: [`SaleError::NotActive`], [`SaleError::InvalidAmount`],
    /// [`SaleError::CapExceeded`], [`SaleError::Overflow`],
    /// [`SaleError::LedgerUnavailable`], [`SaleError::Ledger`].
    pub fn contribute(
        &mut self,
        contributor: &AccountId,
        value: Amount,
        now: DateTime<Utc>,
    ) -> Result<Contribution, SaleError> {
        let state = self.state(now);
        if state == SaleState::Closed {
            // A closed sale stays closed, whatever clock the next caller brings.
            self.finalize(now);
        }
        if state != SaleState::Active {
            warn!(contributor = %contributor.short(), value, %state, "contribution outside window");
            return Err(SaleError::NotActive { state });
        }
        if value == 0 {
            return Err(SaleError::InvalidAmount);
        }

        let new_total = self
            .total_collected
            .checked_add(value)
            .filter(|total| *total <= self.params.hard_cap)
            .ok_or_else(|| {
                warn!(
                    contributor = %contributor.short(),
                    value,
                    total_collected = self.total_collected,
                    "contribution exceeds hard cap"
                );
                SaleError::CapExceeded {
                    total_collected: self.total_collected,
                    attempted: value,
                    hard_cap: self.params.hard_cap,
                }
            })?;
        let minted = value
            .checked_mul(self.config.exchange_rate)
            .ok_or(SaleError::Overflow)?;

        let ledger = self.ledger()?;
        let point = ledger.write().mint(&self.address, contributor, minted)?;

        // Mint landed: commit the sale's own bookkeeping.
        self.total_collected = new_total;
        self.contribution_count += 1;
        if self.opening_point.is_none() {
            self.opening_point = Some(point.prev());
        }

        let contribution = Contribution {
            id: self.contribution_count,
            contributor: *contributor,
            value,
            minted,
            point,
            forward: VaultForward {
                vault: self.params.vault,
                amount: value,
            },
        };

        info!(
            id = contribution.id,
            contributor = %contributor.short(),
            value,
            minted,
            %point,
            total_collected = self.total_collected,
            "contribution accepted"
        );
        if self.total_collected == self.params.hard_cap {
            info!(hard_cap = self.params.hard_cap, "hard cap reached, sale closed");
        }

        Ok(contribution)
    }

    /// Latches the terminal state once the sale has closed.
    ///
    /// Before that it only reports the current state. Idempotent.
    pub fn finalize(&mut self, now: DateTime<Utc>) -> SaleState {
        let state = self.state(now);
        if state == SaleState::Closed && !self.finalized {
            self.finalized = true;
            info!(
                total_collected = self.total_collected,
                contributions = self.contribution_count,
                "sale finalized"
            );
        }
        state
    }

    // -- owner operations ---------------------------------------------------

    /// Passes sale ownership to `new_owner`.
    pub fn transfer_ownership(
        &mut self,
        caller: &AccountId,
        new_owner: AccountId,
    ) -> Result<(), SaleError> {
        let previous = self.ownership.transfer(caller, new_owner)?;
        info!(previous = %previous.short(), current = %new_owner.short(), "sale ownership transferred");
        Ok(())
    }

    /// Redirects forwards of subsequent contributions to `vault`.
    pub fn set_vault(&mut self, caller: &AccountId, vault: AccountId) -> Result<(), SaleError> {
        self.ownership.require(caller)?;
        debug!(previous = %self.params.vault.short(), current = %vault.short(), "vault changed");
        self.params.vault = vault;
        Ok(())
    }

    /// Hands the ledger's controller capability from the sale to
    /// `new_controller`, or renounces it when `None`. Finalizes the sale.
    ///
    /// # Errors
    ///
    /// [`SaleError::Unauthorized`] unless `caller` is the owner,
    /// [`SaleError::StillOpen`] unless the sale is closed at `now`,
    /// [`SaleError::Ledger`] if the sale does not hold the capability.
    pub fn release_control(
        &mut self,
        caller: &AccountId,
        new_controller: Option<AccountId>,
        now: DateTime<Utc>,
    ) -> Result<(), SaleError> {
        self.ownership.require(caller)?;
        let state = self.state(now);
        if state != SaleState::Closed {
            return Err(SaleError::StillOpen { state });
        }

        let ledger = self.ledger()?;
        {
            let mut ledger = ledger.write();
            match new_controller {
                Some(next) => ledger.set_controller(&self.address, next)?,
                None => ledger.renounce_controller(&self.address)?,
            }
        }

        self.finalize(now);
        info!(
            new_controller = ?new_controller.map(|id| id.short()),
            "sale released ledger control"
        );
        Ok(())
    }

    fn ledger(&self) -> Result<SharedLedger, SaleError> {
        self.ledger.upgrade().ok_or(SaleError::LedgerUnavailable)
    }
}
