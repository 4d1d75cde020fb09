//! # Controller / Ownership Guard
//!
//! Two capabilities gate every privileged operation in Tvrbo:
//!
//! - **Controller**: held by at most one identity per ledger. Only the
//!   controller may mint, destroy, toggle transfers, or move balances
//!   without an allowance. The capability can be handed over or renounced
//!   by its current holder; a renounced controller is gone for good.
//! - **Owner**: held by exactly one identity per sale. Only the owner may
//!   change the vault, hand the ledger's controller capability onwards
//!   after the sale closes, or pass ownership on.
//!
//! Both are plain values owned by the component they protect. There is no
//! global registry of who controls what.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::identity::AccountId;

/// Which capability a privileged call required.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Role {
    /// The ledger's minting/destroying capability.
    Controller,
    /// The sale's administrative capability.
    Owner,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Controller => write!(f, "controller"),
            Role::Owner => write!(f, "owner"),
        }
    }
}

/// The caller does not hold the capability the operation requires.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unauthorized: {caller} is not the {role}")]
pub struct Unauthorized {
    /// The identity that attempted the call.
    pub caller: AccountId,
    /// The capability that was required.
    pub role: Role,
}

// ---------------------------------------------------------------------------
// Controller
// ---------------------------------------------------------------------------

/// The controller capability of a ledger. `None` once renounced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Controller(Option<AccountId>);

impl Controller {
    /// A controller capability held by `holder`.
    pub fn new(holder: AccountId) -> Self {
        Self(Some(holder))
    }

    /// The current holder, if any.
    pub fn holder(&self) -> Option<AccountId> {
        self.0
    }

    /// Returns `true` if `caller` currently holds the capability.
    pub fn is_held_by(&self, caller: &AccountId) -> bool {
        self.0.as_ref() == Some(caller)
    }

    /// Fails with [`Unauthorized`] unless `caller` holds the capability.
    pub fn require(&self, caller: &AccountId) -> Result<(), Unauthorized> {
        if self.is_held_by(caller) {
            Ok(())
        } else {
            Err(Unauthorized {
                caller: *caller,
                role: Role::Controller,
            })
        }
    }

    /// Moves the capability to `next` (or drops it when `next` is `None`).
    ///
    /// Returns the previous holder. Handing the capability to the current
    /// holder is allowed and changes nothing.
    pub fn hand_over(
        &mut self,
        caller: &AccountId,
        next: Option<AccountId>,
    ) -> Result<Option<AccountId>, Unauthorized> {
        self.require(caller)?;
        Ok(std::mem::replace(&mut self.0, next))
    }
}

// ---------------------------------------------------------------------------
// Ownership
// ---------------------------------------------------------------------------

/// The owner capability of a sale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ownership {
    owner: AccountId,
}

impl Ownership {
    /// Ownership held by `owner`.
    pub fn new(owner: AccountId) -> Self {
        Self { owner }
    }

    /// The current owner.
    pub fn owner(&self) -> AccountId {
        self.owner
    }

    /// Fails with [`Unauthorized`] unless `caller` is the owner.
    pub fn require(&self, caller: &AccountId) -> Result<(), Unauthorized> {
        if &self.owner == caller {
            Ok(())
        } else {
            Err(Unauthorized {
                caller: *caller,
                role: Role::Owner,
            })
        }
    }

    /// Passes ownership to `new_owner`. Returns the previous owner.
    pub fn transfer(
        &mut self,
        caller: &AccountId,
        new_owner: AccountId,
    ) -> Result<AccountId, Unauthorized> {
        self.require(caller)?;
        Ok(std::mem::replace(&mut self.owner, new_owner))
    }
}
