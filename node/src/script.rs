//! # Call Script Replay
//!
//! A script is a recorded sequence of calls against one ledger and one
//! sale, with the caller identity and timestamp spelled out for every
//! call. Replaying it builds a fresh ledger, deploys the sale, applies the
//! calls in order, and settles each vault forward through an in-memory
//! transport.
//!
//! Individual call failures are part of the record, not replay failures:
//! a rejected contribution shows up in the report with its error. Only a
//! broken setup (bad sale parameters, a settlement that cannot be
//! recorded) aborts the run.
//!
//! Accounts are referenced by label (`"alice"`) or by 64-char hex id. Each
//! call is a single-key object naming the operation:
//!
//! ```json
//! { "contribute": { "contributor": "alice", "value": 600, "at": "2026-03-02T09:00:00Z" } }
//! ```

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, info};

use tvrbo_contracts::settlement::{RecordingTransport, ValueTransport};
use tvrbo_contracts::token_sale::{
    Contribution, SaleConfig, SaleParams, SaleRecord, SaleState, SharedLedger, TokenSale,
};
use tvrbo_protocol::config::DEFAULT_EXCHANGE_RATE;
use tvrbo_protocol::identity::AccountId;
use tvrbo_protocol::ledger::{Amount, CheckpointLedger, LedgerEvent, SequencePoint, TokenMetadata};

// ---------------------------------------------------------------------------
// Script format
// ---------------------------------------------------------------------------

/// A recorded deployment plus call log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Script {
    /// Token metadata for the fresh ledger.
    #[serde(default)]
    pub token: TokenMetadata,
    /// Initial ledger controller.
    pub issuer: String,
    /// The sale to deploy.
    pub sale: SaleSpec,
    /// Whether the issuer hands minting rights to the sale before the
    /// first call.
    #[serde(default = "default_true")]
    pub hand_control_to_sale: bool,
    /// Calls, applied in order.
    #[serde(default)]
    pub calls: Vec<Call>,
}

fn default_true() -> bool {
    true
}

fn default_exchange_rate() -> u128 {
    DEFAULT_EXCHANGE_RATE
}

/// Sale deployment parameters as written in a script.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaleSpec {
    /// The sale's own identity.
    pub address: String,
    /// Sale owner.
    pub owner: String,
    /// Beneficiary of forwarded value.
    pub vault: String,
    /// Opening time; omitted means open from deployment.
    #[serde(default)]
    pub start_time: Option<DateTime<Utc>>,
    /// Closing time.
    pub end_time: DateTime<Utc>,
    /// Hard cap on collected value.
    pub hard_cap: Amount,
    /// Tokens minted per unit of value.
    #[serde(default = "default_exchange_rate")]
    pub exchange_rate: u128,
}

/// One recorded call.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Call {
    /// Controller mint.
    Mint {
        /// Claimed controller.
        caller: String,
        /// Recipient.
        to: String,
        /// Tokens to create.
        amount: Amount,
    },
    /// Controller destroy.
    Destroy {
        /// Claimed controller.
        caller: String,
        /// Account to debit.
        holder: String,
        /// Tokens to remove.
        amount: Amount,
    },
    /// Holder transfer.
    Transfer {
        /// Sender, acting for itself.
        from: String,
        /// Recipient.
        to: String,
        /// Tokens to move.
        amount: Amount,
    },
    /// Allowance grant.
    Approve {
        /// Holder granting the allowance.
        owner: String,
        /// Delegate.
        spender: String,
        /// New allowance.
        amount: Amount,
    },
    /// Delegated or controller transfer.
    TransferFrom {
        /// Delegate or controller making the move.
        caller: String,
        /// Account to debit.
        from: String,
        /// Recipient.
        to: String,
        /// Tokens to move.
        amount: Amount,
    },
    /// Switches holder transfers on or off.
    EnableTransfers {
        /// Claimed controller.
        caller: String,
        /// New setting.
        enabled: bool,
    },
    /// Hands the ledger controller capability on.
    SetController {
        /// Current controller.
        caller: String,
        /// Next controller.
        new_controller: String,
    },
    /// Drops the ledger controller capability for good.
    RenounceController {
        /// Current controller.
        caller: String,
    },
    /// Sale contribution.
    Contribute {
        /// Who pays and receives tokens.
        contributor: String,
        /// Value contributed.
        value: Amount,
        /// Time of the contribution.
        at: DateTime<Utc>,
    },
    /// Sale finalization attempt.
    Finalize {
        /// Time of the attempt.
        at: DateTime<Utc>,
    },
    /// Redirects later vault forwards.
    SetVault {
        /// Claimed sale owner.
        caller: String,
        /// New vault.
        vault: String,
    },
    /// Passes sale ownership on.
    TransferOwnership {
        /// Current owner.
        caller: String,
        /// Next owner.
        new_owner: String,
    },
    /// Sale hands the ledger controller capability on after closing.
    ReleaseControl {
        /// Claimed sale owner.
        caller: String,
        /// Next ledger controller; omitted renounces.
        #[serde(default)]
        new_controller: Option<String>,
        /// Time of the release.
        at: DateTime<Utc>,
    },
}

impl Call {
    /// Short operation name for reports.
    pub fn op(&self) -> &'static str {
        match self {
            Call::Mint { .. } => "mint",
            Call::Destroy { .. } => "destroy",
            Call::Transfer { .. } => "transfer",
            Call::Approve { .. } => "approve",
            Call::TransferFrom { .. } => "transfer_from",
            Call::EnableTransfers { .. } => "enable_transfers",
            Call::SetController { .. } => "set_controller",
            Call::RenounceController { .. } => "renounce_controller",
            Call::Contribute { .. } => "contribute",
            Call::Finalize { .. } => "finalize",
            Call::SetVault { .. } => "set_vault",
            Call::TransferOwnership { .. } => "transfer_ownership",
            Call::ReleaseControl { .. } => "release_control",
        }
    }
}

// ---------------------------------------------------------------------------
// Report format
// ---------------------------------------------------------------------------

/// What a successful call did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "effect", rename_all = "snake_case")]
pub enum Effect {
    /// A ledger mutation landed at `point` (the unchanged head for no-ops).
    Ledger {
        /// Point the mutation occupies.
        point: SequencePoint,
    },
    /// A capability or setting changed; no checkpoint was written.
    Settings,
    /// A contribution was accepted and its forward settled.
    Contribution(Contribution),
    /// A state query.
    Sale {
        /// State at the call's timestamp.
        state: SaleState,
    },
}

/// Result of one call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    /// The call was applied.
    Ok(Effect),
    /// The call was rejected; nothing changed.
    Error(String),
}

/// Report line for one call.
#[derive(Debug, Clone, Serialize)]
pub struct CallReport {
    /// Position in the script, from zero.
    pub index: usize,
    /// Operation name, as written in the script.
    pub op: &'static str,
    /// What happened.
    #[serde(flatten)]
    pub outcome: Outcome,
}

/// Summary of a full replay.
#[derive(Debug, Clone, Serialize)]
pub struct ReplayReport {
    /// One line per call, in script order.
    pub calls: Vec<CallReport>,
    /// Ledger head after the last call.
    pub head: SequencePoint,
    /// Final total supply.
    pub total_supply: Amount,
    /// Value the sale accepted.
    pub total_collected: Amount,
    /// Number of accepted contributions.
    pub contributions: u64,
    /// Sale state at the latest timestamp seen in the script.
    pub sale_state: Option<SaleState>,
    /// Per-vault settled value, keyed by label where known.
    pub vaults: BTreeMap<String, Amount>,
    /// Current balances, keyed by label where known.
    pub balances: BTreeMap<String, Amount>,
    /// Ledger event journal, when requested.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub events: Option<Vec<LedgerEvent>>,
}

/// Everything needed to inspect or resume a replayed system.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateFile {
    /// The full ledger, histories included.
    pub ledger: CheckpointLedger,
    /// The sale, without its ledger handle.
    pub sale: SaleRecord,
    /// Settled vault forwards.
    pub transport: RecordingTransport,
    /// Label for every identity the script referenced.
    pub labels: BTreeMap<AccountId, String>,
}

impl StateFile {
    /// Resolves a label or hex string against this state's label table.
    pub fn resolve(&self, reference: &str) -> AccountId {
        self.labels
            .iter()
            .find(|(_, label)| label.as_str() == reference)
            .map(|(id, _)| *id)
            .unwrap_or_else(|| parse_reference(reference))
    }
}

/// Point-in-time view of one account, as printed by `inspect`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AccountView {
    /// Resolved identity.
    pub account: AccountId,
    /// Script label, if the script used one.
    pub label: Option<String>,
    /// Point the figures below are read at.
    pub point: SequencePoint,
    /// Current ledger head.
    pub head: SequencePoint,
    /// Balance at `point`.
    pub balance: Amount,
    /// Total supply at `point`.
    pub total_supply: Amount,
    /// Balance just before the sale's first mint, if it minted at all.
    pub balance_before_sale: Option<Amount>,
    /// Number of checkpoints in the account's history.
    pub checkpoints: usize,
    /// Current ledger controller, by label where known.
    pub controller: Option<String>,
    /// Value the sale accepted.
    pub sale_collected: Amount,
    /// Whether the sale's terminal state was latched.
    pub sale_finalized: bool,
}

impl StateFile {
    /// Looks up `reference` at `at`, or at the ledger head when `None`.
    pub fn inspect(&self, reference: &str, at: Option<u64>) -> AccountView {
        let account = self.resolve(reference);
        let head = self.ledger.head();
        let point = at.map(SequencePoint::new).unwrap_or(head);
        let label_of = |id: &AccountId| {
            self.labels
                .get(id)
                .cloned()
                .unwrap_or_else(|| id.to_hex())
        };

        AccountView {
            account,
            label: self.labels.get(&account).cloned(),
            point,
            head,
            balance: self.ledger.balance_at(&account, point),
            total_supply: self.ledger.total_supply_at(point),
            balance_before_sale: self
                .sale
                .opening_point
                .map(|p| self.ledger.balance_at(&account, p)),
            checkpoints: self.ledger.history(&account).map_or(0, |h| h.len()),
            controller: self.ledger.controller().map(|id| label_of(&id)),
            sale_collected: self.sale.total_collected,
            sale_finalized: self.sale.finalized,
        }
    }
}

fn parse_reference(reference: &str) -> AccountId {
    if reference.len() == 64 {
        if let Ok(id) = AccountId::from_hex(reference) {
            return id;
        }
    }
    AccountId::from_label(reference)
}

// ---------------------------------------------------------------------------
// Replay
// ---------------------------------------------------------------------------

/// A deployed system being driven by a script.
pub struct Replay {
    ledger: SharedLedger,
    sale: TokenSale,
    transport: RecordingTransport,
    labels: BTreeMap<AccountId, String>,
    clock: Option<DateTime<Utc>>,
}

impl Replay {
    /// Creates the ledger, deploys the sale and (optionally) hands it
    /// minting rights.
    pub fn deploy(script: &Script) -> Result<Self> {
        let mut labels = BTreeMap::new();
        let mut resolve = |reference: &str| {
            let id = parse_reference(reference);
            labels.entry(id).or_insert_with(|| reference.to_string());
            id
        };

        let issuer = resolve(&script.issuer);
        let address = resolve(&script.sale.address);
        let owner = resolve(&script.sale.owner);
        let vault = resolve(&script.sale.vault);

        let ledger = Arc::new(RwLock::new(CheckpointLedger::new(
            script.token.clone(),
            issuer,
        )));
        let params = SaleParams {
            start_time: script.sale.start_time,
            end_time: script.sale.end_time,
            hard_cap: script.sale.hard_cap,
            vault,
        };
        let config = SaleConfig {
            exchange_rate: script.sale.exchange_rate,
        };
        let sale = TokenSale::deploy(address, owner, params, config, &ledger)
            .context("failed to deploy sale")?;

        if script.hand_control_to_sale {
            ledger
                .write()
                .set_controller(&issuer, address)
                .context("failed to hand ledger control to the sale")?;
        }

        info!(
            token = %script.token.symbol,
            calls = script.calls.len(),
            "replay deployed"
        );

        Ok(Self {
            ledger,
            sale,
            transport: RecordingTransport::new(),
            labels,
            clock: None,
        })
    }

    fn id(&mut self, reference: &str) -> AccountId {
        let id = parse_reference(reference);
        self.labels
            .entry(id)
            .or_insert_with(|| reference.to_string());
        id
    }

    fn tick(&mut self, at: DateTime<Utc>) {
        self.clock = Some(self.clock.map_or(at, |c| c.max(at)));
    }

    /// Applies one call. Call-level rejections come back as
    /// [`Outcome::Error`]; only settlement failures are fatal.
    pub fn apply(&mut self, call: &Call) -> Result<Outcome> {
        let outcome = match call {
            Call::Mint { caller, to, amount } => {
                let (caller, to) = (self.id(caller), self.id(to));
                let result = self.ledger.write().mint(&caller, &to, *amount);
                ledger_outcome(result)
            }
            Call::Destroy {
                caller,
                holder,
                amount,
            } => {
                let (caller, holder) = (self.id(caller), self.id(holder));
                let result = self.ledger.write().destroy(&caller, &holder, *amount);
                ledger_outcome(result)
            }
            Call::Transfer { from, to, amount } => {
                let (from, to) = (self.id(from), self.id(to));
                let result = self.ledger.write().transfer(&from, &to, *amount);
                ledger_outcome(result)
            }
            Call::Approve {
                owner,
                spender,
                amount,
            } => {
                let (owner, spender) = (self.id(owner), self.id(spender));
                let result = self.ledger.write().approve(&owner, &spender, *amount);
                settings_outcome(result)
            }
            Call::TransferFrom {
                caller,
                from,
                to,
                amount,
            } => {
                let (caller, from, to) = (self.id(caller), self.id(from), self.id(to));
                let result = self
                    .ledger
                    .write()
                    .transfer_from(&caller, &from, &to, *amount);
                ledger_outcome(result)
            }
            Call::EnableTransfers { caller, enabled } => {
                let caller = self.id(caller);
                let result = self.ledger.write().enable_transfers(&caller, *enabled);
                settings_outcome(result)
            }
            Call::SetController {
                caller,
                new_controller,
            } => {
                let (caller, next) = (self.id(caller), self.id(new_controller));
                let result = self.ledger.write().set_controller(&caller, next);
                settings_outcome(result)
            }
            Call::RenounceController { caller } => {
                let caller = self.id(caller);
                let result = self.ledger.write().renounce_controller(&caller);
                settings_outcome(result)
            }
            Call::Contribute {
                contributor,
                value,
                at,
            } => {
                self.tick(*at);
                let contributor = self.id(contributor);
                match self.sale.contribute(&contributor, *value, *at) {
                    Ok(contribution) => {
                        self.transport
                            .settle(&contribution.forward)
                            .context("vault forward could not be settled")?;
                        Outcome::Ok(Effect::Contribution(contribution))
                    }
                    Err(e) => Outcome::Error(e.to_string()),
                }
            }
            Call::Finalize { at } => {
                self.tick(*at);
                Outcome::Ok(Effect::Sale {
                    state: self.sale.finalize(*at),
                })
            }
            Call::SetVault { caller, vault } => {
                let (caller, vault) = (self.id(caller), self.id(vault));
                settings_outcome(self.sale.set_vault(&caller, vault))
            }
            Call::TransferOwnership { caller, new_owner } => {
                let (caller, new_owner) = (self.id(caller), self.id(new_owner));
                settings_outcome(self.sale.transfer_ownership(&caller, new_owner))
            }
            Call::ReleaseControl {
                caller,
                new_controller,
                at,
            } => {
                self.tick(*at);
                let caller = self.id(caller);
                let next = new_controller.as_deref().map(|r| self.id(r));
                settings_outcome(self.sale.release_control(&caller, next, *at))
            }
        };

        debug!(op = call.op(), ?outcome, "call applied");
        Ok(outcome)
    }

    /// Applies every call in `script` and builds the report.
    pub fn run(script: &Script, include_events: bool) -> Result<(ReplayReport, StateFile)> {
        let mut replay = Self::deploy(script)?;
        let mut calls = Vec::with_capacity(script.calls.len());
        for (index, call) in script.calls.iter().enumerate() {
            let outcome = replay
                .apply(call)
                .with_context(|| format!("call #{index} ({}) aborted the replay", call.op()))?;
            calls.push(CallReport {
                index,
                op: call.op(),
                outcome,
            });
        }

        let report = replay.report(calls, include_events);
        info!(
            head = %report.head,
            total_supply = report.total_supply,
            total_collected = report.total_collected,
            "replay finished"
        );
        Ok((report, replay.into_state()))
    }

    fn label(&self, id: &AccountId) -> String {
        self.labels
            .get(id)
            .cloned()
            .unwrap_or_else(|| id.to_hex())
    }

    fn report(&self, calls: Vec<CallReport>, include_events: bool) -> ReplayReport {
        let ledger = self.ledger.read();
        ReplayReport {
            calls,
            head: ledger.head(),
            total_supply: ledger.total_supply(),
            total_collected: self.sale.total_collected(),
            contributions: self.sale.contribution_count(),
            sale_state: self.clock.map(|now| self.sale.state(now)),
            vaults: self
                .transport
                .received()
                .iter()
                .map(|(id, amount)| (self.label(id), *amount))
                .collect(),
            balances: ledger
                .holders()
                .map(|(id, balance)| (self.label(&id), balance))
                .collect(),
            events: include_events.then(|| ledger.events().to_vec()),
        }
    }

    fn into_state(self) -> StateFile {
        let ledger = self.ledger.read().clone();
        StateFile {
            ledger,
            sale: self.sale.record(),
            transport: self.transport,
            labels: self.labels,
        }
    }
}

fn ledger_outcome<E: std::fmt::Display>(result: Result<SequencePoint, E>) -> Outcome {
    match result {
        Ok(point) => Outcome::Ok(Effect::Ledger { point }),
        Err(e) => Outcome::Error(e.to_string()),
    }
}

fn settings_outcome<E: std::fmt::Display>(result: Result<(), E>) -> Outcome {
    match result {
        Ok(()) => Outcome::Ok(Effect::Settings),
        Err(e) => Outcome::Error(e.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SCRIPT: &str = r#"{
        "issuer": "issuer",
        "sale": {
            "address": "sale",
            "owner": "owner",
            "vault": "vault",
            "end_time": "2026-02-01T00:00:00Z",
            "hard_cap": 1000
        },
        "calls": [
            { "contribute": { "contributor": "A", "value": 600, "at": "2026-01-10T00:00:00Z" } },
            { "contribute": { "contributor": "B", "value": 500, "at": "2026-01-10T00:00:00Z" } },
            { "contribute": { "contributor": "B", "value": 0, "at": "2026-01-11T00:00:00Z" } },
            { "transfer": { "from": "A", "to": "B", "amount": 100 } },
            { "mint": { "caller": "issuer", "to": "A", "amount": 1 } },
            { "finalize": { "at": "2026-02-01T00:00:00Z" } },
            { "release_control": { "caller": "owner", "new_controller": "issuer", "at": "2026-02-01T00:00:00Z" } },
            { "mint": { "caller": "issuer", "to": "A", "amount": 1 } }
        ]
    }"#;

    fn script() -> Script {
        serde_json::from_str(SCRIPT).unwrap()
    }

    fn is_ok(report: &CallReport) -> bool {
        matches!(report.outcome, Outcome::Ok(_))
    }

    #[test]
    fn replay_reports_each_call() {
        let (report, _) = Replay::run(&script(), false).unwrap();
        let oks: Vec<bool> = report.calls.iter().map(is_ok).collect();
        assert_eq!(oks, vec![true, false, false, true, false, true, true, true]);

        match &report.calls[1].outcome {
            Outcome::Error(msg) => assert!(msg.contains("hard cap")),
            other => panic!("unexpected outcome: {other:?}"),
        }
        assert_eq!(report.total_collected, 600);
        assert_eq!(report.total_supply, 601);
        assert_eq!(report.vaults.get("vault"), Some(&600));
        assert_eq!(report.balances.get("A"), Some(&501));
        assert_eq!(report.balances.get("B"), Some(&100));
        assert_eq!(report.sale_state, Some(SaleState::Closed));
        assert!(report.events.is_none());
    }

    #[test]
    fn replay_is_deterministic() {
        let (first, state_a) = Replay::run(&script(), true).unwrap();
        let (second, state_b) = Replay::run(&script(), true).unwrap();
        assert_eq!(
            serde_json::to_string(&first).unwrap(),
            serde_json::to_string(&second).unwrap()
        );
        assert_eq!(
            serde_json::to_string(&state_a).unwrap(),
            serde_json::to_string(&state_b).unwrap()
        );
    }

    #[test]
    fn invalid_sale_aborts_replay() {
        let mut s = script();
        s.sale.hard_cap = 0;
        assert!(Replay::run(&s, false).is_err());
    }

    #[test]
    fn state_file_resolves_labels_and_hex() {
        let (_, state) = Replay::run(&script(), false).unwrap();
        let a = AccountId::from_label("A");
        assert_eq!(state.resolve("A"), a);
        assert_eq!(state.resolve(&a.to_hex()), a);
        assert_eq!(state.ledger.current_balance(&a), 501);
        assert_eq!(state.transport.received_by(&state.resolve("vault")), 600);
        assert!(state.sale.finalized);
    }

    #[test]
    fn inspect_reads_historical_points() {
        let (report, state) = Replay::run(&script(), false).unwrap();
        let now = state.inspect("A", None);
        assert_eq!(now.head, report.head);
        assert_eq!(now.balance, 501);
        assert_eq!(now.checkpoints, 3);
        assert_eq!(now.balance_before_sale, Some(0));
        assert_eq!(now.controller.as_deref(), Some("issuer"));

        let after_purchase = state.inspect("A", Some(1));
        assert_eq!(after_purchase.balance, 600);
        assert_eq!(after_purchase.total_supply, 600);

        let genesis = state.inspect("A", Some(0));
        assert_eq!(genesis.balance, 0);
        assert_eq!(genesis.label.as_deref(), Some("A"));
    }

    #[test]
    fn state_file_survives_disk() {
        use tvrbo_protocol::storage::{load_json, save_json};

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        let (_, state) = Replay::run(&script(), false).unwrap();
        save_json(&path, &state).unwrap();

        let loaded: StateFile = load_json(&path).unwrap();
        loaded.ledger.check_integrity().unwrap();
        assert_eq!(loaded.sale, state.sale);
        assert_eq!(loaded.labels, state.labels);
        assert_eq!(loaded.inspect("B", None), state.inspect("B", None));
    }

    #[test]
    fn out_of_order_timestamps_cannot_reopen_sale() {
        let mut s = script();
        s.calls = serde_json::from_str(
            r#"[
                { "contribute": { "contributor": "A", "value": 5, "at": "2026-02-02T00:00:00Z" } },
                { "contribute": { "contributor": "A", "value": 5, "at": "2026-01-10T00:00:00Z" } }
            ]"#,
        )
        .unwrap();
        let (report, state) = Replay::run(&s, false).unwrap();
        assert!(report.calls.iter().all(|c| !is_ok(c)));
        assert_eq!(report.total_collected, 0);
        assert_eq!(report.sale_state, Some(SaleState::Closed));
        assert!(state.sale.finalized);
    }

    #[test]
    fn without_control_handoff_contributions_fail() {
        let mut s = script();
        s.hand_control_to_sale = false;
        let (report, _) = Replay::run(&s, false).unwrap();
        assert!(!is_ok(&report.calls[0]));
        assert_eq!(report.total_collected, 0);
        assert!(report.vaults.is_empty());
    }
}
