//! # Checkpoints & Histories
//!
//! A [`History`] is the append-only timeline of one value (an account
//! balance, or total supply). Each mutation appends a [`Checkpoint`]
//! stamped with the ledger-wide [`SequencePoint`] at which it happened.
//! Nothing is ever overwritten, so the value at any past point is just
//! "the latest checkpoint at or before that point".
//!
//! ```text
//! points:   3        7             12
//! values:   100      40            90
//!           |--------|-------------|---------->
//! value_at(0..=2) = 0   value_at(3..=6) = 100
//! value_at(7..=11) = 40 value_at(12..) = 90
//! ```
//!
//! Lookups are a binary search over the checkpoint vector, so a history
//! with `n` entries answers in `O(log n)` without storing a value per point.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Unsigned amount type used for every balance and supply value.
pub type Amount = u128;

/// A position in the ledger's global, strictly increasing operation order.
///
/// Point 0 is genesis: nothing has happened yet. Every applied mutation
/// occupies exactly one point, and all checkpoints it writes share it.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct SequencePoint(u64);

impl SequencePoint {
    /// The genesis point.
    pub const GENESIS: SequencePoint = SequencePoint(0);

    /// Wraps a raw counter value.
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    /// The raw counter value.
    pub const fn value(self) -> u64 {
        self.0
    }

    /// The point immediately after this one, or `None` on counter exhaustion.
    pub fn next(self) -> Option<SequencePoint> {
        self.0.checked_add(1).map(SequencePoint)
    }

    /// The point immediately before this one, saturating at genesis.
    pub fn prev(self) -> SequencePoint {
        SequencePoint(self.0.saturating_sub(1))
    }
}

impl fmt::Display for SequencePoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

impl From<u64> for SequencePoint {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

/// An immutable `(point, value)` record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Checkpoint {
    /// When the value took effect.
    pub point: SequencePoint,
    /// The value from `point` onwards, until the next checkpoint.
    pub value: Amount,
}

/// Append-only, point-ascending sequence of checkpoints.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct History {
    checkpoints: Vec<Checkpoint>,
}

impl History {
    /// An empty history. Reads as zero at every point.
    pub fn new() -> Self {
        Self::default()
    }

    /// Value in effect at `point`: the latest checkpoint with
    /// `checkpoint.point <= point`, or zero if there is none.
    pub fn value_at(&self, point: SequencePoint) -> Amount {
        // Index of the first checkpoint strictly after `point`.
        let idx = self.checkpoints.partition_point(|cp| cp.point <= point);
        match idx {
            0 => 0,
            i => self.checkpoints[i - 1].value,
        }
    }

    /// Most recent value, or zero if nothing was ever recorded.
    pub fn latest(&self) -> Amount {
        self.checkpoints.last().map(|cp| cp.value).unwrap_or(0)
    }

    /// Appends a checkpoint.
    ///
    /// The caller guarantees `point` is strictly after every existing
    /// checkpoint; the ledger's single sequence counter makes that hold.
    pub(crate) fn record(&mut self, point: SequencePoint, value: Amount) {
        debug_assert!(
            self.checkpoints.last().map_or(true, |cp| cp.point < point),
            "checkpoint {point} is not after the history head"
        );
        self.checkpoints.push(Checkpoint { point, value });
    }

    /// The first checkpoint, if any.
    pub fn first(&self) -> Option<&Checkpoint> {
        self.checkpoints.first()
    }

    /// All checkpoints, oldest first.
    pub fn checkpoints(&self) -> &[Checkpoint] {
        &self.checkpoints
    }

    /// Number of checkpoints recorded.
    pub fn len(&self) -> usize {
        self.checkpoints.len()
    }

    /// Returns `true` if no checkpoint was ever recorded.
    pub fn is_empty(&self) -> bool {
        self.checkpoints.is_empty()
    }

    /// Returns `true` if the points are strictly ascending. Used when
    /// loading histories from untrusted snapshots.
    pub fn is_well_ordered(&self) -> bool {
        self.checkpoints.windows(2).all(|w| w[0].point < w[1].point)
    }
}
