//! # Protocol Configuration & Constants
//!
//! Every magic number in Tvrbo lives here. Token metadata defaults, the
//! sale's default exchange rate, and the domain-separation tags used when
//! deriving account identities.
//!
//! Changing the identity tags after launch re-derives every address in the
//! system, so treat them as frozen.

// ---------------------------------------------------------------------------
// Protocol Version
// ---------------------------------------------------------------------------

/// The crate-level protocol version string.
pub const PROTOCOL_VERSION: &str = "0.1.0";

// ---------------------------------------------------------------------------
// Token Defaults
// ---------------------------------------------------------------------------

/// Default human-readable token name.
pub const DEFAULT_TOKEN_NAME: &str = "Tvrbo Token";

/// Default ticker symbol.
pub const DEFAULT_TOKEN_SYMBOL: &str = "TTK";

/// Default decimal precision. Display only: the ledger never divides.
pub const DEFAULT_TOKEN_DECIMALS: u8 = 18;

/// Version tag stamped into token metadata. Bumped whenever the checkpoint
/// layout changes in a way that affects persisted snapshots.
pub const TOKEN_VERSION_TAG: &str = "TTK_0.1";

// ---------------------------------------------------------------------------
// Sale Defaults
// ---------------------------------------------------------------------------

/// Ledger units minted per unit of contributed value when no rate is
/// configured. 1:1, matching the historical deployment parameters.
pub const DEFAULT_EXCHANGE_RATE: u128 = 1;

// ---------------------------------------------------------------------------
// Identity Derivation
// ---------------------------------------------------------------------------

/// Domain tag for identities derived from raw public key bytes.
pub const PUBLIC_KEY_ID_DOMAIN: &[u8] = b"tvrbo/account/pubkey/v1";

/// Domain tag for identities derived from human-readable labels (scripts,
/// fixtures, local tooling).
pub const LABEL_ID_DOMAIN: &[u8] = b"tvrbo/account/label/v1";

/// Length of an account identity in bytes.
pub const ACCOUNT_ID_LENGTH: usize = 32;
