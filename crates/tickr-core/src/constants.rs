/// ─── Tickr Registry Constants ───────────────────────────────────────────────
///
/// Symbols are reserved for a bounded window against a fee paid in the
/// registry's fee token, then handed to the downstream issuance registry.
///
/// Fee unit:  1 token = 10^18 base units
/// Times:     Unix seconds, UTC

// ── Symbols ──────────────────────────────────────────────────────────────────

/// Minimum symbol length in characters (after canonicalization).
pub const MIN_SYMBOL_LEN: usize = 1;

/// Maximum symbol length in characters (after canonicalization).
pub const MAX_SYMBOL_LEN: usize = 10;

/// Width of a metadata pointer in bytes.
pub const METADATA_POINTER_LEN: usize = 32;

// ── Time ─────────────────────────────────────────────────────────────────────

pub const SECS_PER_DAY: i64 = 24 * 3600;

/// Lower bound for the expiry window. The administrator can never go below it.
pub const MIN_EXPIRY_WINDOW_SECS: i64 = SECS_PER_DAY;

/// Expiry window a fresh registry starts with: 7 days.
pub const DEFAULT_EXPIRY_WINDOW_SECS: i64 = 7 * SECS_PER_DAY;

// ── Fees ─────────────────────────────────────────────────────────────────────

/// Base units per whole fee token (18 decimals).
pub const BASE_UNITS_PER_TOKEN: u128 = 1_000_000_000_000_000_000;

/// Registration fee a fresh registry starts with: 250 tokens.
pub const DEFAULT_REGISTRATION_FEE: u128 = 250 * BASE_UNITS_PER_TOKEN;
