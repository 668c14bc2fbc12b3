use thiserror::Error;

use crate::types::{AccountId, Timestamp};

#[derive(Debug, Error)]
pub enum TickrError {
    // ── Access control ───────────────────────────────────────────────────────
    #[error("unauthorized: {caller} is not the {role}")]
    Unauthorized { caller: AccountId, role: &'static str },

    #[error("{0} is already set and cannot be changed")]
    AlreadySet(&'static str),

    // ── Parameters ───────────────────────────────────────────────────────────
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    // ── Reservations ─────────────────────────────────────────────────────────
    #[error("symbol already reserved: {0}")]
    SymbolTaken(String),

    #[error("no reservation for symbol: {0}")]
    NotFound(String),

    #[error("registration fee payment failed: {0}")]
    PaymentFailed(String),

    #[error("reservation for {0} does not match the claimed owner/name or is already finalized")]
    ClaimMismatch(String),

    #[error("reservation for {symbol} expired at {expired_at}")]
    ReservationExpired { symbol: String, expired_at: Timestamp },

    // ── Serialization / storage ──────────────────────────────────────────────
    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("storage error: {0}")]
    Storage(String),
}
