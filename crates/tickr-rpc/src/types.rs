use serde::{Deserialize, Serialize};

use tickr_core::record::{
    RegistrationEvent, RegistrationEventKind, RegistryConfig, ReservationRecord, TickerDetails,
};

/// JSON-serializable reservation returned by `tickr_getDetails` and the
/// mutating methods.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcTicker {
    pub symbol: String,
    pub owner: String,
    pub name: String,
    /// Metadata pointer, 64 hex digits.
    pub metadata: String,
    /// The pointer decoded as text, when it was packed from text.
    pub metadata_text: Option<String>,
    pub registered_at: i64,
    pub finalized: bool,
}

impl RpcTicker {
    pub fn from_details(symbol: &str, d: &TickerDetails) -> Self {
        Self {
            symbol: symbol.to_string(),
            owner: d.owner.to_b58(),
            name: d.name.clone(),
            metadata: d.metadata.to_hex(),
            metadata_text: d.metadata.as_text().filter(|t| !t.is_empty()).map(str::to_string),
            registered_at: d.registered_at,
            finalized: d.finalized,
        }
    }
}

impl From<&ReservationRecord> for RpcTicker {
    fn from(r: &ReservationRecord) -> Self {
        Self::from_details(r.symbol.as_str(), &r.details())
    }
}

/// Registry parameters returned by `tickr_getConfig`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcConfig {
    pub administrator: String,
    pub treasury: String,
    /// Registration fee in base units (u128 as string).
    pub fee_amount: String,
    pub expiry_window_secs: i64,
    pub downstream_caller: Option<String>,
}

impl From<&RegistryConfig> for RpcConfig {
    fn from(c: &RegistryConfig) -> Self {
        Self {
            administrator: c.administrator.to_b58(),
            treasury: c.treasury.to_b58(),
            fee_amount: c.fee_amount.to_string(),
            expiry_window_secs: c.expiry_window_secs,
            downstream_caller: c.downstream_caller.as_ref().map(|a| a.to_b58()),
        }
    }
}

/// One audit-log entry returned by `tickr_getHistory`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcRegistrationEvent {
    pub seq: u64,
    pub symbol: String,
    pub owner: String,
    pub name: String,
    pub timestamp: i64,
    /// "Registered" or "Finalized".
    pub kind: String,
    /// Fee collected (u128 as string); registrations only.
    pub fee_paid: Option<String>,
    /// Previous owner whose lapsed reservation was overwritten.
    pub replaced: Option<String>,
}

impl From<&RegistrationEvent> for RpcRegistrationEvent {
    fn from(e: &RegistrationEvent) -> Self {
        let (kind, fee_paid, replaced) = match &e.kind {
            RegistrationEventKind::Registered { fee_paid, replaced } => (
                "Registered",
                Some(fee_paid.to_string()),
                replaced.as_ref().map(|a| a.to_b58()),
            ),
            RegistrationEventKind::Finalized => ("Finalized", None, None),
        };
        Self {
            seq: e.seq,
            symbol: e.symbol.to_string(),
            owner: e.owner.to_b58(),
            name: e.name.clone(),
            timestamp: e.timestamp,
            kind: kind.to_string(),
            fee_paid,
            replaced,
        }
    }
}
