use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_EXPIRY_WINDOW_SECS, DEFAULT_REGISTRATION_FEE, MIN_EXPIRY_WINDOW_SECS,
};
use crate::error::TickrError;
use crate::symbol::Symbol;
use crate::types::{AccountId, Balance, MetadataPointer, Timestamp};

// ── ReservationRecord ─────────────────────────────────────────────────────────

/// The reservation held on one canonical symbol.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ReservationRecord {
    pub symbol: Symbol,
    pub owner: AccountId,
    /// Display name of the asset the owner intends to issue. Not unique.
    pub name: String,
    pub metadata: MetadataPointer,
    /// Time of the most recent successful registration of this symbol.
    pub registered_at: Timestamp,
    /// Set by the downstream registry. A finalized record never expires.
    pub finalized: bool,
    #[serde(default)]
    pub finalized_at: Option<Timestamp>,
}

impl ReservationRecord {
    pub fn new(
        symbol: Symbol,
        owner: AccountId,
        name: String,
        metadata: MetadataPointer,
        registered_at: Timestamp,
    ) -> Self {
        Self {
            symbol,
            owner,
            name,
            metadata,
            registered_at,
            finalized: false,
            finalized_at: None,
        }
    }

    /// First instant at which the reservation lapses under `expiry_window_secs`.
    pub fn expires_at(&self, expiry_window_secs: i64) -> Timestamp {
        self.registered_at.saturating_add(expiry_window_secs)
    }

    /// A record can be taken over by a new registrant only while it is not
    /// finalized and its window has run out.
    pub fn is_reclaimable(&self, now: Timestamp, expiry_window_secs: i64) -> bool {
        !self.finalized && now >= self.expires_at(expiry_window_secs)
    }

    pub fn details(&self) -> TickerDetails {
        TickerDetails {
            owner: self.owner.clone(),
            registered_at: self.registered_at,
            name: self.name.clone(),
            metadata: self.metadata,
            finalized: self.finalized,
        }
    }
}

/// Public view of a reservation returned by `get_details`.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct TickerDetails {
    pub owner: AccountId,
    pub registered_at: Timestamp,
    pub name: String,
    pub metadata: MetadataPointer,
    pub finalized: bool,
}

// ── RegistryConfig ────────────────────────────────────────────────────────────

/// Economic and temporal parameters of one registry instance.
///
/// Only the registry's administrative methods mutate a live config; the
/// setters here enforce the bounds and leave authorization to the caller.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct RegistryConfig {
    pub administrator: AccountId,
    /// Receives every registration fee.
    pub treasury: AccountId,
    pub fee_amount: Balance,
    pub expiry_window_secs: i64,
    /// Write-once: the only identity allowed through the finalization gateway.
    pub downstream_caller: Option<AccountId>,
}

impl RegistryConfig {
    /// Config with the default fee and expiry window and no downstream caller.
    pub fn new(administrator: AccountId, treasury: AccountId) -> Self {
        Self {
            administrator,
            treasury,
            fee_amount: DEFAULT_REGISTRATION_FEE,
            expiry_window_secs: DEFAULT_EXPIRY_WINDOW_SECS,
            downstream_caller: None,
        }
    }

    pub fn with_fee_amount(mut self, fee_amount: Balance) -> Self {
        self.fee_amount = fee_amount;
        self
    }

    pub fn with_expiry_window(mut self, secs: i64) -> Result<Self, TickrError> {
        self.set_expiry_window(secs)?;
        Ok(self)
    }

    pub fn set_expiry_window(&mut self, secs: i64) -> Result<(), TickrError> {
        validate_expiry_window(secs)?;
        self.expiry_window_secs = secs;
        Ok(())
    }

    pub fn bind_downstream_caller(&mut self, caller: AccountId) -> Result<(), TickrError> {
        if self.downstream_caller.is_some() {
            return Err(TickrError::AlreadySet("downstream caller"));
        }
        self.downstream_caller = Some(caller);
        Ok(())
    }

    /// Checks the invariants a config loaded from outside must satisfy.
    pub fn validate(&self) -> Result<(), TickrError> {
        validate_expiry_window(self.expiry_window_secs)
    }
}

fn validate_expiry_window(secs: i64) -> Result<(), TickrError> {
    if secs < MIN_EXPIRY_WINDOW_SECS {
        return Err(TickrError::InvalidParameter(format!(
            "expiry window must be at least {MIN_EXPIRY_WINDOW_SECS} seconds, got {secs}"
        )));
    }
    Ok(())
}

// ── Audit events ──────────────────────────────────────────────────────────────

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub enum RegistrationEventKind {
    /// A symbol was registered. `replaced` names the owner of the lapsed
    /// reservation that was overwritten, if there was one.
    Registered {
        fee_paid: Balance,
        replaced: Option<AccountId>,
    },
    /// The downstream registry locked the reservation.
    Finalized,
}

/// One entry of the append-only audit log.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct RegistrationEvent {
    pub seq: u64,
    pub symbol: Symbol,
    pub owner: AccountId,
    pub name: String,
    pub metadata: MetadataPointer,
    pub timestamp: Timestamp,
    pub kind: RegistrationEventKind,
}
