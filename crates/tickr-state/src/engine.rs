use std::sync::{Arc, Mutex, MutexGuard};

use tickr_core::error::TickrError;
use tickr_core::record::{
    RegistrationEvent, RegistrationEventKind, RegistryConfig, ReservationRecord, TickerDetails,
};
use tickr_core::symbol::Symbol;
use tickr_core::types::{AccountId, Balance, MetadataPointer, Timestamp};
use tracing::{error, info, warn};

use crate::db::StateDb;
use crate::fee::FeeTransfer;
use crate::query::TickerQuery;

// ── TickerRegistry ────────────────────────────────────────────────────────────

/// The reservation state machine.
///
/// Every mutating call holds `config` for its whole duration, so mutations
/// are applied one at a time and each either commits fully or leaves the
/// store untouched. Expiry is never swept: it is derived from
/// `registered_at` whenever a record is looked at.
pub struct TickerRegistry {
    db: Arc<StateDb>,
    fee: Arc<dyn FeeTransfer>,
    config: Mutex<RegistryConfig>,
}

impl TickerRegistry {
    /// Open the registry stored in `db`.
    ///
    /// A config already persisted in `db` takes precedence over `initial`,
    /// which is only written on first open. Either one must validate.
    pub fn open(
        db: Arc<StateDb>,
        fee: Arc<dyn FeeTransfer>,
        initial: RegistryConfig,
    ) -> Result<Self, TickrError> {
        let config = match db.get_config()? {
            Some(stored) => {
                stored.validate()?;
                info!(
                    administrator = %stored.administrator,
                    tickers = db.ticker_count(),
                    "loaded existing registry config"
                );
                stored
            }
            None => {
                initial.validate()?;
                db.put_config(&initial)?;
                info!(
                    administrator = %initial.administrator,
                    treasury = %initial.treasury,
                    fee_amount = %initial.fee_amount,
                    expiry_window_secs = initial.expiry_window_secs,
                    "initialised registry config"
                );
                initial
            }
        };
        Ok(Self { db, fee, config: Mutex::new(config) })
    }

    /// Read-only view over the stored reservations.
    pub fn query(&self) -> TickerQuery<'_> {
        TickerQuery::new(&self.db)
    }

    fn lock(&self) -> Result<MutexGuard<'_, RegistryConfig>, TickrError> {
        self.config
            .lock()
            .map_err(|_| TickrError::Storage("registry lock poisoned".into()))
    }

    // ── Registration ─────────────────────────────────────────────────────────

    /// Reserve `symbol` for `requester`, charging the current fee.
    ///
    /// Succeeds when the symbol is free or its previous reservation has
    /// lapsed without being finalized; the lapsed record is overwritten.
    pub fn register(
        &self,
        requester: &AccountId,
        symbol: &str,
        name: &str,
        metadata: MetadataPointer,
        now: Timestamp,
    ) -> Result<ReservationRecord, TickrError> {
        let symbol = Symbol::parse(symbol)?;
        let config = self.lock()?;

        // ── Conflict check ────────────────────────────────────────────────────
        let replaced = match self.db.get_ticker(&symbol)? {
            None => None,
            Some(existing) if existing.is_reclaimable(now, config.expiry_window_secs) => {
                Some(existing.owner)
            }
            Some(_) => return Err(TickrError::SymbolTaken(symbol.to_string())),
        };

        let record = ReservationRecord::new(
            symbol.clone(),
            requester.clone(),
            name.to_string(),
            metadata,
            now,
        );
        let event = RegistrationEvent {
            seq: 0,
            symbol: symbol.clone(),
            owner: requester.clone(),
            name: record.name.clone(),
            metadata,
            timestamp: now,
            kind: RegistrationEventKind::Registered {
                fee_paid: config.fee_amount,
                replaced: replaced.clone(),
            },
        };

        // Sequence and encode before any value moves.
        let staged = self.db.stage_ticker(&record, event)?;

        // ── Payment ───────────────────────────────────────────────────────────
        if config.fee_amount > 0 {
            self.fee
                .transfer_from(requester, &config.treasury, config.fee_amount)
                .map_err(|e| {
                    warn!(%symbol, %requester, error = %e, "registration fee not collected");
                    TickrError::PaymentFailed(e.to_string())
                })?;
        }

        // ── Commit ────────────────────────────────────────────────────────────
        let event = self.commit_or_refund(requester, &config.treasury, config.fee_amount, || {
            self.db.apply_staged(staged)
        })?;

        info!(
            seq = event.seq,
            owner = %requester,
            %symbol,
            name = %record.name,
            timestamp = now,
            replaced = ?replaced,
            "ticker registered"
        );
        Ok(record)
    }

    /// Run `commit` after `fee` was pulled from `payer`; if it fails, hand
    /// the fee back before returning the commit error.
    fn commit_or_refund<F>(
        &self,
        payer: &AccountId,
        treasury: &AccountId,
        fee: Balance,
        commit: F,
    ) -> Result<RegistrationEvent, TickrError>
    where
        F: FnOnce() -> Result<RegistrationEvent, TickrError>,
    {
        match commit() {
            Ok(event) => Ok(event),
            Err(e) => {
                if fee > 0 {
                    match self.fee.refund(payer, treasury, fee) {
                        Ok(()) => warn!(%payer, fee = %fee, error = %e, "commit failed, fee refunded"),
                        Err(refund_err) => error!(
                            %payer,
                            fee = %fee,
                            error = %e,
                            refund_error = %refund_err,
                            "commit failed and fee refund failed"
                        ),
                    }
                }
                Err(e)
            }
        }
    }

    // ── Finalization gateway ──────────────────────────────────────────────────

    fn authorize_downstream(
        config: &RegistryConfig,
        caller: &AccountId,
    ) -> Result<(), TickrError> {
        match &config.downstream_caller {
            Some(bound) if bound == caller => Ok(()),
            _ => Err(TickrError::Unauthorized {
                caller: caller.clone(),
                role: "downstream registry",
            }),
        }
    }

    fn claim_matches(record: &ReservationRecord, owner: &AccountId, name: &str) -> bool {
        record.owner == *owner && record.name == name && !record.finalized
    }

    /// Read-only check used by the downstream registry before it commits.
    ///
    /// True iff the reservation belongs to `claimed_owner` under
    /// `claimed_name` and is not yet finalized.
    pub fn check_validity(
        &self,
        symbol: &str,
        claimed_owner: &AccountId,
        claimed_name: &str,
        caller: &AccountId,
    ) -> Result<bool, TickrError> {
        {
            let config = self.lock()?;
            Self::authorize_downstream(&config, caller)?;
        }
        let symbol = Symbol::lookup(symbol)?;
        let record = self
            .db
            .get_ticker(&symbol)?
            .ok_or_else(|| TickrError::NotFound(symbol.to_string()))?;
        Ok(Self::claim_matches(&record, claimed_owner, claimed_name))
    }

    /// Permanently lock a reservation on behalf of the downstream registry.
    ///
    /// The claim must pass `check_validity` and the reservation must still
    /// be inside its window.
    pub fn confirm_finalization(
        &self,
        symbol: &str,
        claimed_owner: &AccountId,
        claimed_name: &str,
        caller: &AccountId,
        now: Timestamp,
    ) -> Result<ReservationRecord, TickrError> {
        let config = self.lock()?;
        Self::authorize_downstream(&config, caller)?;
        let symbol = Symbol::lookup(symbol)?;

        let mut record = self
            .db
            .get_ticker(&symbol)?
            .ok_or_else(|| TickrError::NotFound(symbol.to_string()))?;

        if !Self::claim_matches(&record, claimed_owner, claimed_name) {
            return Err(TickrError::ClaimMismatch(symbol.to_string()));
        }
        let expires_at = record.expires_at(config.expiry_window_secs);
        if now >= expires_at {
            return Err(TickrError::ReservationExpired {
                symbol: symbol.to_string(),
                expired_at: expires_at,
            });
        }

        record.finalized = true;
        record.finalized_at = Some(now);
        let event = RegistrationEvent {
            seq: 0,
            symbol: symbol.clone(),
            owner: record.owner.clone(),
            name: record.name.clone(),
            metadata: record.metadata,
            timestamp: now,
            kind: RegistrationEventKind::Finalized,
        };
        let event = self.db.commit_ticker(&record, event)?;

        info!(seq = event.seq, %symbol, owner = %record.owner, "ticker finalized");
        Ok(record)
    }

    // ── Administration ────────────────────────────────────────────────────────

    fn authorize_admin(config: &RegistryConfig, caller: &AccountId) -> Result<(), TickrError> {
        if config.administrator != *caller {
            return Err(TickrError::Unauthorized {
                caller: caller.clone(),
                role: "administrator",
            });
        }
        Ok(())
    }

    /// Persist `next` and make it the live config.
    fn store_config(
        &self,
        live: &mut RegistryConfig,
        next: RegistryConfig,
    ) -> Result<(), TickrError> {
        self.db.put_config(&next)?;
        *live = next;
        Ok(())
    }

    /// Change the fee charged by later registrations. Zero disables the fee.
    pub fn set_fee_amount(&self, amount: Balance, caller: &AccountId) -> Result<(), TickrError> {
        let mut config = self.lock()?;
        Self::authorize_admin(&config, caller)?;
        let old = config.fee_amount;
        let next = config.clone().with_fee_amount(amount);
        self.store_config(&mut config, next)?;
        info!(old = %old, new = %amount, "registration fee changed");
        Ok(())
    }

    pub fn set_expiry_window(&self, secs: i64, caller: &AccountId) -> Result<(), TickrError> {
        let mut config = self.lock()?;
        Self::authorize_admin(&config, caller)?;
        let old = config.expiry_window_secs;
        let next = config.clone().with_expiry_window(secs)?;
        self.store_config(&mut config, next)?;
        info!(old, new = secs, "expiry window changed");
        Ok(())
    }

    /// Bind the downstream registry. Can only ever happen once.
    pub fn set_downstream_caller(
        &self,
        downstream: &AccountId,
        caller: &AccountId,
    ) -> Result<(), TickrError> {
        let mut config = self.lock()?;
        Self::authorize_admin(&config, caller)?;
        let mut next = config.clone();
        next.bind_downstream_caller(downstream.clone())?;
        self.store_config(&mut config, next)?;
        info!(%downstream, "downstream registry bound");
        Ok(())
    }

    // ── Queries ───────────────────────────────────────────────────────────────

    pub fn get_details(&self, symbol: &str) -> Result<TickerDetails, TickrError> {
        let symbol = Symbol::lookup(symbol)?;
        self.db
            .get_ticker(&symbol)?
            .map(|r| r.details())
            .ok_or_else(|| TickrError::NotFound(symbol.to_string()))
    }

    /// True when `register` on `symbol` would get past the conflict check at
    /// `now`. A symbol outside the length bounds is never available.
    pub fn is_available(&self, symbol: &str, now: Timestamp) -> Result<bool, TickrError> {
        let Ok(symbol) = Symbol::parse(symbol) else {
            return Ok(false);
        };
        let window = self.expiry_window()?;
        Ok(match self.db.get_ticker(&symbol)? {
            None => true,
            Some(r) => r.is_reclaimable(now, window),
        })
    }

    /// Audit log for `symbol`, oldest first. Includes overwritten reservations.
    pub fn history(&self, symbol: &str) -> Result<Vec<RegistrationEvent>, TickrError> {
        let Ok(symbol) = Symbol::parse(symbol) else {
            return Ok(Vec::new());
        };
        self.db.events_for_symbol(&symbol)
    }

    pub fn config(&self) -> Result<RegistryConfig, TickrError> {
        Ok(self.lock()?.clone())
    }

    pub fn expiry_window(&self) -> Result<i64, TickrError> {
        Ok(self.lock()?.expiry_window_secs)
    }

    pub fn fee_amount(&self) -> Result<Balance, TickrError> {
        Ok(self.lock()?.fee_amount)
    }
}
