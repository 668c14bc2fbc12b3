use sled::transaction::{ConflictableTransactionError, TransactionError};
use sled::Transactional;
use std::path::Path;

use tickr_core::error::TickrError;
use tickr_core::record::{RegistrationEvent, RegistryConfig, ReservationRecord};
use tickr_core::symbol::Symbol;

const CONFIG_KEY: &str = "config";

/// Persistent state database backed by sled (pure-Rust, no C dependencies).
///
/// Named trees (analogous to column families):
///   tickers — canonical symbol bytes → bincode(ReservationRecord)
///   events  — u64 BE sequence        → bincode(RegistrationEvent)
///   meta    — utf8 key bytes         → bincode(RegistryConfig) under "config"
pub struct StateDb {
    db: sled::Db,
    tickers: sled::Tree,
    events: sled::Tree,
    meta: sled::Tree,
}

/// A record and its audit event, sequenced and encoded, ready to write.
pub struct StagedTicker {
    key: Vec<u8>,
    record_bytes: Vec<u8>,
    event_bytes: Vec<u8>,
    event: RegistrationEvent,
}

impl StagedTicker {
    pub fn seq(&self) -> u64 {
        self.event.seq
    }
}

fn storage(e: sled::Error) -> TickrError {
    TickrError::Storage(e.to_string())
}

fn serialization(e: bincode::Error) -> TickrError {
    TickrError::Serialization(e.to_string())
}

impl StateDb {
    /// Open or create the state database at `path`.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, TickrError> {
        let db = sled::open(path).map_err(storage)?;
        let tickers = db.open_tree("tickers").map_err(storage)?;
        let events  = db.open_tree("events").map_err(storage)?;
        let meta    = db.open_tree("meta").map_err(storage)?;
        Ok(Self { db, tickers, events, meta })
    }

    // ── Reservations ─────────────────────────────────────────────────────────

    pub fn get_ticker(&self, symbol: &Symbol) -> Result<Option<ReservationRecord>, TickrError> {
        match self.tickers.get(symbol.as_key()).map_err(storage)? {
            Some(bytes) => Ok(Some(bincode::deserialize(&bytes).map_err(serialization)?)),
            None => Ok(None),
        }
    }

    pub fn ticker_count(&self) -> usize {
        self.tickers.len()
    }

    /// Write `record` and append `event` to the audit log in one transaction.
    ///
    /// The event's `seq` is assigned here; the committed event is returned.
    pub fn commit_ticker(
        &self,
        record: &ReservationRecord,
        event: RegistrationEvent,
    ) -> Result<RegistrationEvent, TickrError> {
        let staged = self.stage_ticker(record, event)?;
        self.apply_staged(staged)
    }

    /// Allocate the event's `seq` and encode both values, without writing.
    pub fn stage_ticker(
        &self,
        record: &ReservationRecord,
        mut event: RegistrationEvent,
    ) -> Result<StagedTicker, TickrError> {
        event.seq = self.db.generate_id().map_err(storage)?;
        Ok(StagedTicker {
            key: record.symbol.as_key().to_vec(),
            record_bytes: bincode::serialize(record).map_err(serialization)?,
            event_bytes: bincode::serialize(&event).map_err(serialization)?,
            event,
        })
    }

    /// Write a staged record and its event in one sled transaction.
    pub fn apply_staged(&self, staged: StagedTicker) -> Result<RegistrationEvent, TickrError> {
        let seq_key = staged.event.seq.to_be_bytes();
        (&self.tickers, &self.events)
            .transaction(|(tickers, events)| {
                tickers.insert(staged.key.as_slice(), staged.record_bytes.as_slice())?;
                events.insert(&seq_key[..], staged.event_bytes.as_slice())?;
                Ok::<(), ConflictableTransactionError<TickrError>>(())
            })
            .map_err(|e| match e {
                TransactionError::Abort(inner) => inner,
                TransactionError::Storage(inner) => storage(inner),
            })?;
        Ok(staged.event)
    }

    // ── Audit log ────────────────────────────────────────────────────────────

    /// All audit events for `symbol`, oldest first.
    pub fn events_for_symbol(&self, symbol: &Symbol) -> Result<Vec<RegistrationEvent>, TickrError> {
        let mut out = Vec::new();
        for item in self.events.iter() {
            let (_, bytes) = item.map_err(storage)?;
            let event: RegistrationEvent = bincode::deserialize(&bytes).map_err(serialization)?;
            if event.symbol == *symbol {
                out.push(event);
            }
        }
        Ok(out)
    }

    pub fn event_count(&self) -> usize {
        self.events.len()
    }

    // ── Config ───────────────────────────────────────────────────────────────

    pub fn get_config(&self) -> Result<Option<RegistryConfig>, TickrError> {
        match self.meta.get(CONFIG_KEY.as_bytes()).map_err(storage)? {
            Some(bytes) => Ok(Some(bincode::deserialize(&bytes).map_err(serialization)?)),
            None => Ok(None),
        }
    }

    pub fn put_config(&self, config: &RegistryConfig) -> Result<(), TickrError> {
        let bytes = bincode::serialize(config).map_err(serialization)?;
        self.meta
            .insert(CONFIG_KEY.as_bytes(), bytes)
            .map_err(storage)?;
        Ok(())
    }

    /// Flush all pending writes to disk.
    pub fn flush(&self) -> Result<(), TickrError> {
        self.db.flush().map_err(storage)?;
        Ok(())
    }
}
