use chrono::{DateTime, Utc};
use tickr_core::error::TickrError;
use tickr_core::record::{RegistryConfig, ReservationRecord};
use tickr_core::symbol::Symbol;
use tickr_core::types::Timestamp;

use crate::db::StateDb;

/// Read-only helpers over stored reservations.
pub struct TickerQuery<'a> {
    db: &'a StateDb,
}

fn format_ts(ts: Timestamp) -> String {
    DateTime::<Utc>::from_timestamp(ts, 0)
        .map(|d| d.format("%Y-%m-%d %H:%M:%S UTC").to_string())
        .unwrap_or_else(|| ts.to_string())
}

impl<'a> TickerQuery<'a> {
    pub fn new(db: &'a StateDb) -> Self {
        Self { db }
    }

    fn load(&self, symbol: &Symbol) -> Result<(ReservationRecord, RegistryConfig), TickrError> {
        let record = self
            .db
            .get_ticker(symbol)?
            .ok_or_else(|| TickrError::NotFound(symbol.to_string()))?;
        let config = self
            .db
            .get_config()?
            .ok_or_else(|| TickrError::Storage("registry config missing".into()))?;
        Ok((record, config))
    }

    /// When the reservation lapses. `None` once it is finalized.
    pub fn expires_at(&self, symbol: &Symbol) -> Result<Option<Timestamp>, TickrError> {
        let (record, config) = self.load(symbol)?;
        if record.finalized {
            return Ok(None);
        }
        Ok(Some(record.expires_at(config.expiry_window_secs)))
    }

    /// Human-readable summary of a reservation's state.
    pub fn describe(&self, symbol: &Symbol, now: Timestamp) -> Result<String, TickrError> {
        let (r, config) = self.load(symbol)?;

        let status = if r.finalized {
            match r.finalized_at {
                Some(at) => format!("Finalized at {}", format_ts(at)),
                None => "Finalized".to_string(),
            }
        } else {
            let expires_at = r.expires_at(config.expiry_window_secs);
            let remaining = expires_at - now;
            if remaining > 0 {
                format!(
                    "Reserved — expires {} ({}h left)",
                    format_ts(expires_at),
                    remaining / 3600
                )
            } else {
                format!("Lapsed at {} — open for registration", format_ts(expires_at))
            }
        };

        Ok(format!(
            "{} | \"{}\" | owner: {} | registered {} | {}",
            r.symbol,
            r.name,
            r.owner,
            format_ts(r.registered_at),
            status
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tickr_core::constants::SECS_PER_DAY;
    use tickr_core::record::{RegistrationEvent, RegistrationEventKind};
    use tickr_core::types::{AccountId, MetadataPointer};

    fn seeded_db(name: &str, finalized: bool) -> (StateDb, Symbol) {
        let dir = std::env::temp_dir().join(format!("tickr_query_test_{}", name));
        let _ = std::fs::remove_dir_all(&dir);
        let db = StateDb::open(&dir).unwrap();
        let cfg = RegistryConfig::new(AccountId::from_bytes([1; 32]), AccountId::from_bytes([2; 32]))
            .with_expiry_window(SECS_PER_DAY)
            .unwrap();
        db.put_config(&cfg).unwrap();

        let symbol = Symbol::parse("DET").unwrap();
        let mut rec = ReservationRecord::new(
            symbol.clone(),
            AccountId::from_bytes([3; 32]),
            "Demo Token".into(),
            MetadataPointer::default(),
            0,
        );
        if finalized {
            rec.finalized = true;
            rec.finalized_at = Some(60);
        }
        let ev = RegistrationEvent {
            seq: 0,
            symbol: symbol.clone(),
            owner: rec.owner.clone(),
            name: rec.name.clone(),
            metadata: rec.metadata,
            timestamp: 0,
            kind: RegistrationEventKind::Registered { fee_paid: 0, replaced: None },
        };
        db.commit_ticker(&rec, ev).unwrap();
        (db, symbol)
    }

    #[test]
    fn pending_reservation_reports_expiry() {
        let (db, symbol) = seeded_db("pending", false);
        let q = TickerQuery::new(&db);
        assert_eq!(q.expires_at(&symbol).unwrap(), Some(SECS_PER_DAY));

        let text = q.describe(&symbol, 3_600).unwrap();
        assert!(text.starts_with("DET"), "{text}");
        assert!(text.contains("23h left"), "{text}");
        assert!(q.describe(&symbol, SECS_PER_DAY).unwrap().contains("Lapsed"));
    }

    #[test]
    fn finalized_reservation_has_no_expiry() {
        let (db, symbol) = seeded_db("finalized", true);
        let q = TickerQuery::new(&db);
        assert_eq!(q.expires_at(&symbol).unwrap(), None);
        assert!(q.describe(&symbol, 0).unwrap().contains("Finalized at 1970-01-01 00:01:00 UTC"));
    }

    #[test]
    fn unknown_symbol_is_not_found() {
        let (db, _) = seeded_db("unknown", false);
        let q = TickerQuery::new(&db);
        assert!(matches!(
            q.expires_at(&Symbol::parse("NOPE").unwrap()).unwrap_err(),
            TickrError::NotFound(_)
        ));
    }
}
