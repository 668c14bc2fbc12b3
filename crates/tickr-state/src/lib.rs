//! tickr-state
//!
//! Persistent reservation store and the registry state machine.
//! `StateDb` owns the sled trees; `TickerRegistry` applies every
//! registration, finalization and administrative change against it.

pub mod db;
pub mod engine;
pub mod fee;
pub mod query;

pub use db::StateDb;
pub use engine::TickerRegistry;
pub use fee::{AllowanceLedger, FeeError, FeeTransfer};
pub use query::TickerQuery;
