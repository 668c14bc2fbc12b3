//! tickr-rpc
//!
//! JSON-RPC 2.0 server for a Tickr registry.
//!
//! Namespace: "tickr"
//! Methods:
//!   tickr_registerTicker        — reserve a symbol (fee pulled from the requester)
//!   tickr_checkValidity         — downstream registry: validate a claim
//!   tickr_confirmFinalization   — downstream registry: lock a reservation
//!   tickr_setRegistrationFee    — administrator
//!   tickr_setExpiryWindow       — administrator
//!   tickr_setDownstreamCaller   — administrator, once
//!   tickr_getDetails            — reservation details
//!   tickr_getConfig             — fee, window and role bindings
//!   tickr_isAvailable           — can the symbol be registered now
//!   tickr_getHistory            — audit log for a symbol
//!   tickr_describeTicker        — human-readable status line
//!
//! Caller identities travel as plain parameters and are not authenticated
//! here; bind the server to loopback or put an authenticating proxy in front.

pub mod api;
pub mod server;
pub mod types;

pub use server::RpcServer;
pub use server::RpcServerState;
pub use types::{RpcConfig, RpcRegistrationEvent, RpcTicker};
