use std::net::SocketAddr;
use std::sync::Arc;

use jsonrpsee::core::{async_trait, RpcResult};
use jsonrpsee::server::{Server, ServerHandle};
use jsonrpsee::types::ErrorObject;
use tracing::{info, warn};

use tickr_core::error::TickrError;
use tickr_core::symbol::Symbol;
use tickr_core::types::{AccountId, Balance, MetadataPointer, Timestamp};
use tickr_state::TickerRegistry;

use crate::api::TickrApiServer;
use crate::types::{RpcConfig, RpcRegistrationEvent, RpcTicker};

fn rpc_err(code: i32, msg: impl Into<String>) -> ErrorObject<'static> {
    ErrorObject::owned(code, msg.into(), None::<()>)
}

/// Map a registry failure onto a JSON-RPC application error code.
fn registry_err(e: TickrError) -> ErrorObject<'static> {
    let code = match &e {
        TickrError::Unauthorized { .. } => -32001,
        TickrError::InvalidParameter(_) => -32002,
        TickrError::SymbolTaken(_) => -32003,
        TickrError::NotFound(_) => -32004,
        TickrError::PaymentFailed(_) => -32005,
        TickrError::AlreadySet(_) => -32006,
        TickrError::ClaimMismatch(_) => -32007,
        TickrError::ReservationExpired { .. } => -32008,
        TickrError::Serialization(_) | TickrError::Storage(_) => {
            warn!(error = %e, "RPC: registry storage failure");
            -32603
        }
    };
    rpc_err(code, e.to_string())
}

fn parse_account(field: &str, s: &str) -> Result<AccountId, ErrorObject<'static>> {
    AccountId::from_b58(s).map_err(|e| rpc_err(-32602, format!("invalid {field}: {e}")))
}

/// 64 hex digits (optionally 0x-prefixed) are taken as raw bytes; anything
/// else is packed as text.
fn parse_metadata(s: &str) -> Result<MetadataPointer, ErrorObject<'static>> {
    let digits = s.trim_start_matches("0x");
    let parsed = if digits.len() == 64 && digits.chars().all(|c| c.is_ascii_hexdigit()) {
        MetadataPointer::from_hex(digits)
    } else {
        MetadataPointer::from_text(s)
    };
    parsed.map_err(|e| rpc_err(-32602, format!("invalid metadata: {e}")))
}

/// Shared state passed to the RPC server.
pub struct RpcServerState {
    pub registry: Arc<TickerRegistry>,
}

impl RpcServerState {
    fn now(&self) -> Timestamp {
        chrono::Utc::now().timestamp()
    }
}

/// The RPC server implementation.
pub struct RpcServer {
    state: Arc<RpcServerState>,
}

impl RpcServer {
    pub fn new(state: Arc<RpcServerState>) -> Self {
        Self { state }
    }

    /// Start the JSON-RPC server on `addr`. Returns the bound address and a
    /// handle to stop it.
    pub async fn start(self, addr: SocketAddr) -> anyhow::Result<(SocketAddr, ServerHandle)> {
        let server = Server::builder().build(addr).await?;
        let local = server.local_addr()?;
        let module = self.into_rpc();
        let handle = server.start(module);
        info!(addr = %local, "RPC server started");
        Ok((local, handle))
    }

    fn config(&self) -> RpcResult<RpcConfig> {
        let cfg = self.state.registry.config().map_err(registry_err)?;
        Ok(RpcConfig::from(&cfg))
    }
}

#[async_trait]
impl TickrApiServer for RpcServer {
    async fn register_ticker(
        &self,
        requester: String,
        symbol: String,
        name: String,
        metadata: String,
    ) -> RpcResult<RpcTicker> {
        let requester = parse_account("requester", &requester)?;
        let metadata = parse_metadata(&metadata)?;
        let record = self
            .state
            .registry
            .register(&requester, &symbol, &name, metadata, self.state.now())
            .map_err(registry_err)?;
        Ok(RpcTicker::from(&record))
    }

    async fn check_validity(
        &self,
        symbol: String,
        claimed_owner: String,
        claimed_name: String,
        caller: String,
    ) -> RpcResult<bool> {
        let owner = parse_account("claimed_owner", &claimed_owner)?;
        let caller = parse_account("caller", &caller)?;
        self.state
            .registry
            .check_validity(&symbol, &owner, &claimed_name, &caller)
            .map_err(registry_err)
    }

    async fn confirm_finalization(
        &self,
        symbol: String,
        claimed_owner: String,
        claimed_name: String,
        caller: String,
    ) -> RpcResult<RpcTicker> {
        let owner = parse_account("claimed_owner", &claimed_owner)?;
        let caller = parse_account("caller", &caller)?;
        let record = self
            .state
            .registry
            .confirm_finalization(&symbol, &owner, &claimed_name, &caller, self.state.now())
            .map_err(registry_err)?;
        Ok(RpcTicker::from(&record))
    }

    async fn set_registration_fee(&self, amount: String, caller: String) -> RpcResult<RpcConfig> {
        let amount: Balance = amount
            .parse()
            .map_err(|e| rpc_err(-32602, format!("invalid amount: {e}")))?;
        let caller = parse_account("caller", &caller)?;
        self.state
            .registry
            .set_fee_amount(amount, &caller)
            .map_err(registry_err)?;
        self.config()
    }

    async fn set_expiry_window(&self, secs: i64, caller: String) -> RpcResult<RpcConfig> {
        let caller = parse_account("caller", &caller)?;
        self.state
            .registry
            .set_expiry_window(secs, &caller)
            .map_err(registry_err)?;
        self.config()
    }

    async fn set_downstream_caller(&self, downstream: String, caller: String) -> RpcResult<RpcConfig> {
        let downstream = parse_account("downstream", &downstream)?;
        let caller = parse_account("caller", &caller)?;
        self.state
            .registry
            .set_downstream_caller(&downstream, &caller)
            .map_err(registry_err)?;
        self.config()
    }

    async fn get_details(&self, symbol: String) -> RpcResult<RpcTicker> {
        let canonical = Symbol::lookup(&symbol).map_err(registry_err)?;
        let details = self
            .state
            .registry
            .get_details(canonical.as_str())
            .map_err(registry_err)?;
        Ok(RpcTicker::from_details(canonical.as_str(), &details))
    }

    async fn get_config(&self) -> RpcResult<RpcConfig> {
        self.config()
    }

    async fn is_available(&self, symbol: String) -> RpcResult<bool> {
        self.state
            .registry
            .is_available(&symbol, self.state.now())
            .map_err(registry_err)
    }

    async fn get_history(&self, symbol: String) -> RpcResult<Vec<RpcRegistrationEvent>> {
        let events = self.state.registry.history(&symbol).map_err(registry_err)?;
        Ok(events.iter().map(RpcRegistrationEvent::from).collect())
    }

    async fn describe_ticker(&self, symbol: String) -> RpcResult<String> {
        let canonical = Symbol::lookup(&symbol).map_err(registry_err)?;
        self.state
            .registry
            .query()
            .describe(&canonical, self.state.now())
            .map_err(registry_err)
    }
}
