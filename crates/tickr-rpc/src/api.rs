use jsonrpsee::core::RpcResult;
use jsonrpsee::proc_macros::rpc;

use crate::types::{RpcConfig, RpcRegistrationEvent, RpcTicker};

/// Tickr JSON-RPC 2.0 API definition.
///
/// All method names are prefixed with "tickr_" via `namespace = "tickr"`.
/// Identities are base-58 account ids; amounts are decimal strings.
#[rpc(server, namespace = "tickr")]
pub trait TickrApi {
    /// Reserve `symbol` for `requester`. `metadata` is 64 hex digits or up
    /// to 32 bytes of text.
    #[method(name = "registerTicker")]
    async fn register_ticker(
        &self,
        requester: String,
        symbol: String,
        name: String,
        metadata: String,
    ) -> RpcResult<RpcTicker>;

    /// Downstream registry only: does the reservation match the claim?
    #[method(name = "checkValidity")]
    async fn check_validity(
        &self,
        symbol: String,
        claimed_owner: String,
        claimed_name: String,
        caller: String,
    ) -> RpcResult<bool>;

    /// Downstream registry only: lock the reservation permanently.
    #[method(name = "confirmFinalization")]
    async fn confirm_finalization(
        &self,
        symbol: String,
        claimed_owner: String,
        claimed_name: String,
        caller: String,
    ) -> RpcResult<RpcTicker>;

    /// Administrator only. `amount` is in base units (u128 as string).
    #[method(name = "setRegistrationFee")]
    async fn set_registration_fee(&self, amount: String, caller: String) -> RpcResult<RpcConfig>;

    /// Administrator only. At least one day.
    #[method(name = "setExpiryWindow")]
    async fn set_expiry_window(&self, secs: i64, caller: String) -> RpcResult<RpcConfig>;

    /// Administrator only; succeeds once.
    #[method(name = "setDownstreamCaller")]
    async fn set_downstream_caller(&self, downstream: String, caller: String) -> RpcResult<RpcConfig>;

    #[method(name = "getDetails")]
    async fn get_details(&self, symbol: String) -> RpcResult<RpcTicker>;

    #[method(name = "getConfig")]
    async fn get_config(&self) -> RpcResult<RpcConfig>;

    /// Whether `symbol` could be registered right now.
    #[method(name = "isAvailable")]
    async fn is_available(&self, symbol: String) -> RpcResult<bool>;

    /// Audit log for `symbol`, oldest first.
    #[method(name = "getHistory")]
    async fn get_history(&self, symbol: String) -> RpcResult<Vec<RpcRegistrationEvent>>;

    #[method(name = "describeTicker")]
    async fn describe_ticker(&self, symbol: String) -> RpcResult<String>;
}
