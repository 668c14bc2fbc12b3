//! End-to-end smoke test for tickr-node.
//!
//! Starts a real node process on a fresh database, drives the registry via
//! JSON-RPC, and asserts the results and error codes.
//!
//! Run with:
//!   cargo test -p tickr-node --test smoke

use std::net::TcpListener;
use std::path::PathBuf;
use std::process::{Child, Command, Stdio};
use std::time::{Duration, Instant};

use tickr_core::types::AccountId;

// ── Node lifecycle ────────────────────────────────────────────────────────────

struct NodeGuard {
    child: Child,
    data_dir: PathBuf,
}

impl Drop for NodeGuard {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
        let _ = std::fs::remove_dir_all(&self.data_dir);
    }
}

/// Find a free TCP port on loopback.
fn free_port() -> u16 {
    TcpListener::bind("127.0.0.1:0")
        .unwrap()
        .local_addr()
        .unwrap()
        .port()
}

fn account(b: u8) -> String {
    AccountId::from_bytes([b; 32]).to_b58()
}

// ── RPC helpers ───────────────────────────────────────────────────────────────

/// Returns `Ok(result)` or `Err(error code)`.
async fn rpc_call(
    client: &reqwest::Client,
    url: &str,
    method: &str,
    params: serde_json::Value,
) -> Result<serde_json::Value, i64> {
    let body = serde_json::json!({
        "jsonrpc": "2.0",
        "method": method,
        "params": params,
        "id": 1
    });
    let resp = client
        .post(url)
        .json(&body)
        .send()
        .await
        .unwrap_or_else(|e| panic!("RPC call {method} failed: {e}"));
    let json: serde_json::Value = resp.json().await.expect("parse RPC JSON");
    if let Some(err) = json.get("error") {
        return Err(err["code"].as_i64().expect("error code"));
    }
    Ok(json["result"].clone())
}

async fn rpc_ok(
    client: &reqwest::Client,
    url: &str,
    method: &str,
    params: serde_json::Value,
) -> serde_json::Value {
    rpc_call(client, url, method, params)
        .await
        .unwrap_or_else(|code| panic!("RPC error from {method}: {code}"))
}

/// Poll until the RPC server responds or the timeout elapses.
async fn wait_for_rpc(client: &reqwest::Client, url: &str, timeout: Duration) -> bool {
    let body = serde_json::json!({
        "jsonrpc": "2.0",
        "method": "tickr_getConfig",
        "params": [],
        "id": 1
    });
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if let Ok(resp) = client.post(url).json(&body).send().await {
            if resp.status().is_success() {
                return true;
            }
        }
        tokio::time::sleep(Duration::from_millis(250)).await;
    }
    false
}

// ── Smoke test ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn smoke_register_validate_finalize() {
    // ── 1. Prepare temp dir and registry params ───────────────────────────────
    let data_dir = std::env::temp_dir().join(format!("tickr_e2e_{}", std::process::id()));
    let _ = std::fs::remove_dir_all(&data_dir);
    std::fs::create_dir_all(&data_dir).unwrap();

    let admin = account(1);
    let treasury = account(2);
    let downstream = account(3);
    let alice = account(10);
    let bob = account(11);

    let params = serde_json::json!({
        "administrator": admin,
        "treasury": treasury,
        "registration_fee": "1000",
        "fee_allocations": [
            { "account": alice, "balance": "5000", "allowance": "5000" },
            { "account": bob, "balance": "5000" }
        ]
    });
    let params_path = data_dir.join("registry-params.json");
    std::fs::write(&params_path, params.to_string()).unwrap();

    // ── 2. Start node ─────────────────────────────────────────────────────────
    let rpc_port = free_port();
    let rpc_url = format!("http://127.0.0.1:{}", rpc_port);

    let node_bin = env!("CARGO_BIN_EXE_tickr-node");
    let child = Command::new(node_bin)
        .args([
            "--data-dir",        data_dir.join("state").to_str().unwrap(),
            "--rpc-addr",        &format!("127.0.0.1:{}", rpc_port),
            "--registry-params", params_path.to_str().unwrap(),
        ])
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .expect("failed to spawn tickr-node");

    let _guard = NodeGuard { child, data_dir };

    // ── 3. Wait for RPC ready ─────────────────────────────────────────────────
    let http = reqwest::Client::new();
    assert!(
        wait_for_rpc(&http, &rpc_url, Duration::from_secs(20)).await,
        "tickr-node did not become ready within 20 seconds"
    );

    let config = rpc_ok(&http, &rpc_url, "tickr_getConfig", serde_json::json!([])).await;
    assert_eq!(config["fee_amount"], "1000");
    assert_eq!(config["expiry_window_secs"], 604_800);
    assert!(config["downstream_caller"].is_null());

    // ── 4. Alice reserves "det"; bob is refused ───────────────────────────────
    let ticker = rpc_ok(
        &http,
        &rpc_url,
        "tickr_registerTicker",
        serde_json::json!([alice, "det", "Detailed Corp", "ipfs-pointer"]),
    )
    .await;
    assert_eq!(ticker["symbol"], "DET");
    assert_eq!(ticker["owner"], alice.as_str());
    assert_eq!(ticker["metadata_text"], "ipfs-pointer");
    assert_eq!(ticker["finalized"], false);

    let taken = rpc_call(
        &http,
        &rpc_url,
        "tickr_registerTicker",
        serde_json::json!([bob, "DET", "Other", ""]),
    )
    .await;
    assert_eq!(taken, Err(-32003), "live reservation must not be overwritten");

    // ── 5. Bob never approved the fee ─────────────────────────────────────────
    let unpaid = rpc_call(
        &http,
        &rpc_url,
        "tickr_registerTicker",
        serde_json::json!([bob, "XYZ", "Xyz Inc", ""]),
    )
    .await;
    assert_eq!(unpaid, Err(-32005));
    let free = rpc_ok(&http, &rpc_url, "tickr_isAvailable", serde_json::json!(["XYZ"])).await;
    assert_eq!(free, true, "failed payment must leave the symbol free");

    // ── 6. Fee changes are administrator-only ─────────────────────────────────
    let denied = rpc_call(
        &http,
        &rpc_url,
        "tickr_setRegistrationFee",
        serde_json::json!(["0", bob]),
    )
    .await;
    assert_eq!(denied, Err(-32001));

    let config = rpc_ok(
        &http,
        &rpc_url,
        "tickr_setRegistrationFee",
        serde_json::json!(["0", admin]),
    )
    .await;
    assert_eq!(config["fee_amount"], "0");

    rpc_ok(
        &http,
        &rpc_url,
        "tickr_registerTicker",
        serde_json::json!([bob, "xyz", "Xyz Inc", ""]),
    )
    .await;

    // ── 7. Downstream binding gates validation ────────────────────────────────
    let unbound = rpc_call(
        &http,
        &rpc_url,
        "tickr_checkValidity",
        serde_json::json!(["DET", alice, "Detailed Corp", downstream]),
    )
    .await;
    assert_eq!(unbound, Err(-32001));

    rpc_ok(
        &http,
        &rpc_url,
        "tickr_setDownstreamCaller",
        serde_json::json!([downstream, admin]),
    )
    .await;
    let rebind = rpc_call(
        &http,
        &rpc_url,
        "tickr_setDownstreamCaller",
        serde_json::json!([account(4), admin]),
    )
    .await;
    assert_eq!(rebind, Err(-32006));

    let valid = rpc_ok(
        &http,
        &rpc_url,
        "tickr_checkValidity",
        serde_json::json!(["det", alice, "Detailed Corp", downstream]),
    )
    .await;
    assert_eq!(valid, true);
    let wrong_name = rpc_ok(
        &http,
        &rpc_url,
        "tickr_checkValidity",
        serde_json::json!(["DET", alice, "Detailed", downstream]),
    )
    .await;
    assert_eq!(wrong_name, false);

    // ── 8. Finalize "DET" ─────────────────────────────────────────────────────
    rpc_ok(
        &http,
        &rpc_url,
        "tickr_confirmFinalization",
        serde_json::json!(["DET", alice, "Detailed Corp", downstream]),
    )
    .await;
    let details = rpc_ok(&http, &rpc_url, "tickr_getDetails", serde_json::json!(["det"])).await;
    assert_eq!(details["finalized"], true);
    let available = rpc_ok(&http, &rpc_url, "tickr_isAvailable", serde_json::json!(["DET"])).await;
    assert_eq!(available, false);

    let history = rpc_ok(&http, &rpc_url, "tickr_getHistory", serde_json::json!(["DET"])).await;
    let history = history.as_array().expect("history list");
    assert_eq!(history.len(), 2);
    assert_eq!(history[0]["kind"], "Registered");
    assert_eq!(history[0]["fee_paid"], "1000");
    assert_eq!(history[1]["kind"], "Finalized");

    // ── 9. Expiry window bounds ───────────────────────────────────────────────
    let short = rpc_call(
        &http,
        &rpc_url,
        "tickr_setExpiryWindow",
        serde_json::json!([5_000, admin]),
    )
    .await;
    assert_eq!(short, Err(-32002));
    let config = rpc_ok(
        &http,
        &rpc_url,
        "tickr_setExpiryWindow",
        serde_json::json!([86_400, admin]),
    )
    .await;
    assert_eq!(config["expiry_window_secs"], 86_400);

    let missing = rpc_call(&http, &rpc_url, "tickr_getDetails", serde_json::json!(["NOPE"])).await;
    assert_eq!(missing, Err(-32004));
    let too_long =
        rpc_call(&http, &rpc_url, "tickr_getDetails", serde_json::json!(["POLYMATHNET"])).await;
    assert_eq!(too_long, Err(-32004));
    let intruder = rpc_call(
        &http,
        &rpc_url,
        "tickr_checkValidity",
        serde_json::json!(["", alice, "Detailed Corp", bob]),
    )
    .await;
    assert_eq!(intruder, Err(-32001), "non-downstream callers are always refused");
}
