//! tickr-node — serves one ticker registry over JSON-RPC.
//!
//! Startup sequence:
//!   1. Open (or initialise) the state database
//!   2. Initialise the registry config from `--registry-params` if the DB is fresh
//!   3. Load development fee allocations into the in-memory fee ledger
//!   4. Start the JSON-RPC 2.0 server
//!   5. Run until Ctrl-C, then flush

mod params;

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing::{info, warn};

use tickr_rpc::{RpcServer, RpcServerState};
use tickr_state::{AllowanceLedger, StateDb, TickerRegistry};

use crate::params::RegistryParams;

#[derive(Parser, Debug)]
#[command(
    name = "tickr-node",
    version,
    about = "Tickr node — fee-gated, time-bounded ticker reservations"
)]
struct Args {
    /// Directory for the persistent state database.
    #[arg(long, default_value = "~/.tickr/data")]
    data_dir: PathBuf,

    /// JSON-RPC listen address.
    #[arg(long, default_value = "127.0.0.1:8546")]
    rpc_addr: SocketAddr,

    /// Path to registry params JSON (required on first run).
    #[arg(long)]
    registry_params: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info,tickr=debug")),
        )
        .init();

    let args = Args::parse();
    info!("Tickr node starting");

    // ── State database ────────────────────────────────────────────────────────
    let data_dir = expand_tilde(&args.data_dir);
    std::fs::create_dir_all(&data_dir)
        .with_context(|| format!("creating data dir {}", data_dir.display()))?;

    let db = Arc::new(StateDb::open(&data_dir).context("opening state database")?);

    // ── Registry config ───────────────────────────────────────────────────────
    let params = args
        .registry_params
        .as_deref()
        .map(RegistryParams::load)
        .transpose()?;

    let initial = match (db.get_config().context("reading stored config")?, &params) {
        (Some(stored), _) => {
            info!("existing database found — using stored registry config");
            stored
        }
        (None, Some(p)) => {
            info!("fresh database — initialising registry config from params");
            p.to_config()?
        }
        (None, None) => anyhow::bail!(
            "fresh database at {}: --registry-params is required to set the administrator",
            data_dir.display()
        ),
    };

    // ── Fee ledger ────────────────────────────────────────────────────────────
    let ledger = Arc::new(AllowanceLedger::new());
    if let Some(p) = &params {
        if !p.fee_allocations.is_empty() {
            warn!(
                accounts = p.fee_allocations.len(),
                "Using the in-memory fee ledger with development allocations — DO NOT USE IN PRODUCTION."
            );
        }
        p.seed_ledger(&ledger)?;
    }

    let registry = Arc::new(
        TickerRegistry::open(Arc::clone(&db), ledger, initial).context("opening registry")?,
    );

    // ── RPC server ────────────────────────────────────────────────────────────
    let rpc_state = Arc::new(RpcServerState { registry });
    let (_rpc_addr, rpc_handle) = RpcServer::new(rpc_state)
        .start(args.rpc_addr)
        .await
        .context("starting RPC server")?;

    info!("node ready");
    tokio::signal::ctrl_c().await.context("waiting for Ctrl-C")?;

    info!("shutting down");
    if rpc_handle.stop().is_err() {
        warn!("RPC server already stopped");
    }
    db.flush().context("flushing state database")?;
    Ok(())
}

/// Expand a leading `~` to the user's home directory (`HOME` or `USERPROFILE`).
fn expand_tilde(path: &Path) -> PathBuf {
    if let Ok(stripped) = path.strip_prefix("~") {
        if let Ok(home) = std::env::var("HOME").or_else(|_| std::env::var("USERPROFILE")) {
            return PathBuf::from(home).join(stripped);
        }
    }
    path.to_path_buf()
}
