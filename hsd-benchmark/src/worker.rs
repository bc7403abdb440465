//! Single-slot-per-network benchmark worker, §4.4.
//!
//! One `tokio` task per network drains a dedicated channel in order —
//! that alone is what makes "one active benchmark at a time per
//! network" a hard invariant rather than something a semaphore has to
//! enforce. A side table of last-attempt timestamps enforces the 10
//! minute no-retry rule independently of whatever cadence the scheduler
//! is using.

use chrono::Utc;
use hsd_core::{BenchmarkOutcome, Network, Protocol, PublicKey, REQUIRED_DURATION_BLOCKS, SECTOR_SIZE_BYTES};
use hsd_rpc::bandwidth::expected_cost;
use hsd_rpc::proof::{verify_append_proof, verify_range_proof};
use hsd_rpc::transport::{append_sector, close_contract, form_contract, read_sector, request_price_table, request_settings};
use hsd_rpc::{decode_price_table, decode_settings, evaluate_gouging, Connection, ContractTerms, MarketConditions, TransportError};
use hsd_store::HostStore;
use log::{info, warn};
use rand::RngCore;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{mpsc, Mutex};
use tokio_util::sync::CancellationToken;

/// No retry of a failed benchmark against the same host within this
/// window, §4.4.
pub const RETRY_COOLDOWN: Duration = Duration::from_secs(10 * 60);

/// Funding leeway over one sector-write's cost, §4.4 step 4.
const FUNDING_LEEWAY: f64 = 0.20;

#[derive(Debug, Clone)]
pub struct BenchmarkJob {
    pub network: Network,
    pub public_key: PublicKey,
    pub net_address: String,
    pub protocol: Protocol,
}

enum BenchmarkStep {
    Completed(BenchmarkOutcome),
    Skipped(&'static str),
    Failed(String),
}

fn network_slot(network: Network) -> usize {
    match network {
        Network::Mainnet => 0,
        Network::Zen => 1,
    }
}

pub struct BenchmarkWorker {
    senders: [mpsc::Sender<BenchmarkJob>; 2],
}

impl BenchmarkWorker {
    pub fn spawn(
        store: Arc<HostStore>,
        market: Arc<dyn MarketConditions>,
        renter_public_key: PublicKey,
        cancel: CancellationToken,
    ) -> Self {
        let recent = Arc::new(Mutex::new(HashMap::<PublicKey, Instant>::new()));
        let mut senders = Vec::with_capacity(Network::ALL.len());
        for _network in Network::ALL {
            // Capacity 1: one job may queue behind the one currently
            // running. A third concurrent submit finds the channel full
            // and is rejected as busy rather than queuing indefinitely.
            let (tx, rx) = mpsc::channel(1);
            tokio::spawn(run_network_loop(
                rx,
                store.clone(),
                market.clone(),
                renter_public_key,
                recent.clone(),
                cancel.clone(),
            ));
            senders.push(tx);
        }
        Self {
            senders: senders
                .try_into()
                .unwrap_or_else(|_| unreachable!("one sender per network")),
        }
    }

    /// Non-blocking, T9: returns `false` ("busy") immediately if a
    /// benchmark is already running (or already queued) for that
    /// network, rather than waiting for the current one to finish.
    pub async fn submit(&self, job: BenchmarkJob) -> bool {
        self.senders[network_slot(job.network)].try_send(job).is_ok()
    }
}

async fn run_network_loop(
    mut rx: mpsc::Receiver<BenchmarkJob>,
    store: Arc<HostStore>,
    market: Arc<dyn MarketConditions>,
    renter_public_key: PublicKey,
    recent: Arc<Mutex<HashMap<PublicKey, Instant>>>,
    cancel: CancellationToken,
) {
    loop {
        let job = tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            job = rx.recv() => match job {
                Some(job) => job,
                None => break,
            },
        };

        {
            let mut guard = recent.lock().await;
            if let Some(last) = guard.get(&job.public_key) {
                if last.elapsed() < RETRY_COOLDOWN {
                    info!("skipping benchmark for {}: within retry cooldown", job.public_key);
                    continue;
                }
            }
            guard.insert(job.public_key, Instant::now());
        }

        run_one(&job, &store, market.as_ref(), renter_public_key, &cancel).await;
    }
}

async fn run_one(
    job: &BenchmarkJob,
    store: &HostStore,
    market: &dyn MarketConditions,
    renter_public_key: PublicKey,
    cancel: &CancellationToken,
) {
    let expectation = market.expectation(job.network);
    match benchmark_one(job, market, renter_public_key, cancel).await {
        BenchmarkStep::Completed(outcome) => {
            if let Err(e) = store.record_benchmark(job.network, job.public_key, outcome, &expectation).await {
                warn!("failed to record benchmark for {}: {e}", job.public_key);
            }
        }
        BenchmarkStep::Skipped(reason) => {
            info!("benchmark skipped for {}: {reason}", job.public_key);
        }
        BenchmarkStep::Failed(err) => {
            let outcome = BenchmarkOutcome {
                ran_at: Utc::now(),
                success: false,
                upload_bps: 0.0,
                download_bps: 0.0,
                ttfb_ns: 0,
                error: Some(err),
            };
            if let Err(e) = store.record_benchmark(job.network, job.public_key, outcome, &expectation).await {
                warn!("failed to record failed benchmark for {}: {e}", job.public_key);
            }
        }
    }
}

async fn benchmark_one(
    job: &BenchmarkJob,
    market: &dyn MarketConditions,
    renter_public_key: PublicKey,
    cancel: &CancellationToken,
) -> BenchmarkStep {
    match run_contract_cycle(job, market, renter_public_key, cancel).await {
        Ok(step) => step,
        Err(e) => BenchmarkStep::Failed(e.to_string()),
    }
}

/// Steps 2-8 of §4.4: refresh pricing, gouge-check, form a short
/// contract, append one sector, verify, read it back, close.
async fn run_contract_cycle(
    job: &BenchmarkJob,
    market: &dyn MarketConditions,
    renter_public_key: PublicKey,
    cancel: &CancellationToken,
) -> Result<BenchmarkStep, TransportError> {
    let mut conn = Connection::dial(&job.net_address, job.protocol).await?;

    let decoded = match job.protocol {
        Protocol::V1 => {
            let resp = request_price_table(&mut conn, cancel, true).await?;
            decode_price_table(&resp)?
        }
        Protocol::V2 => {
            let resp = request_settings(&mut conn, cancel).await?;
            decode_settings(&resp)?
        }
    };

    let limits = market.price_limits(job.network);
    if !evaluate_gouging(&decoded, &limits).is_accept() {
        return Ok(BenchmarkStep::Skipped("gouging filter rejected current prices"));
    }

    let sector_cost = expected_cost(SECTOR_SIZE_BYTES, decoded.upload_price_per_byte);
    let funding = sector_cost + (sector_cost as f64 * FUNDING_LEEWAY) as u128;
    let duration_blocks = REQUIRED_DURATION_BLOCKS.min(decoded.max_duration_blocks.saturating_sub(1));
    let terms = ContractTerms { duration_blocks, funding };
    let mut contract = form_contract(&mut conn, cancel, terms, &renter_public_key).await?;

    let mut sector = vec![0u8; SECTOR_SIZE_BYTES as usize];
    rand::thread_rng().fill_bytes(&mut sector);

    let old_num_leaves = contract.filesize / SECTOR_SIZE_BYTES;
    let upload_started = Instant::now();
    let append_result = append_sector(&mut conn, cancel, &contract, &sector).await?;
    let upload_elapsed = upload_started.elapsed();

    if !verify_append_proof(
        &contract.merkle_root,
        &append_result.new_merkle_root,
        old_num_leaves,
        &sector,
        &append_result.proof,
    ) {
        return Err(TransportError::Malformed("append proof failed verification".into()));
    }

    contract.revision_number += 1;
    contract.filesize += SECTOR_SIZE_BYTES;
    contract.merkle_root = append_result.new_merkle_root;

    let download_started = Instant::now();
    let read_result = read_sector(&mut conn, cancel, &contract, &contract.merkle_root).await?;
    let ttfb_ns = download_started.elapsed().as_nanos() as u64;
    let download_elapsed = download_started.elapsed();

    let sector_data = read_result
        .output
        .ok_or_else(|| TransportError::Malformed("missing sector payload".into()))?;
    let num_leaves = contract.filesize / SECTOR_SIZE_BYTES;
    if !verify_range_proof(&contract.merkle_root, &sector_data, num_leaves - 1, num_leaves, &read_result.proof) {
        return Err(TransportError::Malformed("read proof failed verification".into()));
    }

    close_contract(&mut conn, cancel, &contract).await?;

    let upload_bps = SECTOR_SIZE_BYTES as f64 / upload_elapsed.as_secs_f64().max(1e-6);
    let download_bps = SECTOR_SIZE_BYTES as f64 / download_elapsed.as_secs_f64().max(1e-6);

    Ok(BenchmarkStep::Completed(BenchmarkOutcome {
        ran_at: Utc::now(),
        success: true,
        upload_bps,
        download_bps,
        ttfb_ns,
        error: None,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn network_slots_are_distinct() {
        assert_ne!(network_slot(Network::Mainnet), network_slot(Network::Zen));
    }

    /// T9: once the single slot plus its one-deep queue are both taken,
    /// a third concurrent submit is rejected immediately rather than
    /// blocking for the running job to finish.
    #[tokio::test]
    async fn submit_rejects_once_slot_and_queue_are_full() {
        let (tx, mut rx) = mpsc::channel(1);
        let job = BenchmarkJob {
            network: Network::Mainnet,
            public_key: PublicKey([1u8; 32]),
            net_address: "1.2.3.4:9982".into(),
            protocol: Protocol::V2,
        };
        assert!(tx.try_send(job.clone()).is_ok(), "first submit fills the queue slot");
        assert!(tx.try_send(job.clone()).is_err(), "second concurrent submit must be rejected as busy");
        rx.close();
    }
}
