//! Fixed-size scan worker pool, §4.3.
//!
//! `submit` is non-blocking: it drops the job if the host is already
//! queued or running (tracked in `inflight`), or if the channel is at
//! its back-pressure cap. A dispatcher task pulls jobs off the channel
//! and hands each to a fresh `tokio::spawn`, gated by a `Semaphore` with
//! one permit per pool slot — the same bounded-fan-out shape as a
//! `chain_sync` bitswap worker pool, generalized from block requests to
//! host dials.

use chrono::Utc;
use hsd_core::{Network, PriceTable, Protocol, PublicKey, ScanOutcome};
use hsd_rpc::transport::{request_price_table, request_settings};
use hsd_rpc::{decode_price_table, decode_settings, evaluate_gouging, Connection, MarketConditions, TransportError};
use hsd_store::HostStore;
use log::warn;
use parking_lot::Mutex;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::{mpsc, Semaphore};
use tokio_util::sync::CancellationToken;

/// Admission cap multiplier on the queue ahead of the pool, §4.5.
const QUEUE_ADMISSION_MULTIPLIER: usize = 2;

#[derive(Debug, Clone)]
pub struct ScanJob {
    pub network: Network,
    pub public_key: PublicKey,
    pub net_address: String,
    pub protocol: Protocol,
}

pub struct ScanPool {
    tx: mpsc::Sender<ScanJob>,
    inflight: Arc<Mutex<HashSet<(Network, PublicKey)>>>,
}

impl ScanPool {
    pub fn spawn(
        pool_size: usize,
        store: Arc<HostStore>,
        market: Arc<dyn MarketConditions>,
        cancel: CancellationToken,
    ) -> Self {
        let pool_size = pool_size.max(1);
        let (tx, rx) = mpsc::channel(pool_size * QUEUE_ADMISSION_MULTIPLIER);
        let inflight = Arc::new(Mutex::new(HashSet::new()));
        let semaphore = Arc::new(Semaphore::new(pool_size));
        tokio::spawn(dispatch(rx, store, market, semaphore, inflight.clone(), cancel));
        Self { tx, inflight }
    }

    /// Non-blocking. Returns `false` (and drops the job) if the host is
    /// already queued/running or the channel is saturated.
    pub fn submit(&self, job: ScanJob) -> bool {
        let key = (job.network, job.public_key);
        if !self.inflight.lock().insert(key) {
            return false;
        }
        match self.tx.try_send(job) {
            Ok(()) => true,
            Err(_) => {
                self.inflight.lock().remove(&key);
                false
            }
        }
    }

    pub fn inflight_count(&self) -> usize {
        self.inflight.lock().len()
    }
}

async fn dispatch(
    mut rx: mpsc::Receiver<ScanJob>,
    store: Arc<HostStore>,
    market: Arc<dyn MarketConditions>,
    semaphore: Arc<Semaphore>,
    inflight: Arc<Mutex<HashSet<(Network, PublicKey)>>>,
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
        let permit = match semaphore.clone().acquire_owned().await {
            Ok(permit) => permit,
            Err(_) => break,
        };
        let store = store.clone();
        let market = market.clone();
        let inflight = inflight.clone();
        let job_cancel = cancel.clone();
        tokio::spawn(async move {
            let key = (job.network, job.public_key);
            run_one(job, &store, market.as_ref(), &job_cancel).await;
            inflight.lock().remove(&key);
            drop(permit);
        });
    }
}

async fn run_one(job: ScanJob, store: &HostStore, market: &dyn MarketConditions, cancel: &CancellationToken) {
    let expectation = market.expectation(job.network);
    let (network, pk, protocol) = (job.network, job.public_key, job.protocol);
    let record = match scan_one(&job, market, cancel).await {
        Ok((outcome, prices, gouging_passed)) => {
            store.record_scan(network, pk, outcome, prices, gouging_passed, protocol, &expectation).await
        }
        Err(e) => {
            let outcome = ScanOutcome { ran_at: Utc::now(), success: false, latency_ns: 0, error: Some(e.to_string()) };
            store.record_scan(network, pk, outcome, None, false, protocol, &expectation).await
        }
    };
    if let Err(e) = record {
        warn!("failed to record scan for {pk}: {e}");
    }
}

/// Dials, requests `Settings` (and, on v1, an unpaid `PriceTable`), and
/// evaluates gouging. Success iff both RPCs return parseable, signed
/// content — gouging failure is recorded separately via the returned
/// `gouging_passed` flag, not as a scan failure (§4.3).
async fn scan_one(
    job: &ScanJob,
    market: &dyn MarketConditions,
    cancel: &CancellationToken,
) -> Result<(ScanOutcome, Option<PriceTable>, bool), TransportError> {
    let started = Instant::now();
    let mut conn = Connection::dial(&job.net_address, job.protocol).await?;
    let settings = request_settings(&mut conn, cancel).await?;
    let latency_ns = started.elapsed().as_nanos() as u64;
    if !settings.signed {
        return Err(TransportError::Malformed("unsigned settings response".into()));
    }

    let price_table = match job.protocol {
        Protocol::V1 => {
            let resp = request_price_table(&mut conn, cancel, false).await?;
            if !resp.signed {
                return Err(TransportError::Malformed("unsigned price table".into()));
            }
            let decoded = decode_price_table(&resp)?;
            PriceTable::V1 { settings_blob: settings.raw, price_table_blob: resp.raw, decoded }
        }
        Protocol::V2 => {
            let decoded = decode_settings(&settings)?;
            PriceTable::V2 { settings_blob: settings.raw, decoded }
        }
    };

    let limits = market.price_limits(job.network);
    let gouging_passed = evaluate_gouging(price_table.decoded(), &limits).is_accept();

    Ok((
        ScanOutcome { ran_at: Utc::now(), success: true, latency_ns, error: None },
        Some(price_table),
        gouging_passed,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn submit_drops_duplicate_inflight_key() {
        let pk = PublicKey([1u8; 32]);
        let inflight: Arc<Mutex<HashSet<(Network, PublicKey)>>> = Arc::new(Mutex::new(HashSet::new()));
        let key = (Network::Mainnet, pk);
        assert!(inflight.lock().insert(key));
        assert!(!inflight.lock().insert(key), "second insert of the same key must report duplicate");
    }
}
