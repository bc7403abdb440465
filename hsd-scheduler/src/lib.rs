//! Scan/benchmark scheduling, §4.5.
//!
//! Ties the host record store to the two executors (`hsd-scan`'s pool,
//! `hsd-benchmark`'s single-slot-per-network worker) without either
//! depending on the other — the cyclic-reference break §9 REDESIGN
//! FLAGS calls for: the scheduler only ever calls `submit`, never reads
//! executor internals, and only ever reads `Host` snapshots off the
//! store, never holds a record lock across an I/O boundary.

pub mod cadence;
pub mod fairness;

use chrono::{DateTime, Utc};
use hsd_core::{Host, HostState, Network, Protocol, PublicKey};
use log::debug;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use fairness::Rotation;
use hsd_benchmark::{BenchmarkJob, BenchmarkWorker};
use hsd_scan::{ScanJob, ScanPool};
use hsd_store::HostStore;
use std::sync::Arc;

pub use cadence::{benchmark_due_at, scan_due_at};

/// Scheduler tick cadence, §4.5.
pub const TICK_INTERVAL: Duration = Duration::from_secs(30);

/// `consecutive_benchmark_failures` at which a host is demoted to the
/// cold queue, F3.
pub const COLD_THRESHOLD: u32 = 5;
/// Cold-queue retry cadence, F3.
pub const COLD_RETRY_INTERVAL: Duration = Duration::from_secs(24 * 3600);

pub struct Scheduler {
    store: Arc<HostStore>,
    scan_pool: Arc<ScanPool>,
    benchmark_worker: Arc<BenchmarkWorker>,
    rotation: Mutex<HashMap<Network, Rotation>>,
}

impl Scheduler {
    pub fn new(store: Arc<HostStore>, scan_pool: Arc<ScanPool>, benchmark_worker: Arc<BenchmarkWorker>) -> Arc<Self> {
        let mut rotation = HashMap::new();
        for network in Network::ALL {
            rotation.insert(network, Rotation::default());
        }
        Arc::new(Self {
            store,
            scan_pool,
            benchmark_worker,
            rotation: Mutex::new(rotation),
        })
    }

    /// Spawns the timer-driven tick loop (§5: the scheduler tick is the
    /// only suspension point driven by a timer rather than network I/O).
    pub fn spawn(self: &Arc<Self>, cancel: CancellationToken) {
        let this = self.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(TICK_INTERVAL);
            loop {
                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => break,
                    _ = interval.tick() => this.tick(Utc::now()).await,
                }
            }
        });
    }

    /// One scheduler tick: scans every due, unblocked host and submits
    /// at most one benchmark candidate per network.
    pub async fn tick(&self, now: DateTime<Utc>) {
        let hosts = self.store.all_hosts().await;
        self.tick_scans(&hosts, now);
        for network in Network::ALL {
            self.tick_benchmark(network, &hosts, now).await;
        }
    }

    fn tick_scans(&self, hosts: &[Host], now: DateTime<Utc>) {
        for host in hosts {
            if host.blocked || host.state == HostState::Blocked {
                continue;
            }
            let due = scan_due_at(host.last_seen, host.consecutive_scan_failures);
            if host.last_seen.is_none() || now >= due {
                let submitted = self.scan_pool.submit(ScanJob {
                    network: host.network,
                    public_key: host.public_key,
                    net_address: host.net_address.clone(),
                    protocol: host.protocol,
                });
                if !submitted {
                    // Already in flight, or the admission cap (§4.5
                    // back-pressure) is saturated; the scheduler simply
                    // re-offers the host on the next tick rather than
                    // queuing it itself.
                    debug!("scan submit dropped for {}, will retry next tick", host.public_key);
                }
            }
        }
    }

    /// F2: picks the earliest-due eligible host that hasn't run this
    /// rotation; resets the rotation once every eligible host has had a
    /// turn. F3: hosts at/above `COLD_THRESHOLD` consecutive failures
    /// are floored to a 24h retry cadence regardless of the doubling
    /// schedule, and are excluded from the rotation's completeness
    /// check so one flaky host can't stall everyone else's fairness.
    async fn tick_benchmark(&self, network: Network, hosts: &[Host], now: DateTime<Utc>) {
        let mut eligible: Vec<&Host> = hosts
            .iter()
            .filter(|h| h.network == network && !h.blocked && h.state != HostState::Blocked)
            .collect();
        eligible.sort_by_key(|h| h.public_key);

        let mut due: Vec<&Host> = eligible
            .iter()
            .copied()
            .filter(|h| now >= benchmark_due_at(h.last_benchmark_at, h.consecutive_benchmark_failures))
            .collect();
        due.sort_by_key(|h| (benchmark_due_at(h.last_benchmark_at, h.consecutive_benchmark_failures), h.public_key));

        let Some(chosen) = ({
            let mut rotation = self.rotation.lock();
            let slot = rotation.entry(network).or_default();
            let warm: Vec<&Host> = eligible
                .iter()
                .copied()
                .filter(|h| h.consecutive_benchmark_failures < COLD_THRESHOLD)
                .collect();
            slot.pick(&due, &warm)
        }) else {
            return;
        };

        let job = BenchmarkJob {
            network: chosen.network,
            public_key: chosen.public_key,
            net_address: chosen.net_address.clone(),
            protocol: chosen.protocol,
        };
        if !self.benchmark_worker.submit(job).await {
            debug!("benchmark worker busy or closed for {network}, will retry next tick");
        }
    }
}

/// Host key shorthand used by the rotation set.
pub type HostKey = (Network, PublicKey);

#[cfg(test)]
mod tests {
    use super::*;

    fn host(pk: u8, state: HostState, cons_fail: u32) -> Host {
        Host {
            id: pk as i64,
            network: Network::Mainnet,
            public_key: PublicKey([pk; 32]),
            net_address: "1.2.3.4:9982".into(),
            protocol: Protocol::V2,
            siamux_addresses: vec![],
            subnet_fingerprints: vec![],
            first_seen_height: 0,
            first_seen_at: Utc::now(),
            known_since_height: 0,
            last_announcement: Utc::now(),
            uptime_ns: 0,
            downtime_ns: 0,
            last_seen: Some(Utc::now() - chrono::Duration::hours(3)),
            successes: 1.0,
            failures: 0.0,
            consecutive_scan_failures: 0,
            scans: hsd_core::Ring::new(4),
            last_prices: None,
            accepting_contracts: true,
            benchmarks: hsd_core::Ring::new(4),
            last_benchmark_at: Some(Utc::now() - chrono::Duration::hours(3)),
            consecutive_benchmark_failures: cons_fail,
            state,
            blocked: state == HostState::Blocked,
            score: hsd_core::Score::ZERO,
            modified: 0,
            fetched: None,
            seq: 0,
        }
    }

    #[test]
    fn tick_scans_skips_blocked_hosts() {
        // Exercised indirectly via Scheduler::tick in the integration
        // tests under hsd-daemon; here we just confirm the predicate a
        // blocked host fails.
        let h = host(1, HostState::Blocked, 0);
        assert!(h.blocked || h.state == HostState::Blocked);
    }
}
