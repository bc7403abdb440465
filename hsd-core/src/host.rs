use crate::network::Network;
use crate::pricing::PriceTable;
use crate::pubkey::PublicKey;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Protocol flavour a host was last reached over. See §4.2.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Protocol {
    V1,
    V2,
}

/// Per-host state machine, §4.8.
///
/// `Blocked` is terminal for scheduling purposes but the record itself is
/// retained (hosts are never deleted, only flagged).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HostState {
    Pending,
    Online,
    Offline,
    Blocked,
}

impl HostState {
    /// Applies one state-machine transition, returning the new state.
    /// Unmodeled transitions (e.g. `scan_ok` while already `Blocked`) are
    /// no-ops: blocklist status is terminal.
    pub fn on_scan(self, success: bool, blocked: bool) -> HostState {
        if blocked {
            return HostState::Blocked;
        }
        if self == HostState::Blocked {
            return self;
        }
        if success {
            HostState::Online
        } else {
            HostState::Offline
        }
    }
}

/// Bounded ring buffer of the last N entries, used for both the scan and
/// benchmark history on a host record (§3).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ring<T> {
    capacity: usize,
    entries: VecDeque<T>,
}

impl<T> Ring<T> {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            entries: VecDeque::with_capacity(capacity),
        }
    }

    pub fn push(&mut self, item: T) {
        if self.entries.len() == self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(item);
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Ten sub-scores plus their product, §4.7.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Score {
    pub prices: f64,
    pub storage: f64,
    pub collateral: f64,
    pub interactions: f64,
    pub uptime: f64,
    pub age: f64,
    pub version: f64,
    pub latency: f64,
    pub benchmarks: f64,
    pub accepting_contracts: f64,
}

impl Score {
    pub const ZERO: Score = Score {
        prices: 0.0,
        storage: 0.0,
        collateral: 0.0,
        interactions: 0.0,
        uptime: 0.0,
        age: 0.0,
        version: 0.0,
        latency: 0.0,
        benchmarks: 0.0,
        accepting_contracts: 0.0,
    };

    /// Product of the ten sub-scores, T3.
    pub fn total(&self) -> f64 {
        self.prices
            * self.storage
            * self.collateral
            * self.interactions
            * self.uptime
            * self.age
            * self.version
            * self.latency
            * self.benchmarks
            * self.accepting_contracts
    }
}

/// One reachability probe outcome kept on the host record for the last-N
/// ring (§3). The append-only `ScanRecord` persisted to SQL carries the
/// same fields plus an `id`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanOutcome {
    pub ran_at: chrono::DateTime<chrono::Utc>,
    pub success: bool,
    pub latency_ns: u64,
    pub error: Option<String>,
}

/// One benchmark outcome kept on the host record for the last-M ring.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BenchmarkOutcome {
    pub ran_at: chrono::DateTime<chrono::Utc>,
    pub success: bool,
    pub upload_bps: f64,
    pub download_bps: f64,
    pub ttfb_ns: u64,
    pub error: Option<String>,
}

/// The authoritative host record, keyed by `(network, public_key)` (I1).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Host {
    pub id: i64,
    pub network: Network,
    pub public_key: PublicKey,
    pub net_address: String,
    pub protocol: Protocol,
    pub siamux_addresses: Vec<String>,
    pub subnet_fingerprints: Vec<String>,

    pub first_seen_height: u64,
    pub first_seen_at: chrono::DateTime<chrono::Utc>,
    pub known_since_height: u64,
    pub last_announcement: chrono::DateTime<chrono::Utc>,

    pub uptime_ns: u64,
    pub downtime_ns: u64,
    pub last_seen: Option<chrono::DateTime<chrono::Utc>>,
    /// Aged, floating counters; see hsd-scorer's aging function. Never
    /// decremented by subtraction (I2).
    pub successes: f64,
    pub failures: f64,
    pub consecutive_scan_failures: u32,
    pub scans: Ring<ScanOutcome>,

    pub last_prices: Option<PriceTable>,
    pub accepting_contracts: bool,

    pub benchmarks: Ring<BenchmarkOutcome>,
    pub last_benchmark_at: Option<chrono::DateTime<chrono::Utc>>,
    pub consecutive_benchmark_failures: u32,

    pub state: HostState,
    pub blocked: bool,

    pub score: Score,

    pub modified: u64,
    pub fetched: Option<u64>,
    pub seq: u64,
}

impl Host {
    /// Age of the record relative to `now`, used by the uptime invariant
    /// I3 (`uptime + downtime <= age`) and the age sub-score. Anchored on
    /// first sight, not `last_announcement`, which is bumped forward on
    /// every re-announcement and would otherwise make age reset toward
    /// zero instead of growing monotonically from discovery.
    pub fn age(&self, now: chrono::DateTime<chrono::Utc>) -> chrono::Duration {
        now - self.first_seen_at.min(now)
    }

    pub fn key(&self) -> (Network, PublicKey) {
        (self.network, self.public_key)
    }
}
