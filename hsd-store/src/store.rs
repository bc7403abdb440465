//! The host record store, §4.6: single-writer-many-readers per record,
//! write-through to SQL under the same lock, append to the update
//! journal, bump the record's sequence number.

use crate::blocklist::Blocklist;
use crate::errors::StoreError;
use crate::migration::Migration;
use crate::schema::SCHEMA;
use crate::subnet;
use crate::table::Table;
use chrono::Utc;
use hsd_core::{
    Announcement, BenchmarkOutcome, BenchmarkRecord, Host, HostState, Network, PriceTable,
    Protocol, PublicKey, Ring, ScanOutcome, ScanRecord,
};
use hsd_journal::{Journal, UpdateKind};
use hsd_scorer::Expectation;
use sqlx::{Row, SqlitePool};
use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};
use std::sync::Arc;

/// Startup replay page size and working-set bound, §4.6.
const REPLAY_PAGE_SIZE: i64 = 1000;
const REPLAY_WORKING_SET: usize = 50_000;

const SCAN_RING_CAPACITY: usize = 200;
const BENCHMARK_RING_CAPACITY: usize = 50;

pub struct ListFilters {
    pub network: Option<Network>,
    pub include_blocked: bool,
    pub query: Option<String>,
    pub offset: usize,
    pub limit: usize,
}

impl Default for ListFilters {
    fn default() -> Self {
        Self {
            network: None,
            include_blocked: false,
            query: None,
            offset: 0,
            limit: 100,
        }
    }
}

pub struct HostStore {
    pool: SqlitePool,
    table: Table,
    journal: Arc<Journal>,
    blocklist: Arc<Blocklist>,
    next_ids: [AtomicI64; 2],
    modified_clock: AtomicU64,
}

impl HostStore {
    pub async fn open(
        pool: SqlitePool,
        journal: Arc<Journal>,
        blocklist: Arc<Blocklist>,
        migrations: &[Box<dyn Migration>],
    ) -> Result<Self, StoreError> {
        for statement in SCHEMA.split(';') {
            let trimmed = statement.trim();
            if trimmed.is_empty() {
                continue;
            }
            sqlx::query(trimmed).execute(&pool).await?;
        }
        crate::migration::run_all(&pool, migrations).await?;

        let store = Self {
            pool,
            table: Table::default(),
            journal,
            blocklist,
            next_ids: [AtomicI64::new(1), AtomicI64::new(1)],
            modified_clock: AtomicU64::new(1),
        };
        store.replay().await?;
        Ok(store)
    }

    fn network_slot(network: Network) -> usize {
        match network {
            Network::Mainnet => 0,
            Network::Zen => 1,
        }
    }

    fn next_id(&self, network: Network) -> i64 {
        self.next_ids[Self::network_slot(network)].fetch_add(1, Ordering::Relaxed)
    }

    fn next_modified(&self) -> u64 {
        self.modified_clock.fetch_add(1, Ordering::Relaxed)
    }

    /// Rebuilds in-memory state from SQL in key order, bounded to the
    /// most recently modified `REPLAY_WORKING_SET` hosts, §4.6.
    async fn replay(&self) -> Result<(), StoreError> {
        let mut offset: i64 = 0;
        let mut loaded = 0usize;
        loop {
            let rows = sqlx::query(
                "SELECT record_json FROM hdb_hosts ORDER BY modified DESC LIMIT ? OFFSET ?",
            )
            .bind(REPLAY_PAGE_SIZE)
            .bind(offset)
            .fetch_all(&self.pool)
            .await?;
            if rows.is_empty() {
                break;
            }
            for row in &rows {
                let json: String = row.try_get("record_json")?;
                let host: Host = serde_json::from_str(&json)?;
                let seen_id = self.next_ids[Self::network_slot(host.network)].load(Ordering::Relaxed);
                if host.id >= seen_id {
                    self.next_ids[Self::network_slot(host.network)]
                        .store(host.id + 1, Ordering::Relaxed);
                }
                let seen_mod = self.modified_clock.load(Ordering::Relaxed);
                if host.modified >= seen_mod {
                    self.modified_clock.store(host.modified + 1, Ordering::Relaxed);
                }
                let key = host.key();
                self.table.get_or_insert_with(key.0, key.1, || host);
                loaded += 1;
            }
            offset += REPLAY_PAGE_SIZE;
            if loaded >= REPLAY_WORKING_SET {
                break;
            }
        }
        log::info!("store replay loaded {loaded} hosts");
        Ok(())
    }

    async fn persist_host(&self, host: &Host) -> Result<(), StoreError> {
        let record_json = serde_json::to_string(host)?;
        sqlx::query(
            "INSERT INTO hdb_hosts (id, network, public_key, net_address, protocol, \
             first_seen_height, known_since_height, last_announcement, uptime_ns, downtime_ns, \
             successes, failures, consecutive_scan_failures, consecutive_benchmark_failures, \
             last_benchmark_at, state, blocked, score_total, record_json, modified, seq) \
             VALUES (?,?,?,?,?,?,?,?,?,?,?,?,?,?,?,?,?,?,?,?,?) \
             ON CONFLICT (network, public_key) DO UPDATE SET \
             net_address=excluded.net_address, protocol=excluded.protocol, \
             known_since_height=excluded.known_since_height, last_announcement=excluded.last_announcement, \
             uptime_ns=excluded.uptime_ns, downtime_ns=excluded.downtime_ns, successes=excluded.successes, \
             failures=excluded.failures, consecutive_scan_failures=excluded.consecutive_scan_failures, \
             consecutive_benchmark_failures=excluded.consecutive_benchmark_failures, \
             last_benchmark_at=excluded.last_benchmark_at, state=excluded.state, blocked=excluded.blocked, \
             score_total=excluded.score_total, record_json=excluded.record_json, modified=excluded.modified, \
             seq=excluded.seq",
        )
        .bind(host.id)
        .bind(host.network.as_str())
        .bind(host.public_key.to_hex())
        .bind(&host.net_address)
        .bind(format!("{:?}", host.protocol))
        .bind(host.first_seen_height as i64)
        .bind(host.known_since_height as i64)
        .bind(host.last_announcement.to_rfc3339())
        .bind(host.uptime_ns as i64)
        .bind(host.downtime_ns as i64)
        .bind(host.successes)
        .bind(host.failures)
        .bind(host.consecutive_scan_failures as i64)
        .bind(host.consecutive_benchmark_failures as i64)
        .bind(host.last_benchmark_at.map(|t| t.to_rfc3339()))
        .bind(format!("{:?}", host.state))
        .bind(host.blocked as i64)
        .bind(host.score.total())
        .bind(record_json)
        .bind(host.modified as i64)
        .bind(host.seq as i64)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// §4.8: ingests one host announcement. Creates the record on first
    /// sight; on replay, updates only the net address and folds
    /// `known_since_height` to the minimum observed height.
    pub async fn upsert_announcement(&self, ann: Announcement) -> Result<Host, StoreError> {
        let blocked = self.blocklist.is_blocked(&ann.net_address);
        let (handle, created) = self.table.get_or_insert_with(ann.network, ann.public_key, || Host {
            id: self.next_id(ann.network),
            network: ann.network,
            public_key: ann.public_key,
            net_address: ann.net_address.clone(),
            protocol: Protocol::V1,
            siamux_addresses: Vec::new(),
            subnet_fingerprints: Vec::new(),
            first_seen_height: ann.height,
            first_seen_at: ann.observed_at,
            known_since_height: ann.height,
            last_announcement: ann.observed_at,
            uptime_ns: 0,
            downtime_ns: 0,
            last_seen: None,
            successes: 0.0,
            failures: 0.0,
            consecutive_scan_failures: 0,
            scans: Ring::new(SCAN_RING_CAPACITY),
            last_prices: None,
            accepting_contracts: false,
            benchmarks: Ring::new(BENCHMARK_RING_CAPACITY),
            last_benchmark_at: None,
            consecutive_benchmark_failures: 0,
            state: if blocked { HostState::Blocked } else { HostState::Pending },
            blocked,
            score: hsd_core::Score::ZERO,
            modified: 0,
            fetched: None,
            seq: 0,
        });

        let mut host = handle.write().await;
        if !created {
            host.known_since_height = host.known_since_height.min(ann.height);
            host.net_address = ann.net_address;
            host.last_announcement = host.last_announcement.max(ann.observed_at);
        }
        if let Some(ip) = subnet::parse_host_ip(&host.net_address) {
            let fp = subnet::fingerprint(ip);
            if !host.subnet_fingerprints.contains(&fp) {
                host.subnet_fingerprints.push(fp);
            }
        }
        host.blocked = blocked;
        if blocked {
            host.state = HostState::Blocked;
        }
        host.modified = self.next_modified();
        host.seq = host.modified;
        self.persist_host(&host).await?;
        self.journal.append(UpdateKind::Host(Box::new(host.clone())));
        Ok(host.clone())
    }

    /// §4.3/§4.6: records one scan outcome. Enforces I2 (aging, not
    /// subtraction), I3 (uptime+downtime bounded by age), I5 (pricing
    /// only replaced by a gouging-passing snapshot).
    #[allow(clippy::too_many_arguments)]
    pub async fn record_scan(
        &self,
        network: Network,
        pk: PublicKey,
        outcome: ScanOutcome,
        prices: Option<PriceTable>,
        gouging_passed: bool,
        protocol: Protocol,
        expectation: &Expectation,
    ) -> Result<Host, StoreError> {
        let handle = self.table.get_handle(network, pk).ok_or(StoreError::NotFound)?;
        let mut host = handle.write().await;
        if outcome.ran_at < host.last_seen.unwrap_or(outcome.ran_at) {
            return Err(StoreError::OutOfOrder {
                incoming: outcome.ran_at.timestamp() as u64,
                current: host.last_seen.unwrap().timestamp() as u64,
            });
        }

        let elapsed = host
            .last_seen
            .map(|last| (outcome.ran_at - last).num_seconds().max(0) as f64)
            .unwrap_or(0.0);
        let (aged_s, aged_f) = hsd_scorer::age_counters(host.successes, host.failures, elapsed);
        host.successes = aged_s;
        host.failures = aged_f;

        if outcome.success {
            host.successes += 1.0;
            host.consecutive_scan_failures = 0;
            host.uptime_ns += (elapsed * 1e9) as u64;
        } else {
            host.failures += 1.0;
            host.consecutive_scan_failures += 1;
            host.downtime_ns += (elapsed * 1e9) as u64;
        }
        host.last_seen = Some(outcome.ran_at);
        host.protocol = protocol;

        if outcome.success && gouging_passed {
            if let Some(pt) = &prices {
                host.accepting_contracts = pt.decoded().accepting_contracts;
                host.last_prices = Some(pt.clone());
            }
        }

        let record = ScanRecord {
            id: 0,
            network,
            public_key: pk,
            ran_at: outcome.ran_at,
            success: outcome.success,
            latency_ns: outcome.latency_ns,
            error: outcome.error.clone(),
            settings_blob: prices.as_ref().map(|p| match p {
                PriceTable::V1 { settings_blob, .. } | PriceTable::V2 { settings_blob, .. } => {
                    settings_blob.clone()
                }
            }),
            price_table_blob: prices.as_ref().and_then(|p| match p {
                PriceTable::V1 { price_table_blob, .. } => Some(price_table_blob.clone()),
                PriceTable::V2 { .. } => None,
            }),
        };
        let inserted = sqlx::query(
            "INSERT INTO hdb_scans (network, public_key, ran_at, success, latency_ns, error, settings_blob, price_table_blob) \
             VALUES (?,?,?,?,?,?,?,?)",
        )
        .bind(network.as_str())
        .bind(pk.to_hex())
        .bind(record.ran_at.to_rfc3339())
        .bind(record.success as i64)
        .bind(record.latency_ns as i64)
        .bind(&record.error)
        .bind(&record.settings_blob)
        .bind(&record.price_table_blob)
        .execute(&self.pool)
        .await?;
        let mut record = record;
        record.id = inserted.last_insert_rowid();

        let success = record.success;
        host.scans.push(outcome);
        host.state = host.state.on_scan(success, host.blocked);
        host.score = hsd_scorer::recompute(&host, expectation, Utc::now());
        host.modified = self.next_modified();
        host.seq = host.modified;
        self.persist_host(&host).await?;

        self.journal.append(UpdateKind::Scan(record));
        self.journal.append(UpdateKind::Host(Box::new(host.clone())));
        Ok(host.clone())
    }

    /// §4.4/§4.6: records one benchmark outcome, under the same
    /// record-write-lock as the score recompute (I4: logged exactly
    /// once, even on crash, because this whole function is the only
    /// place that ever calls it and does so after the benchmark fully
    /// resolves).
    pub async fn record_benchmark(
        &self,
        network: Network,
        pk: PublicKey,
        outcome: BenchmarkOutcome,
        expectation: &Expectation,
    ) -> Result<Host, StoreError> {
        let handle = self.table.get_handle(network, pk).ok_or(StoreError::NotFound)?;
        let mut host = handle.write().await;

        if outcome.success {
            host.consecutive_benchmark_failures = 0;
        } else {
            host.consecutive_benchmark_failures += 1;
        }
        host.last_benchmark_at = Some(outcome.ran_at);

        let record = BenchmarkRecord {
            id: 0,
            network,
            public_key: pk,
            ran_at: outcome.ran_at,
            success: outcome.success,
            upload_bps: outcome.upload_bps,
            download_bps: outcome.download_bps,
            ttfb_ns: outcome.ttfb_ns,
            error: outcome.error.clone(),
        };
        let inserted = sqlx::query(
            "INSERT INTO hdb_benchmarks (network, public_key, ran_at, success, upload_bps, download_bps, ttfb_ns, error) \
             VALUES (?,?,?,?,?,?,?,?)",
        )
        .bind(network.as_str())
        .bind(pk.to_hex())
        .bind(record.ran_at.to_rfc3339())
        .bind(record.success as i64)
        .bind(record.upload_bps)
        .bind(record.download_bps)
        .bind(record.ttfb_ns as i64)
        .bind(&record.error)
        .execute(&self.pool)
        .await?;
        let mut record = record;
        record.id = inserted.last_insert_rowid();

        host.benchmarks.push(outcome);
        host.score = hsd_scorer::recompute(&host, expectation, Utc::now());
        host.modified = self.next_modified();
        host.seq = host.modified;
        self.persist_host(&host).await?;

        self.journal.append(UpdateKind::Benchmark(record));
        self.journal.append(UpdateKind::Host(Box::new(host.clone())));
        Ok(host.clone())
    }

    pub async fn get(&self, network: Network, pk: PublicKey) -> Option<Host> {
        self.table.snapshot(network, pk).await
    }

    /// Every host currently held in memory, unfiltered and unpaginated
    /// — the scheduler's view, as opposed to `list`'s API-shaped one.
    pub async fn all_hosts(&self) -> Vec<Host> {
        self.table.all_snapshots().await
    }

    pub async fn list(&self, filters: &ListFilters) -> Vec<Host> {
        let mut hosts = self.table.all_snapshots().await;
        hosts.retain(|h| {
            filters.network.map(|n| n == h.network).unwrap_or(true)
                && (filters.include_blocked || !h.blocked)
                && filters
                    .query
                    .as_ref()
                    .map(|q| h.net_address.contains(q.as_str()) || h.public_key.to_hex().contains(q.as_str()))
                    .unwrap_or(true)
        });
        hosts.sort_by(|a, b| {
            b.score
                .total()
                .partial_cmp(&a.score.total())
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.public_key.cmp(&b.public_key))
        });
        hosts.into_iter().skip(filters.offset).take(filters.limit).collect()
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    /// The shared SQL pool, handed to sibling components (the chain
    /// subscriber's tip persistence, §4.10) that need their own tables
    /// on the same database without routing every write through the
    /// store's record lock. `SqlitePool` is an `Arc` handle internally,
    /// so cloning is cheap.
    pub fn pool(&self) -> SqlitePool {
        self.pool.clone()
    }

    /// Backs `GET /hostdb/scans`: append-only rows for one host, bounded
    /// by an optional `[from, to)` window on `ran_at`, newest first.
    pub async fn list_scans(&self, filters: &RecordFilters) -> Result<Vec<ScanRecord>, StoreError> {
        let rows = sqlx::query(
            "SELECT id, network, public_key, ran_at, success, latency_ns, error, settings_blob, price_table_blob \
             FROM hdb_scans WHERE network = ? AND public_key = ? \
             AND (? IS NULL OR ran_at >= ?) AND (? IS NULL OR ran_at < ?) \
             ORDER BY ran_at DESC LIMIT ?",
        )
        .bind(filters.network.as_str())
        .bind(filters.public_key.to_hex())
        .bind(filters.from.map(|t| t.to_rfc3339()))
        .bind(filters.from.map(|t| t.to_rfc3339()))
        .bind(filters.to.map(|t| t.to_rfc3339()))
        .bind(filters.to.map(|t| t.to_rfc3339()))
        .bind(filters.limit as i64)
        .fetch_all(&self.pool)
        .await?;

        let mut out = Vec::with_capacity(rows.len());
        for row in rows {
            let ran_at: String = row.try_get("ran_at")?;
            out.push(ScanRecord {
                id: row.try_get("id")?,
                network: filters.network,
                public_key: filters.public_key,
                ran_at: ran_at.parse().map_err(|e: chrono::ParseError| StoreError::Other(e.to_string()))?,
                success: row.try_get::<i64, _>("success")? != 0,
                latency_ns: row.try_get::<i64, _>("latency_ns")? as u64,
                error: row.try_get("error")?,
                settings_blob: row.try_get("settings_blob")?,
                price_table_blob: row.try_get("price_table_blob")?,
            });
        }
        Ok(out)
    }

    /// Backs `GET /hostdb/benchmarks`, mirroring `list_scans`.
    pub async fn list_benchmarks(&self, filters: &RecordFilters) -> Result<Vec<BenchmarkRecord>, StoreError> {
        let rows = sqlx::query(
            "SELECT id, network, public_key, ran_at, success, upload_bps, download_bps, ttfb_ns, error \
             FROM hdb_benchmarks WHERE network = ? AND public_key = ? \
             AND (? IS NULL OR ran_at >= ?) AND (? IS NULL OR ran_at < ?) \
             ORDER BY ran_at DESC LIMIT ?",
        )
        .bind(filters.network.as_str())
        .bind(filters.public_key.to_hex())
        .bind(filters.from.map(|t| t.to_rfc3339()))
        .bind(filters.from.map(|t| t.to_rfc3339()))
        .bind(filters.to.map(|t| t.to_rfc3339()))
        .bind(filters.to.map(|t| t.to_rfc3339()))
        .bind(filters.limit as i64)
        .fetch_all(&self.pool)
        .await?;

        let mut out = Vec::with_capacity(rows.len());
        for row in rows {
            let ran_at: String = row.try_get("ran_at")?;
            out.push(BenchmarkRecord {
                id: row.try_get("id")?,
                network: filters.network,
                public_key: filters.public_key,
                ran_at: ran_at.parse().map_err(|e: chrono::ParseError| StoreError::Other(e.to_string()))?,
                success: row.try_get::<i64, _>("success")? != 0,
                upload_bps: row.try_get("upload_bps")?,
                download_bps: row.try_get("download_bps")?,
                ttfb_ns: row.try_get::<i64, _>("ttfb_ns")? as u64,
                error: row.try_get("error")?,
            });
        }
        Ok(out)
    }
}

/// Query window for `list_scans`/`list_benchmarks`: one host, optionally
/// bounded by `ran_at`.
pub struct RecordFilters {
    pub network: Network,
    pub public_key: PublicKey,
    pub from: Option<chrono::DateTime<chrono::Utc>>,
    pub to: Option<chrono::DateTime<chrono::Utc>>,
    pub limit: usize,
}

impl Default for RecordFilters {
    fn default() -> Self {
        Self {
            network: Network::Mainnet,
            public_key: PublicKey([0u8; 32]),
            from: None,
            to: None,
            limit: 100,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hsd_core::DecodedPrices;

    fn expectation() -> Expectation {
        Expectation {
            expected_price_per_byte: 100.0,
            expected_storage_bytes: 1_000_000.0,
            needed_storage_bytes: 500_000.0,
        }
    }

    fn decoded() -> DecodedPrices {
        DecodedPrices {
            contract_price: 1,
            storage_price_per_byte_per_block: 100,
            upload_price_per_byte: 1,
            download_price_per_byte: 1,
            egress_price_per_byte: 1,
            ingress_price_per_byte: 1,
            collateral_per_byte_per_block: 300,
            max_collateral: 1_000_000,
            max_duration_blocks: 2000,
            remaining_storage_bytes: 2_000_000,
            total_storage_bytes: 4_000_000,
            accepting_contracts: true,
            version: "1.6.0".to_string(),
        }
    }

    async fn open_store() -> HostStore {
        let pool = SqlitePool::connect("sqlite::memory:").await.unwrap();
        let journal = Arc::new(Journal::default());
        let blocklist = Arc::new(Blocklist::default());
        HostStore::open(pool, journal, blocklist, &[]).await.unwrap()
    }

    fn announcement(pk: PublicKey, addr: &str, height: u64) -> Announcement {
        Announcement {
            network: Network::Mainnet,
            public_key: pk,
            net_address: addr.to_string(),
            height,
            observed_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn upsert_creates_then_updates_in_place() {
        let store = open_store().await;
        let pk = PublicKey([1u8; 32]);
        let host = store.upsert_announcement(announcement(pk, "1.2.3.4:9982", 100)).await.unwrap();
        assert_eq!(host.known_since_height, 100);
        assert_eq!(store.len(), 1);

        // A replayed announcement at a lower height folds known_since
        // down but keeps the record identity (I1).
        let host2 = store.upsert_announcement(announcement(pk, "1.2.3.5:9982", 40)).await.unwrap();
        assert_eq!(host2.id, host.id);
        assert_eq!(host2.known_since_height, 40);
        assert_eq!(host2.net_address, "1.2.3.5:9982");
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn record_scan_updates_state_and_score() {
        let store = open_store().await;
        let pk = PublicKey([2u8; 32]);
        store.upsert_announcement(announcement(pk, "1.2.3.4:9982", 10)).await.unwrap();

        let prices = PriceTable::V1 {
            settings_blob: vec![1, 2, 3],
            price_table_blob: vec![4, 5, 6],
            decoded: decoded(),
        };
        let outcome = ScanOutcome {
            ran_at: Utc::now(),
            success: true,
            latency_ns: 5_000_000,
            error: None,
        };
        let host = store
            .record_scan(Network::Mainnet, pk, outcome, Some(prices), true, Protocol::V1, &expectation())
            .await
            .unwrap();
        assert_eq!(host.state, HostState::Online);
        assert!(host.last_prices.is_some());
        assert!(host.score.total() > 0.0);
        assert_eq!(host.scans.len(), 1);
    }

    #[tokio::test]
    async fn failed_scan_without_blocking_sets_offline_and_keeps_prior_prices() {
        let store = open_store().await;
        let pk = PublicKey([3u8; 32]);
        store.upsert_announcement(announcement(pk, "1.2.3.4:9982", 10)).await.unwrap();

        let prices = PriceTable::V1 {
            settings_blob: vec![],
            price_table_blob: vec![],
            decoded: decoded(),
        };
        store
            .record_scan(
                Network::Mainnet,
                pk,
                ScanOutcome { ran_at: Utc::now(), success: true, latency_ns: 1_000_000, error: None },
                Some(prices),
                true,
                Protocol::V1,
                &expectation(),
            )
            .await
            .unwrap();

        let host = store
            .record_scan(
                Network::Mainnet,
                pk,
                ScanOutcome {
                    ran_at: Utc::now(),
                    success: false,
                    latency_ns: 0,
                    error: Some("dial timeout".to_string()),
                },
                None,
                false,
                Protocol::V1,
                &expectation(),
            )
            .await
            .unwrap();

        assert_eq!(host.state, HostState::Offline);
        assert_eq!(host.consecutive_scan_failures, 1);
        assert!(host.last_prices.is_some(), "a failed scan must not clear prior pricing (I5)");
    }

    #[tokio::test]
    async fn record_scan_on_unknown_host_is_not_found() {
        let store = open_store().await;
        let err = store
            .record_scan(
                Network::Mainnet,
                PublicKey([9u8; 32]),
                ScanOutcome { ran_at: Utc::now(), success: true, latency_ns: 0, error: None },
                None,
                false,
                Protocol::V1,
                &expectation(),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound));
    }

    #[tokio::test]
    async fn blocklisted_announcement_marks_host_blocked() {
        let store = open_store().await;
        store.blocklist.replace(["evil.example".to_string()]);
        let pk = PublicKey([4u8; 32]);
        let host = store
            .upsert_announcement(announcement(pk, "host.evil.example:9982", 1))
            .await
            .unwrap();
        assert!(host.blocked);
        assert_eq!(host.state, HostState::Blocked);
    }

    #[tokio::test]
    async fn list_filters_out_blocked_hosts_by_default() {
        let store = open_store().await;
        store.blocklist.replace(["evil.example".to_string()]);
        store
            .upsert_announcement(announcement(PublicKey([5u8; 32]), "good.example:9982", 1))
            .await
            .unwrap();
        store
            .upsert_announcement(announcement(PublicKey([6u8; 32]), "host.evil.example:9982", 1))
            .await
            .unwrap();

        let visible = store.list(&ListFilters::default()).await;
        assert_eq!(visible.len(), 1);

        let all = store.list(&ListFilters { include_blocked: true, ..Default::default() }).await;
        assert_eq!(all.len(), 2);
    }
}
