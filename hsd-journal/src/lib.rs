//! Bounded, at-least-once update journal, §4.9.
//!
//! Downstream clients `take()` everything since their last confirmed
//! id, then `confirm(id)` once they've durably applied it. Until
//! confirmed, the same window is handed back (with a fresh id token) on
//! every `take()`, matching scenario 5 in §8.

use hsd_core::{BenchmarkRecord, Host, ScanRecord};
use parking_lot::Mutex;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};

/// Default ring capacity, §4.9.
pub const DEFAULT_CAPACITY: usize = 100_000;
/// Per-`take()` batch cap, §4.9.
pub const TAKE_BATCH_CAP: usize = 10_000;

/// Opaque 16-byte token grouping a batch of entries, §3.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UpdateId(pub [u8; 16]);

impl UpdateId {
    fn random() -> Self {
        let mut bytes = [0u8; 16];
        rand::thread_rng().fill_bytes(&mut bytes);
        Self(bytes)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum UpdateKind {
    Host(Box<Host>),
    Scan(ScanRecord),
    Benchmark(BenchmarkRecord),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JournalEntry {
    pub seq: u64,
    pub kind: UpdateKind,
}

/// Response to `take()`: an id to `confirm()` later, plus the entries
/// covered by it. Grouped by kind for the HTTP API's `{hosts, scans,
/// benchmarks}` shape (§6).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateBatch {
    pub hosts: Vec<Host>,
    pub scans: Vec<ScanRecord>,
    pub benchmarks: Vec<BenchmarkRecord>,
}

impl UpdateBatch {
    pub fn is_empty(&self) -> bool {
        self.hosts.is_empty() && self.scans.is_empty() && self.benchmarks.is_empty()
    }
}

struct Inner {
    entries: VecDeque<JournalEntry>,
    next_seq: u64,
    /// Highest seq the downstream client has durably acknowledged.
    confirmed_up_to: u64,
    /// Outstanding tokens from `take()` not yet confirmed, mapping to the
    /// highest seq they cover.
    pending: HashMap<UpdateId, u64>,
    capacity: usize,
}

pub struct Journal {
    inner: Mutex<Inner>,
}

impl Default for Journal {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl Journal {
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: Mutex::new(Inner {
                entries: VecDeque::new(),
                next_seq: 1,
                confirmed_up_to: 0,
                pending: HashMap::new(),
                capacity: capacity.max(1),
            }),
        }
    }

    /// Appends one entry with the next globally monotone sequence
    /// number. Evicts the oldest entry if the ring is at capacity —
    /// a client that falls far enough behind loses the evicted entries,
    /// which is the bound the "bounded" in "bounded change log" buys.
    pub fn append(&self, kind: UpdateKind) -> u64 {
        let mut inner = self.inner.lock();
        let seq = inner.next_seq;
        inner.next_seq += 1;
        if inner.entries.len() == inner.capacity {
            inner.entries.pop_front();
        }
        inner.entries.push_back(JournalEntry { seq, kind });
        seq
    }

    /// Returns everything since the last confirmed id, capped at
    /// `TAKE_BATCH_CAP`, under a fresh `UpdateId`. Calling this again
    /// without an intervening `confirm` reissues the same window under a
    /// new id (at-least-once delivery).
    pub fn take(&self) -> (UpdateId, UpdateBatch) {
        let mut inner = self.inner.lock();
        let confirmed_up_to = inner.confirmed_up_to;
        let mut batch = UpdateBatch::default();
        let mut max_seq = confirmed_up_to;
        let mut count = 0usize;
        for entry in inner.entries.iter() {
            if entry.seq <= confirmed_up_to {
                continue;
            }
            if count >= TAKE_BATCH_CAP {
                break;
            }
            match &entry.kind {
                UpdateKind::Host(h) => batch.hosts.push((**h).clone()),
                UpdateKind::Scan(s) => batch.scans.push(s.clone()),
                UpdateKind::Benchmark(b) => batch.benchmarks.push(b.clone()),
            }
            max_seq = max_seq.max(entry.seq);
            count += 1;
        }
        let id = UpdateId::random();
        inner.pending.insert(id, max_seq);
        (id, batch)
    }

    /// Acknowledges everything covered by `id`. Unknown or
    /// already-superseded ids are ignored (idempotent).
    pub fn confirm(&self, id: UpdateId) {
        let mut inner = self.inner.lock();
        if let Some(max_seq) = inner.pending.remove(&id) {
            if max_seq > inner.confirmed_up_to {
                inner.confirmed_up_to = max_seq;
            }
            // Any other pending tokens that only covered an earlier
            // window are now also satisfied.
            inner.pending.retain(|_, seq| *seq > inner.confirmed_up_to);
        }
    }

    pub fn confirmed_up_to(&self) -> u64 {
        self.inner.lock().confirmed_up_to
    }

    pub fn len(&self) -> usize {
        self.inner.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use hsd_core::{Network, PublicKey};

    fn scan_entry(seq_hint: u8) -> UpdateKind {
        UpdateKind::Scan(ScanRecord {
            id: seq_hint as i64,
            network: Network::Mainnet,
            public_key: PublicKey([seq_hint; 32]),
            ran_at: Utc::now(),
            success: true,
            latency_ns: 1_000_000,
            error: None,
            settings_blob: None,
            price_table_blob: None,
        })
    }

    /// T5 / T7 and scenario 5: repeated `take()` without `confirm`
    /// reissues the same entries; confirming then taking again returns
    /// only newer entries.
    #[test]
    fn replays_until_confirmed() {
        let journal = Journal::default();
        for i in 0..3 {
            journal.append(scan_entry(i));
        }
        let (id_a, batch_a) = journal.take();
        assert_eq!(batch_a.scans.len(), 3);

        let (id_b, batch_b) = journal.take();
        assert_eq!(batch_b.scans.len(), 3);
        assert_ne!(id_a.0, id_b.0);

        journal.confirm(id_b);
        let (_id_c, batch_c) = journal.take();
        assert!(batch_c.is_empty());
    }

    #[test]
    fn confirm_is_idempotent_and_ignores_unknown_ids() {
        let journal = Journal::default();
        journal.append(scan_entry(1));
        let (id, _) = journal.take();
        journal.confirm(id);
        journal.confirm(id); // no panic, no effect
        journal.confirm(UpdateId([9u8; 16]));
        assert_eq!(journal.confirmed_up_to(), 1);
    }

    #[test]
    fn eviction_bounds_ring_size() {
        let journal = Journal::new(4);
        for i in 0..10u8 {
            journal.append(scan_entry(i));
        }
        assert_eq!(journal.len(), 4);
    }

    #[test]
    fn confirming_an_older_token_does_not_regress() {
        let journal = Journal::default();
        journal.append(scan_entry(1));
        let (id_old, _) = journal.take();
        journal.append(scan_entry(2));
        let (id_new, _) = journal.take();
        journal.confirm(id_new);
        journal.confirm(id_old);
        assert_eq!(journal.confirmed_up_to(), 2);
    }
}
