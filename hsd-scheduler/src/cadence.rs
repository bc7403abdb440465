//! Pure due-at calculations, §4.5. Kept free of I/O and clock reads
//! beyond the `now`/`last_*` the caller supplies, the same way
//! `hsd-scorer`'s sub-scores are pure — these are exactly as easy to
//! unit-test and just as worth keeping that way.

use chrono::{DateTime, Duration as ChronoDuration, Utc};

/// Base scan interval at zero consecutive failures, §4.5.
pub const SCAN_BASE_INTERVAL_MINS: i64 = 30;
/// Scan back-off ceiling, §4.5.
pub const SCAN_MAX_INTERVAL_HOURS: i64 = 24;

/// Base benchmark cadence target, §4.5.
pub const BENCHMARK_BASE_INTERVAL_HOURS: i64 = 2;
/// Benchmark back-off ceiling, §4.5.
pub const BENCHMARK_MAX_INTERVAL_HOURS: i64 = 24;

fn doubled_interval(base: ChronoDuration, max: ChronoDuration, consecutive_failures: u32) -> ChronoDuration {
    let shift = consecutive_failures.min(32);
    let multiplier = 1u64.checked_shl(shift).unwrap_or(u64::MAX);
    let candidate = base
        .num_seconds()
        .checked_mul(multiplier as i64)
        .unwrap_or(max.num_seconds());
    ChronoDuration::seconds(candidate.min(max.num_seconds()))
}

/// `scan_due_at = last_scan_at + scan_interval(failures)`, doubling from
/// 30 min to a 24h ceiling. A host never scanned is always due (the
/// caller checks `last_seen.is_none()` separately and enqueues
/// immediately, per §4.5's "if never scanned: enqueue immediately").
pub fn scan_due_at(last_seen: Option<DateTime<Utc>>, consecutive_failures: u32) -> DateTime<Utc> {
    let interval = doubled_interval(
        ChronoDuration::minutes(SCAN_BASE_INTERVAL_MINS),
        ChronoDuration::hours(SCAN_MAX_INTERVAL_HOURS),
        consecutive_failures,
    );
    last_seen.unwrap_or_else(Utc::now) + interval
}

/// Benchmark cadence: every 2h, doubling on consecutive failures to a
/// 24h ceiling, §4.5.
pub fn benchmark_due_at(last_benchmark_at: Option<DateTime<Utc>>, consecutive_failures: u32) -> DateTime<Utc> {
    let interval = doubled_interval(
        ChronoDuration::hours(BENCHMARK_BASE_INTERVAL_HOURS),
        ChronoDuration::hours(BENCHMARK_MAX_INTERVAL_HOURS),
        consecutive_failures,
    );
    last_benchmark_at.unwrap_or_else(Utc::now) + interval
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scan_interval_doubles_then_caps() {
        let t0 = Utc::now();
        let due0 = scan_due_at(Some(t0), 0);
        assert_eq!((due0 - t0).num_minutes(), SCAN_BASE_INTERVAL_MINS);

        let due2 = scan_due_at(Some(t0), 2);
        assert_eq!((due2 - t0).num_minutes(), SCAN_BASE_INTERVAL_MINS * 4);

        // 30min * 2^10 would blow well past the 24h ceiling.
        let due_many = scan_due_at(Some(t0), 10);
        assert_eq!((due_many - t0).num_hours(), SCAN_MAX_INTERVAL_HOURS);
    }

    #[test]
    fn benchmark_interval_doubles_then_caps() {
        let t0 = Utc::now();
        let due1 = benchmark_due_at(Some(t0), 1);
        assert_eq!((due1 - t0).num_hours(), BENCHMARK_BASE_INTERVAL_HOURS * 2);

        let due_many = benchmark_due_at(Some(t0), 8);
        assert_eq!((due_many - t0).num_hours(), BENCHMARK_MAX_INTERVAL_HOURS);
    }

    #[test]
    fn overflow_shift_does_not_panic() {
        let t0 = Utc::now();
        let due = scan_due_at(Some(t0), u32::MAX);
        assert_eq!((due - t0).num_hours(), SCAN_MAX_INTERVAL_HOURS);
    }
}
