//! Ten weighted sub-scores and their product, §4.7.
//!
//! Every function here is pure: no I/O, no clock reads beyond the `now`
//! the caller supplies. Kept dependency-free and fully unit tested
//! rather than folded into the stateful store, in the style of
//! `forest_bitfield` and similar leaf crates.

use hsd_core::{DecodedPrices, Host, Protocol, Score};

/// Aging half-life for the `successes`/`failures` counters, I2 / §4.7.
pub const AGING_TAU_SECONDS: f64 = 30.0 * 24.0 * 3600.0;

/// Exponent applied to the storage sub-score's ratio.
pub const STORAGE_PENALTY: f64 = 2.0;

fn clip01(x: f64) -> f64 {
    x.clamp(0.0, 1.0)
}

/// What the caller expects to pay / needs, used by the `prices` and
/// `storage` sub-scores. A renter-side expectation, not advertised by
/// the host.
#[derive(Debug, Clone, Copy)]
pub struct Expectation {
    pub expected_price_per_byte: f64,
    pub expected_storage_bytes: f64,
    pub needed_storage_bytes: f64,
}

/// Applies multiplicative aging to `successes`/`failures` before the
/// caller increments whichever counter the latest interaction affects.
/// I2: decay, never subtraction.
pub fn age_counters(successes: f64, failures: f64, elapsed_seconds: f64) -> (f64, f64) {
    let decay = (-elapsed_seconds / AGING_TAU_SECONDS).exp();
    (successes * decay, failures * decay)
}

pub fn score_prices(host_price_per_byte: f64, expected_price_per_byte: f64) -> f64 {
    if expected_price_per_byte <= 0.0 {
        return 0.5;
    }
    let ratio = host_price_per_byte / expected_price_per_byte;
    if ratio <= 1.0 {
        // Linear bonus: ratio 1.0 -> 0.5, ratio 0.1 (10x cheaper) -> 1.0,
        // clipped beyond that.
        let r = ratio.max(0.1);
        clip01(0.5 + 0.5 * (1.0 - r) / 0.9)
    } else {
        // Exponential malus calibrated against the two fixed points the
        // spec gives: 2x expensive -> 0.16, 3x -> 0.05.
        clip01(0.5 * 0.32_f64.powf(ratio - 1.0))
    }
}

pub fn score_storage(expected_storage_bytes: f64, needed_storage_bytes: f64) -> f64 {
    if needed_storage_bytes <= 0.0 {
        return 1.0;
    }
    let ratio = expected_storage_bytes / needed_storage_bytes;
    clip01(ratio.max(0.0).powf(STORAGE_PENALTY))
}

pub fn score_collateral(collateral_per_byte: f64, storage_price_per_byte: f64) -> f64 {
    if storage_price_per_byte <= 0.0 {
        return 0.0;
    }
    let ratio = collateral_per_byte / storage_price_per_byte;
    clip01((ratio - 1.5) / (6.0 - 1.5))
}

pub fn score_interactions(successes: f64, failures: f64) -> f64 {
    let total = successes + failures;
    if total <= 0.0 {
        return 0.72;
    }
    let s = successes / total;
    let f = failures / total;
    clip01((0.72 + 0.28 * s) * 0.1_f64.powf(f))
}

pub fn score_uptime(uptime_ns: u64, downtime_ns: u64) -> f64 {
    let total = uptime_ns as f64 + downtime_ns as f64;
    if total <= 0.0 {
        return 1.0;
    }
    let ratio = uptime_ns as f64 / total;
    if ratio >= 0.98 {
        1.0
    } else {
        clip01((ratio / 0.98).powf(30.0))
    }
}

/// Piecewise-linear through the 8/32/128-day knots, anchored at 0 days
/// -> 0.001 and saturating to 1.0 beyond 128 days.
pub fn score_age(age_days: f64) -> f64 {
    const KNOTS: [(f64, f64); 5] = [
        (0.0, 0.001),
        (8.0, 0.2),
        (32.0, 0.5),
        (128.0, 1.0),
        (f64::MAX, 1.0),
    ];
    if age_days <= 0.0 {
        return KNOTS[0].1;
    }
    for window in KNOTS.windows(2) {
        let (x0, y0) = window[0];
        let (x1, y1) = window[1];
        if age_days <= x1 {
            if x1 == x0 {
                return y1;
            }
            let t = (age_days - x0) / (x1 - x0);
            return y0 + (y1 - y0) * t;
        }
    }
    1.0
}

pub fn score_version(protocol: Protocol, advertised_version: &str) -> f64 {
    match protocol {
        Protocol::V2 => 1.0,
        Protocol::V1 if advertised_version == "1.6.0" => 0.99,
        Protocol::V1 => 0.0,
    }
}

pub fn score_latency(latency_ns: u64) -> f64 {
    const MIN_MS: f64 = 10.0;
    const MAX_MS: f64 = 1000.0;
    let ms = latency_ns as f64 / 1_000_000.0;
    if ms <= MIN_MS {
        1.0
    } else if ms >= MAX_MS {
        0.0
    } else {
        1.0 - (ms - MIN_MS) / (MAX_MS - MIN_MS)
    }
}

pub fn score_benchmarks(upload_bps: f64, download_bps: f64) -> f64 {
    const UPLOAD_BASELINE: f64 = 50_000_000.0;
    const DOWNLOAD_BASELINE: f64 = 100_000_000.0;
    clip01(upload_bps / UPLOAD_BASELINE) * clip01(download_bps / DOWNLOAD_BASELINE)
}

pub fn score_accepting_contracts(accepting: bool) -> f64 {
    if accepting {
        1.0
    } else {
        0.0
    }
}

/// Recomputes the full `Score` for a host against a renter-side
/// expectation, using whichever pricing snapshot and benchmark history
/// the host record currently carries. Called after every scan and
/// benchmark interaction (stale-recompute, §3).
pub fn recompute(host: &Host, expectation: &Expectation, now: chrono::DateTime<chrono::Utc>) -> Score {
    let prices = host
        .last_prices
        .as_ref()
        .map(|pt| score_prices(decoded_price_per_byte(pt.decoded()), expectation.expected_price_per_byte))
        .unwrap_or(0.5);

    let (storage, collateral, accepting, version) = match host.last_prices.as_ref() {
        Some(pt) => {
            let d = pt.decoded();
            (
                score_storage(
                    expectation.expected_storage_bytes,
                    expectation.needed_storage_bytes.max(d.remaining_storage_bytes as f64),
                ),
                score_collateral(
                    d.collateral_per_byte_per_block as f64,
                    d.storage_price_per_byte_per_block as f64,
                ),
                score_accepting_contracts(d.accepting_contracts),
                score_version(host.protocol, &d.version),
            )
        }
        None => (0.0, 0.0, 0.0, score_version(host.protocol, "")),
    };

    let latency = host
        .scans
        .iter()
        .last()
        .map(|s| score_latency(s.latency_ns))
        .unwrap_or(0.0);

    let benchmarks = host
        .benchmarks
        .iter()
        .last()
        .map(|b| score_benchmarks(b.upload_bps, b.download_bps))
        .unwrap_or(0.0);

    Score {
        prices,
        storage,
        collateral,
        interactions: score_interactions(host.successes, host.failures),
        uptime: score_uptime(host.uptime_ns, host.downtime_ns),
        age: score_age(host.age(now).num_seconds() as f64 / 86_400.0),
        version,
        latency,
        benchmarks,
        accepting_contracts: accepting,
    }
}

fn decoded_price_per_byte(d: &DecodedPrices) -> f64 {
    d.storage_price_per_byte_per_block as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prices_neutral_at_parity() {
        assert!((score_prices(100.0, 100.0) - 0.5).abs() < 1e-9);
    }

    #[test]
    fn prices_malus_matches_named_fixed_points() {
        assert!((score_prices(200.0, 100.0) - 0.16).abs() < 0.01);
        assert!((score_prices(300.0, 100.0) - 0.05).abs() < 0.01);
    }

    #[test]
    fn prices_bonus_saturates_at_ten_x_cheaper() {
        assert_eq!(score_prices(1.0, 100.0), 1.0);
        assert_eq!(score_prices(5.0, 100.0), 1.0);
    }

    #[test]
    fn uptime_boundary() {
        assert_eq!(score_uptime(98, 2), 1.0);
        assert!(score_uptime(50, 50) < 0.6);
    }

    #[test]
    fn age_saturates() {
        assert!(score_age(0.0) < 0.01);
        assert_eq!(score_age(200.0), 1.0);
        assert!(score_age(32.0) > score_age(8.0));
    }

    #[test]
    fn version_table() {
        assert_eq!(score_version(Protocol::V2, "anything"), 1.0);
        assert_eq!(score_version(Protocol::V1, "1.6.0"), 0.99);
        assert_eq!(score_version(Protocol::V1, "1.5.0"), 0.0);
    }

    #[test]
    fn latency_boundaries() {
        assert_eq!(score_latency(5_000_000), 1.0);
        assert_eq!(score_latency(2_000_000_000), 0.0);
    }

    #[test]
    fn aging_decays_towards_zero() {
        let (s, f) = age_counters(100.0, 100.0, AGING_TAU_SECONDS * 10.0);
        assert!(s < 1.0 && f < 1.0);
        assert!(s >= 0.0 && f >= 0.0);
    }

    #[quickcheck_macros::quickcheck]
    fn sub_scores_are_bounded(host_price: f64, expected: f64) -> bool {
        if !host_price.is_finite() || !expected.is_finite() || host_price < 0.0 || expected <= 0.0 {
            return true;
        }
        let s = score_prices(host_price, expected);
        (0.0..=1.0).contains(&s)
    }
}
