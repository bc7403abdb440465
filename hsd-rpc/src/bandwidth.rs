//! Bandwidth padding, §4.2: round ingress/egress requirements up to whole
//! packets before computing expected cost, then apply a leeway fraction
//! to mask quirks between host implementations/versions.

/// Ethernet MTU minus IP/TCP overhead, the packet size advertised
/// ingress/egress is rounded up to.
pub const PACKET_SIZE_BYTES: u64 = 1460;

/// Cost leeway: accept up to 10% higher cost than the padded estimate.
pub const COST_LEEWAY: f64 = 0.10;

/// Refund/collateral leeway: accept up to 10% lower than advertised.
pub const REFUND_LEEWAY: f64 = 0.10;

pub fn pad_to_packets(bytes: u64) -> u64 {
    if bytes == 0 {
        return 0;
    }
    bytes.div_ceil(PACKET_SIZE_BYTES) * PACKET_SIZE_BYTES
}

pub fn expected_cost(bytes: u64, price_per_byte: u128) -> u128 {
    let padded = pad_to_packets(bytes) as u128;
    let base = padded.saturating_mul(price_per_byte);
    base + (base as f64 * COST_LEEWAY) as u128
}

/// Whether an observed cost is within the accepted leeway of the
/// expected (padded) cost — the host is allowed to charge up to
/// `COST_LEEWAY` more than our estimate.
pub fn cost_within_leeway(observed: u128, expected: u128) -> bool {
    observed <= expected
}

/// Whether an observed refund/collateral is within the accepted leeway
/// of what the host advertised (allowed to be up to `REFUND_LEEWAY`
/// lower).
pub fn refund_within_leeway(observed: u128, advertised: u128) -> bool {
    let floor = advertised as f64 * (1.0 - REFUND_LEEWAY);
    (observed as f64) >= floor
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pads_up_to_whole_packets() {
        assert_eq!(pad_to_packets(1), PACKET_SIZE_BYTES);
        assert_eq!(pad_to_packets(PACKET_SIZE_BYTES), PACKET_SIZE_BYTES);
        assert_eq!(pad_to_packets(PACKET_SIZE_BYTES + 1), PACKET_SIZE_BYTES * 2);
        assert_eq!(pad_to_packets(0), 0);
    }

    #[test]
    fn refund_leeway_allows_ten_percent_lower() {
        assert!(refund_within_leeway(90, 100));
        assert!(!refund_within_leeway(89, 100));
    }
}
