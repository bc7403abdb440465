use hsd_core::{BLOCKS_PER_MONTH, DecodedPrices, PriceLimits, REQUIRED_DURATION_BLOCKS, SECTOR_SIZE_BYTES};

/// Outcome of the price-limit / gouging filter, §4.1. A pure function:
/// no I/O, no clock reads. The caller supplies limits already translated
/// from USD via the current SC/USD rate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GougingVerdict {
    Accept,
    Reject(&'static str),
}

impl GougingVerdict {
    pub fn is_accept(&self) -> bool {
        matches!(self, GougingVerdict::Accept)
    }
}

/// Evaluates a host's decoded prices against the caller's limits,
/// returning the first rejection reason encountered or `Accept`. Order
/// matches the list in §4.1.
pub fn evaluate(prices: &DecodedPrices, limits: &PriceLimits) -> GougingVerdict {
    let per_tb = |per_byte: u128| per_byte.saturating_mul(1_000_000_000_000);

    let storage_price_per_tb_per_month = per_tb(prices.storage_price_per_byte_per_block)
        .saturating_mul(BLOCKS_PER_MONTH as u128);
    if storage_price_per_tb_per_month > limits.max_storage_price_per_tb_per_month {
        return GougingVerdict::Reject("storage > cap");
    }
    if per_tb(prices.ingress_price_per_byte) > limits.max_upload_price_per_tb {
        return GougingVerdict::Reject("ingress > cap");
    }
    if per_tb(prices.egress_price_per_byte) > limits.max_download_price_per_tb {
        return GougingVerdict::Reject("egress > cap");
    }
    if prices.contract_price > limits.max_contract_price {
        return GougingVerdict::Reject("contract_price > cap");
    }
    if prices.max_collateral == 0 {
        return GougingVerdict::Reject("max_collateral == 0");
    }
    if !prices.accepting_contracts {
        return GougingVerdict::Reject("accepting_contracts == false");
    }
    if prices.max_duration_blocks < REQUIRED_DURATION_BLOCKS {
        return GougingVerdict::Reject("max_duration < required_duration");
    }
    if prices.remaining_storage_bytes < SECTOR_SIZE_BYTES {
        return GougingVerdict::Reject("remaining_storage < 1 sector");
    }
    GougingVerdict::Accept
}

#[cfg(test)]
mod tests {
    use super::*;

    fn baseline_prices() -> DecodedPrices {
        DecodedPrices {
            contract_price: 100,
            storage_price_per_byte_per_block: 100,
            upload_price_per_byte: 1000,
            download_price_per_byte: 3000,
            egress_price_per_byte: 3000,
            ingress_price_per_byte: 1000,
            collateral_per_byte_per_block: 200,
            max_collateral: 1_000_000,
            max_duration_blocks: REQUIRED_DURATION_BLOCKS,
            remaining_storage_bytes: SECTOR_SIZE_BYTES,
            total_storage_bytes: SECTOR_SIZE_BYTES * 2,
            accepting_contracts: true,
            version: "1.6.0".into(),
        }
    }

    fn baseline_limits() -> PriceLimits {
        PriceLimits {
            max_contract_price: 1_000,
            max_upload_price_per_tb: 1000 * 1_000_000_000_000,
            max_download_price_per_tb: 3000 * 1_000_000_000_000,
            max_storage_price_per_tb_per_month: 100 * 1_000_000_000_000 * BLOCKS_PER_MONTH as u128,
        }
    }

    /// T11: a host exactly at the cap passes; one hasting above fails.
    #[test]
    fn gouging_boundary_storage_price() {
        let prices = baseline_prices();
        let limits = baseline_limits();
        assert_eq!(evaluate(&prices, &limits), GougingVerdict::Accept);

        let mut over = prices;
        over.storage_price_per_byte_per_block += 1;
        assert_eq!(
            evaluate(&over, &limits),
            GougingVerdict::Reject("storage > cap")
        );
    }

    #[test]
    fn rejects_non_accepting_host() {
        let mut prices = baseline_prices();
        prices.accepting_contracts = false;
        let verdict = evaluate(&prices, &baseline_limits());
        assert_eq!(verdict, GougingVerdict::Reject("accepting_contracts == false"));
    }

    #[test]
    fn rejects_short_max_duration() {
        let mut prices = baseline_prices();
        prices.max_duration_blocks = REQUIRED_DURATION_BLOCKS - 1;
        assert_eq!(
            evaluate(&prices, &baseline_limits()),
            GougingVerdict::Reject("max_duration < required_duration")
        );
    }

    #[test]
    fn rejects_insufficient_remaining_storage() {
        let mut prices = baseline_prices();
        prices.remaining_storage_bytes = SECTOR_SIZE_BYTES - 1;
        assert_eq!(
            evaluate(&prices, &baseline_limits()),
            GougingVerdict::Reject("remaining_storage < 1 sector")
        );
    }
}
