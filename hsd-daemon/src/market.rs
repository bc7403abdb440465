//! Concrete `MarketConditions`, §4.1: USD-denominated price caps and
//! renter expectations translated into the chain's native currency using
//! the current SC/USD exchange rate.
//!
//! The exchange-rate fetcher itself is an external collaborator (§1) —
//! `ExchangeRateSource` is the thin seam it's driven through, mirroring
//! `hsd_chain::ConsensusClient`. `RateLimitedMarket` owns the refresh
//! cadence and the "last known rate persists" fallback; it never blocks
//! `price_limits`/`expectation` callers on network I/O.

use crate::token_bucket::TokenBucket;
use async_trait::async_trait;
use hsd_core::{Network, PriceLimits};
use hsd_scorer::Expectation;
use hsd_rpc::MarketConditions;
use log::{info, warn};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Refresh cadence, §4.1: "refreshed every 10 min".
pub const RATE_REFRESH_INTERVAL: Duration = Duration::from_secs(10 * 60);
/// Minimum spacing between outbound rate-fetch calls, §5.
pub const RATE_FETCH_TOKEN_INTERVAL: Duration = Duration::from_secs(5);
/// Hastings per siacoin, the chain's smallest native unit.
pub const HASTINGS_PER_SC: u128 = 1_000_000_000_000_000_000_000_000;

#[async_trait]
pub trait ExchangeRateSource: Send + Sync {
    /// USD value of one SC. Errors leave the previous rate in place.
    async fn usd_per_sc(&self) -> anyhow::Result<f64>;
}

/// USD-denominated limits and renter expectations, configured per network
/// and translated to native currency at read time using the current rate.
#[derive(Debug, Clone, Copy)]
pub struct UsdMarketParams {
    pub max_contract_price_usd: f64,
    pub max_upload_price_per_tb_usd: f64,
    pub max_download_price_per_tb_usd: f64,
    pub max_storage_price_per_tb_per_month_usd: f64,
    pub expected_price_per_byte_usd: f64,
    pub expected_storage_bytes: f64,
    pub needed_storage_bytes: f64,
}

impl Default for UsdMarketParams {
    fn default() -> Self {
        Self {
            max_contract_price_usd: 1.0,
            max_upload_price_per_tb_usd: 10.0,
            max_download_price_per_tb_usd: 45.0,
            max_storage_price_per_tb_per_month_usd: 4.0,
            expected_price_per_byte_usd: 2e-12,
            expected_storage_bytes: 1e12,
            needed_storage_bytes: 1e11,
        }
    }
}

fn usd_to_hastings(usd: f64, usd_per_sc: f64) -> u128 {
    if usd_per_sc <= 0.0 {
        return 0;
    }
    let sc = usd / usd_per_sc;
    (sc * HASTINGS_PER_SC as f64).max(0.0) as u128
}

/// Falls back to this rate if no fetch has ever succeeded — better than
/// translating every cap to zero and rejecting every host.
const FALLBACK_USD_PER_SC: f64 = 0.01;

pub struct RateLimitedMarket {
    params: HashMap<Network, UsdMarketParams>,
    rate: RwLock<f64>,
    bucket: TokenBucket,
    source: Arc<dyn ExchangeRateSource>,
}

impl RateLimitedMarket {
    pub fn new(params: HashMap<Network, UsdMarketParams>, source: Arc<dyn ExchangeRateSource>) -> Arc<Self> {
        Arc::new(Self {
            params,
            rate: RwLock::new(FALLBACK_USD_PER_SC),
            bucket: TokenBucket::new(RATE_FETCH_TOKEN_INTERVAL),
            source,
        })
    }

    fn params_for(&self, network: Network) -> UsdMarketParams {
        self.params.get(&network).copied().unwrap_or_default()
    }

    fn current_rate(&self) -> f64 {
        *self.rate.read()
    }

    async fn refresh_once(&self) {
        self.bucket.acquire().await;
        match self.source.usd_per_sc().await {
            Ok(rate) if rate > 0.0 => {
                *self.rate.write() = rate;
                info!("exchange rate refreshed: {rate} USD/SC");
            }
            Ok(rate) => warn!("exchange rate source returned non-positive rate {rate}, keeping last known"),
            Err(e) => warn!("exchange rate refresh failed, keeping last known rate: {e}"),
        }
    }

    /// Spawns the periodic refresh loop. The first refresh runs
    /// immediately so the daemon doesn't operate on the hardcoded
    /// fallback for a full interval after startup.
    pub fn spawn(self: &Arc<Self>, cancel: CancellationToken) {
        let this = self.clone();
        tokio::spawn(async move {
            this.refresh_once().await;
            let mut interval = tokio::time::interval(RATE_REFRESH_INTERVAL);
            interval.tick().await;
            loop {
                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => break,
                    _ = interval.tick() => this.refresh_once().await,
                }
            }
        });
    }
}

impl MarketConditions for RateLimitedMarket {
    fn price_limits(&self, network: Network) -> PriceLimits {
        let p = self.params_for(network);
        let rate = self.current_rate();
        PriceLimits {
            max_contract_price: usd_to_hastings(p.max_contract_price_usd, rate),
            max_upload_price_per_tb: usd_to_hastings(p.max_upload_price_per_tb_usd, rate),
            max_download_price_per_tb: usd_to_hastings(p.max_download_price_per_tb_usd, rate),
            max_storage_price_per_tb_per_month: usd_to_hastings(p.max_storage_price_per_tb_per_month_usd, rate),
        }
    }

    fn expectation(&self, network: Network) -> Expectation {
        let p = self.params_for(network);
        let rate = self.current_rate();
        Expectation {
            expected_price_per_byte: usd_to_hastings(p.expected_price_per_byte_usd, rate) as f64,
            expected_storage_bytes: p.expected_storage_bytes,
            needed_storage_bytes: p.needed_storage_bytes,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    struct FixedRate(f64);

    #[async_trait]
    impl ExchangeRateSource for FixedRate {
        async fn usd_per_sc(&self) -> anyhow::Result<f64> {
            Ok(self.0)
        }
    }

    struct FailingRate(AtomicU32);

    #[async_trait]
    impl ExchangeRateSource for FailingRate {
        async fn usd_per_sc(&self) -> anyhow::Result<f64> {
            self.0.fetch_add(1, Ordering::SeqCst);
            Err(anyhow::anyhow!("source unavailable"))
        }
    }

    #[test]
    fn usd_conversion_scales_with_rate() {
        let cheap = usd_to_hastings(10.0, 1.0);
        let expensive = usd_to_hastings(10.0, 0.5);
        assert!(expensive > cheap, "a lower USD/SC rate must yield more hastings for the same USD cap");
    }

    #[test]
    fn zero_rate_yields_zero_rather_than_panicking() {
        assert_eq!(usd_to_hastings(10.0, 0.0), 0);
    }

    #[tokio::test]
    async fn refresh_updates_rate_on_success() {
        let market = RateLimitedMarket::new(HashMap::new(), Arc::new(FixedRate(0.02)));
        market.refresh_once().await;
        assert_eq!(market.current_rate(), 0.02);
    }

    #[tokio::test]
    async fn refresh_keeps_last_known_rate_on_failure() {
        let market = RateLimitedMarket::new(HashMap::new(), Arc::new(FixedRate(0.05)));
        market.refresh_once().await;
        assert_eq!(market.current_rate(), 0.05);

        let failing = Arc::new(FailingRate(AtomicU32::new(0)));
        let market = Arc::new(RateLimitedMarket {
            params: HashMap::new(),
            rate: RwLock::new(0.05),
            bucket: TokenBucket::new(Duration::from_millis(0)),
            source: failing,
        });
        market.refresh_once().await;
        assert_eq!(market.current_rate(), 0.05, "a failed fetch must not clear the last known rate");
    }

    #[test]
    fn unconfigured_network_falls_back_to_default_params() {
        let market = RateLimitedMarket::new(HashMap::new(), Arc::new(FixedRate(0.01)));
        let limits = market.price_limits(Network::Mainnet);
        assert!(limits.max_contract_price > 0);
    }
}
