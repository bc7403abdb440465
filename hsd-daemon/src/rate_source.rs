//! Default `ExchangeRateSource`, §1: the real exchange-rate fetcher is an
//! external collaborator out of scope here. This reads a single
//! environment variable so the daemon has a working default wiring;
//! production deployments swap in an HTTP-backed source against whatever
//! price feed they trust, behind the same trait.

use crate::market::ExchangeRateSource;
use async_trait::async_trait;

pub const RATE_ENV_VAR: &str = "HSD_EXCHANGE_RATE_USD_PER_SC";

pub struct EnvRateSource;

#[async_trait]
impl ExchangeRateSource for EnvRateSource {
    async fn usd_per_sc(&self) -> anyhow::Result<f64> {
        let raw = std::env::var(RATE_ENV_VAR)
            .map_err(|_| anyhow::anyhow!("{RATE_ENV_VAR} is not set"))?;
        let rate: f64 = raw
            .parse()
            .map_err(|e| anyhow::anyhow!("{RATE_ENV_VAR} is not a valid number: {e}"))?;
        Ok(rate)
    }
}
