//! Capability interface for the renter-side market conditions a host is
//! judged against: the gouging filter's `PriceLimits` and the scorer's
//! `Expectation`, both derived from the current SC/USD rate (§4.1).
//!
//! §9 REDESIGN FLAGS: the scan and benchmark workers depend on this thin
//! trait rather than reaching into the chain subscriber directly, which
//! is what keeps `hsd-scan`/`hsd-benchmark` and `hsd-chain` from needing
//! a cyclic dependency on each other.

use hsd_core::{Network, PriceLimits};
use hsd_scorer::Expectation;

pub trait MarketConditions: Send + Sync {
    fn price_limits(&self, network: Network) -> PriceLimits;
    fn expectation(&self, network: Network) -> Expectation;
}
