//! Shared data model for the HostScore benchmarking daemon.
//!
//! Every other crate in the workspace depends on this one for the host
//! record, its append-only satellite records, and the wire-level pricing
//! types; it has no dependency back on them (cf. `forest_blocks` /
//! `forest_cid`, leaf crates with the same one-way dependency shape).

pub mod error;
pub mod host;
pub mod network;
pub mod pricing;
pub mod pubkey;
pub mod records;

pub use error::HostError;
pub use host::{BenchmarkOutcome, Host, HostState, Protocol, Ring, ScanOutcome, Score};
pub use network::Network;
pub use pricing::{BLOCKS_PER_MONTH, DecodedPrices, PriceLimits, PriceTable, REQUIRED_DURATION_BLOCKS, SECTOR_SIZE_BYTES};
pub use pubkey::PublicKey;
pub use records::{Announcement, BenchmarkRecord, ScanRecord, TipRecord};
