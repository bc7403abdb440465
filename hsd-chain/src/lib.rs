//! Chain subscriber, §4.8, and tip persistence/replay guard, §4.10.
//!
//! The consensus follower and gossip peer layer are external
//! collaborators (§1); `ConsensusClient` is the thin capability seam
//! this crate is driven through, mirroring `hsd-rpc::MarketConditions`.

pub mod client;
pub mod errors;
pub mod subscriber;
pub mod tip;

pub use client::{BlockAnnouncements, ConsensusClient};
pub use errors::ChainError;
pub use subscriber::{ChainSubscriber, MAX_BLOCKS_PER_BATCH, MAX_CONSECUTIVE_FAILURES};
pub use tip::TipStore;
