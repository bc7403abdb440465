//! The consensus component's interface, §6 External Interfaces: `TipState()`,
//! `Subscribe(onTipChange)`, `Block(id) -> {header, txns}`. Out of scope
//! per §1 — this trait is the thin capability seam the subscriber drives,
//! matching the `MarketConditions` seam `hsd-rpc` exposes for the
//! exchange-rate collaborator.

use crate::errors::ChainError;
use async_trait::async_trait;
use hsd_core::{Announcement, Network};

/// Host-announcement payloads extracted from one block's transactions,
/// plus the block's own id for the tip record, §4.8/§4.10.
#[derive(Debug, Clone)]
pub struct BlockAnnouncements {
    pub block_id: [u8; 32],
    pub announcements: Vec<Announcement>,
}

#[async_trait]
pub trait ConsensusClient: Send + Sync {
    /// `TipState()`: the consensus layer's current height for `network`.
    async fn tip_height(&self, network: Network) -> Result<u64, ChainError>;

    /// Models `Subscribe(onTipChange)` as a pull the subscriber loop
    /// drives: blocks until the tip has advanced past `after_height`,
    /// returning the new height.
    async fn wait_for_tip_change(&self, network: Network, after_height: u64) -> Result<u64, ChainError>;

    /// `Block(id) -> {header, txns}`, pre-filtered to the announcement
    /// payloads found in `txns` (§4.8).
    async fn block_announcements(&self, network: Network, height: u64) -> Result<BlockAnnouncements, ChainError>;
}
