//! Chain subscriber, §4.8: consumes tip-changed notifications and
//! host-announcement payloads, applies them to the store, then commits
//! the new tip. Runs on its own task per network (§5: "The chain
//! subscriber runs on its own thread").

use crate::client::ConsensusClient;
use crate::tip::TipStore;
use hsd_core::{Network, TipRecord};
use hsd_store::HostStore;
use log::{error, info, warn};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Blocks absorbed per batch, §4.8.
pub const MAX_BLOCKS_PER_BATCH: u64 = 1000;
/// Consecutive failed batches before the subscriber escalates to a
/// fatal shutdown trigger, §4.8/§7.
pub const MAX_CONSECUTIVE_FAILURES: u32 = 10;

pub struct ChainSubscriber;

impl ChainSubscriber {
    /// Spawns the per-network subscriber loop. `shutdown` is cancelled
    /// (not awaited) when the subscriber gives up after
    /// `MAX_CONSECUTIVE_FAILURES`, per §4.11 "fatal error from any
    /// component" triggering daemon-wide shutdown; `cancel` is the
    /// subscriber's own stop signal, cancelled by the lifecycle
    /// controller during an orderly shutdown.
    pub fn spawn(
        consensus: Arc<dyn ConsensusClient>,
        store: Arc<HostStore>,
        tip_store: Arc<TipStore>,
        network: Network,
        cancel: CancellationToken,
        shutdown: CancellationToken,
    ) {
        tokio::spawn(async move {
            run(consensus, store, tip_store, network, cancel, shutdown).await;
        });
    }
}

async fn run(
    consensus: Arc<dyn ConsensusClient>,
    store: Arc<HostStore>,
    tip_store: Arc<TipStore>,
    network: Network,
    cancel: CancellationToken,
    shutdown: CancellationToken,
) {
    let mut consecutive_failures = 0u32;
    loop {
        if cancel.is_cancelled() {
            break;
        }
        let current = match tip_store.get(network).await {
            Ok(Some(tip)) => tip,
            Ok(None) => TipRecord { height: 0, block_id: [0u8; 32] },
            Err(e) => {
                warn!("{network}: failed to read persisted tip: {e}");
                consecutive_failures += 1;
                if consecutive_failures >= MAX_CONSECUTIVE_FAILURES {
                    error!("{network}: tip store unreadable after {consecutive_failures} attempts, triggering shutdown");
                    shutdown.cancel();
                    break;
                }
                continue;
            }
        };

        let new_height = tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            result = consensus.wait_for_tip_change(network, current.height) => match result {
                Ok(height) => height,
                Err(e) => {
                    warn!("{network}: tip subscription error: {e}");
                    consecutive_failures += 1;
                    if consecutive_failures >= MAX_CONSECUTIVE_FAILURES {
                        error!("{network}: chain subscriber failed {consecutive_failures} times in a row, triggering shutdown");
                        shutdown.cancel();
                        break;
                    }
                    continue;
                }
            },
        };

        match absorb_batch(consensus.as_ref(), &store, &tip_store, network, current.height, new_height).await {
            Ok(absorbed_to) => {
                consecutive_failures = 0;
                if absorbed_to > current.height {
                    info!("{network}: absorbed announcements through height {absorbed_to}");
                }
            }
            Err(e) => {
                warn!("{network}: batch rolled back: {e}");
                consecutive_failures += 1;
                if consecutive_failures >= MAX_CONSECUTIVE_FAILURES {
                    error!("{network}: {consecutive_failures} consecutive batch failures, triggering shutdown");
                    shutdown.cancel();
                    break;
                }
            }
        }
    }
}

/// Absorbs every block strictly after `from_height` up to `to_height`,
/// bounded to `MAX_BLOCKS_PER_BATCH` per call (§4.8). The tip is
/// committed only once every block in the batch has had its
/// announcements upserted — §4.10's ordering guarantee.
async fn absorb_batch(
    consensus: &dyn ConsensusClient,
    store: &HostStore,
    tip_store: &TipStore,
    network: Network,
    from_height: u64,
    to_height: u64,
) -> Result<u64, crate::errors::ChainError> {
    let batch_end = to_height.min(from_height + MAX_BLOCKS_PER_BATCH);
    let mut last_block_id = None;
    for height in (from_height + 1)..=batch_end {
        let block = consensus.block_announcements(network, height).await?;
        for announcement in block.announcements {
            store
                .upsert_announcement(announcement)
                .await
                .map_err(|e| crate::errors::ChainError::Consensus(e.to_string()))?;
        }
        last_block_id = Some(block.block_id);
    }
    if let Some(block_id) = last_block_id {
        tip_store.commit(network, TipRecord { height: batch_end, block_id }).await?;
    }
    Ok(batch_end)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::BlockAnnouncements;
    use async_trait::async_trait;
    use hsd_core::Announcement;
    use hsd_store::Blocklist;
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::sync::Mutex as StdMutex;

    struct FakeConsensus {
        tip: AtomicU64,
        blocks: StdMutex<std::collections::HashMap<u64, BlockAnnouncements>>,
    }

    #[async_trait]
    impl ConsensusClient for FakeConsensus {
        async fn tip_height(&self, _network: Network) -> Result<u64, crate::errors::ChainError> {
            Ok(self.tip.load(Ordering::SeqCst))
        }

        async fn wait_for_tip_change(&self, _network: Network, after_height: u64) -> Result<u64, crate::errors::ChainError> {
            let tip = self.tip.load(Ordering::SeqCst);
            if tip > after_height {
                Ok(tip)
            } else {
                // In a real subscription this would await a
                // notification; the test drives the tip directly so we
                // just report no change has happened yet.
                Ok(after_height)
            }
        }

        async fn block_announcements(&self, _network: Network, height: u64) -> Result<BlockAnnouncements, crate::errors::ChainError> {
            self.blocks
                .lock()
                .unwrap()
                .get(&height)
                .cloned()
                .ok_or_else(|| crate::errors::ChainError::Consensus(format!("no block at height {height}")))
        }
    }

    fn announcement(pk: u8, height: u64) -> Announcement {
        Announcement {
            network: Network::Mainnet,
            public_key: hsd_core::PublicKey([pk; 32]),
            net_address: "1.2.3.4:9982".to_string(),
            height,
            observed_at: chrono::Utc::now(),
        }
    }

    #[tokio::test]
    async fn absorb_batch_applies_announcements_then_commits_tip() {
        let pool = sqlx::SqlitePool::connect("sqlite::memory:").await.unwrap();
        let journal = Arc::new(hsd_journal::Journal::default());
        let blocklist = Arc::new(Blocklist::default());
        let store = HostStore::open(pool.clone(), journal, blocklist, &[]).await.unwrap();
        let tip_store = TipStore::new(pool);

        let mut blocks = std::collections::HashMap::new();
        blocks.insert(1, BlockAnnouncements { block_id: [1u8; 32], announcements: vec![announcement(1, 1)] });
        blocks.insert(2, BlockAnnouncements { block_id: [2u8; 32], announcements: vec![announcement(2, 2)] });
        let consensus = FakeConsensus { tip: AtomicU64::new(2), blocks: StdMutex::new(blocks) };

        let absorbed = absorb_batch(&consensus, &store, &tip_store, Network::Mainnet, 0, 2).await.unwrap();
        assert_eq!(absorbed, 2);
        assert_eq!(store.len(), 2);
        let tip = tip_store.get(Network::Mainnet).await.unwrap().unwrap();
        assert_eq!(tip.height, 2);
        assert_eq!(tip.block_id, [2u8; 32]);
    }
}
