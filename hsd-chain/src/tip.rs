//! Tip persistence & replay guard, §4.10: remembers the highest chain
//! tip whose announcements have been absorbed so a restart replays only
//! the blocks it hasn't seen. Lives on its own table (`hdb_tip`) on the
//! shared pool rather than inside `hsd-store`'s record lock — the tip
//! commit is deliberately the *last* write of a batch (§4.10), not one
//! more field on the host record.

use crate::errors::ChainError;
use hsd_core::{Network, TipRecord};
use sqlx::{Row, SqlitePool};

pub struct TipStore {
    pool: SqlitePool,
}

impl TipStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn get(&self, network: Network) -> Result<Option<TipRecord>, ChainError> {
        let row = sqlx::query("SELECT height, block_id FROM hdb_tip WHERE network = ?")
            .bind(network.as_str())
            .fetch_optional(&self.pool)
            .await?;
        let Some(row) = row else { return Ok(None) };
        let height: i64 = row.try_get("height")?;
        let block_id_hex: String = row.try_get("block_id")?;
        let bytes = hex::decode(&block_id_hex).map_err(|e| ChainError::Decode(e.to_string()))?;
        if bytes.len() != 32 {
            return Err(ChainError::Decode("block_id must be 32 bytes".into()));
        }
        let mut block_id = [0u8; 32];
        block_id.copy_from_slice(&bytes);
        Ok(Some(TipRecord { height: height as u64, block_id }))
    }

    /// Commits the new tip. Called only after every announcement in the
    /// batch has been durably applied (§4.10): on crash between a
    /// batch's host writes and this commit, the restart replays from
    /// the old tip, and replaying is safe because announcement upserts
    /// are idempotent (I1 + the min-height-observed rule).
    pub async fn commit(&self, network: Network, tip: TipRecord) -> Result<(), ChainError> {
        sqlx::query(
            "INSERT INTO hdb_tip (network, height, block_id) VALUES (?, ?, ?) \
             ON CONFLICT (network) DO UPDATE SET height = excluded.height, block_id = excluded.block_id",
        )
        .bind(network.as_str())
        .bind(tip.height as i64)
        .bind(hex::encode(tip.block_id))
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn round_trips_and_overwrites() {
        let pool = SqlitePool::connect("sqlite::memory:").await.unwrap();
        for statement in hsd_store::schema::SCHEMA.split(';') {
            let trimmed = statement.trim();
            if !trimmed.is_empty() {
                sqlx::query(trimmed).execute(&pool).await.unwrap();
            }
        }
        let store = TipStore::new(pool);

        assert!(store.get(Network::Mainnet).await.unwrap().is_none());

        store.commit(Network::Mainnet, TipRecord { height: 10, block_id: [1u8; 32] }).await.unwrap();
        let tip = store.get(Network::Mainnet).await.unwrap().unwrap();
        assert_eq!(tip.height, 10);
        assert_eq!(tip.block_id, [1u8; 32]);

        store.commit(Network::Mainnet, TipRecord { height: 11, block_id: [2u8; 32] }).await.unwrap();
        let tip = store.get(Network::Mainnet).await.unwrap().unwrap();
        assert_eq!(tip.height, 11);

        // Zen's tip is independent of mainnet's.
        assert!(store.get(Network::Zen).await.unwrap().is_none());
    }
}
