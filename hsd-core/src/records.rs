use crate::network::Network;
use crate::pubkey::PublicKey;
use serde::{Deserialize, Serialize};

/// Append-only scan record, §3. Immutable once written.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanRecord {
    pub id: i64,
    pub network: Network,
    pub public_key: PublicKey,
    pub ran_at: chrono::DateTime<chrono::Utc>,
    pub success: bool,
    pub latency_ns: u64,
    pub error: Option<String>,
    pub settings_blob: Option<Vec<u8>>,
    pub price_table_blob: Option<Vec<u8>>,
}

/// Append-only benchmark record, §3. Immutable once written.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BenchmarkRecord {
    pub id: i64,
    pub network: Network,
    pub public_key: PublicKey,
    pub ran_at: chrono::DateTime<chrono::Utc>,
    pub success: bool,
    pub upload_bps: f64,
    pub download_bps: f64,
    pub ttfb_ns: u64,
    pub error: Option<String>,
}

/// One per network: the highest chain tip whose announcements have been
/// absorbed. §3, §4.10.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct TipRecord {
    pub height: u64,
    pub block_id: [u8; 32],
}

/// A host-announcement payload extracted from a block by the chain
/// subscriber (§4.8), handed to `store::upsert`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Announcement {
    pub network: Network,
    pub public_key: PublicKey,
    pub net_address: String,
    pub height: u64,
    pub observed_at: chrono::DateTime<chrono::Utc>,
}
