//! `ConsensusClient` wired over the wire, §6: `TipState()`,
//! `Subscribe(onTipChange)`, `Block(id) -> {header, txns}`. The consensus
//! component itself is an external collaborator (§1); this is the thin
//! length-prefixed-JSON client that drives it, one dial per call, in the
//! same scoped-connection style as `hsd_rpc::transport`.

use async_trait::async_trait;
use hsd_chain::{BlockAnnouncements, ChainError, ConsensusClient};
use hsd_core::{Announcement, Network};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::time::timeout;

const MAX_FRAME_BYTES: usize = 4 * 1024 * 1024;
const DIAL_DEADLINE: Duration = Duration::from_secs(10);
/// `wait_for_tip_change` long-polls the consensus component; bounded so a
/// never-changing tip doesn't wedge the subscriber loop forever.
const TIP_WAIT_DEADLINE: Duration = Duration::from_secs(5 * 60);

#[derive(Serialize)]
#[serde(tag = "cmd", rename_all = "snake_case")]
enum Request {
    TipHeight { network: Network },
    WaitForTipChange { network: Network, after_height: u64 },
    BlockAnnouncements { network: Network, height: u64 },
}

#[derive(Deserialize)]
struct HeightResponse {
    height: u64,
}

#[derive(Deserialize)]
struct WireAnnouncement {
    public_key: hsd_core::PublicKey,
    net_address: String,
    height: u64,
    observed_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Deserialize)]
struct BlockResponse {
    block_id: [u8; 32],
    announcements: Vec<WireAnnouncement>,
}

pub struct TcpConsensusClient {
    addr: String,
}

impl TcpConsensusClient {
    pub fn new(addr: String) -> Self {
        Self { addr }
    }

    async fn call(&self, request: &Request, deadline: Duration) -> Result<Vec<u8>, ChainError> {
        let connect = TcpStream::connect(&self.addr);
        let mut stream = timeout(DIAL_DEADLINE, connect)
            .await
            .map_err(|_| ChainError::Consensus("dial timed out".into()))?
            .map_err(|e| ChainError::Consensus(e.to_string()))?;

        let payload = serde_json::to_vec(request).map_err(|e| ChainError::Consensus(e.to_string()))?;
        let write = async {
            stream.write_u32(payload.len() as u32).await?;
            stream.write_all(&payload).await?;
            let len = stream.read_u32().await? as usize;
            if len > MAX_FRAME_BYTES {
                return Err(std::io::Error::new(std::io::ErrorKind::InvalidData, "response too large"));
            }
            let mut buf = vec![0u8; len];
            stream.read_exact(&mut buf).await?;
            Ok::<_, std::io::Error>(buf)
        };
        timeout(deadline, write)
            .await
            .map_err(|_| ChainError::Consensus("request timed out".into()))?
            .map_err(|e| ChainError::Consensus(e.to_string()))
    }
}

#[async_trait]
impl ConsensusClient for TcpConsensusClient {
    async fn tip_height(&self, network: Network) -> Result<u64, ChainError> {
        let raw = self.call(&Request::TipHeight { network }, DIAL_DEADLINE).await?;
        let resp: HeightResponse = serde_json::from_slice(&raw).map_err(|e| ChainError::Decode(e.to_string()))?;
        Ok(resp.height)
    }

    async fn wait_for_tip_change(&self, network: Network, after_height: u64) -> Result<u64, ChainError> {
        let raw = self
            .call(&Request::WaitForTipChange { network, after_height }, TIP_WAIT_DEADLINE)
            .await?;
        let resp: HeightResponse = serde_json::from_slice(&raw).map_err(|e| ChainError::Decode(e.to_string()))?;
        Ok(resp.height)
    }

    async fn block_announcements(&self, network: Network, height: u64) -> Result<BlockAnnouncements, ChainError> {
        let raw = self
            .call(&Request::BlockAnnouncements { network, height }, DIAL_DEADLINE)
            .await?;
        let resp: BlockResponse = serde_json::from_slice(&raw).map_err(|e| ChainError::Decode(e.to_string()))?;
        Ok(BlockAnnouncements {
            block_id: resp.block_id,
            announcements: resp
                .announcements
                .into_iter()
                .map(|a| Announcement {
                    network,
                    public_key: a.public_key,
                    net_address: a.net_address,
                    height: a.height,
                    observed_at: a.observed_at,
                })
                .collect(),
        })
    }
}
