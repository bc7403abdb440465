use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Which of the two Sia-family chains a host record belongs to.
///
/// Kept as a closed enum rather than a free-form string: §3 keys every
/// record by `(network, public_key)` and the store must be able to shard
/// and index on it cheaply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Network {
    Mainnet,
    /// The "zen" testnet referenced by `HSD_WALLET_SEED_ZEN`.
    Zen,
}

impl Network {
    pub const ALL: [Network; 2] = [Network::Mainnet, Network::Zen];

    pub fn as_str(&self) -> &'static str {
        match self {
            Network::Mainnet => "mainnet",
            Network::Zen => "zen",
        }
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Network {
    type Err = UnknownNetwork;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "mainnet" => Ok(Network::Mainnet),
            "zen" => Ok(Network::Zen),
            other => Err(UnknownNetwork(other.to_string())),
        }
    }
}

#[derive(Debug, thiserror::Error)]
#[error("unknown network: {0}")]
pub struct UnknownNetwork(pub String);
