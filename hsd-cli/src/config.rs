//! JSON config file, §6 Configuration: addresses and directories (never
//! secrets — those are environment-only, see `secrets`).

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NetworkConfig {
    pub name: String,
    pub chain_id: u64,
    pub consensus_addr: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub data_dir: PathBuf,
    pub http_address: String,
    pub networks: Vec<NetworkConfig>,
    pub scan_pool_size: usize,
    pub scan_tick_seconds: u64,
    pub benchmark_interval_hours: u64,
    pub domain_blocklist_path: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./hsd-data"),
            http_address: "127.0.0.1:9980".to_string(),
            networks: vec![
                NetworkConfig {
                    name: "mainnet".to_string(),
                    chain_id: 1,
                    consensus_addr: "127.0.0.1:9981".to_string(),
                },
                NetworkConfig {
                    name: "zen".to_string(),
                    chain_id: 2,
                    consensus_addr: "127.0.0.1:9983".to_string(),
                },
            ],
            scan_pool_size: 16,
            scan_tick_seconds: 30,
            benchmark_interval_hours: 2,
            domain_blocklist_path: None,
        }
    }
}

impl Config {
    pub fn load(path: &std::path::Path) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("failed to read config file {}: {e}", path.display()))?;
        let config: Config = serde_json::from_str(&text)
            .map_err(|e| anyhow::anyhow!("failed to parse config file {}: {e}", path.display()))?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_round_trips_through_json() {
        let config = Config::default();
        let json = serde_json::to_string(&config).unwrap();
        let parsed: Config = serde_json::from_str(&json).unwrap();
        assert_eq!(config, parsed);
    }

    #[test]
    fn partial_json_fills_in_defaults() {
        let parsed: Config = serde_json::from_str(r#"{"http_address": "0.0.0.0:8080"}"#).unwrap();
        assert_eq!(parsed.http_address, "0.0.0.0:8080");
        assert_eq!(parsed.scan_pool_size, Config::default().scan_pool_size);
    }
}
