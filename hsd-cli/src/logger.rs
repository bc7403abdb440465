//! Logger setup, mirroring `forest/shared/src/logger/mod.rs`: a
//! `pretty_env_logger` builder defaulting to `Info`, with per-module
//! filters layered on top and `RUST_LOG` taking final precedence.

use log::LevelFilter;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct LogConfig {
    pub filters: Vec<LogValue>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LogValue {
    pub module: String,
    #[serde(with = "level_filter_serde")]
    pub level: LevelFilter,
}

mod level_filter_serde {
    use log::LevelFilter;
    use serde::{Deserialize, Deserializer, Serializer};
    use std::str::FromStr;

    pub fn serialize<S: Serializer>(level: &LevelFilter, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&level.to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<LevelFilter, D::Error> {
        let s = String::deserialize(deserializer)?;
        LevelFilter::from_str(&s).map_err(serde::de::Error::custom)
    }
}

impl LogValue {
    pub fn new(module: &str, level: LevelFilter) -> Self {
        Self { module: module.to_string(), level }
    }
}

pub fn setup_logger(log_config: &LogConfig) {
    let mut builder = pretty_env_logger::formatted_timed_builder();
    builder.filter(None, LevelFilter::Info);
    for item in &log_config.filters {
        builder.filter(Some(item.module.as_str()), item.level);
    }
    if let Ok(s) = std::env::var("RUST_LOG") {
        builder.parse_filters(&s);
    }
    builder.init();
}
