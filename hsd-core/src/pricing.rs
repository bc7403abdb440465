use serde::{Deserialize, Serialize};

/// Decoded fields common to both protocol dialects, extracted from the
/// host's advertised settings / price table.
///
/// §9 REDESIGN FLAGS calls for replacing "dynamic JSON over opaque blobs"
/// with explicit tagged variants that keep the wire bytes alongside the
/// decoded struct, so a newer dialect can be forwarded to downstream
/// clients without loss even before this daemon understands it fully.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecodedPrices {
    pub contract_price: u128,
    pub storage_price_per_byte_per_block: u128,
    pub upload_price_per_byte: u128,
    pub download_price_per_byte: u128,
    pub egress_price_per_byte: u128,
    pub ingress_price_per_byte: u128,
    pub collateral_per_byte_per_block: u128,
    pub max_collateral: u128,
    pub max_duration_blocks: u64,
    pub remaining_storage_bytes: u64,
    pub total_storage_bytes: u64,
    pub accepting_contracts: bool,
    pub version: String,
}

/// A settings/price-table snapshot, tagged by the RPC dialect it arrived
/// over. The raw wire bytes are kept verbatim so the update journal and
/// the HTTP API can forward what the host actually sent even as decoded
/// fields evolve.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "dialect")]
pub enum PriceTable {
    V1 {
        settings_blob: Vec<u8>,
        price_table_blob: Vec<u8>,
        decoded: DecodedPrices,
    },
    V2 {
        settings_blob: Vec<u8>,
        decoded: DecodedPrices,
    },
}

impl PriceTable {
    pub fn decoded(&self) -> &DecodedPrices {
        match self {
            PriceTable::V1 { decoded, .. } => decoded,
            PriceTable::V2 { decoded, .. } => decoded,
        }
    }

    pub fn is_v2(&self) -> bool {
        matches!(self, PriceTable::V2 { .. })
    }
}

/// Per-TB(-month) USD price limits from the gouging filter's caller,
/// already translated into the chain's native currency (hastings-per-byte
/// style units) via the current SC/USD rate. See §4.1.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceLimits {
    pub max_contract_price: u128,
    pub max_upload_price_per_tb: u128,
    pub max_download_price_per_tb: u128,
    pub max_storage_price_per_tb_per_month: u128,
}

/// One required contract duration, fixed by §4.1: 1008 blocks (~7 days).
pub const REQUIRED_DURATION_BLOCKS: u64 = 1008;

/// Blocks in one month, at the same ~10 minute block time that makes
/// `REQUIRED_DURATION_BLOCKS` ~7 days: 144 blocks/day * 30 days. Used to
/// bring a per-block storage price onto the same per-month footing as
/// `PriceLimits::max_storage_price_per_tb_per_month` before comparing
/// them, §4.1.
pub const BLOCKS_PER_MONTH: u64 = 4320;

/// One sector's worth of bytes, per the GLOSSARY's benchmark definition.
pub const SECTOR_SIZE_BYTES: u64 = 4 * 1 << 20;
