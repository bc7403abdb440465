//! Decodes the JSON payloads `Settings`/`PriceTable` carry into
//! `DecodedPrices`, §4.2. The raw bytes are kept by the caller alongside
//! the decoded struct (the tagged `PriceTable` in hsd-core) so a
//! dialect newer than this daemon understands can still be forwarded.

use hsd_core::DecodedPrices;

use crate::transport::{PriceTableResponse, SettingsResponse, TransportError};

pub fn decode_settings(resp: &SettingsResponse) -> Result<DecodedPrices, TransportError> {
    serde_json::from_slice(&resp.raw).map_err(|e| TransportError::Malformed(e.to_string()))
}

pub fn decode_price_table(resp: &PriceTableResponse) -> Result<DecodedPrices, TransportError> {
    serde_json::from_slice(&resp.raw).map_err(|e| TransportError::Malformed(e.to_string()))
}
