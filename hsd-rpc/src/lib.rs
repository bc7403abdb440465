//! Renter-host RPC transport layer, §4.2, plus the §4.1 gouging filter.
//!
//! A deadline-bounded, scoped connection wrapper in the same style as
//! `forest_chain_sync::network_context`, generalized from libp2p
//! chain-exchange requests to the Sia renter-host protocol's two wire
//! dialects.

pub mod bandwidth;
pub mod decode;
pub mod gouging;
pub mod market;
pub mod proof;
pub mod transport;

pub use decode::{decode_price_table, decode_settings};
pub use gouging::{evaluate as evaluate_gouging, GougingVerdict};
pub use market::MarketConditions;
pub use transport::{
    Connection, ContractHandle, ContractTerms, InstructionResult, PriceTableResponse,
    SettingsResponse, TransportError,
};
