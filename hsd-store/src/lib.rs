//! Host record store, §4.6: the authoritative in-memory table with
//! SQL write-through, built on top of the update journal (`hsd-journal`)
//! and the domain blocklist.

pub mod blocklist;
pub mod errors;
pub mod migration;
pub mod schema;
pub mod store;
pub mod subnet;
pub mod table;

pub use blocklist::Blocklist;
pub use errors::StoreError;
pub use migration::Migration;
pub use store::{HostStore, ListFilters, RecordFilters};
pub use table::{RowHandle, Table};
