//! Scan worker pool, §4.3.

pub mod pool;

pub use pool::{ScanJob, ScanPool};
