//! Single-slot-per-network benchmark worker, §4.4.

pub mod worker;

pub use worker::{BenchmarkJob, BenchmarkWorker, RETRY_COOLDOWN};
