//! CLI flags, mirroring `forest/daemon/src/cli/mod.rs`'s `clap::Parser`
//! shape: one binary, no subcommands, a `--config` path plus a handful
//! of startup-time overrides.

use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "hsd", author, version, about = "HostScore benchmarking daemon")]
pub struct Cli {
    /// Path to the JSON config file, §6 Configuration.
    #[arg(long, default_value = "hsd.json")]
    pub config: PathBuf,

    /// Run the startup sequence (§4.11) and validate config/DB
    /// connectivity without starting the scheduler, scan pool,
    /// benchmark worker, or HTTP API. Grounded in Forest's
    /// `halt_after_import`-style early-exit flags.
    #[arg(long)]
    pub dry_run: bool,

    /// Overrides `http_address` from the config file.
    #[arg(long)]
    pub http_address: Option<String>,
}
