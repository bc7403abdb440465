//! `hsd`, the HostScore benchmarking daemon binary. Mirrors
//! `forest/daemon/src/main.rs`'s shape: parse flags, load config, set up
//! logging, then hand off to the lifecycle controller and translate its
//! result into a process exit code.

mod consensus_client;
mod exit;
mod lifecycle;
mod market;
mod rate_source;
mod token_bucket;
mod wallet;

use clap::Parser;
use hsd_cli::{Cli, Config, LogConfig, Secrets};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let mut config = match Config::load(&cli.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("configuration error: {e}");
            std::process::exit(exit::ExitCode::Configuration.code());
        }
    };
    if let Some(http_address) = &cli.http_address {
        config.http_address = http_address.clone();
    }

    hsd_cli::setup_logger(&LogConfig::default());

    let secrets = match Secrets::from_env() {
        Ok(secrets) => secrets,
        Err(e) => {
            log::error!("{e}");
            std::process::exit(exit::ExitCode::Configuration.code());
        }
    };

    let code = lifecycle::run(config, secrets, cli.dry_run).await;
    std::process::exit(code.code());
}
