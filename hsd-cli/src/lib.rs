//! Configuration, CLI flags, secrets, and logger setup — the "global
//! command-line config + env state" §9 REDESIGN FLAGS calls for
//! isolating into an explicit config value rather than module-level
//! singletons (the logger sink is the one exception it names).

pub mod cli;
pub mod config;
pub mod logger;
pub mod secret;
pub mod secrets;

pub use cli::Cli;
pub use config::{Config, NetworkConfig};
pub use logger::{setup_logger, LogConfig, LogValue};
pub use secret::Secret;
pub use secrets::{MissingSecret, Secrets};
