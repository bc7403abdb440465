//! Secret material, §6 Configuration: carried exclusively via
//! environment variables, read once at startup, never folded into the
//! JSON config struct.

use crate::secret::Secret;
use thiserror::Error;

pub const ENV_API_PASSWORD: &str = "HSD_API_PASSWORD";
pub const ENV_DB_PASSWORD: &str = "HSD_DB_PASSWORD";
pub const ENV_WALLET_SEED: &str = "HSD_WALLET_SEED";
pub const ENV_WALLET_SEED_ZEN: &str = "HSD_WALLET_SEED_ZEN";

#[derive(Debug, Error)]
#[error("missing required environment variable {0}")]
pub struct MissingSecret(pub &'static str);

pub struct Secrets {
    pub api_password: Secret,
    pub db_password: Secret,
    pub wallet_seed: Secret,
    pub wallet_seed_zen: Secret,
}

impl Secrets {
    /// Reads every secret from the environment. `HSD_API_PASSWORD` is
    /// required (it gates the HTTP API, §6); the wallet seeds and DB
    /// password default to empty so local/dry-run setups that don't
    /// need them don't have to fake values.
    pub fn from_env() -> Result<Self, MissingSecret> {
        let api_password = std::env::var(ENV_API_PASSWORD).map_err(|_| MissingSecret(ENV_API_PASSWORD))?;
        Ok(Self {
            api_password: Secret::new(api_password),
            db_password: Secret::new(std::env::var(ENV_DB_PASSWORD).unwrap_or_default()),
            wallet_seed: Secret::new(std::env::var(ENV_WALLET_SEED).unwrap_or_default()),
            wallet_seed_zen: Secret::new(std::env::var(ENV_WALLET_SEED_ZEN).unwrap_or_default()),
        })
    }
}
