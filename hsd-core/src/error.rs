use thiserror::Error;

/// Error taxonomy shared across crates, §7. Each variant maps to one
/// propagation policy; callers match on the variant to decide whether to
/// log-and-continue or escalate.
#[derive(Debug, Error)]
pub enum HostError {
    #[error("transient network error: {0}")]
    Transient(String),
    #[error("protocol error: {0}")]
    Protocol(String),
    #[error("gouging rejection: {0}")]
    Gouging(String),
    #[error("wallet error: {0}")]
    Wallet(String),
    #[error("sql error: {0}")]
    Sql(String),
    #[error("chain subscriber error: {0}")]
    Chain(String),
    #[error("configuration error: {0}")]
    Config(String),
    #[error("{0}")]
    Other(String),
}

impl HostError {
    /// Whether this error should count against the host's
    /// consecutive-failure counters (protocol + transient do; gouging,
    /// wallet, and infra errors do not, per §7).
    pub fn counts_as_failure(&self) -> bool {
        matches!(self, HostError::Transient(_) | HostError::Protocol(_))
    }
}
