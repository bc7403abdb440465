use thiserror::Error;

/// Errors surfaced by the external consensus collaborator (§1: out of
/// scope, consumed as a black box) or by tip persistence.
#[derive(Debug, Error)]
pub enum ChainError {
    #[error("consensus client error: {0}")]
    Consensus(String),
    #[error("sql error: {0}")]
    Sql(#[from] sqlx::Error),
    #[error("decode error: {0}")]
    Decode(String),
}
