use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("sql error: {0}")]
    Sql(#[from] sqlx::Error),
    #[error("decode error: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("out-of-order write: incoming modified={incoming} <= current={current}")]
    OutOfOrder { incoming: u64, current: u64 },
    #[error("host not found")]
    NotFound,
    #[error("{0}")]
    Other(String),
}
