use thiserror::Error;

/// Column-store failures. Every variant is a transport/schema failure per
/// the error-handling table — callers decide retry/skip/ack policy, this
/// type only carries the "what happened".
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("clickhouse error: {0}")]
    ClickHouse(#[from] clickhouse::error::Error),

    #[error("malformed row: {0}")]
    MalformedRow(String),
}
