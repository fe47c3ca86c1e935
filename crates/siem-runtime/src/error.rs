use thiserror::Error;

#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("worker start failed: {0}")]
    Start(String),

    #[error("worker stop failed: {0}")]
    Stop(String),
}
