use thiserror::Error;

#[derive(Debug, Error)]
pub enum BrokerError {
    #[error("redis pool error: {0}")]
    Pool(#[from] deadpool_redis::PoolError),

    #[error("redis config error: {0}")]
    Config(#[from] deadpool_redis::CreatePoolError),

    #[error("redis command failed: {0}")]
    Command(#[from] redis::RedisError),
}
