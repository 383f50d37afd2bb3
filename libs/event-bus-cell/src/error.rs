use thiserror::Error;

#[derive(Error, Debug)]
pub enum EventBusError {
    #[error("Event bus unavailable: {0}")]
    Unavailable(String),

    #[error("Redis connection error: {0}")]
    RedisError(#[from] redis::RedisError),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}
