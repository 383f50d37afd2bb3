use async_trait::async_trait;
use deadpool_redis::{Config, Pool, Runtime};
use redis::AsyncCommands;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use shared_config::AppConfig;

use crate::error::EventBusError;
use crate::models::AppointmentEvent;

/// Outbound seam for appointment domain events. Callers treat publishing as
/// fire-and-forget; a failed publish must never fail the mutation it follows.
#[async_trait]
pub trait DomainEventPublisher: Send + Sync {
    async fn publish(&self, event: &AppointmentEvent) -> Result<(), EventBusError>;
}

/// Publishes events to Redis pub/sub, one channel per routing key.
pub struct RedisEventPublisher {
    pool: Option<Pool>,
}

impl RedisEventPublisher {
    /// Pool creation is lazy and infallible from the caller's view: with a
    /// bad Redis URL the publisher still constructs and every publish
    /// reports `Unavailable`.
    pub fn new(config: &AppConfig) -> Self {
        let cfg = Config::from_url(config.redis_url.clone());
        let pool = match cfg.create_pool(Some(Runtime::Tokio1)) {
            Ok(pool) => Some(pool),
            Err(e) => {
                warn!("Failed to create Redis pool, events will be dropped: {}", e);
                None
            }
        };

        Self { pool }
    }
}

#[async_trait]
impl DomainEventPublisher for RedisEventPublisher {
    async fn publish(&self, event: &AppointmentEvent) -> Result<(), EventBusError> {
        let Some(pool) = &self.pool else {
            return Err(EventBusError::Unavailable("no Redis pool".to_string()));
        };

        let payload = serde_json::to_string(event)?;
        let mut conn = pool.get().await
            .map_err(|e| EventBusError::Unavailable(e.to_string()))?;

        let _: () = conn.publish(event.kind.routing_key(), payload).await?;

        debug!("Published {} event for appointment {}", event.kind, event.appointment_id);
        Ok(())
    }
}

/// Captures events in memory instead of publishing them. Used by service
/// tests to assert on emission counts and payloads.
#[derive(Default)]
pub struct RecordingEventPublisher {
    events: Mutex<Vec<AppointmentEvent>>,
}

impl RecordingEventPublisher {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn events(&self) -> Vec<AppointmentEvent> {
        self.events.lock().await.clone()
    }
}

#[async_trait]
impl DomainEventPublisher for RecordingEventPublisher {
    async fn publish(&self, event: &AppointmentEvent) -> Result<(), EventBusError> {
        self.events.lock().await.push(event.clone());
        Ok(())
    }
}
