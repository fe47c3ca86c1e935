use async_trait::async_trait;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkerStatus {
    Healthy,
    Degraded,
    Unhealthy,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerHealth {
    pub worker_id: String,
    pub status: WorkerStatus,
}

/// Where health pings go. §5's process-lifecycle requirement only calls for
/// the ping loop to run, not for a concrete health-ping broker topic, so the
/// default sink just logs; a binary that wants health pings published
/// somewhere else can supply its own.
#[async_trait]
pub trait HealthSink: Send + Sync {
    async fn report(&self, health: WorkerHealth);
}

pub struct LoggingHealthSink;

#[async_trait]
impl HealthSink for LoggingHealthSink {
    async fn report(&self, health: WorkerHealth) {
        tracing::info!(
            worker = %health.worker_id,
            status = ?health.status,
            "health ping"
        );
    }
}
