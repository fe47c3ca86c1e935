//! Worker lifecycle scaffolding shared by every stage binary: health pings,
//! signal-driven graceful shutdown, and the `Worker` trait they hang off of
//! (§5 "Process lifecycle").

mod error;
mod health;
mod worker;

pub use error::RuntimeError;
pub use health::{HealthSink, LoggingHealthSink, WorkerHealth, WorkerStatus};
pub use worker::{Worker, WorkerBuilder, WorkerRunner, WorkerRunnerConfig};
