//! Worker trait and lifecycle management.
//!
//! Provides the [`Worker`] trait for defining long-running stage processes,
//! [`WorkerBuilder`] for fluent configuration, and [`WorkerRunner`] for
//! executing the lifecycle with automatic health pings and graceful
//! shutdown (§5 "Process lifecycle").

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Notify;
use tracing::{info, warn};

use crate::error::RuntimeError;
use crate::health::{HealthSink, LoggingHealthSink, WorkerHealth, WorkerStatus};

/// A long-running stage process (normalizer, filter, writer, ...).
/// Implementors define their own consume loop startup/shutdown; the
/// [`WorkerRunner`] handles health pings and signal-driven shutdown around
/// it.
#[async_trait]
pub trait Worker: Send + Sync {
    /// Called once when the worker starts. Open connections, spawn the
    /// consume loop, etc.
    async fn start(&self) -> Result<(), RuntimeError>;

    /// Called once during graceful shutdown. Drain in-flight work, close
    /// connections.
    async fn stop(&self) -> Result<(), RuntimeError>;

    /// Human-readable name for this worker (used in health pings and logs).
    fn name(&self) -> &str;
}

/// Fluent builder for a [`WorkerRunnerConfig`].
pub struct WorkerBuilder {
    name: String,
    health_interval: Duration,
    shutdown_timeout: Duration,
    health_sink: Arc<dyn HealthSink>,
}

impl WorkerBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            health_interval: Duration::from_secs(30),
            shutdown_timeout: Duration::from_secs(5),
            health_sink: Arc::new(LoggingHealthSink),
        }
    }

    /// Set the interval between health pings (default: 30s, §5).
    pub fn health_interval(mut self, interval: Duration) -> Self {
        self.health_interval = interval;
        self
    }

    /// Set the maximum time to wait for `stop()` during shutdown (default:
    /// 5s, §5).
    pub fn shutdown_timeout(mut self, timeout: Duration) -> Self {
        self.shutdown_timeout = timeout;
        self
    }

    /// Override where health pings are reported (default: log only).
    pub fn health_sink(mut self, sink: Arc<dyn HealthSink>) -> Self {
        self.health_sink = sink;
        self
    }

    pub fn build(self) -> WorkerRunnerConfig {
        WorkerRunnerConfig {
            name: self.name,
            health_interval: self.health_interval,
            shutdown_timeout: self.shutdown_timeout,
            health_sink: self.health_sink,
        }
    }
}

pub struct WorkerRunnerConfig {
    pub name: String,
    pub health_interval: Duration,
    pub shutdown_timeout: Duration,
    pub health_sink: Arc<dyn HealthSink>,
}

/// Runs a [`Worker`] with automatic health pings and graceful shutdown.
///
/// Manages three concurrent tasks:
/// 1. **Health ping loop** — reports [`WorkerHealth`] at a configured interval
/// 2. **Signal handler** — listens for SIGINT/SIGTERM and initiates shutdown
/// 3. **Worker lifecycle** — calls `start()`, waits for shutdown, then calls `stop()`
pub struct WorkerRunner;

impl WorkerRunner {
    /// Run a worker to completion. Blocks until a shutdown signal is
    /// received or `shutdown_notify` is triggered.
    pub async fn run(
        worker: Arc<dyn Worker>,
        config: WorkerRunnerConfig,
        shutdown_notify: Option<Arc<Notify>>,
    ) -> Result<(), RuntimeError> {
        let worker_name = config.name.clone();
        info!(worker = %worker_name, "starting worker");

        worker.start().await?;
        info!(worker = %worker_name, "worker started");

        Self::report(&*config.health_sink, &worker_name, WorkerStatus::Healthy).await;

        let shutdown = Arc::new(Notify::new());

        let health_shutdown = shutdown.clone();
        let health_sink = config.health_sink.clone();
        let health_name = worker_name.clone();
        let health_interval = config.health_interval;
        let health_handle = tokio::spawn(async move {
            Self::health_loop(&*health_sink, &health_name, health_interval, &health_shutdown).await;
        });

        let external_shutdown = shutdown_notify.clone();
        let sig_shutdown = shutdown.clone();
        let sig_name = worker_name.clone();
        let signal_handle = tokio::spawn(async move {
            Self::wait_for_shutdown(external_shutdown).await;
            info!(worker = %sig_name, "shutdown signal received");
            sig_shutdown.notify_waiters();
        });

        shutdown.notified().await;

        health_handle.abort();
        signal_handle.abort();

        info!(worker = %worker_name, timeout = ?config.shutdown_timeout, "stopping worker");
        match tokio::time::timeout(config.shutdown_timeout, worker.stop()).await {
            Ok(Ok(())) => {
                info!(worker = %worker_name, "worker stopped gracefully");
            }
            Ok(Err(e)) => {
                warn!(worker = %worker_name, error = %e, "worker stop returned error");
            }
            Err(_) => {
                warn!(worker = %worker_name, "worker stop timed out, forcing shutdown");
            }
        }

        Self::report(&*config.health_sink, &worker_name, WorkerStatus::Unhealthy).await;

        info!(worker = %worker_name, "worker shutdown complete");
        Ok(())
    }

    async fn health_loop(sink: &dyn HealthSink, worker_name: &str, interval: Duration, shutdown: &Notify) {
        let mut ticker = tokio::time::interval(interval);
        ticker.tick().await;

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    Self::report(sink, worker_name, WorkerStatus::Healthy).await;
                }
                _ = shutdown.notified() => {
                    break;
                }
            }
        }
    }

    async fn report(sink: &dyn HealthSink, worker_name: &str, status: WorkerStatus) {
        sink.report(WorkerHealth {
            worker_id: worker_name.to_string(),
            status,
        })
        .await;
    }

    async fn wait_for_shutdown(external: Option<Arc<Notify>>) {
        match external {
            Some(notify) => {
                tokio::select! {
                    _ = Self::os_signal() => {}
                    _ = notify.notified() => {}
                }
            }
            None => {
                Self::os_signal().await;
            }
        }
    }

    /// Wait for SIGINT or SIGTERM (Unix) or Ctrl+C (cross-platform fallback).
    async fn os_signal() {
        #[cfg(unix)]
        {
            use tokio::signal::unix::{signal, SignalKind};
            let mut sigint = signal(SignalKind::interrupt()).expect("failed to register SIGINT");
            let mut sigterm = signal(SignalKind::terminate()).expect("failed to register SIGTERM");
            tokio::select! {
                _ = sigint.recv() => {}
                _ = sigterm.recv() => {}
            }
        }

        #[cfg(not(unix))]
        {
            tokio::signal::ctrl_c()
                .await
                .expect("failed to listen for ctrl_c");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
    use tokio::sync::Mutex;

    struct MockSink {
        reports: Mutex<Vec<WorkerHealth>>,
    }

    impl MockSink {
        fn new() -> Self {
            Self {
                reports: Mutex::new(Vec::new()),
            }
        }

        async fn count(&self) -> usize {
            self.reports.lock().await.len()
        }

        async fn last_status(&self) -> Option<WorkerStatus> {
            self.reports.lock().await.last().map(|h| h.status)
        }
    }

    #[async_trait]
    impl HealthSink for MockSink {
        async fn report(&self, health: WorkerHealth) {
            self.reports.lock().await.push(health);
        }
    }

    struct TestWorker {
        started: AtomicBool,
        stopped: AtomicBool,
        start_count: AtomicU32,
        stop_count: AtomicU32,
    }

    impl TestWorker {
        fn new() -> Self {
            Self {
                started: AtomicBool::new(false),
                stopped: AtomicBool::new(false),
                start_count: AtomicU32::new(0),
                stop_count: AtomicU32::new(0),
            }
        }
    }

    #[async_trait]
    impl Worker for TestWorker {
        async fn start(&self) -> Result<(), RuntimeError> {
            self.started.store(true, Ordering::SeqCst);
            self.start_count.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        async fn stop(&self) -> Result<(), RuntimeError> {
            self.stopped.store(true, Ordering::SeqCst);
            self.stop_count.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        fn name(&self) -> &str {
            "test-worker"
        }
    }

    #[tokio::test]
    async fn worker_lifecycle_start_health_stop() {
        let worker = Arc::new(TestWorker::new());
        let sink = Arc::new(MockSink::new());
        let shutdown = Arc::new(Notify::new());

        let config = WorkerBuilder::new("test-worker")
            .health_interval(Duration::from_millis(50))
            .shutdown_timeout(Duration::from_secs(1))
            .health_sink(sink.clone())
            .build();

        let w = worker.clone();
        let s = shutdown.clone();
        let handle = tokio::spawn(async move { WorkerRunner::run(w, config, Some(s)).await });

        tokio::time::sleep(Duration::from_millis(120)).await;
        assert!(worker.started.load(Ordering::SeqCst));

        let count = sink.count().await;
        assert!(count >= 2, "expected >=2 health pings, got {count}");

        shutdown.notify_waiters();

        let result = tokio::time::timeout(Duration::from_secs(5), handle)
            .await
            .expect("runner should complete within timeout")
            .expect("join handle should not panic");
        assert!(result.is_ok());

        assert!(worker.stopped.load(Ordering::SeqCst));
        assert_eq!(worker.start_count.load(Ordering::SeqCst), 1);
        assert_eq!(worker.stop_count.load(Ordering::SeqCst), 1);

        assert_eq!(sink.last_status().await, Some(WorkerStatus::Unhealthy));
    }

    #[test]
    fn worker_builder_defaults() {
        let config = WorkerBuilder::new("default-worker").build();
        assert_eq!(config.name, "default-worker");
        assert_eq!(config.health_interval, Duration::from_secs(30));
        assert_eq!(config.shutdown_timeout, Duration::from_secs(5));
    }
}
