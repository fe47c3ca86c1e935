//! batch-correlator-worker — periodic SQL-driven correlation (§4.6).
//!
//! No broker, no in-memory state: every tick loads the enabled rule set
//! fresh, substitutes `{WINDOW_S}`, and executes each statement against the
//! column store.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use clap::Parser;
use tokio::sync::Mutex;
use tracing::{error, info};

use batch_correlator::{run_tick, BatchExecutor};
use siem_config::{GlobalConfig, IntervalConfig};
use siem_rules::load_batch_correlation_rules;
use siem_runtime::{RuntimeError, Worker, WorkerBuilder, WorkerRunner};
use siem_store::{ColumnStore, StoreError};

#[derive(Parser, Debug)]
#[command(name = "batch-correlator-worker", version, about)]
struct Cli {
    #[arg(long, env = "SIEM_HEALTH_INTERVAL_SEC", default_value_t = 30)]
    health_interval: u64,

    #[arg(long, env = "SIEM_SHUTDOWN_TIMEOUT_SEC", default_value_t = 5)]
    shutdown_timeout: u64,
}

#[async_trait]
impl BatchExecutor for ColumnStore {
    type Error = StoreError;

    async fn execute(&self, sql: &str) -> Result<(), Self::Error> {
        self.execute_batch_correlation(sql).await
    }
}

struct BatchCorrelatorWorker {
    store: Arc<ColumnStore>,
    interval: Duration,
    tick_handle: Mutex<Option<tokio::task::JoinHandle<()>>>,
}

impl BatchCorrelatorWorker {
    async fn tick_loop(store: Arc<ColumnStore>, interval: Duration) {
        let mut ticker = tokio::time::interval(interval);
        loop {
            ticker.tick().await;

            let rules = match load_batch_correlation_rules(&store).await {
                Ok(rules) => rules,
                Err(err) => {
                    error!(error = %err, "failed to load batch correlation rules, skipping tick");
                    continue;
                }
            };

            let succeeded = run_tick(store.as_ref(), &rules).await;
            info!(total = rules.len(), succeeded, "batch correlation tick complete");
        }
    }
}

#[async_trait]
impl Worker for BatchCorrelatorWorker {
    async fn start(&self) -> Result<(), RuntimeError> {
        let handle = tokio::spawn(Self::tick_loop(self.store.clone(), self.interval));
        *self.tick_handle.lock().await = Some(handle);
        info!("batch correlator worker started");
        Ok(())
    }

    async fn stop(&self) -> Result<(), RuntimeError> {
        if let Some(handle) = self.tick_handle.lock().await.take() {
            handle.abort();
        }
        info!("batch correlator worker stopped");
        Ok(())
    }

    fn name(&self) -> &str {
        "batch-correlator-worker"
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    siem_config::load_dotenv();
    let global = GlobalConfig::from_env();
    siem_logging::init(&global.log_level);

    let cli = Cli::parse();

    let store_config = siem_config::store_config_from_env();
    let intervals = IntervalConfig::from_env();

    let store = Arc::new(ColumnStore::connect(store_config).await?);

    let worker = Arc::new(BatchCorrelatorWorker {
        store,
        interval: intervals.batch_correlator,
        tick_handle: Mutex::new(None),
    });

    let config = WorkerBuilder::new(global.instance_name.clone())
        .health_interval(Duration::from_secs(cli.health_interval))
        .shutdown_timeout(Duration::from_secs(cli.shutdown_timeout))
        .build();

    WorkerRunner::run(worker, config, None).await?;
    Ok(())
}
