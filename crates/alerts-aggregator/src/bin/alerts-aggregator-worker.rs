//! alerts-aggregator-worker — periodic `alerts_agg` rebuild (§4.7).

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use clap::Parser;
use tokio::sync::Mutex;
use tracing::info;

use alerts_aggregator::{run_tick, AggregateRebuilder};
use siem_config::{GlobalConfig, IntervalConfig};
use siem_runtime::{RuntimeError, Worker, WorkerBuilder, WorkerRunner};
use siem_store::{ColumnStore, StoreError};

#[derive(Parser, Debug)]
#[command(name = "alerts-aggregator-worker", version, about)]
struct Cli {
    #[arg(long, env = "SIEM_HEALTH_INTERVAL_SEC", default_value_t = 30)]
    health_interval: u64,

    #[arg(long, env = "SIEM_SHUTDOWN_TIMEOUT_SEC", default_value_t = 5)]
    shutdown_timeout: u64,
}

#[async_trait]
impl AggregateRebuilder for ColumnStore {
    type Error = StoreError;

    async fn rebuild(&self) -> Result<(), Self::Error> {
        self.rebuild_alerts_agg().await
    }
}

struct AlertsAggregatorWorker {
    store: Arc<ColumnStore>,
    interval: Duration,
    tick_handle: Mutex<Option<tokio::task::JoinHandle<()>>>,
}

impl AlertsAggregatorWorker {
    async fn tick_loop(store: Arc<ColumnStore>, interval: Duration) {
        let mut ticker = tokio::time::interval(interval);
        loop {
            ticker.tick().await;
            let ok = run_tick(store.as_ref()).await;
            info!(ok, "alerts_agg rebuild tick complete");
        }
    }
}

#[async_trait]
impl Worker for AlertsAggregatorWorker {
    async fn start(&self) -> Result<(), RuntimeError> {
        let handle = tokio::spawn(Self::tick_loop(self.store.clone(), self.interval));
        *self.tick_handle.lock().await = Some(handle);
        info!("alerts aggregator worker started");
        Ok(())
    }

    async fn stop(&self) -> Result<(), RuntimeError> {
        if let Some(handle) = self.tick_handle.lock().await.take() {
            handle.abort();
        }
        info!("alerts aggregator worker stopped");
        Ok(())
    }

    fn name(&self) -> &str {
        "alerts-aggregator-worker"
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

    let worker = Arc::new(AlertsAggregatorWorker {
        store,
        interval: intervals.alerts_aggregator,
        tick_handle: Mutex::new(None),
    });

    let config = WorkerBuilder::new(global.instance_name.clone())
        .health_interval(Duration::from_secs(cli.health_interval))
        .shutdown_timeout(Duration::from_secs(cli.shutdown_timeout))
        .build();

    WorkerRunner::run(worker, config, None).await?;
    Ok(())
}
