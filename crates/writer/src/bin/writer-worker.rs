//! writer-worker — bulk insert into `events` (§4.1 consumer-group mode, §4.5).

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use clap::Parser;
use siem_core::UemEvent;
use tokio::sync::Mutex;
use tracing::{error, info};

use siem_broker::Broker;
use siem_config::{GlobalConfig, StageDefaults, StageSettings, StreamKeys};
use siem_runtime::{RuntimeError, Worker, WorkerBuilder, WorkerRunner};
use siem_store::ColumnStore;
use writer::build_event_row;

#[derive(Parser, Debug)]
#[command(name = "writer-worker", version, about)]
struct Cli {
    #[arg(long, env = "SIEM_HEALTH_INTERVAL_SEC", default_value_t = 30)]
    health_interval: u64,

    #[arg(long, env = "SIEM_SHUTDOWN_TIMEOUT_SEC", default_value_t = 5)]
    shutdown_timeout: u64,
}

struct WriterWorker {
    broker: Arc<Broker>,
    store: Arc<ColumnStore>,
    streams: StreamKeys,
    settings: StageSettings,
    consume_handle: Mutex<Option<tokio::task::JoinHandle<()>>>,
}

impl WriterWorker {
    async fn consume_loop(broker: Arc<Broker>, store: Arc<ColumnStore>, streams: StreamKeys, settings: StageSettings) {
        if let Err(err) = broker.ensure_group(&streams.filtered, &settings.group).await {
            error!(error = %err, "failed to create writer consumer group");
        }

        loop {
            let records = match broker
                .read_group(
                    &streams.filtered,
                    &settings.group,
                    &settings.consumer,
                    settings.batch_size,
                    settings.block_ms,
                )
                .await
            {
                Ok(records) => records,
                Err(err) => {
                    error!(error = %err, "broker read failed, retrying");
                    tokio::time::sleep(Duration::from_secs(1)).await;
                    continue;
                }
            };

            if records.is_empty() {
                continue;
            }

            let now = Utc::now();
            let rows: Vec<_> = records
                .iter()
                .map(|record| {
                    let event = UemEvent::from_map(record.fields.iter().cloned().collect());
                    build_event_row(&event, now)
                })
                .collect();

            match store.insert_events(&rows).await {
                Ok(()) => {
                    let ids: Vec<String> = records.into_iter().map(|r| r.id).collect();
                    if let Err(err) = broker.ack(&streams.filtered, &settings.group, &ids).await {
                        error!(error = %err, "failed to ack writer batch");
                    }
                }
                Err(err) => {
                    error!(error = %err, count = rows.len(), "failed to insert events, batch will be redelivered");
                }
            }
        }
    }
}

#[async_trait]
impl Worker for WriterWorker {
    async fn start(&self) -> Result<(), RuntimeError> {
        let handle = tokio::spawn(Self::consume_loop(
            self.broker.clone(),
            self.store.clone(),
            self.streams.clone(),
            self.settings.clone(),
        ));
        *self.consume_handle.lock().await = Some(handle);
        info!("writer worker started");
        Ok(())
    }

    async fn stop(&self) -> Result<(), RuntimeError> {
        if let Some(handle) = self.consume_handle.lock().await.take() {
            handle.abort();
        }
        info!("writer worker stopped");
        Ok(())
    }

    fn name(&self) -> &str {
        "writer-worker"
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    siem_config::load_dotenv();
    let global = GlobalConfig::from_env();
    siem_logging::init(&global.log_level);

    let cli = Cli::parse();

    let broker_config = siem_config::broker_config_from_env();
    let store_config = siem_config::store_config_from_env();
    let streams = StreamKeys::from_env();
    let settings = StageSettings::from_env("writer", &StageDefaults::WRITER);

    let broker = Arc::new(Broker::connect(&broker_config)?);
    let store = Arc::new(ColumnStore::connect(store_config).await?);

    let worker = Arc::new(WriterWorker {
        broker,
        store,
        streams,
        settings,
        consume_handle: Mutex::new(None),
    });

    let config = WorkerBuilder::new(global.instance_name.clone())
        .health_interval(Duration::from_secs(cli.health_interval))
        .shutdown_timeout(Duration::from_secs(cli.shutdown_timeout))
        .build();

    WorkerRunner::run(worker, config, None).await?;
    Ok(())
}
