//! normalizer-worker — raw→UEM normalization stage (§4.1 cursor mode, §4.2).

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use clap::Parser;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

use normalizer::normalize;
use siem_broker::Broker;
use siem_config::{GlobalConfig, StageDefaults, StageSettings, StreamKeys};
use siem_core::RawEvent;
use siem_rules::{load_normalizer_rules, NormalizerRule, RuleSet};
use siem_runtime::{RuntimeError, Worker, WorkerBuilder, WorkerRunner};
use siem_store::ColumnStore;

#[derive(Parser, Debug)]
#[command(name = "normalizer-worker", version, about)]
struct Cli {
    /// Health ping interval in seconds.
    #[arg(long, env = "SIEM_HEALTH_INTERVAL_SEC", default_value_t = 30)]
    health_interval: u64,

    /// Shutdown timeout in seconds.
    #[arg(long, env = "SIEM_SHUTDOWN_TIMEOUT_SEC", default_value_t = 5)]
    shutdown_timeout: u64,
}

struct NormalizerWorker {
    broker: Arc<Broker>,
    rules: Arc<RuleSet<NormalizerRule>>,
    streams: StreamKeys,
    settings: StageSettings,
    consume_handle: Mutex<Option<tokio::task::JoinHandle<()>>>,
}

impl NormalizerWorker {
    async fn consume_loop(
        broker: Arc<Broker>,
        rules: Arc<RuleSet<NormalizerRule>>,
        streams: StreamKeys,
        settings: StageSettings,
    ) {
        loop {
            let last_id = match broker.get_cursor(&settings.last_id_key).await {
                Ok(Some(id)) => id,
                Ok(None) => "0-0".to_string(),
                Err(err) => {
                    error!(error = %err, "failed to read normalizer cursor, retrying");
                    tokio::time::sleep(Duration::from_secs(1)).await;
                    continue;
                }
            };

            let records = match broker
                .read_after(&streams.raw, &last_id, settings.batch_size, settings.block_ms)
                .await
            {
                Ok(records) => records,
                Err(err) => {
                    error!(error = %err, "broker read failed, retrying");
                    tokio::time::sleep(Duration::from_secs(1)).await;
                    continue;
                }
            };

            for record in records {
                let raw = RawEvent::from_map(record.fields.into_iter().collect());
                let current_rules = rules.load();

                match normalize(&current_rules, &raw) {
                    Some(event) => {
                        let fields: Vec<(String, String)> = event.into_map().into_iter().collect();
                        let refs: Vec<(&str, &str)> =
                            fields.iter().map(|(k, v)| (k.as_str(), v.as_str())).collect();
                        if let Err(err) = broker.publish(&streams.normalized, &refs).await {
                            error!(error = %err, "failed to publish normalized event");
                        }
                    }
                    None => {
                        debug!(id = %record.id, "dropped raw event: no enabled normalizer rule");
                    }
                }

                if let Err(err) = broker.set_cursor(&settings.last_id_key, &record.id).await {
                    warn!(error = %err, "failed to advance normalizer cursor");
                }
            }
        }
    }
}

#[async_trait]
impl Worker for NormalizerWorker {
    async fn start(&self) -> Result<(), RuntimeError> {
        let handle = tokio::spawn(Self::consume_loop(
            self.broker.clone(),
            self.rules.clone(),
            self.streams.clone(),
            self.settings.clone(),
        ));
        *self.consume_handle.lock().await = Some(handle);
        info!("normalizer worker started");
        Ok(())
    }

    async fn stop(&self) -> Result<(), RuntimeError> {
        if let Some(handle) = self.consume_handle.lock().await.take() {
            handle.abort();
        }
        info!("normalizer worker stopped");
        Ok(())
    }

    fn name(&self) -> &str {
        "normalizer-worker"
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
    let settings = StageSettings::from_env("normalizer", &StageDefaults::NORMALIZER);

    let broker = Arc::new(Broker::connect(&broker_config)?);
    let store = ColumnStore::connect(store_config).await?;

    // Startup-only reload (§4.2, §9 REDESIGN FLAGS: periodic reload not implemented).
    let initial_rules = load_normalizer_rules(&store).await?;
    info!(count = initial_rules.len(), "loaded normalizer rules");
    let rules = Arc::new(RuleSet::new(initial_rules));

    let worker = Arc::new(NormalizerWorker {
        broker,
        rules,
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
