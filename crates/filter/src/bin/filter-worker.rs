//! filter-worker — tag/drop/pass decision stage (§4.1 cursor mode, §4.3).

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use clap::Parser;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

use siem_broker::Broker;
use siem_config::{GlobalConfig, StageDefaults, StageSettings, StreamKeys};
use siem_core::UemEvent;
use siem_rules::{load_filter_rules, FilterDecision, FilterRule, RuleSet};
use siem_runtime::{RuntimeError, Worker, WorkerBuilder, WorkerRunner};
use siem_store::ColumnStore;

const RELOAD_INTERVAL: Duration = Duration::from_secs(30);

#[derive(Parser, Debug)]
#[command(name = "filter-worker", version, about)]
struct Cli {
    #[arg(long, env = "SIEM_HEALTH_INTERVAL_SEC", default_value_t = 30)]
    health_interval: u64,

    #[arg(long, env = "SIEM_SHUTDOWN_TIMEOUT_SEC", default_value_t = 5)]
    shutdown_timeout: u64,
}

struct FilterWorker {
    broker: Arc<Broker>,
    store: Arc<ColumnStore>,
    rules: Arc<RuleSet<FilterRule>>,
    streams: StreamKeys,
    settings: StageSettings,
    consume_handle: Mutex<Option<tokio::task::JoinHandle<()>>>,
    reload_handle: Mutex<Option<tokio::task::JoinHandle<()>>>,
}

impl FilterWorker {
    async fn consume_loop(
        broker: Arc<Broker>,
        rules: Arc<RuleSet<FilterRule>>,
        streams: StreamKeys,
        settings: StageSettings,
    ) {
        loop {
            let last_id = match broker.get_cursor(&settings.last_id_key).await {
                Ok(Some(id)) => id,
                Ok(None) => "0-0".to_string(),
                Err(err) => {
                    error!(error = %err, "failed to read filter cursor, retrying");
                    tokio::time::sleep(Duration::from_secs(1)).await;
                    continue;
                }
            };

            let records = match broker
                .read_after(&streams.normalized, &last_id, settings.batch_size, settings.block_ms)
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
                let mut event = UemEvent::from_map(record.fields.into_iter().collect());
                let current_rules = rules.load();
                let decision = filter::apply(&current_rules, &mut event);

                if decision != FilterDecision::Drop {
                    let fields: Vec<(String, String)> = event.into_map().into_iter().collect();
                    let refs: Vec<(&str, &str)> =
                        fields.iter().map(|(k, v)| (k.as_str(), v.as_str())).collect();
                    if let Err(err) = broker.publish(&streams.filtered, &refs).await {
                        error!(error = %err, "failed to publish filtered event");
                    }
                } else {
                    debug!(id = %record.id, "dropped event by filter rule");
                }

                if let Err(err) = broker.set_cursor(&settings.last_id_key, &record.id).await {
                    warn!(error = %err, "failed to advance filter cursor");
                }
            }
        }
    }
}

#[async_trait]
impl Worker for FilterWorker {
    async fn start(&self) -> Result<(), RuntimeError> {
        let consume_handle = tokio::spawn(Self::consume_loop(
            self.broker.clone(),
            self.rules.clone(),
            self.streams.clone(),
            self.settings.clone(),
        ));
        *self.consume_handle.lock().await = Some(consume_handle);

        let rules = self.rules.clone();
        let store = self.store.clone();
        let reload_handle = tokio::spawn(siem_rules::repository::reload_periodically(
            rules,
            RELOAD_INTERVAL,
            move || {
                let store = store.clone();
                async move { load_filter_rules(&store).await }
            },
        ));
        *self.reload_handle.lock().await = Some(reload_handle);

        info!("filter worker started");
        Ok(())
    }

    async fn stop(&self) -> Result<(), RuntimeError> {
        if let Some(handle) = self.consume_handle.lock().await.take() {
            handle.abort();
        }
        if let Some(handle) = self.reload_handle.lock().await.take() {
            handle.abort();
        }
        info!("filter worker stopped");
        Ok(())
    }

    fn name(&self) -> &str {
        "filter-worker"
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
    let settings = StageSettings::from_env("filter", &StageDefaults::FILTER);

    let broker = Arc::new(Broker::connect(&broker_config)?);
    let store = Arc::new(ColumnStore::connect(store_config).await?);

    let initial_rules = load_filter_rules(&store).await?;
    info!(count = initial_rules.len(), "loaded filter rules");
    let rules = Arc::new(RuleSet::new(initial_rules));

    let worker = Arc::new(FilterWorker {
        broker,
        store,
        rules,
        streams,
        settings,
        consume_handle: Mutex::new(None),
        reload_handle: Mutex::new(None),
    });

    let config = WorkerBuilder::new(global.instance_name.clone())
        .health_interval(Duration::from_secs(cli.health_interval))
        .shutdown_timeout(Duration::from_secs(cli.shutdown_timeout))
        .build();

    WorkerRunner::run(worker, config, None).await?;
    Ok(())
}
