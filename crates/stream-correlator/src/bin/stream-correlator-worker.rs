//! stream-correlator-worker — threshold correlation over a sliding window
//! (§4.1 consumer-group mode, §4.4).

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use clap::Parser;
use siem_core::{AlertRaw, UemEvent};
use tokio::sync::Mutex;
use tracing::{error, info, warn};

use siem_broker::{keys, Broker};
use siem_config::{GlobalConfig, StageDefaults, StageSettings, StreamKeys};
use siem_rules::{load_stream_correlation_rules, RuleSet, StreamCorrelationRule};
use siem_runtime::{RuntimeError, Worker, WorkerBuilder, WorkerRunner};
use siem_store::ColumnStore;
use stream_correlator::{build_alert_row, extract_entity, should_alert};

const RELOAD_INTERVAL: Duration = Duration::from_secs(60);

#[derive(Parser, Debug)]
#[command(name = "stream-correlator-worker", version, about)]
struct Cli {
    #[arg(long, env = "SIEM_HEALTH_INTERVAL_SEC", default_value_t = 30)]
    health_interval: u64,

    #[arg(long, env = "SIEM_SHUTDOWN_TIMEOUT_SEC", default_value_t = 5)]
    shutdown_timeout: u64,
}

struct StreamCorrelatorWorker {
    broker: Arc<Broker>,
    store: Arc<ColumnStore>,
    rules: Arc<RuleSet<StreamCorrelationRule>>,
    streams: StreamKeys,
    settings: StageSettings,
    consume_handle: Mutex<Option<tokio::task::JoinHandle<()>>>,
    reload_handle: Mutex<Option<tokio::task::JoinHandle<()>>>,
}

impl StreamCorrelatorWorker {
    async fn consume_loop(
        broker: Arc<Broker>,
        store: Arc<ColumnStore>,
        rules: Arc<RuleSet<StreamCorrelationRule>>,
        streams: StreamKeys,
        settings: StageSettings,
    ) {
        if let Err(err) = broker.ensure_group(&streams.filtered, &settings.group).await {
            error!(error = %err, "failed to create stream correlator consumer group");
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

            let mut alerts: Vec<AlertRaw> = Vec::new();
            let now_dt = Utc::now();
            let now = now_dt.timestamp_millis() as f64 / 1000.0;

            for record in &records {
                let event = UemEvent::from_map(record.fields.iter().cloned().collect());
                let current_rules = rules.load();

                for rule in current_rules.iter() {
                    let Some(entity_key) = extract_entity(rule, &event) else {
                        continue;
                    };

                    let window_key = keys::window_key(rule.id, entity_key);
                    let last_alert_key = keys::last_alert_key(rule.id, entity_key);

                    if let Err(err) = broker.window_add(&window_key, &record.id, now).await {
                        error!(error = %err, "failed to record window arrival");
                        continue;
                    }
                    let cutoff = now - f64::from(rule.window_s);
                    if let Err(err) = broker.window_trim(&window_key, cutoff).await {
                        warn!(error = %err, "failed to evict expired window members");
                    }
                    let size = match broker.window_count(&window_key).await {
                        Ok(size) => size,
                        Err(err) => {
                            error!(error = %err, "failed to read window size");
                            continue;
                        }
                    };
                    let last_alert_ts = match broker.get_scalar(&last_alert_key).await {
                        Ok(value) => value.and_then(|v| v.parse::<f64>().ok()),
                        Err(err) => {
                            error!(error = %err, "failed to read last alert timestamp");
                            None
                        }
                    };

                    if !should_alert(size, rule.threshold, last_alert_ts, now, rule.window_s) {
                        continue;
                    }

                    if let Err(err) = broker.set_scalar(&last_alert_key, &now.to_string()).await {
                        warn!(error = %err, "failed to persist last alert timestamp");
                    }

                    alerts.push(build_alert_row(rule, entity_key, now_dt, size as u32));
                }
            }

            let insert_ok = match store.insert_alerts_raw(&alerts).await {
                Ok(()) => true,
                Err(err) => {
                    error!(error = %err, count = alerts.len(), "failed to insert stream alerts, batch will be redelivered");
                    false
                }
            };

            if insert_ok {
                let ids: Vec<String> = records.into_iter().map(|r| r.id).collect();
                if let Err(err) = broker.ack(&streams.filtered, &settings.group, &ids).await {
                    error!(error = %err, "failed to ack stream correlator batch");
                }
            }
        }
    }
}

#[async_trait]
impl Worker for StreamCorrelatorWorker {
    async fn start(&self) -> Result<(), RuntimeError> {
        let consume_handle = tokio::spawn(Self::consume_loop(
            self.broker.clone(),
            self.store.clone(),
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
                async move { load_stream_correlation_rules(&store).await }
            },
        ));
        *self.reload_handle.lock().await = Some(reload_handle);

        info!("stream correlator worker started");
        Ok(())
    }

    async fn stop(&self) -> Result<(), RuntimeError> {
        if let Some(handle) = self.consume_handle.lock().await.take() {
            handle.abort();
        }
        if let Some(handle) = self.reload_handle.lock().await.take() {
            handle.abort();
        }
        info!("stream correlator worker stopped");
        Ok(())
    }

    fn name(&self) -> &str {
        "stream-correlator-worker"
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
    let settings = StageSettings::from_env("stream_corr", &StageDefaults::STREAM_CORR);

    let broker = Arc::new(Broker::connect(&broker_config)?);
    let store = Arc::new(ColumnStore::connect(store_config).await?);

    let initial_rules = load_stream_correlation_rules(&store).await?;
    info!(count = initial_rules.len(), "loaded stream correlation rules");
    let rules = Arc::new(RuleSet::new(initial_rules));

    let worker = Arc::new(StreamCorrelatorWorker {
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
