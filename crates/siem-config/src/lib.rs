//! Environment-driven configuration (§6): every worker reads its settings
//! through this crate so the `SIEM_*` variable contract lives in one place
//! instead of being re-parsed by each binary.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use siem_broker::BrokerConfig;
use siem_store::StoreConfig;

fn env_string(name: &str, default: &str) -> String {
    std::env::var(name).unwrap_or_else(|_| default.to_string())
}

fn env_parsed<T: FromStr>(name: &str, default: T) -> T {
    std::env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

/// Loads a `.env` file if present (local-development convenience; §6 notes
/// this is not required since configuration is env-only in production).
pub fn load_dotenv() {
    let _ = dotenvy::dotenv();
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Dev,
    Stage,
    Prod,
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Environment::Dev => "dev",
            Environment::Stage => "stage",
            Environment::Prod => "prod",
        };
        f.write_str(s)
    }
}

impl FromStr for Environment {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "dev" => Ok(Environment::Dev),
            "stage" => Ok(Environment::Stage),
            "prod" => Ok(Environment::Prod),
            _ => Err(()),
        }
    }
}

/// Settings every worker binary reads regardless of which stage it is.
#[derive(Debug, Clone)]
pub struct GlobalConfig {
    pub env: Environment,
    pub instance_name: String,
    pub log_level: String,
}

impl GlobalConfig {
    pub fn from_env() -> Self {
        Self {
            env: std::env::var("SIEM_ENV")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(Environment::Dev),
            instance_name: env_string("SIEM_INSTANCE_NAME", "siem-worker"),
            log_level: env_string("SIEM_LOG_LEVEL", "info"),
        }
    }
}

/// Stream key overrides for the three named logs the pipeline chains
/// stages through.
#[derive(Debug, Clone)]
pub struct StreamKeys {
    pub raw: String,
    pub normalized: String,
    pub filtered: String,
}

impl StreamKeys {
    pub fn from_env() -> Self {
        Self {
            raw: env_string("SIEM_RAW_STREAM_KEY", "raw"),
            normalized: env_string("SIEM_NORMALIZED_STREAM_KEY", "normalized"),
            filtered: env_string("SIEM_FILTERED_STREAM_KEY", "filtered"),
        }
    }
}

/// Default batch size / block timeout for one stage, before env overrides
/// are applied (§4.1's documented per-stage defaults).
pub struct StageDefaults {
    pub batch_size: usize,
    pub block_ms: usize,
}

impl StageDefaults {
    pub const NORMALIZER: StageDefaults = StageDefaults {
        batch_size: 100,
        block_ms: 5_000,
    };
    pub const FILTER: StageDefaults = StageDefaults {
        batch_size: 100,
        block_ms: 5_000,
    };
    pub const WRITER: StageDefaults = StageDefaults {
        batch_size: 100,
        block_ms: 2_000,
    };
    pub const STREAM_CORR: StageDefaults = StageDefaults {
        batch_size: 200,
        block_ms: 2_000,
    };
}

/// Per-stage settings read from `SIEM_<STAGE>_*` (§6). `last_id_key` is
/// only meaningful for cursor-mode stages (normalizer, filter); group-mode
/// stages (writer, stream correlator) use `group`/`consumer` instead.
#[derive(Debug, Clone)]
pub struct StageSettings {
    pub group: String,
    pub consumer: String,
    pub batch_size: usize,
    pub block_ms: usize,
    pub last_id_key: String,
}

impl StageSettings {
    pub fn from_env(stage: &str, defaults: &StageDefaults) -> Self {
        let upper = stage.to_uppercase();
        Self {
            group: env_string(&format!("SIEM_{upper}_GROUP"), stage),
            consumer: env_string(
                &format!("SIEM_{upper}_CONSUMER"),
                &format!("{stage}-0"),
            ),
            batch_size: env_parsed(&format!("SIEM_{upper}_BATCH_SIZE"), defaults.batch_size),
            block_ms: env_parsed(&format!("SIEM_{upper}_BLOCK_MS"), defaults.block_ms),
            last_id_key: format!("siem:cursor:{stage}:last_id"),
        }
    }
}

/// Periodic-stage tick intervals (batch correlator, alerts aggregator).
#[derive(Debug, Clone)]
pub struct IntervalConfig {
    pub batch_correlator: Duration,
    pub alerts_aggregator: Duration,
}

impl IntervalConfig {
    pub fn from_env() -> Self {
        Self {
            batch_correlator: Duration::from_secs(env_parsed(
                "SIEM_BATCH_CORR_INTERVAL_SEC",
                60,
            )),
            alerts_aggregator: Duration::from_secs(env_parsed(
                "SIEM_ALERTS_AGG_INTERVAL_SEC",
                30,
            )),
        }
    }
}

pub fn broker_config_from_env() -> BrokerConfig {
    let defaults = BrokerConfig::default();
    BrokerConfig {
        host: env_string("SIEM_REDIS_HOST", &defaults.host),
        port: env_parsed("SIEM_REDIS_PORT", defaults.port),
        db: env_parsed("SIEM_REDIS_DB", defaults.db),
        password: std::env::var("SIEM_REDIS_PASSWORD").ok(),
        ..defaults
    }
}

pub fn store_config_from_env() -> StoreConfig {
    let defaults = StoreConfig::default();
    StoreConfig {
        host: env_string("SIEM_CH_HOST", &defaults.host),
        port: env_parsed("SIEM_CH_PORT", defaults.port),
        user: env_string("SIEM_CH_USER", &defaults.user),
        password: env_string("SIEM_CH_PASSWORD", &defaults.password),
        database: env_string("SIEM_CH_DB", &defaults.database),
        timeout_secs: env_parsed("SIEM_CH_TIMEOUT_SECS", defaults.timeout_secs),
        events_table: env_string("SIEM_EVENTS_TABLE", &defaults.events_table),
        alerts_raw_table: env_string("SIEM_ALERTS_RAW_TABLE", &defaults.alerts_raw_table),
        alerts_agg_table: env_string("SIEM_ALERTS_AGG_TABLE", &defaults.alerts_agg_table),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn environment_parses_known_values() {
        assert_eq!("dev".parse::<Environment>(), Ok(Environment::Dev));
        assert_eq!("prod".parse::<Environment>(), Ok(Environment::Prod));
        assert!("bogus".parse::<Environment>().is_err());
    }

    #[test]
    fn stage_settings_fall_back_to_defaults() {
        let settings = StageSettings::from_env("test_stage_xyz", &StageDefaults::FILTER);
        assert_eq!(settings.batch_size, 100);
        assert_eq!(settings.block_ms, 5_000);
        assert_eq!(settings.group, "test_stage_xyz");
    }
}
