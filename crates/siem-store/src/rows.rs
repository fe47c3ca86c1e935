//! Wire row shapes for ClickHouse inserts and rule-table selects. Kept
//! separate from `siem_core`'s domain types (`UemEvent`, `AlertRaw`, ...) so
//! the domain crate never depends on the ClickHouse driver, matching this
//! pack's split between an audit-record domain type and its ClickHouse row.

use chrono::{DateTime, Utc};
use siem_core::AlertRaw;

/// Row layout for `events`, built by the writer from a UEM event.
#[derive(clickhouse::Row, serde::Serialize)]
pub struct EventInsertRow {
    #[serde(with = "clickhouse::serde::chrono::datetime64::millis")]
    pub ts: DateTime<Utc>,
    pub event_id: String,
    pub category: String,
    pub subcategory: String,
    pub src_ip: u32,
    pub dst_ip: u32,
    pub src_port: u16,
    pub dst_port: u16,
    pub device_vendor: String,
    pub device_product: String,
    pub log_source: String,
    pub severity: String,
    pub message: String,
}

/// Row layout for `alerts_raw`, shared by the stream correlator and the
/// batch correlator's idempotent `INSERT ... SELECT` statements don't go
/// through this type — only the stream correlator's Rust-built rows do.
#[derive(clickhouse::Row, serde::Serialize)]
pub struct AlertRawInsertRow {
    #[serde(with = "clickhouse::serde::chrono::datetime64::millis")]
    pub ts: DateTime<Utc>,
    pub alert_id: String,
    pub rule_id: u64,
    pub rule_name: String,
    pub severity: String,
    #[serde(with = "clickhouse::serde::chrono::datetime64::millis")]
    pub ts_first: DateTime<Utc>,
    #[serde(with = "clickhouse::serde::chrono::datetime64::millis")]
    pub ts_last: DateTime<Utc>,
    pub window_s: u32,
    pub entity_key: String,
    pub hits: u32,
    pub context_json: String,
    pub source: String,
    pub status: String,
}

impl From<&AlertRaw> for AlertRawInsertRow {
    fn from(alert: &AlertRaw) -> Self {
        Self {
            ts: alert.ts,
            alert_id: alert.alert_id.to_string(),
            rule_id: alert.rule_id,
            rule_name: alert.rule_name.clone(),
            severity: alert.severity.clone(),
            ts_first: alert.ts_first,
            ts_last: alert.ts_last,
            window_s: alert.window_s,
            entity_key: alert.entity_key.clone(),
            hits: alert.hits,
            context_json: alert.context_json.clone(),
            source: alert.source.as_str().to_string(),
            status: alert.status.as_str().to_string(),
        }
    }
}

/// `normalizer_rules` select row.
#[derive(clickhouse::Row, serde::Deserialize)]
pub struct NormalizerRuleRow {
    pub id: u64,
    pub priority: u16,
    pub source_type: String,
    pub event_matcher: String,
    pub uem_mapping: String,
}

/// `filter_rules` select row.
#[derive(clickhouse::Row, serde::Deserialize)]
pub struct FilterRuleRow {
    pub id: u64,
    pub priority: u16,
    pub action: String,
    pub tags: String,
    pub expr: String,
}

/// `correlation_rules_stream` select row.
#[derive(clickhouse::Row, serde::Deserialize)]
pub struct StreamCorrRuleRow {
    pub id: u64,
    pub name: String,
    pub description: String,
    pub severity: String,
    pub pattern: String,
    pub window_s: u32,
    pub threshold: u32,
    pub expr: String,
    pub entity_field: String,
}

/// `correlation_rules_batch` select row.
#[derive(clickhouse::Row, serde::Deserialize)]
pub struct BatchCorrRuleRow {
    pub id: u64,
    pub name: String,
    pub window_s: u32,
    pub sql_template: String,
}
