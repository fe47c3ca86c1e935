//! Alert row shapes: `alerts_raw` (emitted by stream/batch correlation) and
//! `alerts_agg` (the periodic rollup).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Which stage produced a raw alert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertSource {
    Stream,
    Batch,
}

impl AlertSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertSource::Stream => "stream",
            AlertSource::Batch => "batch",
        }
    }
}

/// Lifecycle status of an alert (raw or aggregated).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertStatus {
    Open,
    Closed,
}

impl AlertStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertStatus::Open => "open",
            AlertStatus::Closed => "closed",
        }
    }
}

/// A single row destined for `alerts_raw`.
#[derive(Debug, Clone, PartialEq)]
pub struct AlertRaw {
    pub ts: DateTime<Utc>,
    pub alert_id: Uuid,
    pub rule_id: u64,
    pub rule_name: String,
    pub severity: String,
    pub ts_first: DateTime<Utc>,
    pub ts_last: DateTime<Utc>,
    pub window_s: u32,
    pub entity_key: String,
    pub hits: u32,
    pub context_json: String,
    pub source: AlertSource,
    pub status: AlertStatus,
}

/// A rolled-up group of `alerts_raw` rows sharing `(rule_id, entity_key)`.
#[derive(Debug, Clone, PartialEq)]
pub struct AlertAggregate {
    pub agg_id: Uuid,
    pub rule_id: u64,
    pub rule_name: String,
    pub severity_agg: String,
    pub ts_first: DateTime<Utc>,
    pub ts_last: DateTime<Utc>,
    pub count_alerts: u64,
    pub unique_entities: u64,
    pub entity_key: String,
    pub group_key_json: String,
    pub samples_json: String,
    pub status: AlertStatus,
}
