//! ClickHouse-backed column store. Thin typed wrapper over the `clickhouse`
//! crate's insert/query API, grounded on this pack's existing ClickHouse
//! audit store: one insert per batch, explicit column lists on select,
//! string-escaped SQL for anything built by substitution.

use crate::config::StoreConfig;
use crate::error::StoreError;
use crate::migrations;
use crate::rows::{
    AlertRawInsertRow, BatchCorrRuleRow, EventInsertRow, FilterRuleRow, NormalizerRuleRow,
    StreamCorrRuleRow,
};
use siem_core::AlertRaw;

pub struct ColumnStore {
    client: clickhouse::Client,
    config: StoreConfig,
}

impl ColumnStore {
    /// Connect and run migrations (idempotent `CREATE TABLE IF NOT EXISTS`).
    pub async fn connect(config: StoreConfig) -> Result<Self, StoreError> {
        let client = clickhouse::Client::default()
            .with_url(config.url())
            .with_user(&config.user)
            .with_password(&config.password)
            .with_database(&config.database)
            .with_option("max_execution_time", config.timeout_secs.to_string());

        migrations::run_migrations(&client).await?;

        Ok(Self { client, config })
    }

    /// Bulk-insert a batch of events. A single insert call per batch, per
    /// §4.5 step 2.
    pub async fn insert_events(&self, rows: &[EventInsertRow]) -> Result<(), StoreError> {
        if rows.is_empty() {
            return Ok(());
        }
        let mut insert = self.client.insert(&self.config.events_table)?;
        for row in rows {
            insert.write(row).await?;
        }
        insert.end().await?;
        Ok(())
    }

    /// Bulk-insert a batch of raw alerts, as produced by the stream
    /// correlator.
    pub async fn insert_alerts_raw(&self, alerts: &[AlertRaw]) -> Result<(), StoreError> {
        if alerts.is_empty() {
            return Ok(());
        }
        let rows: Vec<AlertRawInsertRow> = alerts.iter().map(Into::into).collect();
        let mut insert = self.client.insert(&self.config.alerts_raw_table)?;
        for row in &rows {
            insert.write(row).await?;
        }
        insert.end().await?;
        Ok(())
    }

    /// Execute a batch-correlation rule's templated SQL as-is (already
    /// `{WINDOW_S}`-substituted by the caller).
    pub async fn execute_batch_correlation(&self, sql: &str) -> Result<(), StoreError> {
        self.client.query(sql).execute().await?;
        Ok(())
    }

    /// Rebuild `alerts_agg` from `alerts_raw`: truncate then
    /// `INSERT ... SELECT ... GROUP BY`, per §4.7. Not transactional across
    /// the pair — readers may briefly observe an empty table.
    pub async fn rebuild_alerts_agg(&self) -> Result<(), StoreError> {
        let agg = &self.config.alerts_agg_table;
        let raw = &self.config.alerts_raw_table;

        self.client
            .query(&format!("TRUNCATE TABLE {agg}"))
            .execute()
            .await?;

        let insert_sql = format!(
            "INSERT INTO {agg} \
             (ts, agg_id, rule_id, rule_name, severity_agg, ts_first, ts_last, \
              count_alerts, unique_entities, entity_key, group_key_json, samples_json, status) \
             SELECT now64(3), generateUUIDv4(), rule_id, any(rule_name), max(severity), \
                    min(ts_first), max(ts_last), count(*), uniqExact(entity_key), entity_key, \
                    concat('{{\"entity_key\":\"', entity_key, '\"}}'), \
                    concat('[', arrayStringConcat(arraySlice(groupArray(context_json), 1, 3), ','), ']'), \
                    if(countIf(status = 'open') > 0, 'open', 'closed') \
             FROM {raw} GROUP BY rule_id, entity_key"
        );

        self.client.query(&insert_sql).execute().await?;
        Ok(())
    }

    pub async fn fetch_normalizer_rules(&self) -> Result<Vec<NormalizerRuleRow>, StoreError> {
        let sql =
            "SELECT id, priority, source_type, event_matcher, uem_mapping FROM normalizer_rules \
             WHERE enabled = 1 ORDER BY priority ASC, id ASC";
        Ok(self.client.query(sql).fetch_all::<NormalizerRuleRow>().await?)
    }

    pub async fn fetch_filter_rules(&self) -> Result<Vec<FilterRuleRow>, StoreError> {
        let sql = "SELECT id, priority, action, tags, expr FROM filter_rules \
                   WHERE enabled = 1 ORDER BY priority ASC, id ASC";
        Ok(self.client.query(sql).fetch_all::<FilterRuleRow>().await?)
    }

    pub async fn fetch_stream_correlation_rules(
        &self,
    ) -> Result<Vec<StreamCorrRuleRow>, StoreError> {
        let sql = "SELECT id, name, description, severity, pattern, window_s, threshold, expr, \
                   entity_field FROM correlation_rules_stream WHERE enabled = 1 ORDER BY id ASC";
        Ok(self
            .client
            .query(sql)
            .fetch_all::<StreamCorrRuleRow>()
            .await?)
    }

    pub async fn fetch_batch_correlation_rules(&self) -> Result<Vec<BatchCorrRuleRow>, StoreError> {
        let sql = "SELECT id, name, window_s, sql_template FROM correlation_rules_batch \
                   WHERE enabled = 1 ORDER BY id ASC";
        Ok(self.client.query(sql).fetch_all::<BatchCorrRuleRow>().await?)
    }
}
