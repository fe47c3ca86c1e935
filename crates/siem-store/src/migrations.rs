//! Table creation for the seven tables the pipeline reads or writes:
//! `events`, `alerts_raw`, `alerts_agg`, and the four rule tables.
//!
//! JSON-shaped columns (`uem_mapping`, `tags`, `context_json`, ...) are
//! stored as `String`, the same choice this pack's other ClickHouse-backed
//! store makes, since the native `JSON` column type is still experimental.

use crate::error::StoreError;

pub async fn run_migrations(client: &clickhouse::Client) -> Result<(), StoreError> {
    let statements = [
        "CREATE TABLE IF NOT EXISTS events (
            ts              DateTime64(3, 'UTC'),
            event_id        String,
            category        String,
            subcategory     String,
            src_ip          UInt32,
            dst_ip          UInt32,
            src_port        UInt16,
            dst_port        UInt16,
            device_vendor   String,
            device_product  String,
            log_source      String,
            severity        String,
            message         String
        ) ENGINE = MergeTree() ORDER BY (ts, event_id)",
        "CREATE TABLE IF NOT EXISTS alerts_raw (
            ts              DateTime64(3, 'UTC'),
            alert_id        String,
            rule_id         UInt64,
            rule_name       String,
            severity        String,
            ts_first        DateTime64(3, 'UTC'),
            ts_last         DateTime64(3, 'UTC'),
            window_s        UInt32,
            entity_key      String,
            hits            UInt32,
            context_json    String,
            source          String,
            status          String
        ) ENGINE = MergeTree() ORDER BY (rule_id, entity_key, ts)",
        "CREATE TABLE IF NOT EXISTS alerts_agg (
            ts              DateTime64(3, 'UTC'),
            agg_id          String,
            rule_id         UInt64,
            rule_name       String,
            severity_agg    String,
            ts_first        DateTime64(3, 'UTC'),
            ts_last         DateTime64(3, 'UTC'),
            count_alerts    UInt64,
            unique_entities UInt64,
            entity_key      String,
            group_key_json  String,
            samples_json    String,
            status          String
        ) ENGINE = MergeTree() ORDER BY (rule_id, entity_key)",
        "CREATE TABLE IF NOT EXISTS normalizer_rules (
            id              UInt64,
            priority        UInt16,
            source_type     String,
            event_matcher   String,
            uem_mapping     String,
            enabled         UInt8
        ) ENGINE = MergeTree() ORDER BY (priority, id)",
        "CREATE TABLE IF NOT EXISTS filter_rules (
            id              UInt64,
            priority        UInt16,
            action          String,
            tags            String,
            expr            String,
            enabled         UInt8
        ) ENGINE = MergeTree() ORDER BY (priority, id)",
        "CREATE TABLE IF NOT EXISTS correlation_rules_stream (
            id              UInt64,
            name            String,
            description     String,
            enabled         UInt8,
            severity        String,
            pattern         String,
            window_s        UInt32,
            threshold       UInt32,
            expr            String,
            entity_field    String
        ) ENGINE = MergeTree() ORDER BY id",
        "CREATE TABLE IF NOT EXISTS correlation_rules_batch (
            id              UInt64,
            name            String,
            window_s        UInt32,
            sql_template    String,
            enabled         UInt8
        ) ENGINE = MergeTree() ORDER BY id",
    ];

    for stmt in statements {
        client.query(stmt).execute().await?;
    }

    Ok(())
}
