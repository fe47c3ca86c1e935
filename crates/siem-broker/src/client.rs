use deadpool_redis::{Config as RedisConfig, Pool, PoolConfig, Runtime, Timeouts};
use redis::streams::{StreamMaxlen, StreamReadOptions, StreamReadReply};
use redis::AsyncCommands;

use crate::config::BrokerConfig;
use crate::error::BrokerError;

/// One entry read back from a stream: its id (used to ack or advance a
/// cursor) and its flat field map, as written by `publish`.
#[derive(Debug, Clone)]
pub struct StreamRecord {
    pub id: String,
    pub fields: Vec<(String, String)>,
}

/// Thin wrapper over a `deadpool-redis` pool covering the two consume
/// modes (§6: cursor and consumer-group) plus the sliding-window zset and
/// scalar operations the stream correlator needs.
pub struct Broker {
    pool: Pool,
    maxlen: usize,
}

impl Broker {
    pub fn connect(config: &BrokerConfig) -> Result<Self, BrokerError> {
        let mut cfg = RedisConfig::from_url(config.url());
        cfg.pool = Some(PoolConfig {
            max_size: config.pool_size,
            timeouts: Timeouts {
                wait: Some(config.connection_timeout),
                create: Some(config.connection_timeout),
                recycle: Some(config.connection_timeout),
            },
            ..PoolConfig::default()
        });
        let pool = cfg.create_pool(Some(Runtime::Tokio1))?;
        Ok(Self {
            pool,
            maxlen: config.stream_maxlen,
        })
    }

    async fn conn(&self) -> Result<deadpool_redis::Connection, BrokerError> {
        Ok(self.pool.get().await?)
    }

    /// `XADD stream MAXLEN ~ cap * field value [field value ...]`. Returns
    /// the id Redis assigned the entry.
    pub async fn publish(&self, stream: &str, fields: &[(&str, &str)]) -> Result<String, BrokerError> {
        let mut conn = self.conn().await?;
        let id: String = conn
            .xadd_maxlen(stream, StreamMaxlen::Approx(self.maxlen), "*", fields)
            .await?;
        Ok(id)
    }

    /// Cursor-mode read (§6): entries strictly after `last_id`, blocking up
    /// to `block_ms` for at least one to arrive.
    pub async fn read_after(
        &self,
        stream: &str,
        last_id: &str,
        count: usize,
        block_ms: usize,
    ) -> Result<Vec<StreamRecord>, BrokerError> {
        let mut conn = self.conn().await?;
        let opts = StreamReadOptions::default().count(count).block(block_ms);
        let reply: StreamReadReply = conn.xread_options(&[stream], &[last_id], &opts).await?;
        Ok(flatten(reply))
    }

    /// `XGROUP CREATE stream group 0-0 MKSTREAM`. A `BUSYGROUP` reply means
    /// the group already exists, which is the expected steady-state case,
    /// not a failure (§6).
    pub async fn ensure_group(&self, stream: &str, group: &str) -> Result<(), BrokerError> {
        let mut conn = self.conn().await?;
        let result: redis::RedisResult<()> = conn.xgroup_create_mkstream(stream, group, "0-0").await;
        match result {
            Ok(()) => Ok(()),
            Err(err) if err.to_string().contains("BUSYGROUP") => Ok(()),
            Err(err) => Err(err.into()),
        }
    }

    /// Consumer-group read (§6): `XREADGROUP GROUP group consumer COUNT n
    /// BLOCK ms STREAMS stream >`.
    pub async fn read_group(
        &self,
        stream: &str,
        group: &str,
        consumer: &str,
        count: usize,
        block_ms: usize,
    ) -> Result<Vec<StreamRecord>, BrokerError> {
        let mut conn = self.conn().await?;
        let opts = StreamReadOptions::default()
            .group(group, consumer)
            .count(count)
            .block(block_ms);
        let reply: StreamReadReply = conn.xread_options(&[stream], &[">"], &opts).await?;
        Ok(flatten(reply))
    }

    pub async fn ack(&self, stream: &str, group: &str, ids: &[String]) -> Result<(), BrokerError> {
        if ids.is_empty() {
            return Ok(());
        }
        let mut conn = self.conn().await?;
        let _: i64 = conn.xack(stream, group, ids).await?;
        Ok(())
    }

    /// Reads a stage's persisted cursor (§6, cursor-mode writer last_id).
    pub async fn get_cursor(&self, key: &str) -> Result<Option<String>, BrokerError> {
        let mut conn = self.conn().await?;
        Ok(conn.get(key).await?)
    }

    pub async fn set_cursor(&self, key: &str, value: &str) -> Result<(), BrokerError> {
        let mut conn = self.conn().await?;
        let _: () = conn.set(key, value).await?;
        Ok(())
    }

    /// `ZADD key score member` — records one arrival in a sliding window
    /// (§4.4: `siem:stream_corr:rule:{rule_id}:ent:{entity_key}`).
    pub async fn window_add(&self, key: &str, member: &str, score: f64) -> Result<(), BrokerError> {
        let mut conn = self.conn().await?;
        let _: i64 = conn.zadd(key, member, score).await?;
        Ok(())
    }

    /// `ZREMRANGEBYSCORE key -inf max` — evicts arrivals older than the
    /// window's lower bound.
    pub async fn window_trim(&self, key: &str, older_than: f64) -> Result<(), BrokerError> {
        let mut conn = self.conn().await?;
        let _: i64 = conn.zrembyscore(key, f64::NEG_INFINITY, older_than).await?;
        Ok(())
    }

    pub async fn window_count(&self, key: &str) -> Result<u64, BrokerError> {
        let mut conn = self.conn().await?;
        Ok(conn.zcard(key).await?)
    }

    /// Scalar read used for `siem:stream_corr:last_alert:{rule_id}:{entity}`.
    pub async fn get_scalar(&self, key: &str) -> Result<Option<String>, BrokerError> {
        self.get_cursor(key).await
    }

    pub async fn set_scalar(&self, key: &str, value: &str) -> Result<(), BrokerError> {
        self.set_cursor(key, value).await
    }
}

fn flatten(reply: StreamReadReply) -> Vec<StreamRecord> {
    let mut out = Vec::new();
    for key in reply.keys {
        for entry in key.ids {
            let fields = entry
                .map
                .into_iter()
                .filter_map(|(field, value)| match value {
                    redis::Value::BulkString(bytes) => {
                        String::from_utf8(bytes).ok().map(|v| (field, v))
                    }
                    redis::Value::SimpleString(s) => Some((field, s)),
                    _ => None,
                })
                .collect();
            out.push(StreamRecord {
                id: entry.id,
                fields,
            });
        }
    }
    out
}
