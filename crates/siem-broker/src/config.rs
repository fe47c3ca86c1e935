use std::time::Duration;

/// Connection parameters for the Redis Streams broker.
///
/// Populated from environment (`SIEM_REDIS_*`) by `siem-config`; kept
/// independent of that crate so `siem-broker` has no upward dependency.
#[derive(Debug, Clone)]
pub struct BrokerConfig {
    pub host: String,
    pub port: u16,
    pub db: i64,
    pub password: Option<String>,
    pub pool_size: usize,
    pub connection_timeout: Duration,
    /// Approximate cap applied to every `XADD` via `MAXLEN ~`, so streams
    /// don't grow unbounded when a downstream consumer falls behind.
    pub stream_maxlen: usize,
}

impl Default for BrokerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 6379,
            db: 0,
            password: None,
            pool_size: 10,
            connection_timeout: Duration::from_secs(5),
            stream_maxlen: 100_000,
        }
    }
}

impl BrokerConfig {
    pub fn url(&self) -> String {
        match &self.password {
            Some(password) => format!(
                "redis://:{password}@{host}:{port}/{db}",
                password = password,
                host = self.host,
                port = self.port,
                db = self.db
            ),
            None => format!("redis://{host}:{port}/{db}", host = self.host, port = self.port, db = self.db),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn url_without_password() {
        let cfg = BrokerConfig::default();
        assert_eq!(cfg.url(), "redis://127.0.0.1:6379/0");
    }

    #[test]
    fn url_with_password() {
        let cfg = BrokerConfig {
            password: Some("secret".to_string()),
            ..BrokerConfig::default()
        };
        assert_eq!(cfg.url(), "redis://:secret@127.0.0.1:6379/0");
    }
}
