/// Connection parameters for the ClickHouse-backed column store.
///
/// Populated from environment by `siem-config`; kept independent of that
/// crate so `siem-store` has no upward dependency.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub database: String,
    pub timeout_secs: u64,
    pub events_table: String,
    pub alerts_raw_table: String,
    pub alerts_agg_table: String,
}

impl StoreConfig {
    /// The ClickHouse HTTP endpoint this config resolves to.
    pub fn url(&self) -> String {
        format!("http://{}:{}", self.host, self.port)
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8123,
            user: "siem_app".to_string(),
            password: String::new(),
            database: "siem".to_string(),
            timeout_secs: 10,
            events_table: "siem.events".to_string(),
            alerts_raw_table: "siem.alerts_raw".to_string(),
            alerts_agg_table: "siem.alerts_agg".to_string(),
        }
    }
}
