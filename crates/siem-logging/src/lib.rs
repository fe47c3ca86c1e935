//! Structured JSON logging (§6), matching the teacher's
//! `tracing_subscriber::fmt()...with_env_filter(...).init()` convention,
//! generalized to a custom formatter producing the exact
//! `{level, logger, message, ...extras}` shape the interface names.

mod formatter;

pub use formatter::SiemJsonFormatter;

/// Initializes the global `tracing` subscriber. `log_level` is the fallback
/// used when `RUST_LOG` is unset (§6: `SIEM_LOG_LEVEL`, default `info`).
pub fn init(log_level: &str) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level.to_string()));

    tracing_subscriber::fmt()
        .event_format(SiemJsonFormatter)
        .with_env_filter(filter)
        .init();
}
