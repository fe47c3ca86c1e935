//! ClickHouse-backed column store: event/alert writes, rule-table reads,
//! and the periodic batch-correlation / alerts-aggregation SQL operations.

pub mod client;
pub mod config;
mod error;
mod migrations;
pub mod rows;

pub use client::ColumnStore;
pub use config::StoreConfig;
pub use error::StoreError;
