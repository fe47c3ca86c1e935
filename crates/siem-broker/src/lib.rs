//! Redis Streams broker client (§6): cursor-mode and consumer-group-mode
//! stream reads, and the sliding-window zset/scalar operations the stream
//! correlator uses for threshold counting and re-alert suppression.

pub mod client;
pub mod config;
mod error;
pub mod keys;

pub use client::{Broker, StreamRecord};
pub use config::BrokerConfig;
pub use error::BrokerError;
