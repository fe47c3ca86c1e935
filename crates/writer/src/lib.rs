//! Writer core (§4.5): builds one `events` row from a UEM event, applying
//! the field-mapping and fallback-chain rules. Pure and testable —
//! separated from the worker binary's broker/store plumbing.

use chrono::{DateTime, Utc};
use siem_core::UemEvent;
use siem_store::rows::EventInsertRow;
use std::net::Ipv4Addr;
use std::str::FromStr;
use uuid::Uuid;

/// Builds an `events` row from one UEM event (§4.5 step 1).
pub fn build_event_row(event: &UemEvent, now: DateTime<Utc>) -> EventInsertRow {
    EventInsertRow {
        ts: now,
        event_id: Uuid::new_v4().to_string(),
        category: event.get("event.category").to_string(),
        subcategory: event.get("event.type").to_string(),
        src_ip: ipv4_to_u32(event.get("source.ip")),
        dst_ip: ipv4_to_u32(event.get("destination.ip")),
        src_port: parse_port(event.get("source.port")),
        dst_port: parse_port(event.get("destination.port")),
        device_vendor: first_non_empty(&[event.get("device.vendor"), event.provider()]),
        device_product: first_non_empty(&[event.get("device.product"), event.provider()]),
        log_source: first_non_empty(&[event.get("log_source"), event.get("host.name"), event.get("source.ip")]),
        severity: {
            let value = first_non_empty(&[event.get("event.severity"), event.get("severity"), event.get("log.level")]);
            if value.is_empty() {
                "info".to_string()
            } else {
                value
            }
        },
        message: event.original().to_string(),
    }
}

fn first_non_empty(candidates: &[&str]) -> String {
    candidates
        .iter()
        .find(|v| !v.is_empty())
        .map(|v| v.to_string())
        .unwrap_or_default()
}

fn ipv4_to_u32(addr: &str) -> u32 {
    Ipv4Addr::from_str(addr).map(u32::from).unwrap_or(0)
}

fn parse_port(port: &str) -> u16 {
    port.parse().unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap()
    }

    #[test]
    fn scenario_6_ipv4_conversion() {
        let mut event = UemEvent::new();
        event.set("source.ip", "10.0.0.1");
        let row = build_event_row(&event, now());
        assert_eq!(row.src_ip, 167_772_161);

        let mut bad = UemEvent::new();
        bad.set("source.ip", "bad");
        let row = build_event_row(&bad, now());
        assert_eq!(row.src_ip, 0);
    }

    #[test]
    fn device_vendor_falls_back_to_provider() {
        let mut event = UemEvent::new();
        event.set("event.provider", "syslog");
        let row = build_event_row(&event, now());
        assert_eq!(row.device_vendor, "syslog");
        assert_eq!(row.device_product, "syslog");
    }

    #[test]
    fn severity_falls_back_through_chain_to_info() {
        let event = UemEvent::new();
        let row = build_event_row(&event, now());
        assert_eq!(row.severity, "info");

        let mut with_log_level = UemEvent::new();
        with_log_level.set("log.level", "warn");
        let row = build_event_row(&with_log_level, now());
        assert_eq!(row.severity, "warn");
    }

    #[test]
    fn log_source_falls_back_to_host_then_source_ip() {
        let mut event = UemEvent::new();
        event.set("host.name", "host-1");
        let row = build_event_row(&event, now());
        assert_eq!(row.log_source, "host-1");
    }
}
