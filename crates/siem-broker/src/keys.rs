//! Fixed Redis key templates used by the stream correlator (§4.4), kept in
//! one place so the naming stays consistent between the window counter and
//! its companion suppression scalar.

/// `siem:stream_corr:rule:{rule_id}:ent:{entity_key}` — the ordered set of
/// `(message_id, arrival_time)` backing the sliding-window count.
pub fn window_key(rule_id: u64, entity_key: &str) -> String {
    format!("siem:stream_corr:rule:{rule_id}:ent:{entity_key}")
}

/// `siem:stream_corr:last_alert:{rule_id}:{entity_key}` — the last time
/// this `(rule, entity)` pair fired, used for re-alert suppression.
pub fn last_alert_key(rule_id: u64, entity_key: &str) -> String {
    format!("siem:stream_corr:last_alert:{rule_id}:{entity_key}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_window_key() {
        assert_eq!(window_key(7, "host-1"), "siem:stream_corr:rule:7:ent:host-1");
    }

    #[test]
    fn renders_last_alert_key() {
        assert_eq!(
            last_alert_key(7, "host-1"),
            "siem:stream_corr:last_alert:7:host-1"
        );
    }
}
