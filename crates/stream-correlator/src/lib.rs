//! Stream correlator core (§4.4): threshold matching, the sliding-window
//! alert decision, and alert-row construction, all pure functions so the
//! worker binary only has to wire them to the broker and store.

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use siem_core::{AlertRaw, AlertSource, AlertStatus};
use siem_core::UemEvent;
use siem_rules::filter_dsl;
use siem_rules::StreamCorrelationRule;
use uuid::Uuid;

/// Returns the entity key this rule correlates on, or `None` if the rule
/// doesn't apply to this event at all (wrong pattern, unparsed expression,
/// no match, or an empty entity field) — §4.4 steps 1–2.
pub fn extract_entity<'a>(rule: &StreamCorrelationRule, event: &'a UemEvent) -> Option<&'a str> {
    if !rule.is_threshold_rule() {
        return None;
    }
    let ast = rule.expression.as_ref()?;
    if !filter_dsl::eval(ast, event) {
        return None;
    }
    let entity = event.get(&rule.entity_field);
    if entity.is_empty() {
        None
    } else {
        Some(entity)
    }
}

/// The sliding-window alert decision (§4.4 steps 4–6 / §8 scenario 5): alert
/// only once the window holds at least `threshold` hits, and only once
/// `window_s` has elapsed since the last alert for this `(rule, entity)`.
pub fn should_alert(size: u64, threshold: u32, last_alert_ts: Option<f64>, now: f64, window_s: u32) -> bool {
    if size < threshold as u64 {
        return false;
    }
    match last_alert_ts {
        Some(last) => now - last >= window_s as f64,
        None => true,
    }
}

/// Builds the `alerts_raw` row emitted when `should_alert` fires (§4.4).
pub fn build_alert_row(rule: &StreamCorrelationRule, entity_key: &str, now: DateTime<Utc>, hits: u32) -> AlertRaw {
    let ts_first = now - ChronoDuration::seconds(i64::from(rule.window_s));
    AlertRaw {
        ts: now,
        alert_id: Uuid::new_v4(),
        rule_id: rule.id,
        rule_name: rule.name.clone(),
        severity: rule.severity.clone(),
        ts_first,
        ts_last: now,
        window_s: rule.window_s,
        entity_key: entity_key.to_string(),
        hits,
        context_json: format!(
            r#"{{"rule_id":{},"entity_key":"{}","description":"{}"}}"#,
            rule.id,
            json_escape(entity_key),
            json_escape(&rule.description),
        ),
        source: AlertSource::Stream,
        status: AlertStatus::Open,
    }
}

fn json_escape(s: &str) -> String {
    s.replace('\\', "\\\\").replace('"', "\\\"")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scenario_5_sliding_window_threshold_and_suppression() {
        // threshold:3, window_s:60
        // events at t=0,10,20: third emits, ts_first = t-60, hits=3
        assert!(!should_alert(1, 3, None, 0.0, 60));
        assert!(!should_alert(2, 3, None, 10.0, 60));
        assert!(should_alert(3, 3, None, 20.0, 60));

        // t=30: within window of last alert (20), no alert even if size=4
        assert!(!should_alert(4, 3, Some(20.0), 30.0, 60));

        // t=80: count=2 after eviction, below threshold
        assert!(!should_alert(2, 3, Some(20.0), 80.0, 60));

        // t=100: count=3, last_alert_ts=20, elapsed 80 > 60 -> new alert
        assert!(should_alert(3, 3, Some(20.0), 100.0, 60));
    }

    #[test]
    fn not_enough_hits_never_alerts() {
        assert!(!should_alert(0, 1, None, 100.0, 60));
    }
}
