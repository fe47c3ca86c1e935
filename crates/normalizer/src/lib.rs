//! Raw→UEM normalization core (§4.2): pick the first enabled rule and apply
//! its mapping, independent of how the raw event arrived.

use siem_core::{RawEvent, UemEvent};
use siem_rules::NormalizerRule;

/// Normalizes one raw event against an ordered rule list. Returns `None`
/// when there is no enabled rule at all, which the caller logs at debug and
/// drops (§4.2).
pub fn normalize(rules: &[NormalizerRule], raw: &RawEvent) -> Option<UemEvent> {
    let rule = rules.first()?;
    Some(rule.apply(raw))
}

#[cfg(test)]
mod tests {
    use super::*;
    use siem_store::rows::NormalizerRuleRow;

    fn rule(id: u64, mapping_json: &str) -> NormalizerRule {
        NormalizerRule::from_row(NormalizerRuleRow {
            id,
            priority: 1,
            source_type: "http_json".to_string(),
            event_matcher: String::new(),
            uem_mapping: mapping_json.to_string(),
        })
    }

    #[test]
    fn no_rules_means_drop() {
        let mut raw = RawEvent::new();
        raw.insert("source_type".into(), "http_json".into());
        assert!(normalize(&[], &raw).is_none());
    }

    #[test]
    fn first_rule_wins() {
        let rules = vec![rule(1, r#"{"tag":"source_type"}"#), rule(2, "{}")];
        let mut raw = RawEvent::new();
        raw.insert("source_type".into(), "syslog".into());
        raw.insert("message".into(), "m".into());

        let event = normalize(&rules, &raw).unwrap();
        assert_eq!(event.get("tag"), "syslog");
    }
}
