//! Filter stage core (§4.3): applies the tag/drop/pass decision procedure
//! to one event, owned here only to keep the worker binary free of the
//! decision logic itself (which lives in `siem_rules::filter_rule`).

use siem_core::UemEvent;
use siem_rules::{decide, FilterDecision, FilterRule};

/// Runs the decision procedure against `event`, mutating it in place when
/// tags accumulate (§4.3 step 6), and returns the resulting decision.
pub fn apply(rules: &[FilterRule], event: &mut UemEvent) -> FilterDecision {
    decide(rules, event)
}

#[cfg(test)]
mod tests {
    use super::*;
    use siem_store::rows::FilterRuleRow;

    fn rule(id: u64, priority: u16, action: &str, tags: &str, expr: &str) -> FilterRule {
        FilterRule::from_row(FilterRuleRow {
            id,
            priority,
            action: action.to_string(),
            tags: tags.to_string(),
            expr: expr.to_string(),
        })
    }

    #[test]
    fn drop_decision_short_circuits() {
        let rules = vec![rule(1, 1, "drop", "[]", "x=='1'")];
        let mut event = UemEvent::new();
        event.set("x", "1");
        assert_eq!(apply(&rules, &mut event), FilterDecision::Drop);
    }

    #[test]
    fn tag_decision_writes_tags_field() {
        let rules = vec![rule(1, 1, "tag", r#"["suspicious"]"#, "x=='1'")];
        let mut event = UemEvent::new();
        event.set("x", "1");
        assert_eq!(apply(&rules, &mut event), FilterDecision::Tag);
        assert_eq!(event.get("tags"), "suspicious");
    }
}
