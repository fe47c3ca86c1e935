//! `FilterRule` and the tag/drop/pass decision procedure of §4.3.

use crate::filter_dsl::{self, FilterAst};
use siem_core::UemEvent;
use siem_store::rows::FilterRuleRow;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterAction {
    Pass,
    Drop,
    Tag,
}

pub struct FilterRule {
    pub id: u64,
    pub priority: u16,
    pub action: FilterAction,
    pub tags: Vec<String>,
    /// `None` when the rule's expression failed to parse — such a rule
    /// never matches (§4.3: "invalidates only that rule's expression").
    pub expression: Option<FilterAst>,
}

impl FilterRule {
    pub fn from_row(row: FilterRuleRow) -> Self {
        let action = match row.action.as_str() {
            "drop" => FilterAction::Drop,
            "tag" => FilterAction::Tag,
            _ => FilterAction::Pass,
        };
        let tags: Vec<String> = serde_json::from_str(&row.tags).unwrap_or_default();
        let expression = filter_dsl::parse_or_log(row.id, &row.expr);

        Self {
            id: row.id,
            priority: row.priority,
            action,
            tags,
            expression,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterDecision {
    Pass,
    Drop,
    Tag,
}

/// The decision procedure of §4.3/§8: iterate rules in `(priority, id)`
/// order (the caller is responsible for supplying them already sorted),
/// applying drop/tag/pass semantics. Pure in `(event, rules)`.
pub fn decide(rules: &[FilterRule], event: &mut UemEvent) -> FilterDecision {
    let mut accumulated_tags: Vec<&str> = Vec::new();

    for rule in rules {
        let Some(ast) = &rule.expression else {
            continue;
        };
        if !filter_dsl::eval(ast, event) {
            continue;
        }
        match rule.action {
            FilterAction::Drop => return FilterDecision::Drop,
            FilterAction::Tag => {
                accumulated_tags.extend(rule.tags.iter().map(String::as_str));
                break;
            }
            FilterAction::Pass => break,
        }
    }

    if accumulated_tags.is_empty() {
        FilterDecision::Pass
    } else {
        for tag in accumulated_tags {
            event.append_tag(tag);
        }
        FilterDecision::Tag
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rule(id: u64, priority: u16, action: FilterAction, tags: &[&str], expr: &str) -> FilterRule {
        FilterRule {
            id,
            priority,
            action,
            tags: tags.iter().map(|s| s.to_string()).collect(),
            expression: filter_dsl::parse_or_log(id, expr),
        }
    }

    fn event_with(field: &str, value: &str) -> UemEvent {
        let mut e = UemEvent::new();
        e.set(field, value);
        e
    }

    #[test]
    fn scenario_3_first_tag_rule_stops_iteration() {
        let rules = vec![
            rule(1, 1, FilterAction::Tag, &["a"], "x == '1'"),
            rule(2, 2, FilterAction::Tag, &["b"], "x == '1'"),
        ];
        let mut event = event_with("x", "1");
        let decision = decide(&rules, &mut event);
        assert_eq!(decision, FilterDecision::Tag);
        assert_eq!(event.get("tags"), "a");
    }

    #[test]
    fn scenario_4_drop_precedence_depends_on_priority_order() {
        let rules = vec![
            rule(1, 1, FilterAction::Tag, &["a"], "x=='1'"),
            rule(2, 2, FilterAction::Drop, &[], "x=='1'"),
        ];
        let mut event = event_with("x", "1");
        assert_eq!(decide(&rules, &mut event), FilterDecision::Tag);

        let swapped = vec![
            rule(2, 1, FilterAction::Drop, &[], "x=='1'"),
            rule(1, 2, FilterAction::Tag, &["a"], "x=='1'"),
        ];
        let mut event2 = event_with("x", "1");
        assert_eq!(decide(&swapped, &mut event2), FilterDecision::Drop);
    }

    #[test]
    fn unmatched_rules_result_in_plain_pass() {
        let rules = vec![rule(1, 1, FilterAction::Drop, &[], "x=='nope'")];
        let mut event = event_with("x", "1");
        assert_eq!(decide(&rules, &mut event), FilterDecision::Pass);
    }

    #[test]
    fn null_ast_rule_is_skipped() {
        let rules = vec![rule(1, 1, FilterAction::Drop, &[], "")];
        assert!(rules[0].expression.is_none());
        let mut event = event_with("x", "1");
        assert_eq!(decide(&rules, &mut event), FilterDecision::Pass);
    }
}
