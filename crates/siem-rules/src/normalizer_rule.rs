//! `NormalizerRule`: rule load and mapping-expression evaluation for the
//! raw→UEM pass.

use crate::path::PathExpr;
use siem_core::{RawEvent, UemEvent};
use siem_store::rows::NormalizerRuleRow;
use std::collections::HashMap;

/// One compiled mapping entry. Compile failures exclude only this entry —
/// never the whole rule — per §4.2.
struct Mapping {
    uem_field: String,
    expr: PathExpr,
}

pub struct NormalizerRule {
    pub id: u64,
    pub priority: u16,
    pub source_type: String,
    /// Reserved, never evaluated. See §9's open-question resolution: it is
    /// round-tripped from the rule store and nothing else.
    pub event_matcher: String,
    mappings: Vec<Mapping>,
}

impl NormalizerRule {
    /// Build from a rule-store row. `uem_mapping` is a JSON object of
    /// `{uem_field: path_expression}`; each expression is compiled
    /// independently so one bad entry doesn't exclude the rest.
    pub fn from_row(row: NormalizerRuleRow) -> Self {
        let raw_mapping: HashMap<String, String> =
            serde_json::from_str(&row.uem_mapping).unwrap_or_default();

        let mut mappings = Vec::with_capacity(raw_mapping.len());
        for (uem_field, expr_text) in raw_mapping {
            match PathExpr::compile(&expr_text) {
                Ok(expr) => mappings.push(Mapping { uem_field, expr }),
                Err(err) => {
                    tracing::error!(
                        rule_id = row.id,
                        uem_field = %uem_field,
                        error = %err,
                        "failed to compile normalizer mapping expression, excluding field"
                    );
                }
            }
        }

        Self {
            id: row.id,
            priority: row.priority,
            source_type: row.source_type,
            event_matcher: row.event_matcher,
            mappings,
        }
    }

    /// Apply this rule's mapping to a raw event, then fill the
    /// `event.provider`/`event.original` invariant via defaults.
    pub fn apply(&self, raw: &RawEvent) -> UemEvent {
        let mut event = UemEvent::new();
        for mapping in &self.mappings {
            if let Some(value) = mapping.expr.eval(raw) {
                event.set(mapping.uem_field.clone(), value);
            }
        }
        event.apply_defaults(raw);
        event
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(id: u64, mapping_json: &str) -> NormalizerRuleRow {
        NormalizerRuleRow {
            id,
            priority: 1,
            source_type: "http_json".to_string(),
            event_matcher: String::new(),
            uem_mapping: mapping_json.to_string(),
        }
    }

    #[test]
    fn scenario_1_normalizer_default() {
        let rule = NormalizerRule::from_row(row(1, "{}"));
        let mut raw = RawEvent::new();
        raw.insert("source_type".into(), "http_json".into());
        raw.insert("message".into(), "x".into());

        let event = rule.apply(&raw);
        assert_eq!(event.provider(), "http_json");
        assert_eq!(event.original(), "x");
    }

    #[test]
    fn mapping_extracts_requested_fields_only() {
        let rule = NormalizerRule::from_row(row(1, r#"{"source.ip":"source.ip"}"#));
        let mut raw = RawEvent::new();
        raw.insert("source_type".into(), "syslog".into());
        raw.insert("message".into(), "m".into());
        raw.insert("source.ip".into(), "10.0.0.1".into());
        raw.insert("unrelated".into(), "should not appear".into());

        let event = rule.apply(&raw);
        assert_eq!(event.get("source.ip"), "10.0.0.1");
        assert_eq!(event.get("unrelated"), "");
    }

    #[test]
    fn malformed_single_mapping_expr_excludes_only_that_field() {
        let rule = NormalizerRule::from_row(row(
            1,
            r#"{"good":"source_type", "bad":"a..b"}"#,
        ));
        let mut raw = RawEvent::new();
        raw.insert("source_type".into(), "syslog".into());
        raw.insert("message".into(), "m".into());

        let event = rule.apply(&raw);
        assert_eq!(event.get("good"), "syslog");
        assert_eq!(event.get("bad"), "");
    }
}
