//! `StreamCorrelationRule`: threshold correlation rules consumed by the
//! stream correlator, sharing the filter DSL's AST and evaluator.

use crate::filter_dsl::{self, FilterAst};
use siem_store::rows::StreamCorrRuleRow;

pub struct StreamCorrelationRule {
    pub id: u64,
    pub name: String,
    pub description: String,
    pub severity: String,
    pub pattern: String,
    pub window_s: u32,
    pub threshold: u32,
    pub entity_field: String,
    /// `None` when the expression failed to parse; such a rule never
    /// matches any event (§9: "`matches_rule` returns false if the AST is
    /// absent").
    pub expression: Option<FilterAst>,
}

impl StreamCorrelationRule {
    pub fn from_row(row: StreamCorrRuleRow) -> Self {
        let expression = filter_dsl::parse_or_log(row.id, &row.expr);
        Self {
            id: row.id,
            name: row.name,
            description: row.description,
            severity: row.severity,
            pattern: row.pattern,
            window_s: row.window_s.max(1),
            threshold: row.threshold.max(1),
            entity_field: row.entity_field,
            expression,
        }
    }

    /// Only `pattern == "threshold"` rules currently participate; other
    /// pattern values are reserved for future correlation strategies (§4.4
    /// supplement) and are not an error.
    pub fn is_threshold_rule(&self) -> bool {
        self.pattern == "threshold"
    }
}
