//! Evaluator for [`FilterAst`] against a flat event map. Shared, unmodified,
//! between the filter stage and the stream correlator — see §4.4 of
//! SPEC_FULL.md.

use super::ast::{CmpOp, FilterAst};
use std::collections::HashMap;

/// Field lookup treats the whole name as a flat key; a missing key reads as
/// the empty string rather than failing evaluation (per spec, a missing
/// field simply never equals a non-empty literal).
pub fn eval(ast: &FilterAst, event: &HashMap<String, String>) -> bool {
    match ast {
        FilterAst::Cmp { field, op, literal } => {
            let value = event.get(field).map(String::as_str).unwrap_or("");
            match op {
                CmpOp::Eq => value == literal,
                CmpOp::Ne => value != literal,
            }
        }
        FilterAst::And(left, right) => eval(left, event) && eval(right, event),
        FilterAst::Or(left, right) => eval(left, event) || eval(right, event),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter_dsl::parser::parse;

    fn event(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn missing_field_reads_as_empty_string() {
        let ast = parse("x == ''").unwrap();
        assert!(eval(&ast, &event(&[])));
    }

    #[test]
    fn and_short_circuits_like_normal_boolean_and() {
        let ast = parse("x == '1' and y == '2'").unwrap();
        assert!(eval(&ast, &event(&[("x", "1"), ("y", "2")])));
        assert!(!eval(&ast, &event(&[("x", "1"), ("y", "3")])));
    }

    #[test]
    fn not_equal_matches_when_different() {
        let ast = parse("x != '1'").unwrap();
        assert!(eval(&ast, &event(&[("x", "2")])));
        assert!(!eval(&ast, &event(&[("x", "1")])));
    }
}
