//! A small JMESPath-equivalent path-extraction expression, compiled once at
//! rule load and evaluated against a flat [`RawEvent`](siem_core::RawEvent).
//!
//! Supported forms: a bare identifier (`source_type`), a dot-path
//! (`source.ip`), and identifiers whose raw field name itself contains dots
//! (`host.name` stored verbatim as one flat key rather than nested). Since
//! raw events are flat string maps, a dotted expression first tries the
//! literal dotted string as one opaque key; only if that misses, and the
//! expression has more than one segment, does it treat the first segment as
//! a JSON-encoded blob and traverse the remaining segments into it. This
//! lets the same expression language serve both "the field really is named
//! `source.ip`" and "the field `source` holds a nested JSON object with an
//! `ip` member" without the rule author needing to know which.

use crate::error::RuleError;
use siem_core::RawEvent;

/// A compiled path expression. Construction validates the grammar once;
/// evaluation never fails (a missing path yields `None`, per spec).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathExpr {
    raw: String,
    segments: Vec<String>,
}

impl PathExpr {
    /// Compile `expr`. Errors on empty input or a segment that is empty
    /// (e.g. a leading/trailing/doubled dot).
    pub fn compile(expr: &str) -> Result<Self, RuleError> {
        let trimmed = expr.trim();
        if trimmed.is_empty() {
            return Err(RuleError::PathParse("empty path expression".to_string()));
        }
        let segments: Vec<String> = trimmed.split('.').map(str::to_string).collect();
        if segments.iter().any(|s| s.is_empty()) {
            return Err(RuleError::PathParse(format!(
                "empty segment in path expression '{trimmed}'"
            )));
        }
        Ok(Self {
            raw: trimmed.to_string(),
            segments,
        })
    }

    /// Evaluate against a raw event, returning the extracted string value
    /// or `None` if the path does not resolve.
    pub fn eval(&self, raw_event: &RawEvent) -> Option<String> {
        if let Some(v) = raw_event.get(self.raw.as_str()) {
            return Some(v.clone());
        }
        if self.segments.len() < 2 {
            return None;
        }
        let (head, tail) = self.segments.split_first()?;
        let blob = raw_event.get(head.as_str())?;
        let mut value: serde_json::Value = serde_json::from_str(blob).ok()?;
        for seg in tail {
            value = value.get(seg)?.clone();
        }
        match value {
            serde_json::Value::String(s) => Some(s),
            serde_json::Value::Null => None,
            other => Some(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn raw(pairs: &[(&str, &str)]) -> RawEvent {
        let mut map = HashMap::new();
        for (k, v) in pairs {
            map.insert(k.to_string(), v.to_string());
        }
        RawEvent::from_map(map)
    }

    #[test]
    fn resolves_top_level_field() {
        let expr = PathExpr::compile("source_type").unwrap();
        let event = raw(&[("source_type", "http_json")]);
        assert_eq!(expr.eval(&event).as_deref(), Some("http_json"));
    }

    #[test]
    fn resolves_opaque_dotted_key_before_nesting() {
        let expr = PathExpr::compile("source.ip").unwrap();
        let event = raw(&[("source.ip", "10.0.0.1")]);
        assert_eq!(expr.eval(&event).as_deref(), Some("10.0.0.1"));
    }

    #[test]
    fn falls_back_to_nested_json_traversal() {
        let expr = PathExpr::compile("source.ip").unwrap();
        let event = raw(&[("source", r#"{"ip":"10.0.0.2"}"#)]);
        assert_eq!(expr.eval(&event).as_deref(), Some("10.0.0.2"));
    }

    #[test]
    fn missing_path_yields_none() {
        let expr = PathExpr::compile("nope").unwrap();
        let event = raw(&[]);
        assert_eq!(expr.eval(&event), None);
    }

    #[test]
    fn empty_expression_is_a_compile_error() {
        assert!(PathExpr::compile("").is_err());
        assert!(PathExpr::compile("a..b").is_err());
    }
}
