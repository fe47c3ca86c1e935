//! `RawEvent` and `UemEvent`: the two flat, string-keyed record shapes that
//! flow through the pipeline's streams.

use std::collections::HashMap;
use std::ops::{Deref, DerefMut};

/// A record produced by ingress, before normalization.
///
/// Reserved fields: `source` (origin address), `source_type` (e.g.
/// `http_json`, `syslog`), `message` (the original line for line-oriented
/// sources). All other fields are source-specific.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawEvent(HashMap<String, String>);

impl RawEvent {
    pub fn new() -> Self {
        Self(HashMap::new())
    }

    pub fn from_map(fields: HashMap<String, String>) -> Self {
        Self(fields)
    }

    pub fn source_type(&self) -> &str {
        self.0.get("source_type").map(String::as_str).unwrap_or("")
    }

    pub fn message(&self) -> &str {
        self.0.get("message").map(String::as_str).unwrap_or("")
    }

    /// A stringified rendering used as the last-resort fallback for
    /// `event.original` when neither a mapping rule nor `message` supplies
    /// one. Deterministic ordering keeps this reproducible for tests.
    pub fn stringify(&self) -> String {
        let mut pairs: Vec<(&String, &String)> = self.0.iter().collect();
        pairs.sort_by(|a, b| a.0.cmp(b.0));
        let body = pairs
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect::<Vec<_>>()
            .join(", ");
        format!("{{{body}}}")
    }
}

impl Deref for RawEvent {
    type Target = HashMap<String, String>;
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl DerefMut for RawEvent {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.0
    }
}

impl From<HashMap<String, String>> for RawEvent {
    fn from(fields: HashMap<String, String>) -> Self {
        Self(fields)
    }
}

/// The Unified Event Model: a flat mapping from dotted field name to string,
/// produced by the normalizer and consumed by everything downstream.
///
/// Invariant: once constructed via [`UemEvent::finish`], `event.provider`
/// and `event.original` are never absent or empty.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UemEvent(HashMap<String, String>);

impl UemEvent {
    pub fn new() -> Self {
        Self(HashMap::new())
    }

    pub fn from_map(fields: HashMap<String, String>) -> Self {
        Self(fields)
    }

    pub fn provider(&self) -> &str {
        self.0.get("event.provider").map(String::as_str).unwrap_or("")
    }

    pub fn original(&self) -> &str {
        self.0.get("event.original").map(String::as_str).unwrap_or("")
    }

    pub fn get(&self, field: &str) -> &str {
        self.0.get(field).map(String::as_str).unwrap_or("")
    }

    pub fn set(&mut self, field: impl Into<String>, value: impl Into<String>) {
        self.0.insert(field.into(), value.into());
    }

    /// Appends `tag` to the event's `tags` field, comma-joining with any
    /// value already present.
    pub fn append_tag(&mut self, tag: &str) {
        match self.0.get_mut("tags") {
            Some(existing) if !existing.is_empty() => {
                existing.push(',');
                existing.push_str(tag);
            }
            _ => {
                self.0.insert("tags".to_string(), tag.to_string());
            }
        }
    }

    /// Applies the normalizer's default-fallback invariant: `event.provider`
    /// falls back to `raw.source_type`, `event.original` falls back to
    /// `raw.message`, and failing that to a stringified raw event.
    pub fn apply_defaults(&mut self, raw: &RawEvent) {
        if self.provider().is_empty() {
            self.set("event.provider", raw.source_type());
        }
        if self.original().is_empty() {
            let fallback = if raw.message().is_empty() {
                raw.stringify()
            } else {
                raw.message().to_string()
            };
            self.set("event.original", fallback);
        }
    }

    pub fn into_map(self) -> HashMap<String, String> {
        self.0
    }
}

impl Deref for UemEvent {
    type Target = HashMap<String, String>;
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl DerefMut for UemEvent {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_fill_provider_and_original_from_raw() {
        let mut raw = RawEvent::new();
        raw.insert("source_type".into(), "http_json".into());
        raw.insert("message".into(), "x".into());

        let mut event = UemEvent::new();
        event.apply_defaults(&raw);

        assert_eq!(event.provider(), "http_json");
        assert_eq!(event.original(), "x");
    }

    #[test]
    fn defaults_fall_back_to_stringified_raw_when_message_absent() {
        let mut raw = RawEvent::new();
        raw.insert("source_type".into(), "syslog".into());
        raw.insert("host".into(), "a".into());

        let mut event = UemEvent::new();
        event.apply_defaults(&raw);

        assert_eq!(event.provider(), "syslog");
        assert!(event.original().contains("host=a"));
    }

    #[test]
    fn append_tag_joins_with_comma() {
        let mut event = UemEvent::new();
        event.append_tag("a");
        event.append_tag("b");
        assert_eq!(event.get("tags"), "a,b");
    }

    #[test]
    fn missing_field_reads_as_empty_string() {
        let event = UemEvent::new();
        assert_eq!(event.get("source.ip"), "");
    }
}
