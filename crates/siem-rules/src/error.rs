use thiserror::Error;

/// Failures surfaced while compiling, loading, or evaluating rules.
///
/// Every variant maps to a row in the error-handling table: rule parse
/// failures and rule load failures are both logged and non-fatal — callers
/// decide whether to exclude a single rule/mapping or retain a previous
/// rule set.
#[derive(Debug, Error)]
pub enum RuleError {
    #[error("path expression parse error: {0}")]
    PathParse(String),

    #[error("filter expression parse error: {0}")]
    FilterParse(String),

    #[error("rule store unreachable: {0}")]
    Store(#[from] siem_store::StoreError),

    #[error("malformed rule row: {0}")]
    MalformedRow(String),
}
