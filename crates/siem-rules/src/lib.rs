//! Rule types, the shared filter DSL, the path-extraction DSL, and the
//! atomic-swap rule repository used by every rule-driven stage.

pub mod batch_rule;
mod error;
pub mod filter_dsl;
pub mod filter_rule;
pub mod normalizer_rule;
pub mod path;
pub mod repository;
pub mod stream_rule;

pub use batch_rule::BatchCorrelationRule;
pub use error::RuleError;
pub use filter_rule::{decide, FilterAction, FilterDecision, FilterRule};
pub use normalizer_rule::NormalizerRule;
pub use repository::RuleSet;
pub use stream_rule::StreamCorrelationRule;

use siem_store::ColumnStore;

/// Loads and compiles normalizer rules from the column store, already
/// ordered `(priority, id)` by the SQL query itself.
pub async fn load_normalizer_rules(store: &ColumnStore) -> Result<Vec<NormalizerRule>, RuleError> {
    let rows = store.fetch_normalizer_rules().await?;
    Ok(rows.into_iter().map(NormalizerRule::from_row).collect())
}

pub async fn load_filter_rules(store: &ColumnStore) -> Result<Vec<FilterRule>, RuleError> {
    let rows = store.fetch_filter_rules().await?;
    Ok(rows.into_iter().map(FilterRule::from_row).collect())
}

pub async fn load_stream_correlation_rules(
    store: &ColumnStore,
) -> Result<Vec<StreamCorrelationRule>, RuleError> {
    let rows = store.fetch_stream_correlation_rules().await?;
    Ok(rows
        .into_iter()
        .map(StreamCorrelationRule::from_row)
        .collect())
}

pub async fn load_batch_correlation_rules(
    store: &ColumnStore,
) -> Result<Vec<BatchCorrelationRule>, RuleError> {
    let rows = store.fetch_batch_correlation_rules().await?;
    Ok(rows.into_iter().map(BatchCorrelationRule::from_row).collect())
}
