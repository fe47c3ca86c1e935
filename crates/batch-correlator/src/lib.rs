//! Batch correlator core (§4.6): renders each enabled rule's SQL template
//! and executes it, independent of any tick loop. The per-rule
//! render-then-execute sequence is factored out as a trait so it can be
//! exercised against a fake executor without a live ClickHouse connection
//! (§8 AMBIENT test tooling).

use async_trait::async_trait;
use siem_rules::BatchCorrelationRule;

/// Executes one rendered SQL statement. Implemented for [`siem_store::ColumnStore`]
/// in the worker binary; a fake implementation backs the tests here.
#[async_trait]
pub trait BatchExecutor {
    type Error: std::fmt::Display;

    async fn execute(&self, sql: &str) -> Result<(), Self::Error>;
}

/// Runs one tick: every rule's template is substituted and executed in
/// order. A failure on one rule is logged and does not abort the loop
/// (§4.6: "Failures per rule are logged and do not abort the loop").
/// Returns the count of rules that executed successfully.
pub async fn run_tick<E: BatchExecutor>(executor: &E, rules: &[BatchCorrelationRule]) -> usize {
    let mut succeeded = 0;
    for rule in rules {
        let sql = rule.render_sql();
        match executor.execute(&sql).await {
            Ok(()) => succeeded += 1,
            Err(err) => {
                tracing::error!(
                    rule_id = rule.id,
                    rule_name = %rule.name,
                    error = %err,
                    "batch correlation rule failed, continuing with remaining rules"
                );
            }
        }
    }
    succeeded
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    struct FakeExecutor {
        executed: Mutex<Vec<String>>,
        fail_on: Option<String>,
    }

    #[async_trait]
    impl BatchExecutor for FakeExecutor {
        type Error = String;

        async fn execute(&self, sql: &str) -> Result<(), Self::Error> {
            if self.fail_on.as_deref() == Some(sql) {
                return Err("boom".to_string());
            }
            self.executed.lock().unwrap().push(sql.to_string());
            Ok(())
        }
    }

    fn rule(id: u64, window_s: u32) -> BatchCorrelationRule {
        BatchCorrelationRule {
            id,
            name: format!("rule-{id}"),
            window_s,
            sql_template: "INSERT INTO alerts_raw SELECT * FROM events WHERE ts > now() - {WINDOW_S}"
                .to_string(),
        }
    }

    #[tokio::test]
    async fn renders_and_executes_every_rule() {
        let executor = FakeExecutor {
            executed: Mutex::new(Vec::new()),
            fail_on: None,
        };
        let rules = vec![rule(1, 60), rule(2, 300)];

        let succeeded = run_tick(&executor, &rules).await;

        assert_eq!(succeeded, 2);
        let executed = executor.executed.lock().unwrap();
        assert!(executed[0].contains("- 60"));
        assert!(executed[1].contains("- 300"));
    }

    #[tokio::test]
    async fn one_rule_failing_does_not_abort_the_rest() {
        let failing_sql = rule(1, 60).render_sql();
        let executor = FakeExecutor {
            executed: Mutex::new(Vec::new()),
            fail_on: Some(failing_sql),
        };
        let rules = vec![rule(1, 60), rule(2, 300)];

        let succeeded = run_tick(&executor, &rules).await;

        assert_eq!(succeeded, 1);
        assert_eq!(executor.executed.lock().unwrap().len(), 1);
    }
}
