//! Alerts aggregator core (§4.7): the periodic `alerts_agg` rebuild,
//! factored behind a trait so the tick's retry/logging behavior can be
//! exercised without a live ClickHouse connection (§8 AMBIENT test
//! tooling).

use async_trait::async_trait;

/// Rebuilds the `alerts_agg` table from `alerts_raw`. Implemented for
/// [`siem_store::ColumnStore`] in the worker binary.
#[async_trait]
pub trait AggregateRebuilder {
    type Error: std::fmt::Display;

    async fn rebuild(&self) -> Result<(), Self::Error>;
}

/// Runs one tick: rebuild and report success/failure. A failed rebuild is
/// logged; the previous `alerts_agg` contents (whatever the truncate+insert
/// pair left behind) are not rolled back, matching §4.7's accepted
/// non-transactional rebuild.
pub async fn run_tick<R: AggregateRebuilder>(rebuilder: &R) -> bool {
    match rebuilder.rebuild().await {
        Ok(()) => true,
        Err(err) => {
            tracing::error!(error = %err, "alerts_agg rebuild failed");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FakeRebuilder {
        calls: AtomicUsize,
        fail: bool,
    }

    #[async_trait]
    impl AggregateRebuilder for FakeRebuilder {
        type Error = String;

        async fn rebuild(&self) -> Result<(), Self::Error> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                Err("truncate failed".to_string())
            } else {
                Ok(())
            }
        }
    }

    #[tokio::test]
    async fn successful_rebuild_reports_true() {
        let rebuilder = FakeRebuilder {
            calls: AtomicUsize::new(0),
            fail: false,
        };
        assert!(run_tick(&rebuilder).await);
        assert_eq!(rebuilder.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn failed_rebuild_reports_false_without_panicking() {
        let rebuilder = FakeRebuilder {
            calls: AtomicUsize::new(0),
            fail: true,
        };
        assert!(!run_tick(&rebuilder).await);
    }
}
