//! Atomic rule-set swap (§5, §9): rules are held behind a single reference
//! replaced wholesale after a fresh list is fully built, so concurrent
//! readers never observe a partial update.

use std::future::Future;
use std::sync::{Arc, RwLock};
use std::time::Duration;

/// A rule list readers capture once per event and use throughout. `load()`
/// is a cheap `Arc` clone; `swap()` briefly takes a write lock only to
/// replace the pointer, never to mutate in place.
pub struct RuleSet<T> {
    inner: RwLock<Arc<Vec<T>>>,
}

impl<T> RuleSet<T> {
    pub fn new(initial: Vec<T>) -> Self {
        Self {
            inner: RwLock::new(Arc::new(initial)),
        }
    }

    pub fn load(&self) -> Arc<Vec<T>> {
        self.inner
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    pub fn swap(&self, new_rules: Vec<T>) {
        let mut guard = self
            .inner
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        *guard = Arc::new(new_rules);
    }
}

/// Runs `loader` every `interval`, swapping the rule set on success and
/// logging-and-retaining on failure (§7: "Rule load ... retain previous
/// rule set, retry on next tick"). Never returns; callers `tokio::spawn`
/// this alongside their consume loop.
pub async fn reload_periodically<T, F, Fut, E>(
    rules: Arc<RuleSet<T>>,
    interval: Duration,
    mut loader: F,
) where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<Vec<T>, E>>,
    E: std::fmt::Display,
{
    let mut ticker = tokio::time::interval(interval);
    loop {
        ticker.tick().await;
        match loader().await {
            Ok(fresh) => rules.swap(fresh),
            Err(err) => {
                tracing::error!(error = %err, "failed to reload rules, retaining previous set");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn swap_replaces_the_whole_list_atomically() {
        let set = RuleSet::new(vec![1, 2, 3]);
        let before = set.load();
        assert_eq!(*before, vec![1, 2, 3]);

        set.swap(vec![4, 5]);
        let after = set.load();
        assert_eq!(*after, vec![4, 5]);
        // the snapshot taken before the swap is untouched
        assert_eq!(*before, vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn reload_retains_previous_set_on_loader_error() {
        let set = Arc::new(RuleSet::new(vec![1, 2, 3]));
        let rules = set.clone();
        let mut calls = 0;
        let loader = move || {
            calls += 1;
            async move { Err::<Vec<i32>, &'static str>("boom") }
        };

        let handle = tokio::spawn(reload_periodically(
            rules,
            Duration::from_millis(10),
            loader,
        ));
        tokio::time::sleep(Duration::from_millis(35)).await;
        handle.abort();

        assert_eq!(*set.load(), vec![1, 2, 3]);
    }
}
