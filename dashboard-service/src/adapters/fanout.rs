//! Bounded-concurrency fan-out for bulk adapter calls (spec §4.2).
//!
//! Caps concurrent upstream requests at `limit` via a semaphore and isolates
//! per-item failures: a failed item is logged and dropped from the result
//! set rather than aborting the whole batch.

use std::sync::Arc;

use futures::future::join_all;
use tokio::sync::Semaphore;

/// Run `f` over every item in `items` with at most `limit` concurrent
/// in-flight calls, returning only the successes.
pub async fn bounded<T, R, F, Fut>(items: Vec<T>, limit: usize, f: F) -> Vec<R>
where
    T: Send + 'static,
    R: Send + 'static,
    F: Fn(T) -> Fut + Send + Sync + 'static,
    Fut: std::future::Future<Output = crate::error::Result<R>> + Send,
{
    let semaphore = Arc::new(Semaphore::new(limit.max(1)));
    let f = Arc::new(f);

    let tasks = items.into_iter().map(|item| {
        let semaphore = Arc::clone(&semaphore);
        let f = Arc::clone(&f);
        async move {
            let _permit = semaphore.acquire().await.expect("semaphore never closed");
            f(item).await
        }
    });

    join_all(tasks)
        .await
        .into_iter()
        .filter_map(|res| match res {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::warn!(error = %e, "fan-out item failed, omitting from result set");
                None
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn isolates_failures_and_keeps_successes() {
        let items = vec![1, 2, 3, 4];
        let results = bounded(items, 2, |n| async move {
            if n % 2 == 0 {
                Err(crate::error::Error::Internal("even".into()))
            } else {
                Ok(n)
            }
        })
        .await;
        assert_eq!(results, vec![1, 3]);
    }
}
