use anyhow::Result;
use std::future::Future;
use tokio::time::{sleep, Duration};
use tracing::info;

/// Repeats `check` until it yields a value, sleeping with Fibonacci backoff between attempts.
///
/// Returns `Ok(None)` once `max_polls` attempts came back empty. A `check` error
/// stops the polling immediately.
pub async fn poll_with_backoff<T, Fut, F>(
    mut check: F,
    initial_delay: Duration,
    max_polls: usize,
) -> Result<Option<T>>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<Option<T>>>,
{
    let mut fib = (initial_delay, initial_delay);

    for attempt in 1..=max_polls {
        if let Some(value) = check().await? {
            return Ok(Some(value));
        }
        if attempt < max_polls {
            info!(
                "Not ready yet, polling again in {:?} (attempt {}/{})",
                fib.0, attempt, max_polls
            );
            sleep(fib.0).await;
            fib = (fib.1, fib.0 + fib.1);
        }
    }

    Ok(None)
}
