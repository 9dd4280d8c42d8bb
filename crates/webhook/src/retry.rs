use std::{future::Future, time::Duration};

use tokio_retry2::{strategy::FixedInterval, Retry, RetryError};

/// Fixed delays between rename attempts, `max_attempts` counts the first try
pub fn rename_retry_strategy(max_attempts: u32, delay: Duration) -> impl Iterator<Item = Duration> {
    let delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX);
    FixedInterval::from_millis(delay_ms).take(max_attempts.saturating_sub(1) as usize)
}

/// Execute an operation with retry using the provided strategy
pub async fn execute_with_retry<F, Fut, T, E, I>(strategy: I, operation: F) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, RetryError<E>>>,
    I: IntoIterator<Item = Duration>,
{
    Retry::spawn(strategy, operation).await
}
