//! Unconditional, interruptible lock acquisition.
//!
//! The direct counterpart to [`RetryLock`](crate::RetryLock): no attempt
//! ceiling and no backoff, just a single acquire that waits as long as it
//! takes — unless the surrounding context is cancelled first.

use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;

use crate::error::LockError;
use crate::lock::LockedTask;

/// Acquires `mutex` unconditionally and runs `task` while it is held.
///
/// The wait is unbounded but interruptible: if `ctx` is cancelled while
/// waiting (or was cancelled on entry), the call fails with
/// [`LockError::Interrupted`] and the task never runs. Once acquired, the
/// same scoped release discipline applies as everywhere in this module:
/// the guard drops on task success, task error, and cancellation of the
/// surrounding future alike.
///
/// # Example
/// ```
/// use tokio::sync::Mutex;
/// use tokio_util::sync::CancellationToken;
/// use holdfast::{lock, TaskError};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> Result<(), holdfast::LockError> {
/// let names = Mutex::new(Vec::new());
/// let ctx = CancellationToken::new();
///
/// lock(&names, &ctx, |v: &mut Vec<String>| {
///     Box::pin(async move {
///         v.push("held".to_string());
///         Ok::<_, TaskError>(())
///     })
/// })
/// .await?;
///
/// assert_eq!(names.lock().await.len(), 1);
/// # Ok(())
/// # }
/// ```
pub async fn lock<T, R, F>(
    mutex: &Mutex<T>,
    ctx: &CancellationToken,
    task: F,
) -> Result<R, LockError>
where
    F: for<'a> FnOnce(&'a mut T) -> LockedTask<'a, R>,
{
    let mut guard = tokio::select! {
        biased;
        _ = ctx.cancelled() => return Err(LockError::Interrupted),
        guard = mutex.lock() => guard,
    };
    let value = task(&mut *guard).await?;
    Ok(value)
}
