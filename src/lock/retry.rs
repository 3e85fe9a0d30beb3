//! # Retrying lock acquisition policy.
//!
//! [`RetryLock`] bounds each acquisition attempt with a timeout and retries
//! a fixed number of times with a fixed delay in between. Exhausting the
//! ceiling is a hard failure; there is no silent success.
//!
//! The defaults (3 attempts, 500ms per attempt, 200ms between attempts)
//! suit short critical sections guarding shared caches or connection state.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, MutexGuard};
use tokio::task::JoinHandle;
use tokio::time;
use tokio_util::sync::CancellationToken;

use crate::error::LockError;
use crate::lock::LockedTask;

/// Bounded-retry acquisition policy for a [`tokio::sync::Mutex`].
///
/// Encapsulates the three knobs of the retry loop:
/// - [`RetryLock::max_attempts`] — the attempt ceiling (min 1);
/// - [`RetryLock::attempt_timeout`] — bounded wait per attempt;
/// - [`RetryLock::retry_delay`] — fixed delay between attempts.
#[derive(Clone, Copy, Debug)]
pub struct RetryLock {
    /// Attempt ceiling. Reaching it without acquiring fails with
    /// [`LockError::Exhausted`]. Clamped to a minimum of 1.
    pub max_attempts: u32,
    /// Maximum wait for the lock within a single attempt.
    pub attempt_timeout: Duration,
    /// Delay between consecutive attempts (the waiting caller is suspended,
    /// not busy-spinning).
    pub retry_delay: Duration,
}

impl Default for RetryLock {
    /// Returns a policy with:
    /// - `max_attempts = 3`;
    /// - `attempt_timeout = 500ms`;
    /// - `retry_delay = 200ms`.
    fn default() -> Self {
        Self {
            max_attempts: 3,
            attempt_timeout: Duration::from_millis(500),
            retry_delay: Duration::from_millis(200),
        }
    }
}

impl RetryLock {
    /// Returns a policy with an updated attempt ceiling.
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    /// Returns a policy with an updated per-attempt timeout.
    pub fn with_attempt_timeout(mut self, attempt_timeout: Duration) -> Self {
        self.attempt_timeout = attempt_timeout;
        self
    }

    /// Returns a policy with an updated inter-attempt delay.
    pub fn with_retry_delay(mut self, retry_delay: Duration) -> Self {
        self.retry_delay = retry_delay;
        self
    }

    /// Acquires `mutex` under this policy and runs `task` while it is held.
    ///
    /// A free lock is taken immediately: attempt 1 succeeds with zero
    /// backoff delay. Otherwise each attempt waits up to
    /// [`attempt_timeout`](Self::attempt_timeout), and attempts are
    /// separated by [`retry_delay`](Self::retry_delay).
    ///
    /// ### Errors
    /// - [`LockError::Exhausted`] — ceiling reached; the task never ran.
    /// - [`LockError::Interrupted`] — `ctx` cancelled during a wait; the
    ///   task never ran.
    /// - [`LockError::Task`] — the task itself failed; the lock has already
    ///   been released.
    ///
    /// # Example
    /// ```
    /// use tokio::sync::Mutex;
    /// use tokio_util::sync::CancellationToken;
    /// use holdfast::{RetryLock, TaskError};
    ///
    /// # #[tokio::main(flavor = "current_thread")]
    /// # async fn main() -> Result<(), holdfast::LockError> {
    /// let counter = Mutex::new(0u32);
    /// let ctx = CancellationToken::new();
    ///
    /// let value = RetryLock::default()
    ///     .with_lock(&counter, &ctx, |n: &mut u32| {
    ///         Box::pin(async move {
    ///             *n += 1;
    ///             Ok::<_, TaskError>(*n)
    ///         })
    ///     })
    ///     .await?;
    ///
    /// assert_eq!(value, 1);
    /// # Ok(())
    /// # }
    /// ```
    pub async fn with_lock<T, R, F>(
        &self,
        mutex: &Mutex<T>,
        ctx: &CancellationToken,
        task: F,
    ) -> Result<R, LockError>
    where
        F: for<'a> FnOnce(&'a mut T) -> LockedTask<'a, R>,
    {
        let mut guard = self.acquire(mutex, ctx).await?;
        let value = task(&mut *guard).await?;
        Ok(value)
    }

    /// Spawned variant of [`with_lock`](Self::with_lock): acquisition, task,
    /// and release all run on a separate tokio task, and the returned handle
    /// observes exactly the terminal outcome exactly once.
    ///
    /// This replaces run-the-callback-on-a-side-thread patterns; await the
    /// handle wherever the result is needed.
    pub fn spawn_with_lock<T, R, F>(
        &self,
        mutex: Arc<Mutex<T>>,
        ctx: CancellationToken,
        task: F,
    ) -> JoinHandle<Result<R, LockError>>
    where
        T: Send + 'static,
        R: Send + 'static,
        F: for<'a> FnOnce(&'a mut T) -> LockedTask<'a, R> + Send + 'static,
    {
        let policy = *self;
        tokio::spawn(async move {
            let mut guard = policy.acquire(&mutex, &ctx).await?;
            let value = task(&mut *guard).await?;
            Ok(value)
        })
    }

    /// The `Attempting` loop: bounded try-acquire up to the ceiling.
    ///
    /// Attempts from one caller are strictly sequential; attempt `n + 1`
    /// starts only after attempt `n`'s wait resolved and the delay elapsed.
    async fn acquire<'l, T>(
        &self,
        mutex: &'l Mutex<T>,
        ctx: &CancellationToken,
    ) -> Result<MutexGuard<'l, T>, LockError> {
        let ceiling = self.max_attempts.max(1);
        let mut attempt = 1u32;
        loop {
            // A free lock costs neither a wait nor a delay.
            if let Ok(guard) = mutex.try_lock() {
                return Ok(guard);
            }

            let waited = tokio::select! {
                biased;
                _ = ctx.cancelled() => return Err(LockError::Interrupted),
                waited = time::timeout(self.attempt_timeout, mutex.lock()) => waited,
            };
            if let Ok(guard) = waited {
                return Ok(guard);
            }

            if attempt >= ceiling {
                return Err(LockError::Exhausted { attempts: ceiling });
            }
            tracing::debug!(attempt, ceiling, "lock busy; backing off");
            attempt += 1;

            tokio::select! {
                biased;
                _ = ctx.cancelled() => return Err(LockError::Interrupted),
                _ = time::sleep(self.retry_delay) => {}
            }
        }
    }
}
