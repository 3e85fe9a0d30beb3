//! # Bounded-time execution of a unit of work.
//!
//! [`run_with_deadline`] dispatches a task onto a worker and waits up to a
//! wall-clock deadline for it to finish. The pooled variant
//! [`run_with_deadline_on`] behaves identically but spawns onto a
//! caller-supplied runtime handle instead of the ambient runtime.
//!
//! ```text
//!   task ──spawn──► worker (tokio task)
//!                       │
//!         wait ≤ deadline on the join handle
//!           │                          │
//!       completed                 deadline hit
//!   Ok(r) / Err(TaskError)   DeadlineOutcome::TimedOut
//!                            (worker keeps running)
//! ```
//!
//! ## Abandonment hazard
//! When the deadline elapses first, the worker is **not** aborted: it is
//! abandoned and may still run to completion, mutating any state it
//! captured. Callers must not rely on post-timeout non-execution. The
//! timeout is a caller-observable signal only.
//!
//! ## Rules
//! - The wait itself is cancel-safe: dropping the returned future abandons
//!   the worker exactly the way a timeout does.
//! - A task that finishes in time with `Ok` yields
//!   [`DeadlineOutcome::Completed`].
//! - A task that finishes in time with `Err` propagates its [`TaskError`]
//!   unmodified — never swallowed, never retried.
//! - A worker that panics surfaces as [`TaskError::Fatal`].
//! - No retries and no side effects beyond the dispatch itself.

use std::future::Future;
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio::time;

use crate::error::TaskError;

/// Outcome of a deadline-bounded execution.
///
/// Timing out is an expected outcome, not a fault, so it is modeled as a
/// variant rather than an error: callers must check for it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeadlineOutcome<R> {
    /// The task finished within the deadline and produced a value.
    Completed(R),
    /// The deadline elapsed first. The worker was abandoned, not cancelled;
    /// there is no result and there may never be one.
    TimedOut,
}

impl<R> DeadlineOutcome<R> {
    /// Returns `true` if the deadline elapsed before the task finished.
    pub fn is_timed_out(&self) -> bool {
        matches!(self, DeadlineOutcome::TimedOut)
    }

    /// Returns the completed value, or `None` on timeout.
    pub fn completed(self) -> Option<R> {
        match self {
            DeadlineOutcome::Completed(value) => Some(value),
            DeadlineOutcome::TimedOut => None,
        }
    }
}

/// Runs `task` on a fresh worker and waits up to `deadline` for the result.
///
/// ### Parameters
/// - `deadline`: Maximum wall-clock wait. `Duration::ZERO` degenerates to an
///   immediate completion check.
/// - `task`: The unit of work. It is spawned, so it must be `Send + 'static`;
///   ownership of any captured state belongs to the task.
///
/// ### Returns
/// - `Ok(DeadlineOutcome::Completed(r))` — finished in time with a value.
/// - `Ok(DeadlineOutcome::TimedOut)` — deadline elapsed; the worker keeps
///   running in the background (see the module-level hazard note).
/// - `Err(e)` — the task failed in time; its error passes through.
///
/// # Example
/// ```
/// use std::time::Duration;
/// use holdfast::{run_with_deadline, DeadlineOutcome, TaskError};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> Result<(), TaskError> {
/// let outcome = run_with_deadline(Duration::from_secs(2), async {
///     Ok::<_, TaskError>("test")
/// })
/// .await?;
///
/// assert_eq!(outcome, DeadlineOutcome::Completed("test"));
/// # Ok(())
/// # }
/// ```
pub async fn run_with_deadline<R, Fut>(
    deadline: Duration,
    task: Fut,
) -> Result<DeadlineOutcome<R>, TaskError>
where
    R: Send + 'static,
    Fut: Future<Output = Result<R, TaskError>> + Send + 'static,
{
    await_deadline(deadline, tokio::spawn(task)).await
}

/// Pooled variant of [`run_with_deadline`]: spawns onto a caller-supplied
/// runtime handle instead of the ambient runtime.
///
/// Behavior is otherwise identical, including the abandonment hazard: a
/// timed-out worker keeps occupying the supplied pool until it finishes on
/// its own.
pub async fn run_with_deadline_on<R, Fut>(
    handle: &Handle,
    deadline: Duration,
    task: Fut,
) -> Result<DeadlineOutcome<R>, TaskError>
where
    R: Send + 'static,
    Fut: Future<Output = Result<R, TaskError>> + Send + 'static,
{
    await_deadline(deadline, handle.spawn(task)).await
}

/// Waits up to `deadline` for the worker, translating the join outcome.
///
/// Dropping the join handle on the timeout path detaches the worker; it is
/// never aborted.
async fn await_deadline<R>(
    deadline: Duration,
    mut worker: JoinHandle<Result<R, TaskError>>,
) -> Result<DeadlineOutcome<R>, TaskError> {
    match time::timeout(deadline, &mut worker).await {
        Ok(joined) => match joined {
            Ok(Ok(value)) => Ok(DeadlineOutcome::Completed(value)),
            Ok(Err(err)) => Err(err),
            Err(join_err) => Err(TaskError::fatal(join_err)),
        },
        Err(_elapsed) => {
            tracing::warn!(
                deadline_ms = deadline.as_millis() as u64,
                "deadline elapsed; abandoning worker"
            );
            Ok(DeadlineOutcome::TimedOut)
        }
    }
}
