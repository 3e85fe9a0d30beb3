//! # Scoped lock acquisition with bounded retry.
//!
//! Wraps a caller-supplied [`tokio::sync::Mutex`] with acquisition policies:
//!
//! - [`RetryLock`] — bounded try-acquire with a per-attempt timeout, a fixed
//!   inter-attempt delay, and a hard failure at the retry ceiling.
//! - [`lock`] — unconditional, interruptible acquire with the same scoped
//!   release discipline and no retry bookkeeping.
//!
//! ## Acquisition state machine
//! ```text
//!   Idle ──► Attempting ──► Held ──► (released on every exit)
//!               │   ▲
//!        busy,  │   │ delay elapsed
//!        below  ▼   │
//!        ceiling └───┘
//!               │
//!        busy at ceiling
//!               ▼
//!            Failed (LockError::Exhausted)
//! ```
//!
//! ## Rules
//! - The protected task runs **exactly once** while the lock is held, and
//!   only then. It receives `&mut T` borrowed from the guard.
//! - Release is by guard drop on every exit from `Held` — task success, task
//!   error, or cancellation of the surrounding future. The guard never
//!   leaves this module, so it cannot be leaked or reused, and release
//!   cannot fail.
//! - Delayed re-attempts suspend the caller (`tokio::time::sleep`); no
//!   thread is consumed per backoff wait, so many callers can retry the
//!   same or different locks concurrently.
//! - Every wait races a [`CancellationToken`]; cancellation surfaces as
//!   [`LockError::Interrupted`](crate::LockError::Interrupted) immediately,
//!   with no further retries.
//! - Fairness across callers is whatever the underlying mutex provides;
//!   attempts from a single caller are strictly sequential.

mod direct;
mod retry;

pub use direct::lock;
pub use retry::RetryLock;

use futures::future::BoxFuture;

use crate::error::TaskError;

/// Future returned by a protected task while the lock is held.
///
/// The `'a` lifetime ties the task to the guard's borrow of the protected
/// data, so the data cannot escape the critical section.
pub type LockedTask<'a, R> = BoxFuture<'a, Result<R, TaskError>>;
