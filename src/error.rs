//! Error types used by the holdfast primitives.
//!
//! This module defines the error enums shared across the crate:
//!
//! - [`TaskError`] — the wrapped unit of work itself failed.
//! - [`LockError`] — acquiring or holding a lock failed.
//! - [`BrokerError`] — an operation at the broker boundary failed.
//! - [`RedeliveryError`] — a redelivery decision could not be carried out.
//!
//! All types provide `as_label()` helpers that return short stable
//! snake_case labels for logs/metrics.
//!
//! ## Propagation policy
//! Failures local to a single retry attempt (a failed try-acquire) are
//! absorbed into the retry loop up to its ceiling. Failures beyond the
//! ceiling, and all failures from the protected task, a fallback, or broker
//! I/O, surface to the caller unmodified. A deadline expiring is **not** an
//! error — see [`DeadlineOutcome`](crate::DeadlineOutcome).

use thiserror::Error;

/// # Errors produced by a unit of work.
///
/// These represent failures of the task itself. The resilience layers never
/// retry the task's business logic; retry, where it exists, applies only to
/// lock acquisition and redelivery decisions.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum TaskError {
    /// Task execution failed but may succeed if the caller retries it.
    #[error("execution failed: {error}")]
    Fail {
        /// The underlying error message.
        error: String,
    },

    /// Non-recoverable failure (worker panicked or was torn down).
    #[error("fatal error (no retry): {error}")]
    Fatal {
        /// The underlying error message.
        error: String,
    },
}

impl TaskError {
    /// Creates a retryable failure from any displayable error.
    pub fn fail(error: impl std::fmt::Display) -> Self {
        TaskError::Fail {
            error: error.to_string(),
        }
    }

    /// Creates a non-recoverable failure from any displayable error.
    pub fn fatal(error: impl std::fmt::Display) -> Self {
        TaskError::Fatal {
            error: error.to_string(),
        }
    }

    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use holdfast::TaskError;
    ///
    /// assert_eq!(TaskError::fail("boom").as_label(), "task_failed");
    /// assert_eq!(TaskError::fatal("nope").as_label(), "task_fatal");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            TaskError::Fail { .. } => "task_failed",
            TaskError::Fatal { .. } => "task_fatal",
        }
    }
}

/// # Errors produced while acquiring or holding a lock.
///
/// `Exhausted` and `Interrupted` are acquisition failures: the protected task
/// never ran. `Task` wraps the protected task's own error; the lock was held
/// and has been released by the time it is observed.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum LockError {
    /// The retry ceiling was reached without acquiring the lock.
    #[error("lock retries exhausted after {attempts} attempts")]
    Exhausted {
        /// How many acquisition attempts were made.
        attempts: u32,
    },

    /// The waiting context was cancelled while acquiring the lock.
    #[error("interrupted while waiting for the lock")]
    Interrupted,

    /// The protected task failed while the lock was held.
    #[error(transparent)]
    Task(#[from] TaskError),
}

impl LockError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use holdfast::LockError;
    ///
    /// let err = LockError::Exhausted { attempts: 3 };
    /// assert_eq!(err.as_label(), "lock_exhausted");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            LockError::Exhausted { .. } => "lock_exhausted",
            LockError::Interrupted => "lock_interrupted",
            LockError::Task(_) => "lock_task_failed",
        }
    }
}

/// # Failure at the message-broker boundary.
///
/// Raised by [`BrokerChannel`](crate::BrokerChannel) implementations when an
/// acknowledge, reject, or publish call fails. The redelivery policies
/// propagate these uncaught; any outer-level redelivery caused by an
/// unsettled message is the consumer framework's responsibility.
#[derive(Error, Debug)]
#[error("broker {op} failed: {reason}")]
pub struct BrokerError {
    /// Which operation failed (`"ack"`, `"reject"`, `"publish"`).
    pub op: &'static str,
    /// Implementation-specific failure detail.
    pub reason: String,
}

impl BrokerError {
    /// Creates a broker failure for the given operation.
    pub fn new(op: &'static str, reason: impl Into<String>) -> Self {
        Self {
            op,
            reason: reason.into(),
        }
    }
}

/// # Errors produced while carrying out a redelivery decision.
///
/// The decision layer classifies retry-vs-give-up; it does not swallow
/// downstream errors. Broker I/O and fallback failures pass through here.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum RedeliveryError {
    /// A broker call (ack, reject, or publish) failed.
    #[error(transparent)]
    Broker(#[from] BrokerError),

    /// The fallback task failed.
    #[error(transparent)]
    Task(#[from] TaskError),
}

impl RedeliveryError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            RedeliveryError::Broker(_) => "redelivery_broker_failed",
            RedeliveryError::Task(_) => "redelivery_fallback_failed",
        }
    }
}
