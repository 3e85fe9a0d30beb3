//! # holdfast
//!
//! **Holdfast** is a small library of resilience primitives for concurrent,
//! failure-prone task execution. It layers retry, timeout, and
//! acknowledgment policies over collaborators the caller already owns — a
//! tokio runtime, a [`tokio::sync::Mutex`], a message-broker channel — and
//! owns no shared mutable state of its own.
//!
//! ## Architecture
//! ```text
//!   ┌─────────────────────┐   ┌─────────────────────┐
//!   │  Deadline executor  │   │   Resilient lock    │
//!   │  run_with_deadline  │   │ RetryLock / lock()  │
//!   │  (worker abandoned  │◄──┤ (scoped release on  │
//!   │   on timeout)       │   │  every exit path)   │
//!   └─────────────────────┘   └─────────────────────┘
//!        usable standalone, or inside a protected task
//!
//!   ┌───────────────────────────────────────────────┐
//!   │            Redelivery retry policy            │
//!   │  simple_retry_or_exec / retry_or_exec         │
//!   │  Delivery metadata ──► ack / requeue / DLX    │
//!   └───────────────────────────────────────────────┘
//!        invoked by a consumer once per message
//! ```
//!
//! Every component may be invoked from many independent execution contexts
//! concurrently; each suspension point (deadline wait, acquisition wait,
//! inter-attempt delay) suspends only the invoking context and is
//! interruptible via a [`CancellationToken`](tokio_util::sync::CancellationToken).
//!
//! ## Features
//! | Area               | Description                                               | Key types / functions                        |
//! |--------------------|-----------------------------------------------------------|----------------------------------------------|
//! | **Deadlines**      | Bounded-time execution; timed-out workers are abandoned.  | [`run_with_deadline`], [`DeadlineOutcome`]   |
//! | **Locking**        | Bounded retry-with-backoff acquisition, scoped release.   | [`RetryLock`], [`lock`]                      |
//! | **Redelivery**     | Ack / requeue / dead-letter decisions per delivery.       | [`RedeliveryPolicy`], [`Delivery`]           |
//! | **Broker seam**    | Caller-supplied channel behind an async trait.            | [`BrokerChannel`]                            |
//! | **Errors**         | Typed errors with stable log labels.                      | [`TaskError`], [`LockError`], [`BrokerError`]|
//!
//! ## Example
//! ```rust
//! use std::time::Duration;
//! use holdfast::{run_with_deadline, DeadlineOutcome, TaskError};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), TaskError> {
//!     // A slow worker against a short deadline: the call reports the
//!     // timeout and the worker is left running in the background.
//!     let outcome = run_with_deadline(Duration::from_millis(10), async {
//!         tokio::time::sleep(Duration::from_secs(2)).await;
//!         Ok::<_, TaskError>("too late")
//!     })
//!     .await?;
//!
//!     assert!(outcome.is_timed_out());
//!     assert_eq!(outcome.completed(), None);
//!     Ok(())
//! }
//! ```

mod deadline;
mod error;
mod lock;
mod mq;

// ---- Public re-exports ----

pub use deadline::{DeadlineOutcome, run_with_deadline, run_with_deadline_on};
pub use error::{BrokerError, LockError, RedeliveryError, TaskError};
pub use lock::{LockedTask, RetryLock, lock};
pub use mq::{BrokerChannel, DeathRecord, Delivery, Disposition, RedeliveryPolicy};
