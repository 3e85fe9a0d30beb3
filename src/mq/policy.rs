//! # Redelivery decision procedures.
//!
//! Two strategies, selected per message-handling style:
//!
//! - **Simple retry** — no dead-letter topology. A first delivery is
//!   rejected-and-requeued so the broker redelivers it once; a redelivery
//!   means the one retry is already spent, so the fallback runs instead.
//! - **Dead-letter retry** — the message cycles through a dead-letter
//!   exchange, and the broker's death counter decides between another cycle
//!   and the fallback. The original delivery is settled exactly once either
//!   way; this strategy never rejects.
//!
//! Both procedures classify only; errors from the broker or the fallback
//! pass through unmodified.

use std::future::Future;

use crate::error::{RedeliveryError, TaskError};
use crate::mq::{BrokerChannel, Delivery};

/// Which branch a decision procedure took.
///
/// The decision is a pure function of the delivery metadata, so invoking a
/// procedure twice on the same metadata yields the same disposition.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Disposition {
    /// The message was rejected back onto its queue for one more delivery.
    Requeued,
    /// The message was resubmitted to the dead-letter exchange for a
    /// delayed redelivery cycle.
    Resubmitted,
    /// The retry budget was spent; the fallback ran instead.
    Exhausted,
}

/// Redelivery retry policy with a death-count ceiling.
///
/// The ceiling bounds dead-letter cycles: a message whose death count has
/// reached it is handed to the fallback instead of being resubmitted. A
/// message whose count never reaches the ceiling (misconfigured topology)
/// keeps cycling — bounding that loop is the broker topology's job, not
/// this policy's.
#[derive(Clone, Copy, Debug)]
pub struct RedeliveryPolicy {
    /// Maximum number of dead-letter cycles before giving up.
    pub ceiling: u64,
}

impl Default for RedeliveryPolicy {
    /// Returns a policy with `ceiling = 3`.
    fn default() -> Self {
        Self { ceiling: 3 }
    }
}

impl RedeliveryPolicy {
    /// Creates a policy with the given ceiling.
    pub fn new(ceiling: u64) -> Self {
        Self { ceiling }
    }

    /// Simple retry without a fallback: a first delivery is
    /// rejected-and-requeued, a redelivery is acknowledged (when `ack`)
    /// and dropped.
    pub async fn simple_retry(
        &self,
        channel: &dyn BrokerChannel,
        delivery: &Delivery,
        ack: bool,
    ) -> Result<Disposition, RedeliveryError> {
        self.simple_retry_or_exec(channel, delivery, ack, || async { Ok::<(), TaskError>(()) })
            .await
    }

    /// Simple retry: decide between one broker-level redelivery and the
    /// fallback.
    ///
    /// - First delivery (`redelivered == false`): reject-and-requeue. The
    ///   broker will deliver the message once more with the redelivered
    ///   flag set. No ack, no fallback.
    /// - Redelivery (`redelivered == true`): the single retry is spent; run
    ///   `fallback` exactly once, then acknowledge iff `ack`.
    ///
    /// Exactly one of {ack, reject-requeue} reaches the broker per
    /// invocation. Fallback errors propagate before any ack is attempted.
    pub async fn simple_retry_or_exec<F, Fut>(
        &self,
        channel: &dyn BrokerChannel,
        delivery: &Delivery,
        ack: bool,
        fallback: F,
    ) -> Result<Disposition, RedeliveryError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<(), TaskError>>,
    {
        if delivery.redelivered {
            fallback().await?;
            if ack {
                channel.ack(delivery.delivery_tag, false).await?;
            }
            Ok(Disposition::Exhausted)
        } else {
            channel.reject(delivery.delivery_tag, true).await?;
            Ok(Disposition::Requeued)
        }
    }

    /// Dead-letter retry without a fallback: a message past the ceiling is
    /// acknowledged (when `ack`) and dropped.
    pub async fn retry(
        &self,
        channel: &dyn BrokerChannel,
        delivery: &Delivery,
        dlx: &str,
        routing_key: Option<&str>,
        ack: bool,
    ) -> Result<Disposition, RedeliveryError> {
        self.retry_or_exec(channel, delivery, dlx, routing_key, ack, || async {
            Ok::<(), TaskError>(())
        })
        .await
    }

    /// Dead-letter retry: decide between another dead-letter cycle and the
    /// fallback, then settle the original delivery.
    ///
    /// - `death_count < ceiling`: resubmit the message unchanged to `dlx`
    ///   under `routing_key` (defaults to the key the message was received
    ///   under). The broker's dead-lettering will eventually redeliver it
    ///   with an incremented death count.
    /// - `death_count >= ceiling`: run `fallback` exactly once.
    ///
    /// In both branches the original delivery is then acknowledged iff
    /// `ack` — exactly one ack and at most one resubmit per invocation.
    /// This procedure never rejects; the retry chain terminates purely
    /// through the resubmit-vs-fallback branch.
    ///
    /// # Example
    /// ```
    /// # use holdfast::{BrokerChannel, BrokerError, Delivery, Disposition, RedeliveryPolicy};
    /// # struct Nop;
    /// # #[async_trait::async_trait]
    /// # impl BrokerChannel for Nop {
    /// #     async fn ack(&self, _: u64, _: bool) -> Result<(), BrokerError> { Ok(()) }
    /// #     async fn reject(&self, _: u64, _: bool) -> Result<(), BrokerError> { Ok(()) }
    /// #     async fn publish(&self, _: &str, _: &str, _: &Delivery) -> Result<(), BrokerError> { Ok(()) }
    /// # }
    /// # #[tokio::main(flavor = "current_thread")]
    /// # async fn main() -> Result<(), holdfast::RedeliveryError> {
    /// let channel = Nop;
    /// let delivery = Delivery::new(1, "orders.created", Vec::new());
    ///
    /// let disposition = RedeliveryPolicy::default()
    ///     .retry_or_exec(&channel, &delivery, "orders.dlx", None, true, || async {
    ///         // give-up handler: park the message for manual inspection
    ///         Ok::<(), holdfast::TaskError>(())
    ///     })
    ///     .await?;
    ///
    /// // death count 0 < ceiling 3: the message went back through the DLX
    /// assert_eq!(disposition, Disposition::Resubmitted);
    /// # Ok(())
    /// # }
    /// ```
    pub async fn retry_or_exec<F, Fut>(
        &self,
        channel: &dyn BrokerChannel,
        delivery: &Delivery,
        dlx: &str,
        routing_key: Option<&str>,
        ack: bool,
        fallback: F,
    ) -> Result<Disposition, RedeliveryError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<(), TaskError>>,
    {
        let death_count = delivery.death_count();
        tracing::debug!(death_count, ceiling = self.ceiling, "redelivery decision");

        let disposition = if death_count < self.ceiling {
            let key = routing_key.unwrap_or(&delivery.routing_key);
            channel.publish(dlx, key, delivery).await?;
            Disposition::Resubmitted
        } else {
            fallback().await?;
            Disposition::Exhausted
        };

        if ack {
            channel.ack(delivery.delivery_tag, false).await?;
        }
        Ok(disposition)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::BrokerError;
    use crate::mq::DeathRecord;
    use async_trait::async_trait;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Debug, PartialEq, Eq)]
    enum Op {
        Ack(u64, bool),
        Reject(u64, bool),
        Publish(String, String, u64),
    }

    /// Instrumented broker double recording every call in order.
    #[derive(Default)]
    struct RecordingChannel {
        ops: Mutex<Vec<Op>>,
        fail_publish: bool,
    }

    impl RecordingChannel {
        fn failing_publish() -> Self {
            Self {
                fail_publish: true,
                ..Self::default()
            }
        }

        fn ops(&self) -> Vec<Op> {
            std::mem::take(&mut self.ops.lock().unwrap())
        }
    }

    #[async_trait]
    impl BrokerChannel for RecordingChannel {
        async fn ack(&self, delivery_tag: u64, multiple: bool) -> Result<(), BrokerError> {
            self.ops.lock().unwrap().push(Op::Ack(delivery_tag, multiple));
            Ok(())
        }

        async fn reject(&self, delivery_tag: u64, requeue: bool) -> Result<(), BrokerError> {
            self.ops
                .lock()
                .unwrap()
                .push(Op::Reject(delivery_tag, requeue));
            Ok(())
        }

        async fn publish(
            &self,
            exchange: &str,
            routing_key: &str,
            delivery: &Delivery,
        ) -> Result<(), BrokerError> {
            if self.fail_publish {
                return Err(BrokerError::new("publish", "channel closed"));
            }
            self.ops.lock().unwrap().push(Op::Publish(
                exchange.to_string(),
                routing_key.to_string(),
                delivery.delivery_tag,
            ));
            Ok(())
        }
    }

    fn first_delivery() -> Delivery {
        Delivery::new(7, "orders.created", b"body".to_vec())
    }

    fn dead_lettered(count: u64) -> Delivery {
        first_delivery()
            .with_redelivered(true)
            .with_deaths(vec![DeathRecord::new(count)])
    }

    #[tokio::test]
    async fn test_simple_retry_requeues_first_delivery() {
        let channel = RecordingChannel::default();
        let fallback_calls = AtomicUsize::new(0);

        let disposition = RedeliveryPolicy::default()
            .simple_retry_or_exec(&channel, &first_delivery(), true, || {
                fallback_calls.fetch_add(1, Ordering::SeqCst);
                async { Ok::<(), TaskError>(()) }
            })
            .await
            .unwrap();

        assert_eq!(disposition, Disposition::Requeued);
        assert_eq!(channel.ops(), vec![Op::Reject(7, true)]);
        assert_eq!(fallback_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_simple_retry_runs_fallback_once_on_redelivery() {
        let channel = RecordingChannel::default();
        let delivery = first_delivery().with_redelivered(true);
        let fallback_calls = AtomicUsize::new(0);

        let disposition = RedeliveryPolicy::default()
            .simple_retry_or_exec(&channel, &delivery, true, || {
                fallback_calls.fetch_add(1, Ordering::SeqCst);
                async { Ok::<(), TaskError>(()) }
            })
            .await
            .unwrap();

        assert_eq!(disposition, Disposition::Exhausted);
        assert_eq!(channel.ops(), vec![Op::Ack(7, false)]);
        assert_eq!(fallback_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_simple_retry_without_ack_leaves_redelivery_unsettled() {
        let channel = RecordingChannel::default();
        let delivery = first_delivery().with_redelivered(true);

        let disposition = RedeliveryPolicy::default()
            .simple_retry(&channel, &delivery, false)
            .await
            .unwrap();

        assert_eq!(disposition, Disposition::Exhausted);
        assert!(channel.ops().is_empty());
    }

    #[tokio::test]
    async fn test_dlx_retry_resubmits_below_ceiling_then_acks() {
        let channel = RecordingChannel::default();
        let delivery = dead_lettered(2);

        let disposition = RedeliveryPolicy::default()
            .retry_or_exec(&channel, &delivery, "orders.dlx", None, true, || async {
                panic!("fallback must not run below the ceiling")
            })
            .await
            .unwrap();

        assert_eq!(disposition, Disposition::Resubmitted);
        assert_eq!(
            channel.ops(),
            vec![
                Op::Publish("orders.dlx".into(), "orders.created".into(), 7),
                Op::Ack(7, false),
            ]
        );
    }

    #[tokio::test]
    async fn test_dlx_retry_runs_fallback_at_ceiling_then_acks() {
        let channel = RecordingChannel::default();
        let delivery = dead_lettered(3);
        let fallback_calls = AtomicUsize::new(0);

        let disposition = RedeliveryPolicy::default()
            .retry_or_exec(&channel, &delivery, "orders.dlx", None, true, || {
                fallback_calls.fetch_add(1, Ordering::SeqCst);
                async { Ok::<(), TaskError>(()) }
            })
            .await
            .unwrap();

        assert_eq!(disposition, Disposition::Exhausted);
        assert_eq!(channel.ops(), vec![Op::Ack(7, false)]);
        assert_eq!(fallback_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_dlx_retry_uses_explicit_routing_key() {
        let channel = RecordingChannel::default();
        let delivery = first_delivery();

        RedeliveryPolicy::default()
            .retry(&channel, &delivery, "orders.dlx", Some("orders.retry"), true)
            .await
            .unwrap();

        assert_eq!(
            channel.ops(),
            vec![
                Op::Publish("orders.dlx".into(), "orders.retry".into(), 7),
                Op::Ack(7, false),
            ]
        );
    }

    #[tokio::test]
    async fn test_missing_death_header_counts_as_zero() {
        let channel = RecordingChannel::default();
        // Redelivered but never dead-lettered: still below any ceiling.
        let delivery = first_delivery().with_redelivered(true);

        let disposition = RedeliveryPolicy::default()
            .retry(&channel, &delivery, "orders.dlx", None, true)
            .await
            .unwrap();

        assert_eq!(disposition, Disposition::Resubmitted);
    }

    #[tokio::test]
    async fn test_zero_ceiling_always_falls_back() {
        let channel = RecordingChannel::default();
        let delivery = first_delivery();

        let disposition = RedeliveryPolicy::new(0)
            .retry(&channel, &delivery, "orders.dlx", None, true)
            .await
            .unwrap();

        assert_eq!(disposition, Disposition::Exhausted);
        assert_eq!(channel.ops(), vec![Op::Ack(7, false)]);
    }

    #[tokio::test]
    async fn test_decision_is_idempotent_for_equal_metadata() {
        let channel = RecordingChannel::default();
        let delivery = dead_lettered(1);
        let policy = RedeliveryPolicy::default();

        let first = policy
            .retry(&channel, &delivery, "orders.dlx", None, true)
            .await
            .unwrap();
        let second = policy
            .retry(&channel, &delivery, "orders.dlx", None, true)
            .await
            .unwrap();

        assert_eq!(first, second);
        assert_eq!(first, Disposition::Resubmitted);
    }

    #[tokio::test]
    async fn test_publish_error_propagates_and_skips_ack() {
        let channel = RecordingChannel::failing_publish();
        let delivery = first_delivery();

        let err = RedeliveryPolicy::default()
            .retry(&channel, &delivery, "orders.dlx", None, true)
            .await
            .unwrap_err();

        assert!(matches!(err, RedeliveryError::Broker(_)));
        // The failed resubmit aborts the procedure before the ack.
        assert!(channel.ops().is_empty());
    }

    #[tokio::test]
    async fn test_fallback_error_propagates_and_skips_ack() {
        let channel = RecordingChannel::default();
        let delivery = dead_lettered(5);

        let err = RedeliveryPolicy::default()
            .retry_or_exec(&channel, &delivery, "orders.dlx", None, true, || async {
                Err(TaskError::fail("give-up handler failed"))
            })
            .await
            .unwrap_err();

        assert!(matches!(err, RedeliveryError::Task(_)));
        assert!(channel.ops().is_empty());
    }
}
