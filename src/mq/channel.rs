//! # Broker channel contract.
//!
//! The message broker client is supplied by the caller; this trait captures
//! the minimum surface the redelivery policies need. Implementations are
//! assumed safe for concurrent use across independent invocations per their
//! own contracts — this crate neither pools nor caches them.

use async_trait::async_trait;

use crate::error::BrokerError;
use crate::mq::Delivery;

/// Contract for settling and recirculating deliveries.
///
/// All methods are fallible at the broker boundary; errors propagate through
/// the policy layer uncaught.
#[async_trait]
pub trait BrokerChannel: Send + Sync {
    /// Acknowledges the delivery with the given tag, removing it from the
    /// broker's unacknowledged set. `multiple = false` settles exactly one
    /// delivery.
    async fn ack(&self, delivery_tag: u64, multiple: bool) -> Result<(), BrokerError>;

    /// Rejects the delivery with the given tag; with `requeue = true` the
    /// broker will redeliver it (once) with the redelivered flag set.
    async fn reject(&self, delivery_tag: u64, requeue: bool) -> Result<(), BrokerError>;

    /// Publishes the message to `exchange` under `routing_key`. Used to
    /// resubmit a delivery unchanged to a dead-letter exchange.
    async fn publish(
        &self,
        exchange: &str,
        routing_key: &str,
        delivery: &Delivery,
    ) -> Result<(), BrokerError>;
}
