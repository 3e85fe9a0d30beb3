//! # Redelivery retry policies for at-least-once broker consumers.
//!
//! A consumer invokes one decision procedure per received message; the
//! procedure settles the delivery exactly once by acknowledging,
//! rejecting-and-requeueing, or resubmitting it to a dead-letter exchange.
//!
//! ```text
//!   Delivery (tag, redelivered, deaths)
//!        │
//!        ▼
//!   RedeliveryPolicy ──► BrokerChannel (ack / reject / publish)
//!        │
//!        └──► fallback (runs once when the retry budget is spent)
//! ```
//!
//! The broker client itself is an external collaborator behind the
//! [`BrokerChannel`] trait; this module only layers the retry/give-up
//! classification on top of it.

mod channel;
mod delivery;
mod policy;

pub use channel::BrokerChannel;
pub use delivery::{DeathRecord, Delivery};
pub use policy::{Disposition, RedeliveryPolicy};
