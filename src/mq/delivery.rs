//! Per-message delivery metadata.

/// One cycle through a dead-letter path, as recorded by the broker.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DeathRecord {
    /// How many times the message died into the queue this record describes.
    pub count: u64,
}

impl DeathRecord {
    /// Creates a death record with the given count.
    pub fn new(count: u64) -> Self {
        Self { count }
    }
}

/// Immutable metadata of a single message delivery.
///
/// Everything here is broker-assigned; this crate never mutates a delivery,
/// and the broker guarantees the death count is monotonically non-decreasing
/// across redeliveries of the same logical message.
///
/// # Example
/// ```
/// use holdfast::{DeathRecord, Delivery};
///
/// let delivery = Delivery::new(42, "orders.created", b"payload".to_vec())
///     .with_redelivered(true)
///     .with_deaths(vec![DeathRecord::new(2)]);
///
/// assert_eq!(delivery.death_count(), 2);
/// ```
#[derive(Clone, Debug)]
pub struct Delivery {
    /// Broker-assigned sequence identifier, used to ack or reject exactly
    /// this delivery.
    pub delivery_tag: u64,
    /// Set by the broker when this is not the message's first delivery.
    pub redelivered: bool,
    /// The routing key the message was received under.
    pub routing_key: String,
    /// Opaque message body, passed through unchanged on resubmission.
    pub payload: Vec<u8>,
    /// Ordered death records; the first record's count is the effective
    /// death count.
    pub deaths: Vec<DeathRecord>,
}

impl Delivery {
    /// Creates a first-delivery record with no death history.
    pub fn new(delivery_tag: u64, routing_key: impl Into<String>, payload: Vec<u8>) -> Self {
        Self {
            delivery_tag,
            redelivered: false,
            routing_key: routing_key.into(),
            payload,
            deaths: Vec::new(),
        }
    }

    /// Sets the redelivered flag.
    pub fn with_redelivered(mut self, redelivered: bool) -> Self {
        self.redelivered = redelivered;
        self
    }

    /// Attaches the broker's death records.
    pub fn with_deaths(mut self, deaths: Vec<DeathRecord>) -> Self {
        self.deaths = deaths;
        self
    }

    /// Effective death count: the first record's count, or 0 when the
    /// message has never been dead-lettered.
    pub fn death_count(&self) -> u64 {
        self.deaths.first().map(|d| d.count).unwrap_or(0)
    }
}
