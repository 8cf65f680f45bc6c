//! Message bus boundary.
//!
//! The transport is an external collaborator consumed through two
//! narrow surfaces: a publish capability ([`PublishPort`]) and an
//! inbound delivery queue ([`Subscription`]).  Domain components only
//! ever see these; the in-process [`Broker`](broker::Broker) is one
//! adapter behind them, and test doubles record publishes instead.
//!
//! ```text
//!   FieldUnit ──▶ PublishPort ──▶ ┌────────┐ ──▶ Subscription ──▶ ControlCenter
//!   ControlCenter ──▶ ───────────│ Broker │──▶ ────────────────▶ FieldUnit
//!                                 └────────┘
//! ```

pub mod broker;

use std::sync::Arc;

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;

use crate::error::BusError;

/// Fixed capacity of one bus frame's payload.
pub const MAX_PAYLOAD: usize = 512;

/// Pending messages a subscriber may hold before publishes to it are
/// dropped.
pub const INBOX_DEPTH: usize = 32;

/// One delivered message: the topic it was published on plus the raw
/// payload bytes.
#[derive(Debug, Clone)]
pub struct BusMessage {
    pub topic: String,
    pub payload: heapless::Vec<u8, MAX_PAYLOAD>,
}

/// Write-side port: fire-and-forget publish.  No acknowledgment, no
/// retry, no backpressure.
pub trait PublishPort {
    fn publish(&self, topic: &str, payload: &[u8]) -> Result<(), BusError>;
}

pub(crate) type Inbox = Channel<CriticalSectionRawMutex, BusMessage, INBOX_DEPTH>;

/// Read side of one topic subscription.  The owning component drains it
/// from its own event loop; delivery is therefore serialized with the
/// component's periodic work by construction.
pub struct Subscription {
    pub(crate) topic: String,
    pub(crate) inbox: Arc<Inbox>,
}

impl Subscription {
    /// Pop the next pending message, if any.  Never blocks.
    pub fn try_next(&self) -> Option<BusMessage> {
        self.inbox.try_receive().ok()
    }

    /// Topic this subscription is bound to.
    pub fn topic(&self) -> &str {
        &self.topic
    }
}
