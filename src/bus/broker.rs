//! In-process topic broker.
//!
//! Stands in for the deployment's real pub/sub transport.  Routing is
//! exact-match on topic names; every subscriber owns a bounded inbox
//! channel and publishing never blocks — a full inbox drops the
//! message with a warning, mirroring the transport's lack of delivery
//! guarantees.
//!
//! The subscription table is the only structure shared across
//! component threads and sits behind a mutex; everything else each
//! component owns exclusively inside its own event loop.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use log::{debug, info, warn};

use super::{BusMessage, Inbox, PublishPort, Subscription};
use crate::error::BusError;

struct Route {
    topic: String,
    inbox: Arc<Inbox>,
}

/// Exact-match topic broker with bounded per-subscriber inboxes.
pub struct Broker {
    routes: Mutex<Vec<Route>>,
    closed: AtomicBool,
}

impl Broker {
    pub fn new() -> Self {
        Self {
            routes: Mutex::new(Vec::new()),
            closed: AtomicBool::new(false),
        }
    }

    /// Register a subscriber on `topic` and hand back its inbox.
    pub fn subscribe(&self, topic: &str) -> Subscription {
        let inbox = Arc::new(Inbox::new());
        self.routes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(Route {
                topic: topic.to_string(),
                inbox: Arc::clone(&inbox),
            });
        debug!("BUS | subscribed on '{topic}'");
        Subscription {
            topic: topic.to_string(),
            inbox,
        }
    }

    /// Shut the broker down: refuse further traffic and release every
    /// subscriber route.  Part of the process exit path.
    pub fn close(&self) {
        self.closed.store(true, Ordering::Release);
        self.routes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
        info!("BUS | closed");
    }
}

impl Default for Broker {
    fn default() -> Self {
        Self::new()
    }
}

impl PublishPort for Broker {
    fn publish(&self, topic: &str, payload: &[u8]) -> Result<(), BusError> {
        if self.closed.load(Ordering::Acquire) {
            return Err(BusError::Closed);
        }
        let frame =
            heapless::Vec::from_slice(payload).map_err(|()| BusError::PayloadTooLarge)?;
        let msg = BusMessage {
            topic: topic.to_string(),
            payload: frame,
        };

        let routes = self.routes.lock().unwrap_or_else(PoisonError::into_inner);
        for route in routes.iter().filter(|r| r.topic == topic) {
            if route.inbox.try_send(msg.clone()).is_err() {
                warn!("BUS | inbox full on '{topic}', dropping message");
            }
        }
        // Zero subscribers is fine: fire-and-forget.
        Ok(())
    }
}
