//! Recording bus for integration tests.
//!
//! Implements the publish port and keeps every published frame so
//! tests can assert on the full traffic history without wiring up the
//! real broker.

use std::cell::RefCell;

use irrinet::bus::PublishPort;
use irrinet::error::BusError;
use irrinet::wire::{AlertMessage, Command};

#[derive(Default)]
pub struct RecordingBus {
    pub published: RefCell<Vec<(String, Vec<u8>)>>,
}

#[allow(dead_code)]
impl RecordingBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn payloads_on(&self, topic: &str) -> Vec<Vec<u8>> {
        self.published
            .borrow()
            .iter()
            .filter(|(t, _)| t == topic)
            .map(|(_, p)| p.clone())
            .collect()
    }

    pub fn alerts_on(&self, topic: &str) -> Vec<AlertMessage> {
        self.payloads_on(topic)
            .iter()
            .map(|p| AlertMessage::decode(p).expect("recorded alert must decode"))
            .collect()
    }

    pub fn commands_for(&self, sensor_id: &str) -> Vec<Command> {
        self.payloads_on(&format!("sensors/commands/{sensor_id}"))
            .iter()
            .filter_map(|p| Command::parse(p))
            .collect()
    }

    pub fn total_published(&self) -> usize {
        self.published.borrow().len()
    }
}

impl PublishPort for RecordingBus {
    fn publish(&self, topic: &str, payload: &[u8]) -> Result<(), BusError> {
        self.published
            .borrow_mut()
            .push((topic.to_string(), payload.to_vec()));
        Ok(())
    }
}
