//! Wire records exchanged over the message bus.
//!
//! Readings and alerts are JSON objects; commands are plain text from a
//! closed vocabulary.  Decoding is deliberately lenient: a reading
//! missing `water_flow` or `water_leak` carries `None`, and a missing
//! `soil_moisture` falls back to the nominal 70 %.  Only a missing
//! `sensor_id` makes a message unusable.

use log::debug;
use serde::{Deserialize, Serialize};

use crate::error::CodecError;

/// Wire-level fallback for readings that omit `soil_moisture`.
const DEFAULT_MOISTURE_PCT: i32 = 70;

fn default_moisture() -> i32 {
    DEFAULT_MOISTURE_PCT
}

// ---------------------------------------------------------------------------
// Telemetry reading (field unit → control center)
// ---------------------------------------------------------------------------

/// One telemetry record published by a field unit.  Immutable once
/// published.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensorReading {
    pub sensor_id: String,
    /// Water flow in litres/minute; absent if the flow meter gave no
    /// sample.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub water_flow: Option<f64>,
    /// Soil moisture percent, nominally 0–100.
    #[serde(default = "default_moisture")]
    pub soil_moisture: i32,
    /// Whether a leak was detected this tick; absent if unknown.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub water_leak: Option<bool>,
}

impl SensorReading {
    pub fn encode(&self) -> Vec<u8> {
        // A struct of strings, numbers and bools cannot fail to encode.
        serde_json::to_vec(self).unwrap_or_default()
    }

    /// Lenient decode: absent fields fall back, malformed JSON or a
    /// missing `sensor_id` is rejected (and logged by the caller).
    pub fn decode(payload: &[u8]) -> Result<Self, CodecError> {
        let reading: Self = serde_json::from_slice(payload).map_err(|e| {
            debug!("reading decode failed: {e}");
            CodecError::Malformed
        })?;
        if reading.sensor_id.is_empty() {
            return Err(CodecError::MissingSensorId);
        }
        Ok(reading)
    }
}

// ---------------------------------------------------------------------------
// Alert (both sides → alert topic)
// ---------------------------------------------------------------------------

/// Fire-and-forget maintenance alert.  No state is retained for it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlertMessage {
    pub sensor_id: String,
    pub message: String,
}

impl AlertMessage {
    pub fn new(sensor_id: &str, message: &str) -> Self {
        Self {
            sensor_id: sensor_id.to_string(),
            message: message.to_string(),
        }
    }

    pub fn encode(&self) -> Vec<u8> {
        serde_json::to_vec(self).unwrap_or_default()
    }

    pub fn decode(payload: &[u8]) -> Result<Self, CodecError> {
        serde_json::from_slice(payload).map_err(|e| {
            debug!("alert decode failed: {e}");
            CodecError::Malformed
        })
    }
}

// ---------------------------------------------------------------------------
// Commands (control center → one field unit)
// ---------------------------------------------------------------------------

/// Closed command vocabulary, sent as plain text on a per-sensor topic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    ActivateIrrigation,
    DeactivateIrrigation,
    CheckFlow,
    CheckLeak,
}

impl Command {
    /// Wire spelling of the command.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ActivateIrrigation => "ACTIVATE_IRRIGATION",
            Self::DeactivateIrrigation => "DEACTIVATE_IRRIGATION",
            Self::CheckFlow => "CHECK_FLOW",
            Self::CheckLeak => "CHECK_LEAK",
        }
    }

    /// Parse a command payload.  Anything outside the vocabulary
    /// (including non-UTF-8) yields `None` and is ignored by the
    /// receiver — no error, no acknowledgment.
    pub fn parse(payload: &[u8]) -> Option<Self> {
        match core::str::from_utf8(payload).ok()?.trim() {
            "ACTIVATE_IRRIGATION" => Some(Self::ActivateIrrigation),
            "DEACTIVATE_IRRIGATION" => Some(Self::DeactivateIrrigation),
            "CHECK_FLOW" => Some(Self::CheckFlow),
            "CHECK_LEAK" => Some(Self::CheckLeak),
            _ => None,
        }
    }
}
