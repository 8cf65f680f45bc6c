//! Unified error types for the IrriNet simulator.
//!
//! A single `Error` enum that every subsystem can convert into, keeping
//! the top-level event loops' error handling uniform.  All variants are
//! `Copy` so they can be cheaply passed around without allocation; the
//! underlying cause (e.g. a serde parse error) is logged at the site
//! where it occurs.

use core::fmt;

// ---------------------------------------------------------------------------
// Top-level error
// ---------------------------------------------------------------------------

/// Every fallible operation in the simulator funnels into this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// The message bus rejected a publish or subscription.
    Bus(BusError),
    /// A wire payload could not be encoded or decoded.
    Codec(CodecError),
    /// Configuration is invalid or could not be loaded.
    Config(&'static str),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bus(e) => write!(f, "bus: {e}"),
            Self::Codec(e) => write!(f, "codec: {e}"),
            Self::Config(msg) => write!(f, "config: {msg}"),
        }
    }
}

impl std::error::Error for Error {}

// ---------------------------------------------------------------------------
// Bus errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BusError {
    /// The broker has been shut down; no further traffic is accepted.
    Closed,
    /// The payload exceeds the fixed bus frame capacity.
    PayloadTooLarge,
}

impl fmt::Display for BusError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Closed => write!(f, "broker closed"),
            Self::PayloadTooLarge => write!(f, "payload too large"),
        }
    }
}

impl From<BusError> for Error {
    fn from(e: BusError) -> Self {
        Self::Bus(e)
    }
}

// ---------------------------------------------------------------------------
// Codec errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CodecError {
    /// Payload is not valid JSON or not valid UTF-8.
    Malformed,
    /// A reading arrived without a `sensor_id`; it cannot be attributed.
    MissingSensorId,
}

impl fmt::Display for CodecError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Malformed => write!(f, "malformed payload"),
            Self::MissingSensorId => write!(f, "reading without sensor_id"),
        }
    }
}

impl From<CodecError> for Error {
    fn from(e: CodecError) -> Self {
        Self::Codec(e)
    }
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Crate-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
