//! IrriNet simulator library.
//!
//! Exposes the pure-logic modules for integration testing and external
//! inspection.  The binary in `main.rs` only wires them to the
//! in-process broker and the process lifecycle.

#![deny(unused_must_use)]

pub mod bus;
pub mod center;
pub mod config;
pub mod device;
pub mod monitor;
pub mod runtime;
pub mod wire;

pub mod error;
