//! IrriNet — irrigation sensor network simulator.
//!
//! Spawns one control center and one field unit per configured sensor
//! id, all talking over the in-process topic broker:
//!
//! ```text
//!  field units ──(readings)──▶ control center
//!  control center ──(commands)──▶ field units
//!  both ──(alerts)──▶ alert topic
//! ```
//!
//! Usage: `irrinet [config.json]` — any field absent from the file
//! keeps its default.  Runs until SIGINT/SIGTERM, then stops every
//! loop, joins the threads, and closes the broker.

use std::sync::Arc;
use std::sync::atomic::AtomicBool;

use anyhow::{Context, Result};
use log::{info, warn};

use irrinet::bus::broker::Broker;
use irrinet::config::SystemConfig;
use irrinet::runtime;

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = match std::env::args().nth(1) {
        Some(path) => {
            SystemConfig::load_from(&path).with_context(|| format!("loading config '{path}'"))?
        }
        None => SystemConfig::default(),
    };
    config.validate().context("validating config")?;

    info!(
        "IrriNet v{} | {} field unit(s) | data on '{}'",
        env!("CARGO_PKG_VERSION"),
        config.sensor_ids.len(),
        config.data_topic,
    );

    // Shutdown flag raised by SIGINT/SIGTERM; every event loop polls it.
    let shutdown = Arc::new(AtomicBool::new(false));
    for sig in [signal_hook::consts::SIGINT, signal_hook::consts::SIGTERM] {
        signal_hook::flag::register(sig, Arc::clone(&shutdown))
            .context("registering signal handler")?;
    }

    let broker = Arc::new(Broker::new());
    let handles = runtime::spawn_all(&config, &broker, &shutdown)
        .context("spawning component threads")?;

    for handle in handles {
        if handle.join().is_err() {
            warn!("a component thread panicked during shutdown");
        }
    }

    // Release the transport on every exit path.
    broker.close();
    info!("shutdown complete");
    Ok(())
}
