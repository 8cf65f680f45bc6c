//! Component event loops.
//!
//! Each component runs one thread that owns its state exclusively; the
//! loop sleeps for the poll interval, drains the component's inbound
//! subscription, and divides polls down into the component's slower
//! periodic cadence.  Message handling and timer work are therefore
//! serialized per component — no lock is needed around the per-sensor
//! map or the device state.
//!
//! ```text
//!  ┌─────────────────────────────┐   ┌──────────────────────────────┐
//!  │  field unit thread (per id) │   │  control center thread       │
//!  │  drain commands → tick()    │   │  drain readings → on_reading │
//!  └──────────────┬──────────────┘   │  every 10 s → periodic_tick  │
//!                 │                  └──────────────┬───────────────┘
//!                 └───────────▶ Broker ◀────────────┘
//! ```
//!
//! Shutdown: a shared flag set by the signal handler; every loop
//! observes it each poll and returns, letting `main` join the threads
//! and close the broker.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::{Duration, SystemTime};

use log::{debug, error, info, warn};

use crate::bus::broker::Broker;
use crate::center::ControlCenter;
use crate::config::SystemConfig;
use crate::device::FieldUnit;
use crate::device::sampling::{SampleSource, SimSampler};
use crate::wire::{Command, SensorReading};

/// Polls per periodic cycle, never less than one.
fn polls_per_cycle(period_secs: u32, poll_interval_ms: u64) -> u64 {
    (u64::from(period_secs) * 1000 / poll_interval_ms.max(1)).max(1)
}

/// Field unit event loop: drains inbound commands every poll and runs
/// one telemetry tick per device cadence.  Returns when the shutdown
/// flag is raised or the bus goes away.
pub fn run_field_unit(
    config: &SystemConfig,
    sensor_id: &str,
    broker: &Arc<Broker>,
    shutdown: &Arc<AtomicBool>,
    mut samples: impl SampleSource,
) {
    let commands = broker.subscribe(&config.command_topic(sensor_id));
    let mut unit = FieldUnit::new(sensor_id, config);
    let poll = Duration::from_millis(config.poll_interval_ms);
    let cycle = polls_per_cycle(config.device_tick_secs, config.poll_interval_ms);
    let mut polls = 0u64;

    info!("[{sensor_id}] field unit started (tick every {} s)", config.device_tick_secs);
    while !shutdown.load(Ordering::Acquire) {
        thread::sleep(poll);

        // Commands arrive out-of-band relative to the tick cadence but
        // are applied from this same loop, keeping state single-owner.
        while let Some(msg) = commands.try_next() {
            match Command::parse(&msg.payload) {
                Some(cmd) => unit.handle_command(cmd),
                None => debug!("[{sensor_id}] ignoring unrecognized command payload"),
            }
        }

        polls += 1;
        if polls >= cycle {
            polls = 0;
            if let Err(e) = unit.tick(&mut samples, broker.as_ref()) {
                // No retries at this layer: a dead transport ends the
                // loop and the process winds down.
                error!("[{sensor_id}] telemetry publish failed: {e}");
                break;
            }
        }
    }
    info!("[{sensor_id}] field unit stopped");
}

/// Control center event loop: drains inbound readings every poll and
/// runs the prediction/report pass on its own independent cadence.
pub fn run_control_center(config: &SystemConfig, broker: &Arc<Broker>, shutdown: &Arc<AtomicBool>) {
    let readings = broker.subscribe(&config.data_topic);
    let mut center = ControlCenter::new(config);
    let poll = Duration::from_millis(config.poll_interval_ms);
    let cycle = polls_per_cycle(config.report_interval_secs, config.poll_interval_ms);
    let mut polls = 0u64;

    info!(
        "CENTER | listening on '{}' (report every {} s)",
        config.data_topic, config.report_interval_secs,
    );
    while !shutdown.load(Ordering::Acquire) {
        thread::sleep(poll);

        while let Some(msg) = readings.try_next() {
            // Malformed telemetry is dropped, never fatal: the
            // monitoring loop keeps running on whatever does parse.
            match SensorReading::decode(&msg.payload) {
                Ok(reading) => {
                    if let Err(e) =
                        center.on_reading(&reading, SystemTime::now(), broker.as_ref())
                    {
                        error!("CENTER | dispatch failed: {e}");
                        shutdown.store(true, Ordering::Release);
                        break;
                    }
                }
                Err(e) => warn!("CENTER | dropping unusable reading: {e}"),
            }
        }

        polls += 1;
        if polls >= cycle {
            polls = 0;
            let report = center.periodic_tick(SystemTime::now());
            info!("CENTER | {report}");
        }
    }
    info!("CENTER | stopped");
}

/// Spawn every component thread for the configured deployment: one
/// control center plus one field unit per sensor id.
pub fn spawn_all(
    config: &SystemConfig,
    broker: &Arc<Broker>,
    shutdown: &Arc<AtomicBool>,
) -> std::io::Result<Vec<thread::JoinHandle<()>>> {
    let mut handles = Vec::new();

    {
        let config = config.clone();
        let broker = Arc::clone(broker);
        let shutdown = Arc::clone(shutdown);
        handles.push(
            thread::Builder::new()
                .name("control-center".to_string())
                .spawn(move || run_control_center(&config, &broker, &shutdown))?,
        );
    }

    for (index, sensor_id) in config.sensor_ids.iter().enumerate() {
        // Distinct per-unit streams from one configured seed keep the
        // whole deployment replayable.
        let samples = match config.rng_seed {
            Some(seed) => SimSampler::seeded(
                seed.wrapping_add(index as u64),
                config.flow_sample_max_lpm,
                config.leak_probability,
            ),
            None => SimSampler::from_entropy(config.flow_sample_max_lpm, config.leak_probability),
        };
        let config = config.clone();
        let sensor_id = sensor_id.clone();
        let broker = Arc::clone(broker);
        let shutdown = Arc::clone(shutdown);
        handles.push(
            thread::Builder::new()
                .name(format!("field-{sensor_id}"))
                .spawn(move || run_field_unit(&config, &sensor_id, &broker, &shutdown, samples))?,
        );
    }
    Ok(handles)
}
