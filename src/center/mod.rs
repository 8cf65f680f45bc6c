//! Control center — server-side state aggregation and command dispatch.
//!
//! Consumes readings from every field unit, mirrors the last known
//! value per sensor, and reacts with commands and alerts.  An
//! independent periodic pass advances a local moisture prediction
//! between telemetry updates (modeling observational lag) and renders
//! a status snapshot.
//!
//! State updates are idempotent overwrites of "last known value"; the
//! only monotonic quantities are the per-sensor high-flow counters and
//! the savings total.

use std::collections::BTreeMap;
use std::fmt;
use std::time::SystemTime;

use log::{debug, info};

use crate::bus::PublishPort;
use crate::config::SystemConfig;
use crate::error::Result;
use crate::monitor::SustainedThresholdMonitor;
use crate::wire::{AlertMessage, Command, SensorReading};

/// Alert text when a sensor's flow stays above threshold too long.
pub const HIGH_FLOW_ALERT: &str = "Possible fault or malfunction detected";
/// Alert text relayed when a reading reports a leak.
pub const LEAK_ALERT: &str = "Immediate intervention required for water leak";

const MOISTURE_MIN: i32 = 0;
const MOISTURE_MAX: i32 = 100;

/// Last known state of one sensor.  Created lazily on the first
/// reading and kept for the process lifetime.
#[derive(Debug)]
pub struct SensorState {
    /// Mirrors the last reading, then drifts under the periodic
    /// predictor until the next reading overwrites it.
    pub soil_moisture: i32,
    pub irrigation_active: bool,
    pub last_flow_lpm: Option<f64>,
    pub last_leak: Option<bool>,
    pub last_update: SystemTime,
    flow_monitor: SustainedThresholdMonitor,
}

impl SensorState {
    /// Consecutive over-threshold readings seen for this sensor.
    pub fn high_flow_count(&self) -> u32 {
        self.flow_monitor.count()
    }
}

/// Aggregates all known sensors and dispatches commands and alerts.
pub struct ControlCenter {
    sensors: BTreeMap<String, SensorState>,
    total_water_saved_l: f64,
    flow_threshold_lpm: f64,
    flow_alert_ticks: u32,
    moisture_low_pct: i32,
    moisture_high_pct: i32,
    moisture_step_pct: i32,
    initial_moisture_pct: i32,
    water_saved_per_stop_l: f64,
    alert_topic: String,
    command_topic_prefix: String,
}

impl ControlCenter {
    pub fn new(config: &SystemConfig) -> Self {
        Self {
            sensors: BTreeMap::new(),
            total_water_saved_l: 0.0,
            flow_threshold_lpm: config.flow_threshold_lpm,
            flow_alert_ticks: config.flow_alert_ticks,
            moisture_low_pct: config.moisture_low_pct,
            moisture_high_pct: config.moisture_high_pct,
            moisture_step_pct: config.moisture_step_pct,
            initial_moisture_pct: config.initial_moisture_pct,
            water_saved_per_stop_l: config.water_saved_per_stop_l,
            alert_topic: config.alert_topic.clone(),
            command_topic_prefix: config.command_topic_prefix.clone(),
        }
    }

    /// Process one inbound reading: lazily create state, overwrite last
    /// known values, then run the flow, moisture and leak checks.
    pub fn on_reading(
        &mut self,
        reading: &SensorReading,
        now: SystemTime,
        bus: &impl PublishPort,
    ) -> Result<()> {
        let sensor_id = reading.sensor_id.clone();
        let initial_moisture = self.initial_moisture_pct;
        let flow_threshold = self.flow_threshold_lpm;
        let flow_ticks = self.flow_alert_ticks;

        // Mutate the per-sensor entry in one scope, collecting the
        // decisions; publishes happen afterwards.
        let (fire_flow_alert, command) = {
            let state = self.sensors.entry(sensor_id.clone()).or_insert_with(|| {
                info!("CENTER | new sensor '{sensor_id}', state created with defaults");
                SensorState {
                    soil_moisture: initial_moisture,
                    irrigation_active: false,
                    last_flow_lpm: None,
                    last_leak: None,
                    last_update: now,
                    flow_monitor: SustainedThresholdMonitor::new(flow_threshold, flow_ticks),
                }
            });

            state.last_flow_lpm = reading.water_flow;
            state.soil_moisture = reading.soil_moisture;
            state.last_leak = reading.water_leak;
            state.last_update = now;
            debug!(
                "CENTER | {sensor_id} | flow={:?} moisture={}% leak={:?}",
                reading.water_flow, reading.soil_moisture, reading.water_leak,
            );

            // Flow check: debounced per sensor.  A reading without a
            // flow sample neither advances nor resets the counter.
            let fire = reading
                .water_flow
                .is_some_and(|flow| state.flow_monitor.observe(flow));

            // Moisture check: a band, not a single threshold.  Inside
            // [low, high] neither command is issued.
            let command = if reading.soil_moisture < self.moisture_low_pct {
                state.irrigation_active = true;
                Some(Command::ActivateIrrigation)
            } else if reading.soil_moisture > self.moisture_high_pct {
                state.irrigation_active = false;
                Some(Command::DeactivateIrrigation)
            } else {
                None
            };
            (fire, command)
        };

        if let Some(cmd) = command {
            if cmd == Command::DeactivateIrrigation {
                // Flat savings model: a fixed credit per stop command,
                // independent of measured flow volume.
                self.total_water_saved_l += self.water_saved_per_stop_l;
                info!(
                    "CENTER | {sensor_id} | water saved so far: {:.1} L",
                    self.total_water_saved_l,
                );
            }
            self.send_command(bus, &sensor_id, cmd)?;
        }

        if fire_flow_alert {
            self.send_alert(bus, &sensor_id, HIGH_FLOW_ALERT)?;
        }

        // Leak check: relayed unconditionally on every leak reading,
        // deliberately asymmetric with the debounced flow alert.
        if reading.water_leak == Some(true) {
            self.send_alert(bus, &sensor_id, LEAK_ALERT)?;
        }
        Ok(())
    }

    /// Periodic prediction-and-reporting pass, decoupled from message
    /// arrival: drift each sensor's moisture by the irrigation flag,
    /// then snapshot the whole network.  The snapshot is a pure read;
    /// nothing else consumes it.
    pub fn periodic_tick(&mut self, now: SystemTime) -> StatusReport {
        for (sensor_id, state) in &mut self.sensors {
            if state.irrigation_active {
                state.soil_moisture += self.moisture_step_pct;
            } else {
                state.soil_moisture -= self.moisture_step_pct;
            }
            state.soil_moisture = state.soil_moisture.clamp(MOISTURE_MIN, MOISTURE_MAX);
            debug!(
                "CENTER | {sensor_id} | predicted moisture {}% (irrigation {})",
                state.soil_moisture,
                if state.irrigation_active { "on" } else { "off" },
            );
        }
        StatusReport {
            generated_at: now,
            total_water_saved_l: self.total_water_saved_l,
            sensors: self
                .sensors
                .iter()
                .map(|(id, s)| SensorSummary {
                    sensor_id: id.clone(),
                    soil_moisture: s.soil_moisture,
                    irrigation_active: s.irrigation_active,
                    last_flow_lpm: s.last_flow_lpm,
                    last_leak: s.last_leak,
                    last_update: s.last_update,
                })
                .collect(),
        }
    }

    pub fn sensor(&self, sensor_id: &str) -> Option<&SensorState> {
        self.sensors.get(sensor_id)
    }

    pub fn sensor_count(&self) -> usize {
        self.sensors.len()
    }

    pub fn total_water_saved_l(&self) -> f64 {
        self.total_water_saved_l
    }

    fn send_command(&self, bus: &impl PublishPort, sensor_id: &str, cmd: Command) -> Result<()> {
        let topic = format!("{}/{sensor_id}", self.command_topic_prefix);
        info!("CENTER | {sensor_id} | command {}", cmd.as_str());
        bus.publish(&topic, cmd.as_str().as_bytes())?;
        Ok(())
    }

    fn send_alert(&self, bus: &impl PublishPort, sensor_id: &str, message: &str) -> Result<()> {
        info!("CENTER | {sensor_id} | alert: {message}");
        let alert = AlertMessage::new(sensor_id, message);
        bus.publish(&self.alert_topic, &alert.encode())?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Status report
// ---------------------------------------------------------------------------

/// Point-in-time snapshot of the whole network, suitable for logging.
#[derive(Debug, Clone)]
pub struct StatusReport {
    pub generated_at: SystemTime,
    pub total_water_saved_l: f64,
    pub sensors: Vec<SensorSummary>,
}

#[derive(Debug, Clone)]
pub struct SensorSummary {
    pub sensor_id: String,
    pub soil_moisture: i32,
    pub irrigation_active: bool,
    pub last_flow_lpm: Option<f64>,
    pub last_leak: Option<bool>,
    pub last_update: SystemTime,
}

impl fmt::Display for StatusReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "--- network status ({} sensors) ---", self.sensors.len())?;
        for s in &self.sensors {
            let age = self
                .generated_at
                .duration_since(s.last_update)
                .map_or_else(|_| "just now".to_string(), |d| format!("{}s ago", d.as_secs()));
            let flow = s
                .last_flow_lpm
                .map_or_else(|| "n/a".to_string(), |v| format!("{v:.2} L/min"));
            let leak = match s.last_leak {
                Some(true) => "detected",
                Some(false) => "none",
                None => "n/a",
            };
            writeln!(
                f,
                "{} | flow {} | moisture {}% | irrigation {} | leak {} | updated {}",
                s.sensor_id,
                flow,
                s.soil_moisture,
                if s.irrigation_active { "on" } else { "off" },
                leak,
                age,
            )?;
        }
        write!(f, "total water saved: {:.1} L", self.total_water_saved_l)
    }
}
