//! Field unit — one simulated irrigation sensor.
//!
//! Owns the device's physical state and produces one telemetry reading
//! per tick.  Commands from the control center arrive out-of-band and
//! only flip the irrigation flag; moisture moves exclusively inside
//! [`FieldUnit::tick`].
//!
//! Two behaviors are intentionally asymmetric, matching the deployed
//! system: the high-flow alert is debounced through the sustained
//! monitor while the leak alert fires on every tick it recurs.

pub mod sampling;

use log::{debug, info};

use crate::bus::PublishPort;
use crate::config::SystemConfig;
use crate::error::Result;
use crate::monitor::SustainedThresholdMonitor;
use crate::wire::{AlertMessage, Command, SensorReading};
use sampling::SampleSource;

/// Alert text for a sustained high-flow condition.
pub const HIGH_FLOW_ALERT: &str = "High water flow detected, possible fault or malfunction";
/// Alert text for a detected leak.
pub const LEAK_ALERT: &str = "Water leak detected, immediate intervention required";

/// Moisture is kept within the physically meaningful percent range.
const MOISTURE_MIN: i32 = 0;
const MOISTURE_MAX: i32 = 100;

/// The device's simulated physical state.  Exactly one exists per
/// running field unit.
#[derive(Debug, Clone)]
pub struct DeviceState {
    /// Soil moisture percent, clamped to [0, 100].
    pub soil_moisture: i32,
    pub irrigation_active: bool,
    /// Cumulative water drawn through this unit, in litres.
    pub total_water_used_l: f64,
}

/// One simulated sensor: state, flow monitor, and publication cadence
/// parameters.  Sampling and publishing are injected at call sites so
/// the whole unit runs deterministically under test.
pub struct FieldUnit {
    sensor_id: String,
    state: DeviceState,
    flow_monitor: SustainedThresholdMonitor,
    moisture_high_pct: i32,
    moisture_step_pct: i32,
    tick_secs: u32,
    data_topic: String,
    alert_topic: String,
}

impl FieldUnit {
    pub fn new(sensor_id: &str, config: &SystemConfig) -> Self {
        Self {
            sensor_id: sensor_id.to_string(),
            state: DeviceState {
                soil_moisture: config.initial_moisture_pct,
                irrigation_active: false,
                total_water_used_l: 0.0,
            },
            flow_monitor: SustainedThresholdMonitor::new(
                config.flow_threshold_lpm,
                config.flow_alert_ticks,
            ),
            moisture_high_pct: config.moisture_high_pct,
            moisture_step_pct: config.moisture_step_pct,
            tick_secs: config.device_tick_secs,
            data_topic: config.data_topic.clone(),
            alert_topic: config.alert_topic.clone(),
        }
    }

    /// Run one telemetry cycle: advance moisture, draw one flow sample,
    /// debounce-check it, draw the leak flag, publish alerts and the
    /// reading.
    ///
    /// The flow sample is drawn once and reused for accumulation,
    /// monitoring and the published reading.
    pub fn tick(&mut self, samples: &mut impl SampleSource, bus: &impl PublishPort) -> Result<()> {
        // 1. Moisture-and-irrigation rule.  The tick recomputes the
        //    irrigation flag from moisture alone; a command-set flag
        //    only survives until the next tick.
        if self.state.soil_moisture < self.moisture_high_pct {
            self.state.irrigation_active = true;
            self.state.soil_moisture += self.moisture_step_pct;
        } else {
            self.state.irrigation_active = false;
            self.state.soil_moisture -= self.moisture_step_pct;
        }
        self.state.soil_moisture = self.state.soil_moisture.clamp(MOISTURE_MIN, MOISTURE_MAX);
        debug!(
            "[{}] irrigation {} | moisture {}%",
            self.sensor_id,
            if self.state.irrigation_active { "on" } else { "off" },
            self.state.soil_moisture,
        );

        // 2. One flow sample per tick; accumulate usage over the tick
        //    window.
        let flow = samples.flow_lpm();
        self.state.total_water_used_l += flow * f64::from(self.tick_secs) / 60.0;

        // 3. Debounced high-flow alert.
        if self.flow_monitor.observe(flow) {
            info!("[{}] ALERT | sustained high flow ({flow:.2} L/min)", self.sensor_id);
            self.send_alert(bus, HIGH_FLOW_ALERT)?;
        }

        // 4. Un-debounced leak alert: fires on every tick it recurs.
        let leak = samples.leak();
        if leak {
            info!("[{}] ALERT | water leak detected", self.sensor_id);
            self.send_alert(bus, LEAK_ALERT)?;
        }

        // 5. Publish the telemetry reading.
        let reading = SensorReading {
            sensor_id: self.sensor_id.clone(),
            water_flow: Some(flow),
            soil_moisture: self.state.soil_moisture,
            water_leak: Some(leak),
        };
        bus.publish(&self.data_topic, &reading.encode())?;
        Ok(())
    }

    /// Apply one inbound command.  Activation commands are idempotent;
    /// check commands acknowledge without touching state.
    pub fn handle_command(&mut self, cmd: Command) {
        match cmd {
            Command::ActivateIrrigation => {
                self.state.irrigation_active = true;
                info!("[{}] CMD | irrigation activated", self.sensor_id);
            }
            Command::DeactivateIrrigation => {
                self.state.irrigation_active = false;
                info!("[{}] CMD | irrigation deactivated", self.sensor_id);
            }
            Command::CheckFlow => {
                info!(
                    "[{}] CMD | flow check: {:.2} L total used",
                    self.sensor_id, self.state.total_water_used_l,
                );
            }
            Command::CheckLeak => {
                info!("[{}] CMD | leak check in progress", self.sensor_id);
            }
        }
    }

    pub fn sensor_id(&self) -> &str {
        &self.sensor_id
    }

    pub fn state(&self) -> &DeviceState {
        &self.state
    }

    fn send_alert(&self, bus: &impl PublishPort, message: &str) -> Result<()> {
        let alert = AlertMessage::new(&self.sensor_id, message);
        bus.publish(&self.alert_topic, &alert.encode())?;
        Ok(())
    }
}
