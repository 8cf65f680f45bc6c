//! System configuration parameters
//!
//! All tunable parameters for the IrriNet simulation.  Values can be
//! overridden by passing a JSON config file path on the command line;
//! anything not overridden keeps its default.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Core system configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SystemConfig {
    // --- Flow monitoring ---
    /// Water flow threshold (litres/minute) above which a sample counts
    /// toward a high-flow alert.
    pub flow_threshold_lpm: f64,
    /// Consecutive over-threshold samples required before the high-flow
    /// alert fires.
    pub flow_alert_ticks: u32,
    /// Upper bound of the uniform flow sample drawn each device tick.
    pub flow_sample_max_lpm: f64,

    // --- Moisture / irrigation ---
    /// Moisture (percent) below which the control center activates
    /// irrigation.
    pub moisture_low_pct: i32,
    /// Moisture (percent) above which the control center deactivates
    /// irrigation.
    pub moisture_high_pct: i32,
    /// Moisture delta applied per tick while irrigation is on (and
    /// subtracted while off).
    pub moisture_step_pct: i32,
    /// Initial moisture for new sensors and for readings that omit it.
    pub initial_moisture_pct: i32,

    // --- Leak simulation ---
    /// Probability that a device tick reports a water leak.
    pub leak_probability: f64,

    // --- Savings accounting ---
    /// Litres credited to the savings total per DEACTIVATE_IRRIGATION
    /// dispatch (flat model, independent of measured flow).
    pub water_saved_per_stop_l: f64,

    // --- Timing ---
    /// Device telemetry tick period (seconds).
    pub device_tick_secs: u32,
    /// Control center prediction/report period (seconds).
    pub report_interval_secs: u32,
    /// Event-loop poll granularity (milliseconds).  Inbound messages
    /// are drained once per poll.
    pub poll_interval_ms: u64,

    // --- Topics ---
    /// Topic all field units publish readings on.
    pub data_topic: String,
    /// Topic both sides publish alerts on.
    pub alert_topic: String,
    /// Per-sensor command topics are `"{command_topic_prefix}/{sensor_id}"`.
    pub command_topic_prefix: String,

    // --- Deployment ---
    /// Sensor identifiers; one field unit loop is spawned per entry.
    pub sensor_ids: Vec<String>,
    /// Seed for the simulation RNG.  Identical seeds replay identical
    /// flow/leak sequences.  `None` seeds from OS entropy.
    pub rng_seed: Option<u64>,
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            // Flow
            flow_threshold_lpm: 50.0,
            flow_alert_ticks: 10,
            flow_sample_max_lpm: 150.0,

            // Moisture
            moisture_low_pct: 30,
            moisture_high_pct: 70,
            moisture_step_pct: 5,
            initial_moisture_pct: 70,

            // Leak
            leak_probability: 0.5,

            // Savings
            water_saved_per_stop_l: 5.0,

            // Timing
            device_tick_secs: 5,
            report_interval_secs: 10,
            poll_interval_ms: 250,

            // Topics
            data_topic: "sensors/data".to_string(),
            alert_topic: "sensors/alerts".to_string(),
            command_topic_prefix: "sensors/commands".to_string(),

            // Deployment
            sensor_ids: vec!["tank-1".to_string(), "tank-2".to_string()],
            rng_seed: Some(42),
        }
    }
}

impl SystemConfig {
    /// Load configuration from a JSON file, falling back to defaults for
    /// absent fields.  Returns `Error::Config` if the file cannot be
    /// read or parsed.
    pub fn load_from(path: &str) -> Result<Self> {
        let text =
            std::fs::read_to_string(path).map_err(|_| Error::Config("config file unreadable"))?;
        let cfg: Self =
            serde_json::from_str(&text).map_err(|_| Error::Config("config file malformed"))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Range-check the fields the control logic depends on.
    pub fn validate(&self) -> Result<()> {
        if self.flow_alert_ticks == 0 {
            return Err(Error::Config("flow_alert_ticks must be at least 1"));
        }
        if self.flow_threshold_lpm < 0.0 {
            return Err(Error::Config("flow_threshold_lpm must be non-negative"));
        }
        if !(0.0..=1.0).contains(&self.leak_probability) {
            return Err(Error::Config("leak_probability must be within [0,1]"));
        }
        if self.moisture_low_pct >= self.moisture_high_pct {
            return Err(Error::Config(
                "moisture_low_pct must be below moisture_high_pct",
            ));
        }
        if self.device_tick_secs == 0 || self.report_interval_secs == 0 {
            return Err(Error::Config("tick periods must be non-zero"));
        }
        if self.sensor_ids.is_empty() {
            return Err(Error::Config("at least one sensor id is required"));
        }
        Ok(())
    }

    /// Command topic for one sensor.
    pub fn command_topic(&self, sensor_id: &str) -> String {
        format!("{}/{}", self.command_topic_prefix, sensor_id)
    }
}
