//! Whole-pipeline tests: field units and the control center wired
//! through the real broker, pumped synchronously so every exchange is
//! deterministic, plus a smoke test of the threaded runtime.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::SystemTime;

use irrinet::bus::broker::Broker;
use irrinet::center::ControlCenter;
use irrinet::config::SystemConfig;
use irrinet::device::sampling::ScriptedSamples;
use irrinet::device::FieldUnit;
use irrinet::runtime;
use irrinet::wire::{Command, SensorReading};

/// Drain the data subscription into the center, then feed any resulting
/// command back into the unit.  One call models one end-to-end
/// exchange.
fn pump(
    broker: &Broker,
    data: &irrinet::bus::Subscription,
    commands: &irrinet::bus::Subscription,
    center: &mut ControlCenter,
    unit: &mut FieldUnit,
) {
    while let Some(msg) = data.try_next() {
        let reading = SensorReading::decode(&msg.payload).unwrap();
        center.on_reading(&reading, SystemTime::now(), broker).unwrap();
    }
    while let Some(msg) = commands.try_next() {
        if let Some(cmd) = Command::parse(&msg.payload) {
            unit.handle_command(cmd);
        }
    }
}

#[test]
fn reading_flows_from_unit_to_center_state() {
    let cfg = SystemConfig::default();
    let broker = Broker::new();
    let data = broker.subscribe(&cfg.data_topic);
    let commands = broker.subscribe(&cfg.command_topic("tank-1"));

    let mut unit = FieldUnit::new("tank-1", &cfg);
    let mut center = ControlCenter::new(&cfg);
    let mut samples = ScriptedSamples::new(vec![20.0], vec![false]);

    unit.tick(&mut samples, &broker).unwrap();
    pump(&broker, &data, &commands, &mut center, &mut unit);

    let state = center.sensor("tank-1").expect("center learned the sensor");
    assert_eq!(state.last_flow_lpm, Some(20.0));
    assert_eq!(state.soil_moisture, unit.state().soil_moisture);
}

#[test]
fn center_command_reaches_the_unit_and_flips_irrigation() {
    let mut cfg = SystemConfig::default();
    // Start wet so the first tick pushes moisture above the band and
    // the center answers with a stop command.
    cfg.initial_moisture_pct = 95;
    let broker = Broker::new();
    let data = broker.subscribe(&cfg.data_topic);
    let commands = broker.subscribe(&cfg.command_topic("tank-1"));

    let mut unit = FieldUnit::new("tank-1", &cfg);
    let mut center = ControlCenter::new(&cfg);
    let mut samples = ScriptedSamples::new(vec![5.0], vec![false]);

    unit.tick(&mut samples, &broker).unwrap();
    assert_eq!(unit.state().soil_moisture, 90, "still above the band");
    pump(&broker, &data, &commands, &mut center, &mut unit);

    assert!(!unit.state().irrigation_active, "stop command applied");
    assert!((center.total_water_saved_l() - cfg.water_saved_per_stop_l).abs() < f64::EPSILON);
}

#[test]
fn leak_propagates_to_an_alert_from_both_sides() {
    let cfg = SystemConfig::default();
    let broker = Broker::new();
    let data = broker.subscribe(&cfg.data_topic);
    let commands = broker.subscribe(&cfg.command_topic("tank-1"));
    let alerts = broker.subscribe(&cfg.alert_topic);

    let mut unit = FieldUnit::new("tank-1", &cfg);
    let mut center = ControlCenter::new(&cfg);
    let mut samples = ScriptedSamples::new(vec![5.0], vec![true]);

    unit.tick(&mut samples, &broker).unwrap();
    pump(&broker, &data, &commands, &mut center, &mut unit);

    // The unit raises its own leak alert and the center relays one from
    // the reading, on the same topic.
    let mut count = 0;
    while alerts.try_next().is_some() {
        count += 1;
    }
    assert_eq!(count, 2);
}

#[test]
fn threaded_runtime_starts_and_shuts_down() {
    let mut cfg = SystemConfig::default();
    cfg.poll_interval_ms = 5;
    let broker = Arc::new(Broker::new());
    let shutdown = Arc::new(AtomicBool::new(false));

    let handles = runtime::spawn_all(&cfg, &broker, &shutdown).unwrap();
    assert_eq!(handles.len(), cfg.sensor_ids.len() + 1);

    std::thread::sleep(std::time::Duration::from_millis(50));
    shutdown.store(true, Ordering::Release);
    for handle in handles {
        handle.join().unwrap();
    }
    broker.close();
}
