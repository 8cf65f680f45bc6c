//! Field unit against the real in-process broker: telemetry landing on
//! subscriptions and commands round-tripping through the wire format.

use irrinet::bus::broker::Broker;
use irrinet::bus::PublishPort;
use irrinet::config::SystemConfig;
use irrinet::device::sampling::ScriptedSamples;
use irrinet::device::FieldUnit;
use irrinet::wire::{AlertMessage, Command, SensorReading};

#[test]
fn tick_delivers_a_decodable_reading_to_subscribers() {
    let cfg = SystemConfig::default();
    let broker = Broker::new();
    let data = broker.subscribe(&cfg.data_topic);

    let mut unit = FieldUnit::new("tank-1", &cfg);
    let mut samples = ScriptedSamples::new(vec![18.5], vec![false]);
    unit.tick(&mut samples, &broker).unwrap();

    let msg = data.try_next().expect("reading delivered");
    assert_eq!(msg.topic, cfg.data_topic);
    let reading = SensorReading::decode(&msg.payload).unwrap();
    assert_eq!(reading.sensor_id, "tank-1");
    assert_eq!(reading.water_flow, Some(18.5));
    assert_eq!(reading.water_leak, Some(false));
    assert!(data.try_next().is_none(), "one reading per tick");
}

#[test]
fn leak_tick_publishes_both_alert_and_reading() {
    let cfg = SystemConfig::default();
    let broker = Broker::new();
    let data = broker.subscribe(&cfg.data_topic);
    let alerts = broker.subscribe(&cfg.alert_topic);

    let mut unit = FieldUnit::new("tank-2", &cfg);
    let mut samples = ScriptedSamples::new(vec![10.0], vec![true]);
    unit.tick(&mut samples, &broker).unwrap();

    let alert = AlertMessage::decode(&alerts.try_next().expect("alert delivered").payload).unwrap();
    assert_eq!(alert.sensor_id, "tank-2");
    assert_eq!(alert.message, irrinet::device::LEAK_ALERT);
    assert!(data.try_next().is_some(), "reading still published");
}

#[test]
fn published_command_parses_and_flips_the_irrigation_flag() {
    let cfg = SystemConfig::default();
    let broker = Broker::new();
    let commands = broker.subscribe(&cfg.command_topic("tank-1"));
    let mut unit = FieldUnit::new("tank-1", &cfg);

    // The control side publishes the bare command verb.
    broker
        .publish(
            &cfg.command_topic("tank-1"),
            Command::ActivateIrrigation.as_str().as_bytes(),
        )
        .unwrap();

    let msg = commands.try_next().expect("command delivered");
    let cmd = Command::parse(&msg.payload).expect("verb parses");
    unit.handle_command(cmd);
    assert!(unit.state().irrigation_active);

    broker
        .publish(
            &cfg.command_topic("tank-1"),
            Command::DeactivateIrrigation.as_str().as_bytes(),
        )
        .unwrap();
    let cmd = Command::parse(&commands.try_next().unwrap().payload).unwrap();
    unit.handle_command(cmd);
    assert!(!unit.state().irrigation_active);
}

#[test]
fn command_topics_keep_units_apart() {
    let cfg = SystemConfig::default();
    let broker = Broker::new();
    let one = broker.subscribe(&cfg.command_topic("tank-1"));
    let two = broker.subscribe(&cfg.command_topic("tank-2"));

    broker
        .publish(
            &cfg.command_topic("tank-1"),
            Command::CheckLeak.as_str().as_bytes(),
        )
        .unwrap();

    assert!(one.try_next().is_some());
    assert!(two.try_next().is_none(), "other unit's inbox stays empty");
}
