//! Integration tests for startup sequencing and the sample → publish loop.
//!
//! These run on the host (x86_64) against the mock radio and sensor and
//! drive the loop with a manual clock, so no test waits in real time.

use std::time::Duration;

use futures_lite::future::block_on;

use envnode::app::cancel::CancelToken;
use envnode::app::events::AppEvent;
use envnode::app::orchestrator::{LoopStats, Orchestrator};
use envnode::config::NodeConfig;
use envnode::error::{Error, RadioError, SensorError};
use envnode::link::advertising::{AdvertisementPacket, AdvertisingController};
use envnode::sensors::{SensorReading, SensorValue};
use envnode::state::{ConnectionState, NodeState, TrustState};

use crate::mock_hw::{ManualClock, MockRadio, MockSensor, RadioCall, RecordingSink, scenario_reading};

fn advertiser(config: &NodeConfig) -> AdvertisingController {
    AdvertisingController::new(&AdvertisementPacket::sensor_node(), config).unwrap()
}

fn run_cycles(
    radio: &MockRadio,
    state: &NodeState,
    sensor: MockSensor,
    cycles: usize,
    sink: &mut RecordingSink,
) -> (Result<LoopStats, Error>, Vec<Duration>) {
    let config = NodeConfig::default();
    let adv = advertiser(&config);
    let orchestrator = Orchestrator::new(&config, radio, state, &adv);
    let cancel = CancelToken::new();
    let mut clock = ManualClock::new(cycles, &cancel);
    let result = block_on(orchestrator.launch(sensor, &mut clock, &cancel, sink));
    (result, clock.sleeps)
}

// ── Startup ordering ─────────────────────────────────────────

#[test]
fn startup_runs_steps_in_order() {
    let config = NodeConfig::default();
    let adv = advertiser(&config);
    let radio = MockRadio::new();
    let state = NodeState::new();
    let mut sink = RecordingSink::new();

    let orchestrator = Orchestrator::new(&config, &radio, &state, &adv);
    let sampler = orchestrator.startup(MockSensor::steady(scenario_reading()), &mut sink).unwrap();

    assert_eq!(
        radio.calls(),
        vec![
            RadioCall::Enable,
            RadioCall::ClearBonds,
            RadioCall::RegisterCallbacks,
            RadioCall::StartAdvertising {
                mode: adv.mode(),
                payload: adv.payload().to_vec(),
            },
        ]
    );
    assert_eq!(sampler.name(), "BME280");
    assert_eq!(sampler.port().bound_name.as_deref(), Some("BME280"));
    assert_eq!(state.connection(), ConnectionState::Advertising);
    assert!(matches!(sink.events.last(), Some(AppEvent::SensorBound { .. })));
}

#[test]
fn prior_bonds_are_gone_after_startup() {
    let config = NodeConfig::default();
    let adv = advertiser(&config);
    let radio = MockRadio::new().with_bonds(3);
    let state = NodeState::new();
    let mut sink = RecordingSink::new();

    Orchestrator::new(&config, &radio, &state, &adv)
        .startup(MockSensor::steady(scenario_reading()), &mut sink)
        .unwrap();

    assert_eq!(radio.bonds.get(), 0);
    assert_eq!(state.trust(), TrustState::Untrusted);
    assert!(sink.events.contains(&AppEvent::BondsCleared(3)));
}

// ── Failure policy ───────────────────────────────────────────

#[test]
fn missing_sensor_is_fatal_and_reported_once() {
    let radio = MockRadio::new();
    let state = NodeState::new();
    let mut sink = RecordingSink::new();

    let (result, sleeps) = run_cycles(&radio, &state, MockSensor::absent(), 3, &mut sink);

    assert_eq!(result, Err(Error::Sensor(SensorError::NotFound)));
    assert!(sleeps.is_empty(), "loop must never start");
    assert!(sink.readings().is_empty());
    assert!(radio.presence_values().is_empty());
    assert_eq!(sink.count(|e| matches!(e, AppEvent::SensorMissing { .. })), 1);
}

#[test]
fn advertising_failure_does_not_stop_sampling() {
    let radio = MockRadio {
        advertise_error: Some(RadioError(-12)),
        ..MockRadio::new()
    };
    let state = NodeState::new();
    let mut sink = RecordingSink::new();

    let (result, _) = run_cycles(&radio, &state, MockSensor::steady(scenario_reading()), 2, &mut sink);

    assert_eq!(result, Ok(LoopStats { published: 2, skipped: 0 }));
    let calls = radio.calls();
    assert!(calls.contains(&RadioCall::ClearBonds));
    assert!(calls.contains(&RadioCall::RegisterCallbacks));
    assert_eq!(state.connection(), ConnectionState::Uninitialized);
    assert!(sink.events.contains(&AppEvent::AdvertisingFailed(RadioError(-12))));
    assert_eq!(sink.readings().len(), 2);
}

#[test]
fn radio_enable_failure_skips_advertising_only() {
    let radio = MockRadio {
        enable_error: Some(RadioError(-1)),
        ..MockRadio::new()
    };
    let state = NodeState::new();
    let mut sink = RecordingSink::new();

    let (result, _) = run_cycles(&radio, &state, MockSensor::steady(scenario_reading()), 1, &mut sink);

    assert!(result.is_ok());
    assert_eq!(radio.advertising_starts(), 0);
    let calls = radio.calls();
    assert!(calls.contains(&RadioCall::ClearBonds));
    assert!(calls.contains(&RadioCall::RegisterCallbacks));
    assert!(sink.events.contains(&AppEvent::AdvertisingSkipped));
    assert_eq!(sink.readings(), vec![scenario_reading()]);
}

#[test]
fn unpair_failure_leaves_trust_stale() {
    let radio = MockRadio {
        unpair_error: Some(RadioError(-5)),
        ..MockRadio::new()
    }
    .with_bonds(1);
    let state = NodeState::new();
    let mut sink = RecordingSink::new();

    let (result, _) = run_cycles(&radio, &state, MockSensor::steady(scenario_reading()), 1, &mut sink);

    assert!(result.is_ok());
    assert_eq!(state.trust(), TrustState::Stale);
    assert_eq!(radio.bonds.get(), 1);
    assert!(sink.events.contains(&AppEvent::UnpairFailed(RadioError(-5))));
    assert_eq!(radio.advertising_starts(), 1);
}

// ── Sampling loop ────────────────────────────────────────────

#[test]
fn scenario_reading_publishes_presence_and_line() {
    let radio = MockRadio::new();
    radio.linked.set(true);
    let state = NodeState::new();
    let mut sink = RecordingSink::new();

    run_cycles(&radio, &state, MockSensor::steady(scenario_reading()), 1, &mut sink)
        .0
        .unwrap();

    assert_eq!(radio.presence_values(), vec![23]);
    assert_eq!(state.presence(), Some(23));
    let readings = sink.readings();
    assert_eq!(readings.len(), 1);
    assert_eq!(
        readings[0].to_string(),
        "temp: 23.450000; press: 1013.250000; humidity: 45.000000"
    );
}

#[test]
fn loop_sleeps_fixed_interval_each_cycle() {
    let radio = MockRadio::new();
    let state = NodeState::new();
    let mut sink = RecordingSink::new();

    let (result, sleeps) = run_cycles(&radio, &state, MockSensor::steady(scenario_reading()), 3, &mut sink);

    assert_eq!(result, Ok(LoopStats { published: 3, skipped: 0 }));
    assert_eq!(sleeps, vec![Duration::from_millis(5000); 3]);
}

#[test]
fn fetch_failure_skips_cycle_and_keeps_going() {
    let radio = MockRadio::new();
    let state = NodeState::new();
    let mut sink = RecordingSink::new();
    let sensor = MockSensor::new([
        Ok(scenario_reading()),
        Err(SensorError::FetchFailed(-5)),
        Ok(scenario_reading()),
    ]);

    let (result, sleeps) = run_cycles(&radio, &state, sensor, 3, &mut sink);

    assert_eq!(result, Ok(LoopStats { published: 2, skipped: 1 }));
    assert_eq!(sleeps.len(), 3);
    assert_eq!(radio.presence_values().len(), 2);
    assert!(sink.events.contains(&AppEvent::SampleSkipped(SensorError::FetchFailed(-5))));
}

#[test]
fn unlinked_presence_is_stored_but_not_delivered() {
    let radio = MockRadio::new();
    let state = NodeState::new();
    let mut sink = RecordingSink::new();

    run_cycles(&radio, &state, MockSensor::steady(scenario_reading()), 1, &mut sink)
        .0
        .unwrap();

    assert_eq!(state.presence(), Some(23));
    assert!(sink.events.contains(&AppEvent::PresenceNotDelivered(RadioError::NOT_CONNECTED)));
    assert_eq!(sink.readings().len(), 1);
}

#[test]
fn presence_clamps_out_of_range_temperatures() {
    let radio = MockRadio::new();
    let state = NodeState::new();
    let mut sink = RecordingSink::new();
    let at = |whole| SensorReading::new(SensorValue::new(whole, 0), SensorValue::new(1000, 0), SensorValue::new(50, 0));
    let sensor = MockSensor::new([Ok(at(-8)), Ok(at(140)), Ok(at(100))]);

    run_cycles(&radio, &state, sensor, 3, &mut sink).0.unwrap();

    assert_eq!(radio.presence_values(), vec![0, 100, 100]);
}
