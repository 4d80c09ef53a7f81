//! Mock adapters for integration tests.
//!
//! Records every radio call so tests can assert on the full startup and
//! publish history without a real Bluetooth stack or I2C bus.

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::time::Duration;

use envnode::app::cancel::CancelToken;
use envnode::app::events::AppEvent;
use envnode::app::ports::{BondStore, Clock, EventSink, PresencePort, RadioPort, SensorPort};
use envnode::error::{RadioError, SensorError};
use envnode::link::advertising::AdvertisingMode;
use envnode::link::{AddressKind, PeerAddress};
use envnode::sensors::{SensorChannel, SensorReading, SensorValue};

// ── Radio call record ─────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub enum RadioCall {
    Enable,
    ClearBonds,
    RegisterCallbacks,
    StartAdvertising { mode: AdvertisingMode, payload: Vec<u8> },
    SetPresence(u8),
}

// ── MockRadio ─────────────────────────────────────────────────

#[derive(Default)]
pub struct MockRadio {
    pub calls: RefCell<Vec<RadioCall>>,
    pub enable_error: Option<RadioError>,
    pub advertise_error: Option<RadioError>,
    pub unpair_error: Option<RadioError>,
    pub bonds: Cell<usize>,
    pub linked: Cell<bool>,
}

#[allow(dead_code)]
impl MockRadio {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_bonds(self, count: usize) -> Self {
        self.bonds.set(count);
        self
    }

    pub fn calls(&self) -> Vec<RadioCall> {
        self.calls.borrow().clone()
    }

    pub fn advertising_starts(&self) -> usize {
        self.calls
            .borrow()
            .iter()
            .filter(|c| matches!(c, RadioCall::StartAdvertising { .. }))
            .count()
    }

    pub fn presence_values(&self) -> Vec<u8> {
        self.calls
            .borrow()
            .iter()
            .filter_map(|c| match c {
                RadioCall::SetPresence(level) => Some(*level),
                _ => None,
            })
            .collect()
    }

    fn record(&self, call: RadioCall) {
        self.calls.borrow_mut().push(call);
    }
}

impl RadioPort for MockRadio {
    fn enable(&self) -> Result<(), RadioError> {
        self.record(RadioCall::Enable);
        self.enable_error.map_or(Ok(()), Err)
    }

    fn register_callbacks(&self) {
        self.record(RadioCall::RegisterCallbacks);
    }

    fn start_advertising(&self, mode: AdvertisingMode, payload: &[u8]) -> Result<(), RadioError> {
        self.record(RadioCall::StartAdvertising {
            mode,
            payload: payload.to_vec(),
        });
        self.advertise_error.map_or(Ok(()), Err)
    }
}

impl BondStore for MockRadio {
    fn clear_bonds(&self) -> Result<usize, RadioError> {
        self.record(RadioCall::ClearBonds);
        match self.unpair_error {
            Some(e) => Err(e),
            None => Ok(self.bonds.replace(0)),
        }
    }
}

impl PresencePort for MockRadio {
    fn set_presence(&self, level: u8) -> Result<(), RadioError> {
        self.record(RadioCall::SetPresence(level));
        if self.linked.get() {
            Ok(())
        } else {
            Err(RadioError::NOT_CONNECTED)
        }
    }
}

// ── MockSensor ────────────────────────────────────────────────

/// Scripted sensor: each fetch pops the next outcome; an empty script
/// repeats the last good reading.
pub struct MockSensor {
    pub present: bool,
    pub bound_name: Option<String>,
    pub fetches: usize,
    script: VecDeque<Result<SensorReading, SensorError>>,
    last: SensorReading,
    latched: Option<SensorReading>,
}

#[allow(dead_code)]
impl MockSensor {
    pub fn new(script: impl IntoIterator<Item = Result<SensorReading, SensorError>>) -> Self {
        Self {
            present: true,
            bound_name: None,
            fetches: 0,
            script: script.into_iter().collect(),
            last: scenario_reading(),
            latched: None,
        }
    }

    pub fn steady(reading: SensorReading) -> Self {
        Self::new([Ok(reading)])
    }

    pub fn absent() -> Self {
        Self {
            present: false,
            ..Self::new([])
        }
    }
}

impl SensorPort for MockSensor {
    fn bind(&mut self, name: &str) -> Result<(), SensorError> {
        if !self.present {
            return Err(SensorError::NotFound);
        }
        self.bound_name = Some(name.to_owned());
        Ok(())
    }

    fn sample_fetch(&mut self) -> Result<(), SensorError> {
        self.fetches += 1;
        let next = self.script.pop_front().unwrap_or(Ok(self.last));
        match next {
            Ok(reading) => {
                self.last = reading;
                self.latched = Some(reading);
                Ok(())
            }
            Err(e) => {
                self.latched = None;
                Err(e)
            }
        }
    }

    fn channel_get(&mut self, channel: SensorChannel) -> Result<SensorValue, SensorError> {
        let r = self.latched.ok_or(SensorError::ChannelUnavailable)?;
        Ok(match channel {
            SensorChannel::AmbientTemp => r.temperature(),
            SensorChannel::Pressure => r.pressure(),
            SensorChannel::Humidity => r.humidity(),
        })
    }
}

// ── RecordingSink ─────────────────────────────────────────────

#[derive(Default)]
pub struct RecordingSink {
    pub events: Vec<AppEvent>,
}

#[allow(dead_code)]
impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self, pred: impl Fn(&AppEvent) -> bool) -> usize {
        self.events.iter().filter(|e| pred(e)).count()
    }

    pub fn readings(&self) -> Vec<SensorReading> {
        self.events
            .iter()
            .filter_map(|e| match e {
                AppEvent::Reading(r) => Some(*r),
                _ => None,
            })
            .collect()
    }
}

impl EventSink for RecordingSink {
    fn emit(&mut self, event: &AppEvent) {
        self.events.push(event.clone());
    }
}

// ── ManualClock ───────────────────────────────────────────────

/// Returns from every sleep at once, recording the requested duration,
/// and cancels `token` after `cycles` sleeps.
pub struct ManualClock<'a> {
    pub sleeps: Vec<Duration>,
    cycles: usize,
    token: &'a CancelToken,
}

impl<'a> ManualClock<'a> {
    pub fn new(cycles: usize, token: &'a CancelToken) -> Self {
        Self {
            sleeps: Vec::new(),
            cycles,
            token,
        }
    }
}

impl Clock for ManualClock<'_> {
    async fn sleep(&mut self, duration: Duration) {
        self.sleeps.push(duration);
        if self.sleeps.len() >= self.cycles {
            self.token.cancel();
        }
    }
}

// ── Fixtures ──────────────────────────────────────────────────

pub fn scenario_reading() -> SensorReading {
    SensorReading::new(
        SensorValue::new(23, 450_000),
        SensorValue::new(1013, 250_000),
        SensorValue::new(45, 0),
    )
}

#[allow(dead_code)]
pub fn peer() -> PeerAddress {
    PeerAddress::new([0xF0, 0x0D, 0xCA, 0xFE, 0x12, 0x34], AddressKind::Random)
}

#[allow(dead_code)]
pub fn other_peer() -> PeerAddress {
    PeerAddress::new([0x00, 0x1A, 0x7D, 0xDA, 0x71, 0x13], AddressKind::Public)
}
