//! EnvNode Firmware — Main Entry Point
//!
//! Two execution contexts share one [`NodeState`]:
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                      Adapters (outer ring)                     │
//! │                                                                │
//! │  BleRadio               Bme280Sensor   LogEventSink  TimerClock│
//! │  (Radio+Bond+Presence)  (SensorPort)   (EventSink)   (Clock)   │
//! │                                                                │
//! │  ──────────────── Port Trait Boundary ───────────────────      │
//! │                                                                │
//! │  core 0: LinkSupervisor  ◀── RADIO_EVENTS ◀── BLE callbacks    │
//! │  core 1: Orchestrator    (startup, sample → publish → sleep)   │
//! └────────────────────────────────────────────────────────────────┘
//! ```
#![deny(unused_must_use)]

use anyhow::Result;
use edge_executor::LocalExecutor;
use futures_lite::future::block_on;
use log::{error, info};

use esp_idf_hal::i2c::{I2cConfig, I2cDriver};
use esp_idf_hal::peripherals::Peripherals;
use esp_idf_hal::units::Hertz;

use envnode::adapters::ble::BleRadio;
use envnode::adapters::device_id;
use envnode::adapters::log_sink::LogEventSink;
use envnode::adapters::time::TimerClock;
use envnode::app::cancel::CancelToken;
use envnode::app::orchestrator::Orchestrator;
use envnode::config::NodeConfig;
use envnode::drivers::task_pin::{Core, spawn_on_core};
use envnode::error::Error;
use envnode::link::LinkSupervisor;
use envnode::link::advertising::{AdvertisementPacket, AdvertisingController};
use envnode::sensors::bme280::Bme280Sensor;
use envnode::state::NodeState;

static STATE: NodeState = NodeState::new();
static LINK_CANCEL: CancelToken = CancelToken::new();
static LOOP_CANCEL: CancelToken = CancelToken::new();

const LINK_TASK_PRIORITY: u8 = 10;
const LINK_TASK_STACK_KB: usize = 6;
const I2C_BAUDRATE: u32 = 100_000;

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;

    info!("╔══════════════════════════════════════╗");
    info!("║  EnvNode v{}                      ║", env!("CARGO_PKG_VERSION"));
    info!("╚══════════════════════════════════════╝");

    // ── 2. Configuration ──────────────────────────────────────
    let config = NodeConfig::default().with_device_name(&device_id::hostname(&device_id::read_mac()));
    config.validate().map_err(Error::from)?;

    // ── 3. Sensor bus (BME280 on I2C0, SDA=21 SCL=22) ─────────
    let peripherals = Peripherals::take()?;
    let i2c = I2cDriver::new(
        peripherals.i2c0,
        peripherals.pins.gpio21,
        peripherals.pins.gpio22,
        &I2cConfig::new().baudrate(Hertz(I2C_BAUDRATE)),
    )?;
    let sensor = Bme280Sensor::new(i2c);

    // ── 4. Radio and advertising (shared with the link task) ──
    let config: &'static NodeConfig = Box::leak(Box::new(config));
    let radio: &'static BleRadio = Box::leak(Box::new(BleRadio::new(config.device_name.clone())));
    let advertiser: &'static AdvertisingController = Box::leak(Box::new(
        AdvertisingController::new(&AdvertisementPacket::sensor_node(), config).map_err(Error::from)?,
    ));

    // ── 5. Link-event task on the protocol core ───────────────
    let link = spawn_on_core(
        Core::Pro,
        LINK_TASK_PRIORITY,
        LINK_TASK_STACK_KB,
        "link\0",
        move || {
            let mut sink = LogEventSink::new();
            let mut supervisor =
                LinkSupervisor::new(&STATE, advertiser, radio, config.readvertise_on_disconnect);
            let executor: LocalExecutor<'_, 8> = LocalExecutor::new();
            block_on(executor.run(supervisor.run(radio.events(), &LINK_CANCEL, &mut sink)));
        },
    )?;

    // ── 6. Startup + sampling loop (never returns normally) ───
    let orchestrator = Orchestrator::new(config, radio, &STATE, advertiser);
    let mut sink = LogEventSink::new();
    let mut clock = TimerClock::new();
    match block_on(orchestrator.launch(sensor, &mut clock, &LOOP_CANCEL, &mut sink)) {
        Ok(stats) => info!("Sampling stopped ({:?})", stats),
        Err(e) => {
            // Already reported as SensorMissing.  The radio keeps running.
            info!("Sampling disabled ({}); serving the link task only", e);
            if link.join().is_err() {
                error!("Link task panicked");
            }
        }
    }
    Ok(())
}
