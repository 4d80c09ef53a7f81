//! Bosch BME280 temperature / pressure / humidity sensor.
//!
//! ## Dual-target design
//!
//! On ESP-IDF: the `bme280` crate drives the chip over an `embedded-hal`
//! I2C bus (primary address 0x76).  Binding probes and initialises the
//! chip; a missing or unresponsive device makes binding fail.
//! On host/test: readings come from static atomics for injection.
//!
//! Pressure is converted from the driver's pascals to hPa.

use crate::app::ports::SensorPort;
use crate::error::SensorError;

use super::{SensorChannel, SensorValue};

/// Name this driver answers to when bound.
pub const PERIPHERAL_NAME: &str = "BME280";

#[cfg(not(target_os = "espidf"))]
use core::sync::atomic::{AtomicBool, AtomicI32, AtomicI64, Ordering};

#[cfg(not(target_os = "espidf"))]
static SIM_PRESENT: AtomicBool = AtomicBool::new(true);
#[cfg(not(target_os = "espidf"))]
static SIM_FETCH_ERR: AtomicI32 = AtomicI32::new(0);
#[cfg(not(target_os = "espidf"))]
static SIM_TEMP_MICROS: AtomicI64 = AtomicI64::new(21_500_000);
#[cfg(not(target_os = "espidf"))]
static SIM_PRESS_MICROS: AtomicI64 = AtomicI64::new(1_013_250_000);
#[cfg(not(target_os = "espidf"))]
static SIM_HUMIDITY_MICROS: AtomicI64 = AtomicI64::new(40_000_000);

/// Inject the values the next simulated fetch will latch.
#[cfg(not(target_os = "espidf"))]
pub fn sim_set_reading(temperature: SensorValue, pressure: SensorValue, humidity: SensorValue) {
    SIM_TEMP_MICROS.store(temperature.as_micros(), Ordering::Relaxed);
    SIM_PRESS_MICROS.store(pressure.as_micros(), Ordering::Relaxed);
    SIM_HUMIDITY_MICROS.store(humidity.as_micros(), Ordering::Relaxed);
}

/// Simulate the chip being absent from the bus.
#[cfg(not(target_os = "espidf"))]
pub fn sim_set_present(present: bool) {
    SIM_PRESENT.store(present, Ordering::Relaxed);
}

/// Make subsequent fetches fail with `code` (0 restores success).
#[cfg(not(target_os = "espidf"))]
pub fn sim_set_fetch_error(code: i32) {
    SIM_FETCH_ERR.store(code, Ordering::Relaxed);
}

/// Latched channel values from the last successful fetch.
#[derive(Debug, Clone, Copy)]
struct Latched {
    temperature: SensorValue,
    pressure: SensorValue,
    humidity: SensorValue,
}

#[cfg(target_os = "espidf")]
pub struct Bme280Sensor {
    driver: ::bme280::i2c::BME280<esp_idf_hal::i2c::I2cDriver<'static>>,
    delay: esp_idf_hal::delay::FreeRtos,
    bound: bool,
    latched: Option<Latched>,
}

#[cfg(not(target_os = "espidf"))]
pub struct Bme280Sensor {
    bound: bool,
    latched: Option<Latched>,
}

#[cfg(target_os = "espidf")]
impl Bme280Sensor {
    pub fn new(i2c: esp_idf_hal::i2c::I2cDriver<'static>) -> Self {
        Self {
            driver: ::bme280::i2c::BME280::new_primary(i2c),
            delay: esp_idf_hal::delay::FreeRtos,
            bound: false,
            latched: None,
        }
    }

    fn probe(&mut self) -> bool {
        match self.driver.init(&mut self.delay) {
            Ok(()) => true,
            Err(e) => {
                log::warn!("BME280: init failed ({:?})", e);
                false
            }
        }
    }

    fn measure(&mut self) -> Result<Latched, SensorError> {
        // EIO: the driver error carries no numeric code of its own.
        const EIO: i32 = -5;
        let m = self.driver.measure(&mut self.delay).map_err(|e| {
            log::warn!("BME280: measure failed ({:?})", e);
            SensorError::FetchFailed(EIO)
        })?;
        Ok(Latched {
            temperature: SensorValue::from_f64(f64::from(m.temperature)),
            pressure: SensorValue::from_f64(f64::from(m.pressure) / 100.0),
            humidity: SensorValue::from_f64(f64::from(m.humidity)),
        })
    }
}

#[cfg(not(target_os = "espidf"))]
impl Default for Bme280Sensor {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(not(target_os = "espidf"))]
impl Bme280Sensor {
    pub fn new() -> Self {
        Self {
            bound: false,
            latched: None,
        }
    }

    fn probe(&mut self) -> bool {
        SIM_PRESENT.load(Ordering::Relaxed)
    }

    fn measure(&mut self) -> Result<Latched, SensorError> {
        let err = SIM_FETCH_ERR.load(Ordering::Relaxed);
        if err != 0 {
            return Err(SensorError::FetchFailed(err));
        }
        Ok(Latched {
            temperature: SensorValue::from_micros(SIM_TEMP_MICROS.load(Ordering::Relaxed)),
            pressure: SensorValue::from_micros(SIM_PRESS_MICROS.load(Ordering::Relaxed)),
            humidity: SensorValue::from_micros(SIM_HUMIDITY_MICROS.load(Ordering::Relaxed)),
        })
    }
}

impl SensorPort for Bme280Sensor {
    fn bind(&mut self, name: &str) -> Result<(), SensorError> {
        if name != PERIPHERAL_NAME || !self.probe() {
            return Err(SensorError::NotFound);
        }
        self.bound = true;
        Ok(())
    }

    fn sample_fetch(&mut self) -> Result<(), SensorError> {
        if !self.bound {
            return Err(SensorError::NotFound);
        }
        match self.measure() {
            Ok(latched) => {
                self.latched = Some(latched);
                Ok(())
            }
            Err(e) => {
                self.latched = None;
                Err(e)
            }
        }
    }

    fn channel_get(&mut self, channel: SensorChannel) -> Result<SensorValue, SensorError> {
        let latched = self.latched.ok_or(SensorError::ChannelUnavailable)?;
        Ok(match channel {
            SensorChannel::AmbientTemp => latched.temperature,
            SensorChannel::Pressure => latched.pressure,
            SensorChannel::Humidity => latched.humidity,
        })
    }
}
