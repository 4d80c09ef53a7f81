//! Sensor subsystem: the bound-peripheral [`SensorSampler`] and the
//! BME280 driver behind [`SensorPort`].
//!
//! The sampler only exists once binding succeeded, so the sampling loop
//! can never run against a missing device.  Every [`SensorSampler::sample`]
//! is a single fetch followed by three channel reads, so temperature,
//! pressure and humidity always come from the same physical conversion.

pub mod bme280;
pub mod value;

pub use value::{ParseError, SensorReading, SensorValue};

use crate::app::ports::SensorPort;
use crate::error::SensorError;

/// Channels exposed by an environmental sensor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorChannel {
    /// Ambient temperature (°C).
    AmbientTemp,
    /// Barometric pressure (hPa).
    Pressure,
    /// Relative humidity (%).
    Humidity,
}

/// A sensor port that has been successfully bound to a named peripheral.
pub struct SensorSampler<P: SensorPort> {
    port: P,
    name: heapless::String<16>,
}

impl<P: SensorPort> SensorSampler<P> {
    /// Bind `port` to the peripheral called `name`.
    ///
    /// There is no retry: a missing peripheral is returned as
    /// [`SensorError::NotFound`] and the caller must treat it as fatal.
    pub fn bind(mut port: P, name: &str) -> Result<Self, SensorError> {
        port.bind(name)?;
        let mut bound = heapless::String::new();
        bound.push_str(name).map_err(|_| SensorError::NotFound)?;
        Ok(Self { port, name: bound })
    }

    /// Fetch one sample and read all three channels from it.
    pub fn sample(&mut self) -> Result<SensorReading, SensorError> {
        self.port.sample_fetch()?;
        let temperature = self.port.channel_get(SensorChannel::AmbientTemp)?;
        let pressure = self.port.channel_get(SensorChannel::Pressure)?;
        let humidity = self.port.channel_get(SensorChannel::Humidity)?;
        Ok(SensorReading::new(temperature, pressure, humidity))
    }

    /// Name of the bound peripheral.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Access the underlying port (tests inspect scripted drivers).
    pub fn port(&self) -> &P {
        &self.port
    }
}
