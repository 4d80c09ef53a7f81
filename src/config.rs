//! Node configuration parameters
//!
//! All tunable parameters for the sensor node.  Values are compiled-in
//! defaults: the node persists nothing between boots apart from the bond
//! store, which is cleared on every startup anyway.

use crate::error::ConfigError;

/// Maximum advertised device name length (bytes).
pub const MAX_NAME_LEN: usize = 24;

/// Core node configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeConfig {
    // --- Identity ---
    /// Name carried in the scan response of the connectable, named mode
    pub device_name: heapless::String<MAX_NAME_LEN>,
    /// Name of the sensor peripheral to bind at startup
    pub sensor_peripheral: heapless::String<16>,

    // --- Timing ---
    /// Delay between sample cycles (milliseconds)
    pub sample_interval_ms: u32,
    /// Minimum advertising interval (units of 0.625 ms)
    pub adv_interval_min: u16,
    /// Maximum advertising interval (units of 0.625 ms)
    pub adv_interval_max: u16,

    // --- Link policy ---
    /// Restart advertising after a peer disconnects.  Off by default: the
    /// node stays silent after its first link drops until it is rebooted.
    pub readvertise_on_disconnect: bool,
}

impl Default for NodeConfig {
    fn default() -> Self {
        let mut device_name = heapless::String::new();
        let _ = device_name.push_str("envnode");
        let mut sensor_peripheral = heapless::String::new();
        let _ = sensor_peripheral.push_str("BME280");

        Self {
            device_name,
            sensor_peripheral,

            // Timing
            sample_interval_ms: 5000, // 0.2 Hz
            adv_interval_min: 0x00A0, // 100 ms
            adv_interval_max: 0x00F0, // 150 ms

            // Link policy
            readvertise_on_disconnect: false,
        }
    }
}

impl NodeConfig {
    /// Override the advertised name (e.g. with the MAC-derived hostname).
    /// Names longer than [`MAX_NAME_LEN`] are truncated.
    pub fn with_device_name(mut self, name: &str) -> Self {
        self.device_name.clear();
        for ch in name.chars() {
            if self.device_name.push(ch).is_err() {
                break;
            }
        }
        self
    }

    /// Range-check every field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.device_name.is_empty() {
            return Err(ConfigError::ValidationFailed("device_name must not be empty"));
        }
        if self.sensor_peripheral.is_empty() {
            return Err(ConfigError::ValidationFailed(
                "sensor_peripheral must not be empty",
            ));
        }
        if self.sample_interval_ms == 0 {
            return Err(ConfigError::ValidationFailed("sample_interval_ms must be > 0"));
        }
        // Legacy advertising: 20 ms .. 10.24 s.
        if !(0x0020..=0x4000).contains(&self.adv_interval_min)
            || !(0x0020..=0x4000).contains(&self.adv_interval_max)
        {
            return Err(ConfigError::ValidationFailed(
                "advertising interval must be 0x0020-0x4000",
            ));
        }
        if self.adv_interval_min > self.adv_interval_max {
            return Err(ConfigError::ValidationFailed(
                "adv_interval_min must not exceed adv_interval_max",
            ));
        }
        Ok(())
    }
}
