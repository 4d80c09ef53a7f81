//! Adapters — concrete implementations of the hexagonal port traits.
//!
//! | Adapter     | Implements       | Connects to                    |
//! |-------------|------------------|--------------------------------|
//! | `ble`       | RadioPort        | Bluedroid GAP (advertising)    |
//! |             | BondStore        | Bluedroid bond list            |
//! |             | PresencePort     | Battery Level characteristic   |
//! | `log_sink`  | EventSink        | Serial log output              |
//! | `time`      | Clock            | async-io-mini timers           |
//! | `device_id` | —                | eFuse MAC → advertised name    |
//!
//! The BME280 adapter lives with the sampler in `sensors::bme280`.

pub mod ble;
pub mod device_id;
pub mod log_sink;
pub mod time;
