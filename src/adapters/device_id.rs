//! Device identity derived from the ESP32 factory MAC address.
//!
//! The advertised name is `envnode-xxyyzz`: the last 3 bytes of the
//! 6-byte MAC in lowercase hex.  Stable across reboots (eFuse MAC), so an
//! operator can tell nodes apart in a scan list.

use core::fmt::Write;

use crate::config::MAX_NAME_LEN;

/// Full 6-byte MAC address.
pub type MacAddress = [u8; 6];

/// Read the factory MAC address from eFuse.
#[cfg(target_os = "espidf")]
pub fn read_mac() -> MacAddress {
    let mut mac: MacAddress = [0u8; 6];
    unsafe {
        esp_idf_svc::sys::esp_efuse_mac_get_default(mac.as_mut_ptr());
    }
    mac
}

/// Simulation: returns a deterministic fake MAC.
#[cfg(not(target_os = "espidf"))]
pub fn read_mac() -> MacAddress {
    [0xDE, 0xAD, 0xBE, 0xEF, 0xCA, 0xFE]
}

/// Advertised device name for `mac`.
pub fn hostname(mac: &MacAddress) -> heapless::String<MAX_NAME_LEN> {
    let mut name = heapless::String::new();
    let _ = write!(name, "envnode-{:02x}{:02x}{:02x}", mac[3], mac[4], mac[5]);
    name
}
