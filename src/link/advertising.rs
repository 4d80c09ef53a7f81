//! Advertisement payload and the controller that starts broadcasting it.
//!
//! ## Wire format
//!
//! Each AD structure is `[len, type, data…]` where `len` counts the type
//! byte plus the data.  The sensor packet is:
//!
//! | AD type | Meaning                     | Data                              |
//! |---------|-----------------------------|-----------------------------------|
//! | `0x01`  | Flags                       | `0x06` (LE general, no BR/EDR)    |
//! | `0x03`  | Complete 16-bit UUID list   | `0x180D`, `0x180F`, `0x1805` (LE) |
//! | `0x07`  | Complete 128-bit UUID list  | vendor UUID, LE                   |
//!
//! 29 bytes in total, inside the 31-byte legacy advertising limit.

use log::info;

use crate::app::events::AppEvent;
use crate::app::ports::{EventSink, RadioPort};
use crate::config::NodeConfig;
use crate::error::{AdvertisingError, RadioError};

/// Legacy advertising PDU payload limit.
pub const MAX_ADV_LEN: usize = 31;

pub const AD_TYPE_FLAGS: u8 = 0x01;
pub const AD_TYPE_UUID16_ALL: u8 = 0x03;
pub const AD_TYPE_UUID128_ALL: u8 = 0x07;

pub const FLAG_LE_GENERAL_DISC: u8 = 0x02;
pub const FLAG_BREDR_NOT_SUPPORTED: u8 = 0x04;

pub const UUID_HEART_RATE: u16 = 0x180D;
pub const UUID_BATTERY: u16 = 0x180F;
pub const UUID_CURRENT_TIME: u16 = 0x1805;

pub const VENDOR_UUID: u128 = 0x12345678_12345678_12345678_9abcdef0;

pub type AdvPayload = heapless::Vec<u8, MAX_ADV_LEN>;

// ───────────────────────────────────────────────────────────────
// Advertising mode
// ───────────────────────────────────────────────────────────────

/// How the radio broadcasts.  Intervals are in 0.625 ms units.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AdvertisingMode {
    pub connectable: bool,
    /// Put the GAP device name in the scan response.
    pub use_name: bool,
    pub interval_min: u16,
    pub interval_max: u16,
}

impl AdvertisingMode {
    pub const fn connectable_named(interval_min: u16, interval_max: u16) -> Self {
        Self {
            connectable: true,
            use_name: true,
            interval_min,
            interval_max,
        }
    }
}

// ───────────────────────────────────────────────────────────────
// Packet
// ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdElement {
    Flags(u8),
    Uuid16All(heapless::Vec<u16, 4>),
    Uuid128All(u128),
}

impl AdElement {
    fn ad_type(&self) -> u8 {
        match self {
            Self::Flags(_) => AD_TYPE_FLAGS,
            Self::Uuid16All(_) => AD_TYPE_UUID16_ALL,
            Self::Uuid128All(_) => AD_TYPE_UUID128_ALL,
        }
    }

    fn data_len(&self) -> usize {
        match self {
            Self::Flags(_) => 1,
            Self::Uuid16All(ids) => ids.len() * 2,
            Self::Uuid128All(_) => 16,
        }
    }

    fn encode_into(&self, out: &mut AdvPayload) -> Result<(), AdvertisingError> {
        let len = u8::try_from(self.data_len() + 1).map_err(|_| AdvertisingError::PayloadTooLong)?;
        push(out, &[len, self.ad_type()])?;
        match self {
            Self::Flags(bits) => push(out, &[*bits]),
            Self::Uuid16All(ids) => ids.iter().try_for_each(|id| push(out, &id.to_le_bytes())),
            Self::Uuid128All(uuid) => push(out, &uuid.to_le_bytes()),
        }
    }
}

fn push(out: &mut AdvPayload, bytes: &[u8]) -> Result<(), AdvertisingError> {
    out.extend_from_slice(bytes)
        .map_err(|_| AdvertisingError::PayloadTooLong)
}

/// Ordered AD elements.  Built once; immutable afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdvertisementPacket {
    elements: heapless::Vec<AdElement, 4>,
}

impl AdvertisementPacket {
    /// Flags, the three standard services and the vendor service.
    pub fn sensor_node() -> Self {
        let mut ids = heapless::Vec::new();
        for id in [UUID_HEART_RATE, UUID_BATTERY, UUID_CURRENT_TIME] {
            // Capacity 4 holds all three.
            let _ = ids.push(id);
        }
        let mut elements = heapless::Vec::new();
        for el in [
            AdElement::Flags(FLAG_LE_GENERAL_DISC | FLAG_BREDR_NOT_SUPPORTED),
            AdElement::Uuid16All(ids),
            AdElement::Uuid128All(VENDOR_UUID),
        ] {
            let _ = elements.push(el);
        }
        Self { elements }
    }

    pub fn elements(&self) -> &[AdElement] {
        &self.elements
    }

    pub fn encode(&self) -> Result<AdvPayload, AdvertisingError> {
        let mut out = AdvPayload::new();
        for el in &self.elements {
            el.encode_into(&mut out)?;
        }
        Ok(out)
    }
}

// ───────────────────────────────────────────────────────────────
// Controller
// ───────────────────────────────────────────────────────────────

/// Holds the one active packet and starts broadcasting it.
pub struct AdvertisingController {
    payload: AdvPayload,
    mode: AdvertisingMode,
}

impl AdvertisingController {
    /// Encode `packet` up front so a payload that cannot fit is caught
    /// before the radio is touched.
    pub fn new(packet: &AdvertisementPacket, config: &NodeConfig) -> Result<Self, AdvertisingError> {
        Ok(Self {
            payload: packet.encode()?,
            mode: AdvertisingMode::connectable_named(config.adv_interval_min, config.adv_interval_max),
        })
    }

    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    pub fn mode(&self) -> AdvertisingMode {
        self.mode
    }

    /// Start broadcasting.  A stack error is reported and returned; there
    /// is no retry.
    pub fn start(&self, radio: &impl RadioPort, sink: &mut impl EventSink) -> Result<(), RadioError> {
        match radio.start_advertising(self.mode, &self.payload) {
            Ok(()) => {
                info!("ADV: {} byte payload", self.payload.len());
                sink.emit(&AppEvent::AdvertisingStarted);
                Ok(())
            }
            Err(e) => {
                sink.emit(&AppEvent::AdvertisingFailed(e));
                Err(e)
            }
        }
    }
}
