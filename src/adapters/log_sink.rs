//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing structured application events to
//! the ESP-IDF logger (which goes to UART / USB-CDC in production).
//! The per-cycle reading is logged bare so the serial capture stays
//! line-parseable:
//!
//! ```text
//! temp: 23.450000; press: 1013.250000; humidity: 45.000000
//! ```

use log::{debug, error, info, warn};

use crate::app::events::AppEvent;
use crate::app::ports::EventSink;

/// Adapter that logs every [`AppEvent`] to the serial console.
#[derive(Default)]
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &AppEvent) {
        match event {
            AppEvent::Started { name } => info!("START | advertising as '{}'", name),

            AppEvent::RadioEnabled => info!("Bluetooth initialized"),
            AppEvent::RadioEnableFailed(e) => error!("Bluetooth init failed ({})", e),
            AppEvent::BondsCleared(n) => info!("BOND | cleared {} stored bond(s)", n),
            AppEvent::UnpairFailed(e) => warn!("BOND | unpair failed ({}), prior bonds may remain", e),
            AppEvent::CallbacksRegistered => debug!("LINK | callbacks registered"),
            AppEvent::AdvertisingStarted => info!("Advertising successfully started"),
            AppEvent::AdvertisingFailed(e) => error!("Advertising failed to start ({})", e),
            AppEvent::AdvertisingSkipped => warn!("Advertising skipped: radio not ready"),

            AppEvent::SensorBound { name } => info!("SENSOR | bound '{}'", name),
            AppEvent::SensorMissing { name } => error!("No device \"{}\" found; did initialization fail?", name),
            AppEvent::Reading(reading) => info!("{}", reading),
            AppEvent::SampleSkipped(e) => warn!("SENSOR | cycle skipped: {}", e),
            AppEvent::PresenceNotDelivered(e) => debug!("BAS | notify not delivered ({})", e),

            AppEvent::Connected { peer } => info!("Connected {}", peer),
            AppEvent::ConnectFailed { peer, status } => {
                warn!("Failed to connect to {} (err {})", peer, status);
            }
            AppEvent::Disconnected { peer, reason } => {
                info!("Disconnected from {} (reason {})", peer, reason);
            }
            AppEvent::Readvertising => info!("LINK | restarting advertising after disconnect"),
            AppEvent::StateChanged { from, to } => info!("LINK | {:?} -> {:?}", from, to),

            AppEvent::Passkey { peer, passkey } => info!("Passkey for {}: {}", peer, passkey),
            AppEvent::InvalidPasskey { peer, raw } => {
                warn!("PAIR | passkey {} for {} out of range", raw, peer);
            }
            AppEvent::PairingCancelled { peer } => info!("Pairing cancelled: {}", peer),
            AppEvent::PairingComplete { peer, bonded } => {
                info!("PAIR | complete with {} (bonded={})", peer, bonded);
            }
        }
    }
}
