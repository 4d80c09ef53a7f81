//! Port traits — the hexagonal boundary between domain logic and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ Orchestrator / LinkSupervisor (domain)
//! ```
//!
//! Driven adapters (radio stack, bond store, sensor bus, event sinks,
//! timers) implement these traits.  The domain consumes them via generics,
//! so the core never touches the radio or the I2C bus directly.
//!
//! ## Concurrency contract
//!
//! The radio-side ports take `&self`: the same adapter is called from the
//! sampling loop (presence updates) and from the link-event task
//! (re-advertising).  Implementations must be safe to invoke from either
//! context; the domain adds no locking of its own around them.

use core::time::Duration;

use crate::error::{RadioError, SensorError};
use crate::link::advertising::AdvertisingMode;
use crate::sensors::{SensorChannel, SensorValue};

// ───────────────────────────────────────────────────────────────
// Radio port (driven adapter: domain → BLE stack)
// ───────────────────────────────────────────────────────────────

/// Lifecycle and advertising control of the radio stack.
pub trait RadioPort {
    /// Bring the controller and host stack up.
    fn enable(&self) -> Result<(), RadioError>;

    /// Route connection and authentication callbacks into the radio event
    /// queue.  Registration itself cannot fail.
    fn register_callbacks(&self);

    /// Start broadcasting the encoded AD structures in `mode`.
    fn start_advertising(&self, mode: AdvertisingMode, payload: &[u8]) -> Result<(), RadioError>;
}

// ───────────────────────────────────────────────────────────────
// Bond store port (driven adapter: domain ↔ persisted pairing keys)
// ───────────────────────────────────────────────────────────────

/// The stack's persisted bonded-peer store for the default identity.
pub trait BondStore {
    /// Erase every bonded peer.  Returns the number of bonds removed.
    fn clear_bonds(&self) -> Result<usize, RadioError>;
}

// ───────────────────────────────────────────────────────────────
// Presence port (driven adapter: domain → GATT characteristic)
// ───────────────────────────────────────────────────────────────

/// The single-byte battery-level characteristic, repurposed to carry
/// whole-degree temperature.
pub trait PresencePort {
    /// Store `level` (0–100) and notify a subscribed peer.
    ///
    /// An `Err` means the notification was not delivered (typically no peer
    /// is linked); the stored value is still updated.
    fn set_presence(&self, level: u8) -> Result<(), RadioError>;
}

// ───────────────────────────────────────────────────────────────
// Sensor port (driven adapter: peripheral → domain)
// ───────────────────────────────────────────────────────────────

/// Synchronous access to a multi-channel sensor peripheral.
pub trait SensorPort {
    /// Locate and initialise the peripheral called `name`.
    fn bind(&mut self, name: &str) -> Result<(), SensorError>;

    /// Trigger one conversion and latch every channel.
    fn sample_fetch(&mut self) -> Result<(), SensorError>;

    /// Read a channel latched by the last successful fetch.
    fn channel_get(&mut self, channel: SensorChannel) -> Result<SensorValue, SensorError>;
}

// ───────────────────────────────────────────────────────────────
// Event sink port (driven adapter: domain → logging)
// ───────────────────────────────────────────────────────────────

/// The domain emits structured [`AppEvent`](super::events::AppEvent)s
/// through this port.  Adapters decide where they go (serial log, test
/// recorder, etc.).
pub trait EventSink {
    fn emit(&mut self, event: &super::events::AppEvent);
}

// ───────────────────────────────────────────────────────────────
// Clock port (driven adapter: domain → timer)
// ───────────────────────────────────────────────────────────────

/// Suspension source for the sampling loop.  Injected so cadence can be
/// tested without real-time waits.
#[allow(async_fn_in_trait)]
pub trait Clock {
    /// Resolve after `duration` has elapsed.
    async fn sleep(&mut self, duration: Duration);
}
