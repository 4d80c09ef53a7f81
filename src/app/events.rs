//! Outbound application events.
//!
//! The orchestrator and the link handlers emit these through the
//! [`EventSink`](super::ports::EventSink) port.  Adapters on the other
//! side decide what to do with them: the serial log on target, a recorder
//! in tests.

use crate::error::{RadioError, SensorError};
use crate::link::{Passkey, PeerAddress};
use crate::sensors::SensorReading;
use crate::state::ConnectionState;

/// Structured events emitted by the node core.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppEvent {
    /// Startup began under the advertised name.
    Started { name: heapless::String<24> },

    // ── Radio bring-up ───────────────────────────────────────
    RadioEnabled,
    RadioEnableFailed(RadioError),
    /// Prior bonds erased (count removed).
    BondsCleared(usize),
    UnpairFailed(RadioError),
    CallbacksRegistered,
    AdvertisingStarted,
    AdvertisingFailed(RadioError),
    /// Advertising not attempted because the radio never came up.
    AdvertisingSkipped,

    // ── Sensor ───────────────────────────────────────────────
    SensorBound { name: heapless::String<16> },
    /// Fatal: sampling never starts.
    SensorMissing { name: heapless::String<16> },
    /// One published sample.
    Reading(SensorReading),
    /// A cycle produced nothing; the loop carries on.
    SampleSkipped(SensorError),
    /// Presence value stored but the notification went nowhere.
    PresenceNotDelivered(RadioError),

    // ── Link ─────────────────────────────────────────────────
    Connected { peer: PeerAddress },
    ConnectFailed { peer: PeerAddress, status: u8 },
    Disconnected { peer: PeerAddress, reason: u8 },
    Readvertising,
    StateChanged { from: ConnectionState, to: ConnectionState },

    // ── Pairing ──────────────────────────────────────────────
    Passkey { peer: PeerAddress, passkey: Passkey },
    InvalidPasskey { peer: PeerAddress, raw: u32 },
    PairingCancelled { peer: PeerAddress },
    PairingComplete { peer: PeerAddress, bonded: bool },
}
