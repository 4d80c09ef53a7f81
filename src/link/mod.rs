//! Peer link: advertising, connection tracking, pairing.
//!
//! Radio callbacks never touch domain state directly.  The BLE adapter
//! translates each stack callback into a [`RadioEvent`] and pushes it onto
//! a bounded [`RadioEventChannel`]; the [`LinkSupervisor`] drains that
//! channel on its own task and routes each event to the
//! [`ConnectionManager`] or the [`PairingAuthenticator`].
//!
//! ```text
//!  stack callback ──▶ RadioEventChannel ──▶ LinkSupervisor ─┬─▶ ConnectionManager
//!   (push only)        (depth 8)                            └─▶ PairingAuthenticator
//! ```

pub mod advertising;
pub mod connection;
pub mod pairing;

use core::fmt;

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;
use futures_lite::future;
use log::warn;

use crate::app::cancel::CancelToken;
use crate::app::events::AppEvent;
use crate::app::ports::{EventSink, RadioPort};
use crate::error::RadioError;
use crate::state::NodeState;

use self::advertising::AdvertisingController;
use self::connection::ConnectionManager;
use self::pairing::PairingAuthenticator;

// ───────────────────────────────────────────────────────────────
// Peer addressing
// ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddressKind {
    Public,
    Random,
}

/// A remote device address, bytes in display order (most significant
/// first).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PeerAddress {
    addr: [u8; 6],
    kind: AddressKind,
}

impl PeerAddress {
    pub const fn new(addr: [u8; 6], kind: AddressKind) -> Self {
        Self { addr, kind }
    }

    pub const fn bytes(&self) -> [u8; 6] {
        self.addr
    }

    pub const fn kind(&self) -> AddressKind {
        self.kind
    }
}

impl fmt::Display for PeerAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let a = &self.addr;
        write!(
            f,
            "{:02X}:{:02X}:{:02X}:{:02X}:{:02X}:{:02X} ({})",
            a[0],
            a[1],
            a[2],
            a[3],
            a[4],
            a[5],
            match self.kind {
                AddressKind::Public => "public",
                AddressKind::Random => "random",
            }
        )
    }
}

// ───────────────────────────────────────────────────────────────
// Passkey
// ───────────────────────────────────────────────────────────────

/// Six-digit pairing passkey shown to the operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Passkey(u32);

impl Passkey {
    pub const MAX: u32 = 999_999;

    /// `None` when `value` has more than six digits.
    pub const fn new(value: u32) -> Option<Self> {
        if value > Self::MAX { None } else { Some(Self(value)) }
    }

    pub const fn value(self) -> u32 {
        self.0
    }
}

impl fmt::Display for Passkey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:06}", self.0)
    }
}

// ───────────────────────────────────────────────────────────────
// Radio events
// ───────────────────────────────────────────────────────────────

/// Stack callbacks, as queued for the link task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RadioEvent {
    /// `status` is the HCI status; non-zero means the attempt failed.
    Connected { peer: PeerAddress, status: u8 },
    Disconnected { peer: PeerAddress, reason: u8 },
    /// Raw passkey from the stack; validated before it is displayed.
    PasskeyDisplay { peer: PeerAddress, passkey: u32 },
    PairingCancelled { peer: PeerAddress },
    PairingComplete { peer: PeerAddress, bonded: bool },
    /// The stack rejected an advertising start after accepting the request.
    AdvertisingFailed { code: i32 },
}

pub const RADIO_EVENT_DEPTH: usize = 8;

pub type RadioEventChannel = Channel<CriticalSectionRawMutex, RadioEvent, RADIO_EVENT_DEPTH>;

/// Non-blocking push used from stack callback context.  A full queue
/// drops the event with a warning rather than stalling the stack.
pub fn post_event(channel: &RadioEventChannel, event: RadioEvent) -> bool {
    match channel.try_send(event) {
        Ok(()) => true,
        Err(_) => {
            warn!("LINK: event queue full, dropped {:?}", event);
            false
        }
    }
}

// ───────────────────────────────────────────────────────────────
// Supervisor
// ───────────────────────────────────────────────────────────────

/// Owns the link-side handlers and applies queued radio events in order.
pub struct LinkSupervisor<'a, R: RadioPort> {
    connection: ConnectionManager<'a>,
    pairing: PairingAuthenticator<'a>,
    advertiser: &'a AdvertisingController,
    radio: &'a R,
    readvertise_on_disconnect: bool,
}

impl<'a, R: RadioPort> LinkSupervisor<'a, R> {
    pub fn new(
        state: &'a NodeState,
        advertiser: &'a AdvertisingController,
        radio: &'a R,
        readvertise_on_disconnect: bool,
    ) -> Self {
        Self {
            connection: ConnectionManager::new(state),
            pairing: PairingAuthenticator::new(state),
            advertiser,
            radio,
            readvertise_on_disconnect,
        }
    }

    pub fn handle(&mut self, event: RadioEvent, sink: &mut impl EventSink) {
        match event {
            RadioEvent::Connected { peer, status } => {
                self.connection.on_connected(peer, status, sink);
            }
            RadioEvent::Disconnected { peer, reason } => {
                let link_dropped = self.connection.on_disconnected(peer, reason, sink);
                if link_dropped && self.readvertise_on_disconnect {
                    sink.emit(&AppEvent::Readvertising);
                    if self.advertiser.start(self.radio, sink).is_ok() {
                        self.connection.on_advertising_started(sink);
                    }
                }
            }
            RadioEvent::PasskeyDisplay { peer, passkey } => {
                self.pairing.on_passkey_display(peer, passkey, sink);
            }
            RadioEvent::PairingCancelled { peer } => {
                self.pairing.on_cancel(peer, sink);
            }
            RadioEvent::PairingComplete { peer, bonded } => {
                self.pairing.on_pairing_complete(peer, bonded, sink);
            }
            RadioEvent::AdvertisingFailed { code } => {
                self.connection.on_advertising_failed(RadioError(code), sink);
            }
        }
    }

    /// Apply every event currently queued.  Returns how many were handled.
    pub fn drain(&mut self, channel: &RadioEventChannel, sink: &mut impl EventSink) -> usize {
        let mut handled = 0;
        while let Ok(event) = channel.try_receive() {
            self.handle(event, sink);
            handled += 1;
        }
        handled
    }

    /// Handle events as they arrive until `cancel` fires.
    pub async fn run(
        &mut self,
        channel: &RadioEventChannel,
        cancel: &CancelToken,
        sink: &mut impl EventSink,
    ) {
        while !cancel.is_cancelled() {
            let next = future::or(async { Some(channel.receive().await) }, async {
                cancel.cancelled().await;
                None
            })
            .await;
            match next {
                Some(event) => self.handle(event, sink),
                None => break,
            }
        }
    }
}
