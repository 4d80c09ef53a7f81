//! Shared node state: the single synchronized holder for everything the
//! sampling loop and the link-event task both touch.
//!
//! ```text
//!  Orchestrator ──(presence)──▶ ┌───────────────┐ ◀──(link, trust)── LinkSupervisor
//!                               │   NodeState   │
//!                               │ critical-sect │
//!                               └───────────────┘
//! ```
//!
//! Write contracts:
//! - `link` is written only by [`ConnectionManager`](crate::link::connection::ConnectionManager).
//! - `trust` is written only by [`PairingAuthenticator`](crate::link::pairing::PairingAuthenticator).
//! - `presence` is written only by [`TelemetryPublisher`](crate::telemetry::TelemetryPublisher).
//!
//! Any context may read.  Every access is a short critical section; no
//! callback or I/O runs while the lock is held.

use core::cell::RefCell;

use embassy_sync::blocking_mutex::Mutex;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;

use crate::link::PeerAddress;

/// Peer-link state.  Moves `Uninitialized → Advertising → Connected →
/// Uninitialized`, or back from `Advertising` when the stack rejects it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// Radio idle: not advertising, or the tracked link dropped.
    Uninitialized,
    Advertising,
    Connected(PeerAddress),
}

/// Whether any bonded peer exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrustState {
    /// Bonds from a previous boot may still be in the store.
    Stale,
    /// Store cleared; the next peer must pair from scratch.
    Untrusted,
    /// Bonded during this boot.
    Bonded(PeerAddress),
}

/// Point-in-time copy of the shared fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NodeSnapshot {
    pub link: ConnectionState,
    pub trust: TrustState,
    /// Last value written to the presence characteristic.
    pub presence: Option<u8>,
}

impl NodeSnapshot {
    const fn initial() -> Self {
        Self {
            link: ConnectionState::Uninitialized,
            trust: TrustState::Stale,
            presence: None,
        }
    }
}

pub struct NodeState {
    inner: Mutex<CriticalSectionRawMutex, RefCell<NodeSnapshot>>,
}

impl Default for NodeState {
    fn default() -> Self {
        Self::new()
    }
}

impl NodeState {
    pub const fn new() -> Self {
        Self {
            inner: Mutex::new(RefCell::new(NodeSnapshot::initial())),
        }
    }

    pub fn snapshot(&self) -> NodeSnapshot {
        self.inner.lock(|cell| *cell.borrow())
    }

    pub fn connection(&self) -> ConnectionState {
        self.inner.lock(|cell| cell.borrow().link)
    }

    pub fn trust(&self) -> TrustState {
        self.inner.lock(|cell| cell.borrow().trust)
    }

    pub fn presence(&self) -> Option<u8> {
        self.inner.lock(|cell| cell.borrow().presence)
    }

    /// Apply `f` to the link state atomically; returns `(before, after)`.
    pub(crate) fn update_connection(
        &self,
        f: impl FnOnce(ConnectionState) -> ConnectionState,
    ) -> (ConnectionState, ConnectionState) {
        self.inner.lock(|cell| {
            let mut s = cell.borrow_mut();
            let before = s.link;
            s.link = f(before);
            (before, s.link)
        })
    }

    pub(crate) fn set_trust(&self, trust: TrustState) {
        self.inner.lock(|cell| cell.borrow_mut().trust = trust);
    }

    pub(crate) fn set_presence(&self, level: u8) {
        self.inner.lock(|cell| cell.borrow_mut().presence = Some(level));
    }
}
