//! Peer-link state machine.
//!
//! ```text
//!  Uninitialized ──adv started──▶ Advertising ──connected(0)──▶ Connected
//!        ▲  ▲                            │                          │
//!        │  └──── adv rejected ──────────┘                          │
//!        └──────────────────── tracked peer disconnected ───────────┘
//! ```
//!
//! A connect callback with a non-zero status is reported and leaves the
//! state where it was.  Only the tracked peer's disconnect ends the
//! session; a second link coming and going leaves it alone.  Whether
//! advertising resumes is the supervisor's call.

use crate::app::events::AppEvent;
use crate::app::ports::EventSink;
use crate::error::RadioError;
use crate::state::{ConnectionState, NodeState};

use super::PeerAddress;

pub struct ConnectionManager<'a> {
    state: &'a NodeState,
}

impl<'a> ConnectionManager<'a> {
    pub fn new(state: &'a NodeState) -> Self {
        Self { state }
    }

    pub fn state(&self) -> ConnectionState {
        self.state.connection()
    }

    pub fn on_advertising_started(&self, sink: &mut impl EventSink) {
        self.transition(sink, |s| match s {
            ConnectionState::Uninitialized => ConnectionState::Advertising,
            other => other,
        });
    }

    /// The stack turned advertising down after the start request was
    /// accepted.
    pub fn on_advertising_failed(&self, err: RadioError, sink: &mut impl EventSink) {
        sink.emit(&AppEvent::AdvertisingFailed(err));
        self.transition(sink, |s| match s {
            ConnectionState::Advertising => ConnectionState::Uninitialized,
            other => other,
        });
    }

    pub fn on_connected(&self, peer: PeerAddress, status: u8, sink: &mut impl EventSink) {
        if status != 0 {
            sink.emit(&AppEvent::ConnectFailed { peer, status });
            return;
        }
        sink.emit(&AppEvent::Connected { peer });
        // A second link while one is up is not tracked.
        self.transition(sink, |s| match s {
            ConnectionState::Connected(current) => ConnectionState::Connected(current),
            _ => ConnectionState::Connected(peer),
        });
    }

    /// Returns `true` when the node is left without a link, `false` when
    /// an untracked peer dropped and the tracked one is still connected.
    pub fn on_disconnected(&self, peer: PeerAddress, reason: u8, sink: &mut impl EventSink) -> bool {
        sink.emit(&AppEvent::Disconnected { peer, reason });
        let to = self.transition(sink, |s| match s {
            ConnectionState::Connected(current) if current != peer => s,
            _ => ConnectionState::Uninitialized,
        });
        to == ConnectionState::Uninitialized
    }

    fn transition(
        &self,
        sink: &mut impl EventSink,
        f: impl FnOnce(ConnectionState) -> ConnectionState,
    ) -> ConnectionState {
        let (from, to) = self.state.update_connection(f);
        if from != to {
            sink.emit(&AppEvent::StateChanged { from, to });
        }
        to
    }
}
