//! Pairing policy: display-only passkey, fresh trust every boot.
//!
//! The node has a display but no keyboard, so the only authentication it
//! offers is showing a six-digit passkey for the operator to compare with
//! the peer's screen.  Bonds from earlier sessions are erased at startup
//! before advertising begins.

use crate::app::events::AppEvent;
use crate::app::ports::{BondStore, EventSink};
use crate::error::RadioError;
use crate::state::{NodeState, TrustState};

use super::{Passkey, PeerAddress};

pub struct PairingAuthenticator<'a> {
    state: &'a NodeState,
}

impl<'a> PairingAuthenticator<'a> {
    pub fn new(state: &'a NodeState) -> Self {
        Self { state }
    }

    pub fn trust(&self) -> TrustState {
        self.state.trust()
    }

    /// Erase every stored bond.  On failure the trust state is left
    /// untouched and the error is returned for the caller to carry on past.
    pub fn reset_trust(&self, store: &impl BondStore, sink: &mut impl EventSink) -> Result<(), RadioError> {
        match store.clear_bonds() {
            Ok(removed) => {
                self.state.set_trust(TrustState::Untrusted);
                sink.emit(&AppEvent::BondsCleared(removed));
                Ok(())
            }
            Err(e) => {
                sink.emit(&AppEvent::UnpairFailed(e));
                Err(e)
            }
        }
    }

    pub fn on_passkey_display(&self, peer: PeerAddress, passkey: u32, sink: &mut impl EventSink) {
        match Passkey::new(passkey) {
            Some(passkey) => sink.emit(&AppEvent::Passkey { peer, passkey }),
            None => sink.emit(&AppEvent::InvalidPasskey { peer, raw: passkey }),
        }
    }

    pub fn on_cancel(&self, peer: PeerAddress, sink: &mut impl EventSink) {
        sink.emit(&AppEvent::PairingCancelled { peer });
    }

    /// Bonds made now last only until the next boot clears them.
    pub fn on_pairing_complete(&self, peer: PeerAddress, bonded: bool, sink: &mut impl EventSink) {
        if bonded {
            self.state.set_trust(TrustState::Bonded(peer));
        }
        sink.emit(&AppEvent::PairingComplete { peer, bonded });
    }
}
