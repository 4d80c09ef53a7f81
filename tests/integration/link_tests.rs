//! Integration tests for the link supervisor: connection transitions,
//! the disconnect re-arm switch, and pairing events arriving through the
//! radio event queue.

use std::time::Duration;

use futures_lite::future::block_on;

use envnode::app::cancel::CancelToken;
use envnode::app::events::AppEvent;
use envnode::app::orchestrator::Orchestrator;
use envnode::config::NodeConfig;
use envnode::error::RadioError;
use envnode::link::advertising::{AdvertisementPacket, AdvertisingController};
use envnode::link::{LinkSupervisor, Passkey, RadioEvent, RadioEventChannel, post_event};
use envnode::state::{ConnectionState, NodeState, TrustState};

use crate::mock_hw::{MockRadio, MockSensor, RecordingSink, other_peer, peer, scenario_reading};

/// Radio, state and advertiser after a successful startup.
struct Node {
    config: NodeConfig,
    radio: MockRadio,
    state: NodeState,
    adv: AdvertisingController,
}

impl Node {
    fn started(readvertise_on_disconnect: bool) -> Self {
        let config = NodeConfig {
            readvertise_on_disconnect,
            ..NodeConfig::default()
        };
        let node = Self {
            adv: AdvertisingController::new(&AdvertisementPacket::sensor_node(), &config).unwrap(),
            config,
            radio: MockRadio::new(),
            state: NodeState::new(),
        };
        node.startup(&mut RecordingSink::new());
        node
    }

    fn startup(&self, sink: &mut RecordingSink) {
        Orchestrator::new(&self.config, &self.radio, &self.state, &self.adv)
            .startup(MockSensor::steady(scenario_reading()), sink)
            .unwrap();
    }

    fn supervisor(&self) -> LinkSupervisor<'_, MockRadio> {
        LinkSupervisor::new(
            &self.state,
            &self.adv,
            &self.radio,
            self.config.readvertise_on_disconnect,
        )
    }
}

// ── Connection lifecycle ─────────────────────────────────────

#[test]
fn connect_then_disconnect_does_not_readvertise() {
    let node = Node::started(false);
    let mut sup = node.supervisor();
    let mut sink = RecordingSink::new();
    assert_eq!(node.state.connection(), ConnectionState::Advertising);

    sup.handle(RadioEvent::Connected { peer: peer(), status: 0 }, &mut sink);
    assert_eq!(node.state.connection(), ConnectionState::Connected(peer()));

    sup.handle(RadioEvent::Disconnected { peer: peer(), reason: 0x13 }, &mut sink);
    assert_eq!(node.state.connection(), ConnectionState::Uninitialized);
    assert_eq!(node.radio.advertising_starts(), 1);
    assert_eq!(
        sink.events,
        vec![
            AppEvent::Connected { peer: peer() },
            AppEvent::StateChanged {
                from: ConnectionState::Advertising,
                to: ConnectionState::Connected(peer()),
            },
            AppEvent::Disconnected { peer: peer(), reason: 0x13 },
            AppEvent::StateChanged {
                from: ConnectionState::Connected(peer()),
                to: ConnectionState::Uninitialized,
            },
        ]
    );
}

#[test]
fn readvertise_switch_restarts_advertising_once() {
    let node = Node::started(true);
    let mut sup = node.supervisor();
    let mut sink = RecordingSink::new();

    sup.handle(RadioEvent::Connected { peer: peer(), status: 0 }, &mut sink);
    sup.handle(RadioEvent::Disconnected { peer: peer(), reason: 0x08 }, &mut sink);

    assert_eq!(node.radio.advertising_starts(), 2);
    assert_eq!(node.state.connection(), ConnectionState::Advertising);
    assert_eq!(sink.count(|e| *e == AppEvent::Readvertising), 1);
}

#[test]
fn failed_connect_keeps_advertising() {
    let node = Node::started(false);
    let mut sup = node.supervisor();
    let mut sink = RecordingSink::new();

    sup.handle(RadioEvent::Connected { peer: peer(), status: 0x3E }, &mut sink);

    assert_eq!(node.state.connection(), ConnectionState::Advertising);
    assert_eq!(sink.events, vec![AppEvent::ConnectFailed { peer: peer(), status: 0x3E }]);
}

#[test]
fn second_peer_leaving_keeps_first_link_and_does_not_readvertise() {
    let node = Node::started(true);
    let mut sup = node.supervisor();
    let mut sink = RecordingSink::new();

    sup.handle(RadioEvent::Connected { peer: peer(), status: 0 }, &mut sink);
    sup.handle(RadioEvent::Connected { peer: other_peer(), status: 0 }, &mut sink);
    sup.handle(RadioEvent::Disconnected { peer: other_peer(), reason: 0x13 }, &mut sink);

    assert_eq!(node.state.connection(), ConnectionState::Connected(peer()));
    assert_eq!(node.radio.advertising_starts(), 1);
    assert_eq!(sink.count(|e| *e == AppEvent::Readvertising), 0);

    sup.handle(RadioEvent::Disconnected { peer: peer(), reason: 0x13 }, &mut sink);
    assert_eq!(node.state.connection(), ConnectionState::Advertising);
    assert_eq!(node.radio.advertising_starts(), 2);
}

#[test]
fn stack_rejecting_advertising_is_reported_and_leaves_idle() {
    let node = Node::started(false);
    let mut sup = node.supervisor();
    let mut sink = RecordingSink::new();
    assert_eq!(node.state.connection(), ConnectionState::Advertising);

    sup.handle(RadioEvent::AdvertisingFailed { code: 0x0C }, &mut sink);

    assert_eq!(node.state.connection(), ConnectionState::Uninitialized);
    assert_eq!(
        sink.events,
        vec![
            AppEvent::AdvertisingFailed(RadioError(0x0C)),
            AppEvent::StateChanged {
                from: ConnectionState::Advertising,
                to: ConnectionState::Uninitialized,
            },
        ]
    );
}

// ── Pairing ──────────────────────────────────────────────────

#[test]
fn passkey_and_cancel_are_reported() {
    let node = Node::started(false);
    let mut sup = node.supervisor();
    let mut sink = RecordingSink::new();

    sup.handle(RadioEvent::PasskeyDisplay { peer: peer(), passkey: 42 }, &mut sink);
    sup.handle(RadioEvent::PairingCancelled { peer: peer() }, &mut sink);

    let passkey = Passkey::new(42).unwrap();
    assert_eq!(passkey.to_string(), "000042");
    assert_eq!(
        sink.events,
        vec![
            AppEvent::Passkey { peer: peer(), passkey },
            AppEvent::PairingCancelled { peer: peer() },
        ]
    );
    assert_eq!(node.state.trust(), TrustState::Untrusted);
}

#[test]
fn bond_from_this_session_is_cleared_on_next_startup() {
    let node = Node::started(false);
    let mut sup = node.supervisor();
    let mut sink = RecordingSink::new();

    sup.handle(RadioEvent::PairingComplete { peer: peer(), bonded: true }, &mut sink);
    assert_eq!(node.state.trust(), TrustState::Bonded(peer()));

    node.radio.bonds.set(1);
    node.startup(&mut sink);
    assert_eq!(node.state.trust(), TrustState::Untrusted);
    assert_eq!(node.radio.bonds.get(), 0);
}

// ── Event queue ──────────────────────────────────────────────

#[test]
fn drain_applies_queued_events_in_order() {
    let node = Node::started(false);
    let mut sup = node.supervisor();
    let mut sink = RecordingSink::new();
    let channel = RadioEventChannel::new();

    assert!(post_event(&channel, RadioEvent::Connected { peer: peer(), status: 0 }));
    assert!(post_event(&channel, RadioEvent::Disconnected { peer: peer(), reason: 0x13 }));

    assert_eq!(sup.drain(&channel, &mut sink), 2);
    assert_eq!(sup.drain(&channel, &mut sink), 0);
    assert_eq!(node.state.connection(), ConnectionState::Uninitialized);
}

#[test]
fn run_handles_events_until_cancelled() {
    let node = Node::started(false);
    let mut sup = node.supervisor();
    let mut sink = RecordingSink::new();
    let channel = RadioEventChannel::new();
    let cancel = CancelToken::new();

    post_event(&channel, RadioEvent::Connected { peer: peer(), status: 0 });
    post_event(&channel, RadioEvent::PasskeyDisplay { peer: peer(), passkey: 123_456 });

    std::thread::scope(|s| {
        s.spawn(|| {
            std::thread::sleep(Duration::from_millis(20));
            cancel.cancel();
        });
        block_on(sup.run(&channel, &cancel, &mut sink));
    });

    assert_eq!(node.state.connection(), ConnectionState::Connected(peer()));
    assert_eq!(
        sink.count(|e| matches!(e, AppEvent::Passkey { .. })),
        1
    );
}
