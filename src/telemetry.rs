//! Publishing one reading: presence characteristic first, then the log.
//!
//! The presence value is written whether or not a peer is linked; only a
//! subscribed peer ever sees it.  Publishing never fails the cycle.

use crate::app::events::AppEvent;
use crate::app::ports::{EventSink, PresencePort};
use crate::sensors::SensorReading;
use crate::state::NodeState;

pub struct TelemetryPublisher<'a, P: PresencePort> {
    presence: &'a P,
    state: &'a NodeState,
}

impl<'a, P: PresencePort> TelemetryPublisher<'a, P> {
    pub fn new(presence: &'a P, state: &'a NodeState) -> Self {
        Self { presence, state }
    }

    /// Presence and log line both derive from `reading`, so they always
    /// describe the same sample.
    pub fn publish(&mut self, reading: &SensorReading, sink: &mut impl EventSink) {
        let level = reading.presence_level();
        self.state.set_presence(level);
        if let Err(e) = self.presence.set_presence(level) {
            sink.emit(&AppEvent::PresenceNotDelivered(e));
        }
        sink.emit(&AppEvent::Reading(*reading));
    }
}
