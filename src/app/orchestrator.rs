//! Orchestrator: one-time startup, then the sample → publish → sleep loop.
//!
//! ```text
//!  enable radio ─▶ clear bonds ─▶ register callbacks ─▶ advertise ─▶ bind sensor
//!   (degraded)      (degraded)                           (degraded)    (fatal)
//!                                                                         │
//!          ┌──────────────────────────────────────────────────────────────┘
//!          ▼
//!       sample ──▶ publish ──▶ sleep(interval) ──┐
//!          ▲                                     │
//!          └─────────────────────────────────────┘
//! ```
//!
//! Every startup step runs regardless of earlier failures, except that
//! advertising needs an enabled radio.  Only a missing sensor stops the
//! node.  The loop has a single suspension point (the sleep) and is left
//! only through a [`CancelToken`].

use core::time::Duration;

use futures_lite::future;
use log::info;

use crate::config::NodeConfig;
use crate::error::Result;
use crate::link::advertising::AdvertisingController;
use crate::link::connection::ConnectionManager;
use crate::link::pairing::PairingAuthenticator;
use crate::sensors::SensorSampler;
use crate::state::NodeState;
use crate::telemetry::TelemetryPublisher;

use super::cancel::CancelToken;
use super::events::AppEvent;
use super::ports::{BondStore, Clock, EventSink, PresencePort, RadioPort, SensorPort};

/// Cycle counts, returned when the loop is cancelled.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoopStats {
    pub published: u32,
    pub skipped: u32,
}

pub struct Orchestrator<'a, R>
where
    R: RadioPort + BondStore + PresencePort,
{
    config: &'a NodeConfig,
    radio: &'a R,
    state: &'a NodeState,
    advertiser: &'a AdvertisingController,
}

impl<'a, R> Orchestrator<'a, R>
where
    R: RadioPort + BondStore + PresencePort,
{
    pub fn new(
        config: &'a NodeConfig,
        radio: &'a R,
        state: &'a NodeState,
        advertiser: &'a AdvertisingController,
    ) -> Self {
        Self {
            config,
            radio,
            state,
            advertiser,
        }
    }

    // ── Startup ───────────────────────────────────────────────

    /// Run the startup sequence and hand back the bound sampler.
    ///
    /// Radio, unpair and advertising failures are reported and passed
    /// over.  Binding failure is the only error returned.
    pub fn startup<S: SensorPort>(
        &self,
        sensor: S,
        sink: &mut impl EventSink,
    ) -> Result<SensorSampler<S>> {
        sink.emit(&AppEvent::Started {
            name: self.config.device_name.clone(),
        });

        let radio_up = match self.radio.enable() {
            Ok(()) => {
                sink.emit(&AppEvent::RadioEnabled);
                true
            }
            Err(e) => {
                sink.emit(&AppEvent::RadioEnableFailed(e));
                false
            }
        };

        // Failure is already reported; trust stays stale.
        let _ = PairingAuthenticator::new(self.state).reset_trust(self.radio, sink);

        self.radio.register_callbacks();
        sink.emit(&AppEvent::CallbacksRegistered);

        if radio_up {
            if self.advertiser.start(self.radio, sink).is_ok() {
                ConnectionManager::new(self.state).on_advertising_started(sink);
            }
        } else {
            sink.emit(&AppEvent::AdvertisingSkipped);
        }

        let name = self.config.sensor_peripheral.clone();
        match SensorSampler::bind(sensor, &name) {
            Ok(sampler) => {
                sink.emit(&AppEvent::SensorBound { name });
                Ok(sampler)
            }
            Err(e) => {
                sink.emit(&AppEvent::SensorMissing { name });
                Err(e.into())
            }
        }
    }

    // ── Steady state ──────────────────────────────────────────

    /// Sample, publish and sleep until `cancel` fires.
    ///
    /// A failed sample skips the cycle; the cadence is unaffected.
    pub async fn run<S: SensorPort>(
        &self,
        sampler: &mut SensorSampler<S>,
        clock: &mut impl Clock,
        cancel: &CancelToken,
        sink: &mut impl EventSink,
    ) -> LoopStats {
        let interval = Duration::from_millis(u64::from(self.config.sample_interval_ms));
        let mut publisher = TelemetryPublisher::new(self.radio, self.state);
        let mut stats = LoopStats::default();

        while !cancel.is_cancelled() {
            match sampler.sample() {
                Ok(reading) => {
                    publisher.publish(&reading, sink);
                    stats.published += 1;
                }
                Err(e) => {
                    sink.emit(&AppEvent::SampleSkipped(e));
                    stats.skipped += 1;
                }
            }

            let slept = future::or(
                async {
                    clock.sleep(interval).await;
                    true
                },
                async {
                    cancel.cancelled().await;
                    false
                },
            )
            .await;
            if !slept {
                break;
            }
        }

        info!(
            "LOOP | stopped after {} published, {} skipped",
            stats.published, stats.skipped
        );
        stats
    }

    /// Startup followed by the loop.  Returns early only when binding fails.
    pub async fn launch<S: SensorPort>(
        &self,
        sensor: S,
        clock: &mut impl Clock,
        cancel: &CancelToken,
        sink: &mut impl EventSink,
    ) -> Result<LoopStats> {
        let mut sampler = self.startup(sensor, sink)?;
        Ok(self.run(&mut sampler, clock, cancel, sink).await)
    }
}
