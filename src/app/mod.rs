//! Application core — pure domain logic, zero I/O.
//!
//! Startup sequencing and the sampling loop live in [`orchestrator`].
//! All interaction with hardware happens through **port traits** defined
//! in [`ports`], keeping this layer fully testable without real peripherals.

pub mod cancel;
pub mod events;
pub mod orchestrator;
pub mod ports;
