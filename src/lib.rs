//! EnvNode firmware library.
//!
//! Exposes the pure-logic modules for integration testing and external
//! inspection. All ESP-IDF-specific code is guarded by
//! `#[cfg(target_os = "espidf")]` within each module.

#![deny(unused_must_use)]

pub mod app;
pub mod config;
pub mod error;
pub mod link;
pub mod sensors;
pub mod state;
pub mod telemetry;

// ESP-IDF implementations are guarded by cfg attributes inside; host
// builds get the simulation variants.
pub mod adapters;
pub mod drivers;
