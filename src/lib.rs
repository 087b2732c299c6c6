//! Smart-home simulator: rooms, devices, energy accounting, long-running
//! alerts, and time-triggered routines driven by a periodic tick.

pub mod accounts;
#[cfg(feature = "api")]
pub mod api;
pub mod config;
pub mod devices;
pub mod error;
pub mod id;
pub mod io;
pub mod runner;
/// Tick engine, clock, energy, alerts, scheduling, and reporting.
pub mod sim;
pub mod store;
