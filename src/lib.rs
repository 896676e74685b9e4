//! SUMO Demo Library
//!
//! Drives an external SUMO traffic simulation: load a configuration, subscribe
//! to arrived vehicles, step a fixed number of times and report vehicle speeds.

pub mod config;
pub mod driver;
pub mod engine;
pub mod telemetry;
pub mod traci;
