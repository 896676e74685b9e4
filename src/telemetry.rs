//! Destinations for per-step observations

use log::{debug, info};

use crate::engine::{TraciValue, VariableId, VehicleSpeed};

/// Receives everything the driver observes, in emission order
pub trait TelemetrySink {
    /// Called once at the start of every step batch
    fn begin_step(&mut self, _step: u64) {}

    /// One subscribed variable and its value
    fn subscription_value(&mut self, variable: VariableId, value: &TraciValue);

    /// One active vehicle and its current speed
    fn vehicle_speed(&mut self, reading: &VehicleSpeed);
}

/// Writes observations as info-level log lines
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSink;

impl TelemetrySink for LogSink {
    fn begin_step(&mut self, step: u64) {
        debug!("Step {}", step);
    }

    fn subscription_value(&mut self, variable: VariableId, value: &TraciValue) {
        info!("{}", variable);
        info!("{}", value);
    }

    fn vehicle_speed(&mut self, reading: &VehicleSpeed) {
        info!("{}", format_vehicle_speed(reading));
    }
}

/// `<vehicle-id> speed: <speed>`
pub fn format_vehicle_speed(reading: &VehicleSpeed) -> String {
    format!("{} speed: {}", reading.id, reading.speed)
}
