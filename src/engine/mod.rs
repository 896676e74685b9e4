//! Capability interface of the external simulation engine
//!
//! The driver only talks to these traits. A successful [`SimulationEngine::load`]
//! hands back an owned session; every later call goes through that session.

mod error;
mod types;

pub use error::EngineError;
pub use types::{
    SubscriptionRequest, SubscriptionResults, TraciValue, VariableId, VehicleSpeed,
    SUBSCRIPTION_BEGIN, SUBSCRIPTION_END, VAR_ARRIVED_VEHICLES_IDS,
};

/// An engine that has not loaded a simulation yet
pub trait SimulationEngine {
    type Session: SimulationSession;

    /// Load a simulation from engine command-line style arguments.
    /// Consumes the engine, so a run can only load once.
    fn load(self, args: &[String]) -> Result<Self::Session, EngineError>;
}

/// A loaded simulation
pub trait SimulationSession {
    /// Register a standing subscription on simulation-level variables
    fn subscribe(&mut self, request: &SubscriptionRequest) -> Result<(), EngineError>;

    /// Advance the simulation by exactly one step
    fn step(&mut self) -> Result<(), EngineError>;

    /// Subscription values produced by the most recent step
    fn subscription_results(&mut self) -> Result<SubscriptionResults, EngineError>;

    /// Ids of all vehicles currently in the simulation
    fn vehicle_ids(&mut self) -> Result<Vec<String>, EngineError>;

    /// Current speed of a vehicle in m/s
    fn vehicle_speed(&mut self, vehicle_id: &str) -> Result<f64, EngineError>;
}
