//! The simulation driver
//!
//! Loads a simulation once, registers the arrived-vehicles subscription, then
//! steps a fixed number of times and reports what it sees after each step.

use log::debug;
use std::path::Path;

use crate::config::DriverConfig;
use crate::engine::{
    EngineError, SimulationEngine, SimulationSession, SubscriptionRequest, VehicleSpeed,
};
use crate::telemetry::TelemetrySink;

/// A loaded simulation and the bookkeeping around it
pub struct SimulationDriver<S> {
    session: S,
    steps_taken: u64,
}

impl<S: SimulationSession> SimulationDriver<S> {
    /// Load the simulation described by `config_path`. This is the only way
    /// to obtain a driver, so nothing can step an unloaded engine.
    pub fn initialize<E>(engine: E, config_path: &Path) -> Result<Self, EngineError>
    where
        E: SimulationEngine<Session = S>,
    {
        let args = vec![config_path.display().to_string()];
        let session = engine.load(&args)?;
        debug!("Loaded simulation from {}", config_path.display());
        Ok(Self {
            session,
            steps_taken: 0,
        })
    }

    /// Subscribe to arrived vehicles for the whole run
    pub fn register_telemetry(&mut self) -> Result<(), EngineError> {
        let request = SubscriptionRequest::arrived_vehicles();
        debug!(
            "Subscribing to {:?} from {}s to {}s",
            request.variables, request.begin, request.end
        );
        self.session.subscribe(&request)
    }

    /// Step `step_count` times. After each step, report subscription values
    /// first and then the speed of every active vehicle. Runs the full count
    /// even once the simulation has emptied.
    pub fn run_loop<T: TelemetrySink>(
        &mut self,
        step_count: u64,
        sink: &mut T,
    ) -> Result<(), EngineError> {
        for _ in 0..step_count {
            self.session.step()?;
            self.steps_taken += 1;
            sink.begin_step(self.steps_taken);

            for (variable, value) in self.session.subscription_results()? {
                sink.subscription_value(variable, &value);
            }

            for vehicle_id in self.session.vehicle_ids()? {
                let speed = self.session.vehicle_speed(&vehicle_id)?;
                sink.vehicle_speed(&VehicleSpeed::new(vehicle_id, speed));
            }
        }
        Ok(())
    }

    pub fn steps_taken(&self) -> u64 {
        self.steps_taken
    }
}

/// Full run: initialize, register telemetry, step `num_steps` times.
/// Returns the driver so the caller decides when the session goes away.
pub fn run<E, T>(
    engine: E,
    config: &DriverConfig,
    sink: &mut T,
) -> Result<SimulationDriver<E::Session>, EngineError>
where
    E: SimulationEngine,
    T: TelemetrySink,
{
    let mut driver = SimulationDriver::initialize(engine, &config.config_file)?;
    driver.register_telemetry()?;
    driver.run_loop(config.num_steps, sink)?;
    Ok(driver)
}
