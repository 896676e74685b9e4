//! Run configuration built from the command line

use anyhow::{bail, Result};
use std::path::{Path, PathBuf};

/// Scenario used when no configuration file is given
pub const DEFAULT_CONFIG_FILE: &str = "data/hello/hello.sumocfg";

/// Engine binary looked up on `PATH` (or under `SUMO_HOME/bin`)
pub const DEFAULT_SUMO_BINARY: &str = "sumo";

/// Default env_logger filter
pub const DEFAULT_LOG_FILTER: &str = "info";

/// What to load and how long to run it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DriverConfig {
    pub config_file: PathBuf,
    pub num_steps: u64,
}

impl DriverConfig {
    pub fn new(config_file: impl Into<PathBuf>, num_steps: u64) -> Self {
        Self {
            config_file: config_file.into(),
            num_steps,
        }
    }
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self::new(DEFAULT_CONFIG_FILE, 0)
    }
}

/// How to reach the engine
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineOptions {
    pub sumo_binary: PathBuf,
    /// 0 picks a free port
    pub remote_port: u16,
}

impl EngineOptions {
    /// Build options, resolving a bare binary name against `sumo_home`
    pub fn new(sumo_binary: &Path, remote_port: u16, sumo_home: Option<&Path>) -> Result<Self> {
        if sumo_binary.as_os_str().is_empty() {
            bail!("--sumo_binary must not be empty");
        }
        Ok(Self {
            sumo_binary: resolve_sumo_binary(sumo_binary, sumo_home),
            remote_port,
        })
    }
}

/// A bare binary name is looked up in `<sumo_home>/bin` first; anything with
/// a directory component is used as given.
pub fn resolve_sumo_binary(binary: &Path, sumo_home: Option<&Path>) -> PathBuf {
    let is_bare = binary.components().count() == 1 && binary.parent() == Some(Path::new(""));
    if let (true, Some(home)) = (is_bare, sumo_home) {
        let candidate = home.join("bin").join(binary);
        if candidate.is_file() {
            return candidate;
        }
    }
    binary.to_path_buf()
}
