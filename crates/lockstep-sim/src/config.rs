//! Simulation run configuration.

use std::path::PathBuf;

use lockstep_engine::RunArgs;

/// Inputs and knobs for one simulation run.  Fluent setters; every field has
/// a sensible default except the two input files.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SimConfig {
    /// The building description file the engine runs.
    pub building_path: PathBuf,
    /// The weather file driving the run.
    pub weather_path: PathBuf,
    /// Warm-up phases that must complete before the first observation.
    pub warmup_phases: u32,
    /// Action cycles allowed before the run is ended cooperatively.
    pub max_steps: u64,
    /// Directory for the engine's own log files.
    pub log_dir: PathBuf,
    /// Whether the engine may write progress chatter to the console.
    pub verbose: bool,
}

impl SimConfig {
    pub fn new(building_path: impl Into<PathBuf>, weather_path: impl Into<PathBuf>) -> Self {
        SimConfig {
            building_path: building_path.into(),
            weather_path:  weather_path.into(),
            warmup_phases: 5,
            max_steps:     10_000,
            log_dir:       PathBuf::from("engine_output"),
            verbose:       true,
        }
    }

    pub fn warmup_phases(mut self, n: u32) -> Self {
        self.warmup_phases = n;
        self
    }

    pub fn max_steps(mut self, n: u64) -> Self {
        self.max_steps = n;
        self
    }

    pub fn log_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.log_dir = dir.into();
        self
    }

    pub fn verbose(mut self, on: bool) -> Self {
        self.verbose = on;
        self
    }

    pub(crate) fn run_args(&self) -> RunArgs {
        RunArgs {
            building_path: self.building_path.clone(),
            weather_path:  self.weather_path.clone(),
            log_dir:       self.log_dir.clone(),
        }
    }
}
