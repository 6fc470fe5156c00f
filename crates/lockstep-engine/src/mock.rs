//! A deterministic scripted engine for tests.
//!
//! `MockEngine` drives the same callback choreography a real engine does:
//! a few timesteps before the exchange data is ready, a configurable number
//! of warm-up phases (warm-up flag set, warm-up-complete hook fired after
//! each), then the run period proper — one timestep hook invocation per
//! timestep, honouring cooperative stop requests.
//!
//! Readings are synthetic but deterministic, so tests can assert exact
//! values:
//!
//! - sensor `h` at timestep `t` reads `(h + 1) * 100 + t`
//! - meter `h` at timestep `t` reads `(h - 999) * 1000 + t * 10` (handles
//!   for meters start at 1000)
//! - an actuator reads back whatever was last written to it (0.0 initially)
//!
//! The mock also reproduces an anomaly observed in the real engine: the day
//! counter sits on a design day (day 202) for the whole warm-up period, then
//! restarts at day 1 when the run period begins.  The contract tests in this
//! crate pin that behavior down; the state machine does not compensate for
//! it.

use std::collections::{HashMap, HashSet};
use std::path::Path;

use crate::binding::{
    Engine, EngineContext, EngineExchange, ExchangePoint, RawHandle, RunArgs, TimestepHook,
    WarmupHook,
};

/// The simulated day the engine reports while warming up.
pub const WARMUP_DAY: u32 = 202;

const SENSOR_HANDLE_BASE:   i32 = 0;
const METER_HANDLE_BASE:    i32 = 1000;
const ACTUATOR_HANDLE_BASE: i32 = 2000;

// ── Configuration ─────────────────────────────────────────────────────────────

/// Script for one mock engine.  Fluent setters mirror the builder style used
/// across the workspace.
#[derive(Clone, Debug)]
pub struct MockConfig {
    /// Resolvable sensor `(name, key)` pairs.
    pub sensors: Vec<(String, String)>,
    /// Resolvable meter names.
    pub meters: Vec<String>,
    /// Resolvable actuator `(component_type, control_type, key)` triples.
    pub actuators: Vec<(String, String, String)>,
    /// Warm-up phases the engine completes before the run period.
    pub warmup_phases: u32,
    /// Run-period timesteps before the engine exits on its own.
    pub run_timesteps: u64,
    /// Exit code returned when the run period completes uninterrupted.
    pub exit_code: i32,
    /// Timesteps at the very start of the run during which the exchange data
    /// is not yet populated.
    pub not_ready_steps: u64,
    /// Timesteps per simulated day; drives the day-of-year counter.
    pub steps_per_day: u64,
}

impl Default for MockConfig {
    fn default() -> Self {
        MockConfig {
            sensors:         Vec::new(),
            meters:          Vec::new(),
            actuators:       Vec::new(),
            warmup_phases:   5,
            run_timesteps:   48,
            exit_code:       0,
            not_ready_steps: 2,
            steps_per_day:   24,
        }
    }
}

impl MockConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sensor(mut self, name: &str, key: &str) -> Self {
        self.sensors.push((name.to_string(), key.to_string()));
        self
    }

    pub fn meter(mut self, name: &str) -> Self {
        self.meters.push(name.to_string());
        self
    }

    pub fn actuator(mut self, component_type: &str, control_type: &str, key: &str) -> Self {
        self.actuators
            .push((component_type.to_string(), control_type.to_string(), key.to_string()));
        self
    }

    pub fn warmup_phases(mut self, n: u32) -> Self {
        self.warmup_phases = n;
        self
    }

    pub fn run_timesteps(mut self, n: u64) -> Self {
        self.run_timesteps = n;
        self
    }

    pub fn exit_code(mut self, code: i32) -> Self {
        self.exit_code = code;
        self
    }

    pub fn steps_per_day(mut self, n: u64) -> Self {
        self.steps_per_day = n;
        self
    }
}

/// Scripted engine.  Every context it hands out replays the same script.
pub struct MockEngine {
    config: MockConfig,
}

impl MockEngine {
    pub fn new(config: MockConfig) -> Self {
        MockEngine { config }
    }
}

impl Engine for MockEngine {
    fn new_context(&self) -> Box<dyn EngineContext> {
        Box::new(MockContext::new(self.config.clone()))
    }
}

// ── Context ───────────────────────────────────────────────────────────────────

struct MockContext {
    config: MockConfig,

    timestep_hook: Option<TimestepHook>,
    warmup_hook:   Option<WarmupHook>,
    verbose:       bool,

    /// Sensors declared before the run; resolving anything else fails.
    requested_sensors: HashSet<(String, String)>,

    /// Last written value per actuator handle.
    actuator_values: HashMap<RawHandle, f64>,

    stop_requested: bool,
    data_ready:     bool,
    warmup:         bool,
    timestep:       u64,
    day:            u32,
}

impl MockContext {
    fn new(config: MockConfig) -> Self {
        MockContext {
            config,
            timestep_hook: None,
            warmup_hook: None,
            verbose: false,
            requested_sensors: HashSet::new(),
            actuator_values: HashMap::new(),
            stop_requested: false,
            data_ready: false,
            warmup: true,
            timestep: 0,
            day: WARMUP_DAY,
        }
    }

    fn fire_timestep(&mut self, hook: &mut Option<TimestepHook>) {
        if let Some(h) = hook.as_mut() {
            h(self);
        }
    }
}

impl EngineExchange for MockContext {
    fn resolve_sensor(&mut self, name: &str, key: &str) -> RawHandle {
        // Real engines only expose sensors that were requested before the run.
        if !self
            .requested_sensors
            .contains(&(name.to_string(), key.to_string()))
        {
            return RawHandle::INVALID;
        }
        match self
            .config
            .sensors
            .iter()
            .position(|(n, k)| n == name && k == key)
        {
            Some(i) => RawHandle(SENSOR_HANDLE_BASE + i as i32),
            None => RawHandle::INVALID,
        }
    }

    fn resolve_meter(&mut self, name: &str) -> RawHandle {
        match self.config.meters.iter().position(|n| n == name) {
            Some(i) => RawHandle(METER_HANDLE_BASE + i as i32),
            None => RawHandle::INVALID,
        }
    }

    fn resolve_actuator(
        &mut self,
        component_type: &str,
        control_type: &str,
        key: &str,
    ) -> RawHandle {
        match self
            .config
            .actuators
            .iter()
            .position(|(c, t, k)| c == component_type && t == control_type && k == key)
        {
            Some(i) => RawHandle(ACTUATOR_HANDLE_BASE + i as i32),
            None => RawHandle::INVALID,
        }
    }

    fn sensor_value(&self, handle: RawHandle) -> f64 {
        (handle.0 + 1) as f64 * 100.0 + self.timestep as f64
    }

    fn meter_value(&self, handle: RawHandle) -> f64 {
        (handle.0 - METER_HANDLE_BASE + 1) as f64 * 1000.0 + self.timestep as f64 * 10.0
    }

    fn actuator_value(&self, handle: RawHandle) -> f64 {
        self.actuator_values.get(&handle).copied().unwrap_or(0.0)
    }

    fn set_actuator_value(&mut self, handle: RawHandle, value: f64) {
        self.actuator_values.insert(handle, value);
    }

    fn data_ready(&self) -> bool {
        self.data_ready
    }

    fn in_warmup(&self) -> bool {
        self.warmup
    }

    fn current_time(&self) -> f64 {
        let steps = self.config.steps_per_day.max(1);
        (self.timestep % steps) as f64 * (24.0 / steps as f64)
    }

    fn day_of_year(&self) -> u32 {
        self.day
    }

    fn exchange_points(&self) -> Vec<ExchangePoint> {
        let mut out = Vec::new();
        for (name, key) in &self.config.sensors {
            out.push(ExchangePoint::Sensor { name: name.clone(), key: key.clone() });
        }
        for name in &self.config.meters {
            out.push(ExchangePoint::Meter { name: name.clone() });
        }
        for (component_type, control_type, key) in &self.config.actuators {
            out.push(ExchangePoint::Actuator {
                component_type: component_type.clone(),
                control_type:   control_type.clone(),
                key:            key.clone(),
            });
        }
        // Real engines list internals too; consumers are expected to skip them.
        out.push(ExchangePoint::Internal { name: "Site Orientation".to_string() });
        out
    }

    fn request_stop(&mut self) {
        self.stop_requested = true;
    }
}

impl EngineContext for MockContext {
    fn set_timestep_hook(&mut self, hook: TimestepHook) {
        self.timestep_hook = Some(hook);
    }

    fn set_warmup_complete_hook(&mut self, hook: WarmupHook) {
        self.warmup_hook = Some(hook);
    }

    fn set_console_output(&mut self, verbose: bool) {
        self.verbose = verbose;
    }

    fn request_sensor(&mut self, name: &str, key: &str) {
        self.requested_sensors
            .insert((name.to_string(), key.to_string()));
    }

    fn run(&mut self, args: &RunArgs) -> i32 {
        // A building file that doesn't even have a name is the closest mock
        // analogue of an unreadable input: fail before any callback fires.
        if args.building_path == Path::new("") {
            return 1;
        }
        if self.verbose {
            tracing::debug!(building = %args.building_path.display(), "mock engine run starting");
        }

        // Hooks move into locals so they can borrow the context mutably.
        let mut timestep_hook = self.timestep_hook.take();
        let mut warmup_hook = self.warmup_hook.take();

        // Sizing steps: callbacks fire but the exchange data is not ready.
        self.data_ready = false;
        self.warmup = true;
        self.day = WARMUP_DAY;
        for _ in 0..self.config.not_ready_steps {
            self.fire_timestep(&mut timestep_hook);
            if self.stop_requested {
                return 0;
            }
        }
        self.data_ready = true;

        // Warm-up phases: a few flagged timesteps each, then the completion
        // callback.  The day counter stays parked on the design day.
        for _ in 0..self.config.warmup_phases {
            self.warmup = true;
            for _ in 0..3 {
                self.fire_timestep(&mut timestep_hook);
                if self.stop_requested {
                    return 0;
                }
            }
            self.warmup = false;
            if let Some(h) = warmup_hook.as_mut() {
                h();
            }
        }

        // Run period: the day counter restarts at 1.
        self.warmup = false;
        for t in 0..self.config.run_timesteps {
            self.timestep = t;
            self.day = 1 + (t / self.config.steps_per_day.max(1)) as u32;
            self.fire_timestep(&mut timestep_hook);
            if self.stop_requested {
                // Cooperative stop is a normal exit.
                return 0;
            }
        }
        self.config.exit_code
    }
}
