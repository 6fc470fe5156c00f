//! Engine binding traits.
//!
//! # Threading contract
//!
//! A context is created on the engine-driving thread, configured there
//! (hooks, console output, sensor requests), then consumed by the blocking
//! [`EngineContext::run`] call.  The engine invokes both hooks synchronously
//! on that same thread — there is never a third thread.  Hooks must return
//! promptly; the engine decides on its own when the run finishes.
//!
//! # Context lifecycle
//!
//! Dropping the boxed context releases the underlying engine state.  Because
//! the context lives on the engine-driving thread's stack, the release runs
//! on every exit path of that thread — normal return, error, or unwinding.

use std::fmt;
use std::path::PathBuf;

/// Opaque engine-assigned identity for a sensor, meter or actuator.
///
/// Handles are valid only for the lifetime of one engine run.  The engine
/// signals an unknown name by returning a negative value.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct RawHandle(pub i32);

impl RawHandle {
    pub const INVALID: RawHandle = RawHandle(-1);

    /// Negative handles mean the engine does not know the name.
    #[inline]
    pub fn is_valid(self) -> bool {
        self.0 >= 0
    }
}

impl fmt::Display for RawHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Arguments for one blocking engine run.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RunArgs {
    /// The building description file driving the run.
    pub building_path: PathBuf,
    /// The weather file driving the run.
    pub weather_path: PathBuf,
    /// Directory in which the engine writes its own log files.
    pub log_dir: PathBuf,
}

/// One sensor/meter/actuator the running engine exposes for exchange.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ExchangePoint {
    Sensor {
        name: String,
        key:  String,
    },
    Meter {
        name: String,
    },
    Actuator {
        component_type: String,
        control_type:   String,
        key:            String,
    },
    /// Internal engine variable — listed for completeness, not exchangeable.
    Internal {
        name: String,
    },
}

/// Timestep callback: invoked by the engine once per system timestep, on the
/// engine-driving thread, with the live exchange surface.
pub type TimestepHook = Box<dyn FnMut(&mut dyn EngineExchange) + Send>;

/// Warm-up callback: invoked by the engine after each warm-up phase completes.
pub type WarmupHook = Box<dyn FnMut() + Send>;

/// The exchange surface visible inside engine callbacks.
///
/// Resolution turns a human-readable name into a [`RawHandle`]; reads and
/// writes then go through the handle.  Resolution requires a running engine,
/// which is why it can only happen inside a callback.
pub trait EngineExchange {
    // ── Handle resolution ─────────────────────────────────────────────────

    /// Resolve a sensor `(name, key)` pair.  The sensor must have been
    /// requested via [`EngineContext::request_sensor`] before the run.
    fn resolve_sensor(&mut self, name: &str, key: &str) -> RawHandle;

    /// Resolve a cumulative meter by name.
    fn resolve_meter(&mut self, name: &str) -> RawHandle;

    /// Resolve an actuation point by component type, control type and key.
    fn resolve_actuator(&mut self, component_type: &str, control_type: &str, key: &str)
    -> RawHandle;

    // ── Reads and writes ──────────────────────────────────────────────────

    fn sensor_value(&self, handle: RawHandle) -> f64;
    fn meter_value(&self, handle: RawHandle) -> f64;
    fn actuator_value(&self, handle: RawHandle) -> f64;
    fn set_actuator_value(&mut self, handle: RawHandle, value: f64);

    // ── Run-phase flags ───────────────────────────────────────────────────

    /// Whether the exchange data is populated yet.  False early in a run.
    fn data_ready(&self) -> bool;

    /// Whether the engine is currently inside a warm-up period.
    fn in_warmup(&self) -> bool;

    // ── Simulation clock ──────────────────────────────────────────────────

    /// Current simulated hour of day, fractional.
    fn current_time(&self) -> f64;

    /// Current simulated day of year, 1-based.
    fn day_of_year(&self) -> u32;

    // ── Introspection and control ─────────────────────────────────────────

    /// Every exchange point the running engine exposes.
    fn exchange_points(&self) -> Vec<ExchangePoint>;

    /// Ask the engine to end the run cooperatively.  The engine finishes the
    /// current timestep and returns from `run`; there is no hard kill.
    fn request_stop(&mut self);
}

/// One engine run's worth of state, plus pre-run configuration.
pub trait EngineContext: EngineExchange {
    /// Install the timestep callback.  Replaces any previous hook.
    fn set_timestep_hook(&mut self, hook: TimestepHook);

    /// Install the warm-up-complete callback.  Replaces any previous hook.
    fn set_warmup_complete_hook(&mut self, hook: WarmupHook);

    /// Whether the engine may write progress chatter to the console.
    fn set_console_output(&mut self, verbose: bool);

    /// Declare interest in a sensor.  Must be called before [`run`][Self::run];
    /// resolving an unrequested sensor yields an invalid handle.
    fn request_sensor(&mut self, name: &str, key: &str);

    /// Run the simulation to completion.  Blocks until the engine terminates
    /// and returns its exit code; zero means a normal exit.
    fn run(&mut self, args: &RunArgs) -> i32;
}

/// Factory for engine contexts — the injectable seam between the state
/// machine and a concrete engine (a real FFI binding, or the scripted
/// [`MockEngine`][crate::mock::MockEngine] in tests).
pub trait Engine: Send + Sync + 'static {
    fn new_context(&self) -> Box<dyn EngineContext>;
}
