//! `lockstep-sim` — a synchronous lifecycle over a callback-driven engine.
//!
//! The engine underneath inverts control: it owns the run loop and calls
//! into registered hooks once per timestep, on a thread of its own.  This
//! crate turns that inside out.  [`Simulation`] runs the engine on a
//! dedicated thread and exchanges observations for actions with it over a
//! rendezvous channel, so the caller sees three ordinary blocking calls:
//!
//! ```rust,ignore
//! let mut sim = Simulation::new(engine, config, observations, actuators);
//! let (obs, _) = sim.start()?;
//! loop {
//!     let (obs, finished) = sim.step(action_for(&obs))?;
//!     if finished {
//!         break;
//!     }
//! }
//! ```
//!
//! Observations and actions are [`Template`]s — arbitrary nestings of maps,
//! lists and tuples — whose shape the caller picks once up front.  The
//! observation template's leaves are [`Hole`]s naming engine exchange
//! points; every observation comes back in the same shape with the holes
//! replaced by readings.  Actions are addressed against the actuator
//! template the same way, and may cover any subset of it.
//!
//! | Module      | Contents                                              |
//! |-------------|-------------------------------------------------------|
//! | [`sim`]     | `Simulation` — start/step/stop state machine          |
//! | [`hole`]    | `Hole`, `Handle`, `ActuatorSpec`, `ComputedFn`        |
//! | [`config`]  | `SimConfig`                                           |
//! | [`error`]   | `SimError`, `SimResult`                               |
//! | `handles`   | resolution passes and per-timestep exchange (private) |
//! | `message`   | channel protocol payloads (private)                   |
//! | `state`     | lifecycle states (private)                            |

pub mod config;
pub mod error;
pub mod hole;
pub mod sim;

mod handles;
mod message;
mod state;


pub use config::SimConfig;
pub use error::{SimError, SimResult};
pub use hole::{ActuatorSpec, ComputedFn, Handle, Hole};
pub use sim::Simulation;

pub use lockstep_template::{Path, Step, Template};

/// One timestep's readings, in the shape of the observation template.
pub type Observation = Template<f64>;

/// Actuator writes for one timestep, addressed against the actuator template.
pub type Action = Template<f64>;
