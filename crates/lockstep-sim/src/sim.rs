//! The synchronous lifecycle adapter.
//!
//! `Simulation` turns an engine that wants to own the control flow — it
//! calls *you*, once per timestep, on its own thread — into a plain
//! request-response object: `start()` to the first observation, `step(action)`
//! for each exchange, `stop()` to end the run.
//!
//! # How the inversion works
//!
//! `start` spawns one engine-driving thread and parks the engine's timestep
//! callback on a rendezvous channel.  Each caller operation performs a fixed
//! message choreography on that channel, so exactly one of the two threads is
//! ever making progress; the other is parked mid-handoff.  There is no
//! polling and no buffering — an observation is handed over at the moment
//! the caller asks for it, and the engine does not advance until the caller
//! has answered with an action.
//!
//! Per exchange cycle the engine-driving thread publishes
//! `GotObservation(obs)`, then `WantAction(reply)` and blocks on the reply
//! channel.  `step` consumes the pending `WantAction`, answers
//! `RunAction(action)`, and takes the next cycle's `GotObservation` as its
//! return value.  Termination and crashes arrive in-band as `ShutDownAck` /
//! `Crashed` payloads on whichever `get` the caller is parked in.

use std::sync::{Arc, Mutex, MutexGuard};
use std::thread::{self, JoinHandle};

use lockstep_channel::Channel;
use lockstep_engine::{Engine, EngineExchange, RawHandle};
use lockstep_template::Template;

use crate::config::SimConfig;
use crate::error::{SimError, SimResult};
use crate::handles::{
    apply_action, construct_actuator_handles, construct_handles, endpoint_holes,
    read_observation,
};
use crate::hole::{ActuatorSpec, Handle, Hole};
use crate::message::{EngineMessage, Reply};
use crate::state::SimState;
use crate::{Action, Observation};

/// A synchronous `start`/`step`/`stop` view of one engine run.
///
/// One instance is one run: after the run ends — normally, by `stop`, by the
/// step budget, or by a crash — the instance is spent and a fresh one is
/// required.  No operation is ever retried internally.
pub struct Simulation<E: Engine> {
    engine: Arc<E>,
    config: SimConfig,

    observation_template: Template<Hole>,
    actuator_template:    Template<ActuatorSpec>,

    shared:  Arc<Mutex<SimState>>,
    channel: Channel<EngineMessage>,
    driver:  Option<JoinHandle<()>>,

    /// The most recent observation, replayed when the run terminates.
    last_observation: Observation,
}

impl<E: Engine> Simulation<E> {
    /// Describe a simulation without touching the engine.
    ///
    /// The observation template says what each observation looks like and
    /// which exchange point fills each leaf; the actuator template gives the
    /// shape actions are addressed against.
    pub fn new(
        engine: E,
        config: SimConfig,
        observation_template: Template<Hole>,
        actuator_template: Template<ActuatorSpec>,
    ) -> Self {
        Simulation {
            engine: Arc::new(engine),
            config,
            observation_template,
            actuator_template,
            shared: Arc::new(Mutex::new(SimState::Init)),
            channel: Channel::new(),
            driver: None,
            last_observation: Template::empty(),
        }
    }

    // ── Public operations ─────────────────────────────────────────────────

    /// Run the engine up to the first post-warm-up observation.
    ///
    /// Valid only once, from `Init`.  Blocks through engine startup and
    /// warm-up.  Returns `(first_observation, false)` normally, or
    /// `(empty, true)` if the engine terminated before producing any
    /// observation.  A startup crash or a bad template leaf is returned as
    /// the error the engine-driving thread reported.
    pub fn start(&mut self) -> SimResult<(Observation, bool)> {
        {
            let mut state = self.state();
            if !matches!(*state, SimState::Init) {
                return Err(SimError::InvalidState {
                    wanted: "Init",
                    got:    state.name(),
                });
            }
            *state = SimState::Starting { warmup_phases_done: 0 };
        }

        let worker = DriverThread {
            engine:               Arc::clone(&self.engine),
            config:               self.config.clone(),
            observation_template: self.observation_template.clone(),
            actuator_template:    self.actuator_template.clone(),
            shared:               Arc::clone(&self.shared),
            channel:              self.channel.clone(),
        };
        let spawned = thread::Builder::new()
            .name("engine-driver".to_string())
            .spawn(move || worker.run());
        match spawned {
            Ok(handle) => self.driver = Some(handle),
            Err(e) => {
                *self.state() = SimState::Init;
                return Err(SimError::Io(e));
            }
        }
        tracing::debug!(building = %self.config.building_path.display(), "engine thread spawned");

        match self.channel.get() {
            EngineMessage::GotObservation(obs) => {
                self.last_observation = obs.clone();
                Ok((obs, false))
            }
            EngineMessage::ShutDownAck => {
                // The engine ran to completion without a single exchange
                // timestep (e.g. a design-day-only run).
                self.finish(SimState::Done);
                Ok((Template::empty(), true))
            }
            EngineMessage::Crashed(e) => {
                self.finish(SimState::Crashed);
                Err(e)
            }
            EngineMessage::WantAction(_) => {
                unreachable!("engine asked for an action before its first observation")
            }
        }
    }

    /// Exchange one action for the next observation.
    ///
    /// Valid only from `Started`.  Returns `(observation, false)` while the
    /// run continues, or `(last_observation, true)` when it has ended —
    /// normally, or because the step budget ran out.
    ///
    /// `action` may be any sub-shape of the actuator template; each leaf is
    /// written to the actuator at the same path.  A leaf whose path matches
    /// no actuator crashes the run.
    pub fn step(&mut self, action: Action) -> SimResult<(Observation, bool)> {
        self.require_started()?;

        match self.channel.get() {
            EngineMessage::WantAction(reply) => reply.put(Reply::RunAction(action)),
            EngineMessage::ShutDownAck => {
                self.finish(SimState::Done);
                return Ok((self.last_observation.clone(), true));
            }
            EngineMessage::Crashed(e) => {
                self.finish(SimState::Crashed);
                return Err(e);
            }
            EngineMessage::GotObservation(_) => {
                unreachable!("engine published an observation nobody asked for")
            }
        }

        match self.channel.get() {
            EngineMessage::GotObservation(obs) => {
                self.last_observation = obs.clone();
                Ok((obs, false))
            }
            EngineMessage::ShutDownAck => {
                self.finish(SimState::Done);
                Ok((self.last_observation.clone(), true))
            }
            EngineMessage::Crashed(e) => {
                self.finish(SimState::Crashed);
                Err(e)
            }
            EngineMessage::WantAction(_) => {
                unreachable!("engine asked for a second action in one cycle")
            }
        }
    }

    /// End the run cooperatively.
    ///
    /// Valid only from `Started`.  Blocks until the engine has acknowledged
    /// the shutdown and the engine-driving thread has been joined; the
    /// thread is guaranteed not alive afterwards.
    pub fn stop(&mut self) -> SimResult<()> {
        self.require_started()?;

        match self.channel.get() {
            EngineMessage::WantAction(reply) => reply.put(Reply::ShutDown),
            EngineMessage::ShutDownAck => {
                // The engine beat us to it; nothing left to stop.
                self.finish(SimState::Done);
                return Ok(());
            }
            EngineMessage::Crashed(e) => {
                self.finish(SimState::Crashed);
                return Err(e);
            }
            EngineMessage::GotObservation(_) => {
                unreachable!("engine published an observation nobody asked for")
            }
        }

        match self.channel.get() {
            EngineMessage::ShutDownAck => {
                self.finish(SimState::Done);
                tracing::debug!("engine shut down cleanly");
                Ok(())
            }
            EngineMessage::Crashed(e) => {
                self.finish(SimState::Crashed);
                Err(e)
            }
            EngineMessage::GotObservation(_) | EngineMessage::WantAction(_) => {
                unreachable!("engine kept exchanging after a shutdown reply")
            }
        }
    }

    /// Stop if the simulation is running; do nothing if it never started or
    /// has already ended.
    pub fn try_stop(&mut self) -> SimResult<()> {
        {
            let state = self.state();
            match &*state {
                SimState::Init | SimState::Done | SimState::Crashed => return Ok(()),
                SimState::Starting { .. } => {
                    return Err(SimError::InvalidState {
                        wanted: "Started, Init, Done or Crashed",
                        got:    "Starting",
                    });
                }
                SimState::Started { .. } => {}
            }
        }
        self.stop()
    }

    /// Every sensor, meter and actuator the running engine exposes, as
    /// template-ready holes.  Valid only from `Started`; the snapshot was
    /// taken when handles were constructed.
    pub fn api_endpoints(&self) -> SimResult<Vec<Hole>> {
        let state = self.state();
        match &*state {
            SimState::Started { endpoints } => Ok(endpoints.clone()),
            other => Err(SimError::InvalidState {
                wanted: "Started",
                got:    other.name(),
            }),
        }
    }

    // ── Internals ─────────────────────────────────────────────────────────

    fn state(&self) -> MutexGuard<'_, SimState> {
        self.shared.lock().expect("simulation state lock poisoned")
    }

    fn require_started(&self) -> SimResult<()> {
        let state = self.state();
        match &*state {
            SimState::Started { .. } => Ok(()),
            other => Err(SimError::InvalidState {
                wanted: "Started",
                got:    other.name(),
            }),
        }
    }

    /// Record a terminal transition and reap the engine-driving thread.
    /// The thread has already sent its last message, so the join is short.
    fn finish(&mut self, terminal: SimState) {
        *self.state() = terminal;
        if let Some(handle) = self.driver.take() {
            if handle.join().is_err() {
                tracing::error!("engine thread panicked during shutdown");
            }
        }
    }
}

impl<E: Engine> Drop for Simulation<E> {
    /// Best-effort cleanup so an abandoned running simulation does not leak
    /// the engine-driving thread.
    fn drop(&mut self) {
        if let Err(e) = self.try_stop() {
            tracing::error!(error = %e, "simulation dropped while stopping");
        }
    }
}

// ── Engine-driving thread ─────────────────────────────────────────────────────

/// Everything the engine-driving thread owns for one run.
struct DriverThread<E: Engine> {
    engine:               Arc<E>,
    config:               SimConfig,
    observation_template: Template<Hole>,
    actuator_template:    Template<ActuatorSpec>,
    shared:               Arc<Mutex<SimState>>,
    channel:              Channel<EngineMessage>,
}

impl<E: Engine> DriverThread<E> {
    fn run(self) {
        let mut ctx = self.engine.new_context();
        ctx.set_console_output(self.config.verbose);

        // Sensor reads must be declared before the run.
        self.observation_template.for_each(&mut |_, hole| {
            if let Hole::Sensor { name, key } = hole {
                ctx.request_sensor(name, key);
            }
        });

        {
            let shared = Arc::clone(&self.shared);
            ctx.set_warmup_complete_hook(Box::new(move || {
                let mut state = shared.lock().expect("simulation state lock poisoned");
                if let SimState::Starting { warmup_phases_done } = &mut *state {
                    *warmup_phases_done += 1;
                    tracing::debug!(phases = *warmup_phases_done, "warm-up phase complete");
                }
            }));
        }

        let mut exchange = ExchangeLoop {
            observation_template: self.observation_template.clone(),
            actuator_template:    self.actuator_template.clone(),
            shared:               Arc::clone(&self.shared),
            channel:              self.channel.clone(),
            warmup_phases:        self.config.warmup_phases,
            max_steps:            self.config.max_steps,
            handles:              None,
            steps_done:           0,
            crashed:              false,
        };
        ctx.set_timestep_hook(Box::new(move |ex| exchange.on_timestep(ex)));

        let code = ctx.run(&self.config.run_args());
        // Release the engine before reporting, on every exit path.
        drop(ctx);

        if let Some(msg) = self.exit_message(code) {
            self.channel.put(msg);
        }
        // Last act: any later channel use is a bug and should fail loudly.
        self.channel.close();
    }

    /// What to tell the caller about the engine's exit, given how far the
    /// run got.  `None` when the timestep hook already reported a crash.
    fn exit_message(&self, code: i32) -> Option<EngineMessage> {
        let state = self.shared.lock().expect("simulation state lock poisoned");
        match &*state {
            SimState::Crashed => None,
            SimState::Starting { .. } if code == 0 => Some(EngineMessage::ShutDownAck),
            SimState::Starting { .. } => Some(EngineMessage::Crashed(SimError::Crashed(format!(
                "engine exited with code {code} before producing an observation"
            )))),
            SimState::Started { .. } if code == 0 => Some(EngineMessage::ShutDownAck),
            SimState::Started { .. } => Some(EngineMessage::Crashed(SimError::Crashed(format!(
                "engine exited with code {code}"
            )))),
            SimState::Init | SimState::Done => {
                unreachable!("engine exited from the {} state", state.name())
            }
        }
    }
}

/// Resolved handles for one run.  Engine-side only; they expire with it.
struct RunHandles {
    observation: Template<Handle>,
    actuators:   Template<(ActuatorSpec, RawHandle)>,
}

/// The timestep callback's state.  Lives inside the hook closure on the
/// engine-driving thread; nothing here is visible to the caller.
struct ExchangeLoop {
    observation_template: Template<Hole>,
    actuator_template:    Template<ActuatorSpec>,
    shared:               Arc<Mutex<SimState>>,
    channel:              Channel<EngineMessage>,
    warmup_phases:        u32,
    max_steps:            u64,
    handles:              Option<RunHandles>,
    /// Completed action cycles.
    steps_done: u64,
    /// A crash has been reported; ignore any further callbacks while the
    /// stop request makes its way through the engine.
    crashed: bool,
}

impl ExchangeLoop {
    fn on_timestep(&mut self, ex: &mut dyn EngineExchange) {
        if self.crashed || !ex.data_ready() || ex.in_warmup() {
            return;
        }

        if self.handles.is_none() {
            // Hold out until the configured number of warm-up phases is in.
            {
                let state = self.shared.lock().expect("simulation state lock poisoned");
                if let SimState::Starting { warmup_phases_done } = &*state {
                    if *warmup_phases_done < self.warmup_phases {
                        return;
                    }
                }
            }
            if !self.construct(ex) {
                return;
            }
        }

        // One action cycle per remaining budget; the observation after the
        // last allowed action is never delivered.
        if self.steps_done >= self.max_steps {
            ex.request_stop();
            return;
        }

        let handles = self.handles.as_ref().expect("handles exist past construction");
        let observation = read_observation(ex, &handles.observation);
        self.channel.put(EngineMessage::GotObservation(observation));

        let reply = Channel::new();
        self.channel.put(EngineMessage::WantAction(reply.clone()));
        match reply.get() {
            Reply::RunAction(action) => {
                match apply_action(ex, &handles.actuators, &action) {
                    Ok(()) => self.steps_done += 1,
                    Err(e) => self.crash(ex, e),
                }
            }
            Reply::ShutDown => ex.request_stop(),
        }
    }

    /// First good timestep: resolve both templates, snapshot the endpoints,
    /// and go to `Started`.  Returns false after reporting a failure.
    fn construct(&mut self, ex: &mut dyn EngineExchange) -> bool {
        let observation = match construct_handles(ex, &self.observation_template) {
            Ok(t) => t,
            Err(e) => {
                self.crash(ex, e);
                return false;
            }
        };
        let actuators = match construct_actuator_handles(ex, &self.actuator_template) {
            Ok(t) => t,
            Err(e) => {
                self.crash(ex, e);
                return false;
            }
        };
        let endpoints = endpoint_holes(ex);

        self.handles = Some(RunHandles { observation, actuators });
        *self.shared.lock().expect("simulation state lock poisoned") =
            SimState::Started { endpoints };
        true
    }

    /// Report an engine-side failure: stop the engine, mark the state, and
    /// hand the error to whichever call the caller is parked in.
    fn crash(&mut self, ex: &mut dyn EngineExchange, error: SimError) {
        tracing::error!(error = %error, "simulation crashed");
        ex.request_stop();
        self.crashed = true;
        *self.shared.lock().expect("simulation state lock poisoned") = SimState::Crashed;
        self.channel.put(EngineMessage::Crashed(error));
    }
}
