//! The wire protocol between the caller thread and the engine-driving thread.
//!
//! Every payload is single-use and never retried.  The engine-driving thread
//! speaks first on the main channel; the caller answers on the reply channel
//! carried inside `WantAction`.

use lockstep_channel::Channel;

use crate::error::SimError;
use crate::{Action, Observation};

/// Engine-driving thread → caller.
pub(crate) enum EngineMessage {
    /// A fresh observation; step `N`'s readings, `N+1` cycles from the start.
    GotObservation(Observation),
    /// The engine is parked inside its timestep callback waiting for an
    /// action.  Answer on the carried reply channel.
    WantAction(Channel<Reply>),
    /// The run failed; the payload is re-raised on the caller thread.
    Crashed(SimError),
    /// The run ended normally; no further messages follow.
    ShutDownAck,
}

/// Caller → engine-driving thread, via the `WantAction` reply channel.
pub(crate) enum Reply {
    /// Apply these actuator values and advance one timestep.
    RunAction(Action),
    /// Stop the run cooperatively without writing anything.
    ShutDown,
}
