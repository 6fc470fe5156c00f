//! The lifecycle state machine.

use crate::hole::Hole;

/// Where a simulation is in its life.
///
/// Owned by a mutex shared between the caller thread and the engine-driving
/// thread.  The rendezvous handoff already guarantees the two threads never
/// make progress concurrently; the mutex exists to satisfy the compiler and
/// is never held across a channel operation.
///
/// Write discipline: the engine-driving thread performs the forward
/// transitions it alone can observe (warm-up progress, handle resolution,
/// hook-side crashes); the caller performs the terminal transitions when it
/// consumes a `ShutDownAck` or `Crashed` message.  A terminal message is
/// therefore always delivered before the state that announces it becomes
/// visible to the caller's entry checks.
pub(crate) enum SimState {
    /// Constructed; no engine thread yet.
    Init,
    /// Engine thread running, warm-up not finished, no handles yet.
    Starting { warmup_phases_done: u32 },
    /// Warm-up done, handles resolved, lock-step exchange in progress.
    Started {
        /// Exchange points the engine reported at handle-construction time,
        /// internals filtered out.
        endpoints: Vec<Hole>,
    },
    /// The engine exited normally.  Terminal.
    Done,
    /// The engine crashed or handle resolution failed.  Terminal.
    Crashed,
}

impl SimState {
    /// Short name for error messages.
    pub(crate) fn name(&self) -> &'static str {
        match self {
            SimState::Init => "Init",
            SimState::Starting { .. } => "Starting",
            SimState::Started { .. } => "Started",
            SimState::Done => "Done",
            SimState::Crashed => "Crashed",
        }
    }
}
