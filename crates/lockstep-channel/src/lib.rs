//! `lockstep-channel` — a strict two-party rendezvous channel.
//!
//! The simulation engine runs on its own thread and can only be advanced by
//! letting it call back into us; the caller thread wants an ordinary
//! request-response API.  The two sides exchange messages through a
//! [`Channel`], which is a rendezvous point rather than a buffer: a `put`
//! returns only once a `get` on the other thread has taken the value.
//!
//! Because every handoff is a rendezvous, the two threads run in lock-step —
//! whenever one side is computing, the other is provably blocked inside the
//! channel.  That alternation is the only synchronization the rest of the
//! workspace relies on.
//!
//! # Contract
//!
//! Channels are for exactly two logical parties.  `close` is one-shot, and
//! using a channel after `close` is a programming error that panics; shutdown
//! is coordinated by protocol messages, never by racing `close` against an
//! in-flight operation.

pub mod channel;

#[cfg(test)]
mod tests;

pub use channel::Channel;
