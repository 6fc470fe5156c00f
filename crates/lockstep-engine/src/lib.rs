//! `lockstep-engine` — the boundary between lockstep and a simulation engine.
//!
//! The engine is an external collaborator: a callback-driven, single-threaded
//! simulator that owns the only thread allowed to call into it.  This crate
//! pins down the contract the rest of the workspace depends on — context
//! lifecycle, callback registration, the blocking run entry point, and the
//! exchange surface visible inside callbacks — as traits, so the state
//! machine takes an explicit [`Engine`] value instead of reaching for a
//! process-wide singleton.
//!
//! The [`mock`] module ships a deterministic scripted engine.  It is a public
//! module (not test-only) for the same reason the pack's behavior crates ship
//! no-op implementations: downstream crates test against it.
//!
//! | Module      | Contents                                            |
//! |-------------|-----------------------------------------------------|
//! | [`binding`] | `Engine`, `EngineContext`, `EngineExchange`, `RawHandle`, `RunArgs` |
//! | [`mock`]    | `MockEngine` / `MockConfig` — scripted test double  |

pub mod binding;
pub mod mock;


pub use binding::{
    Engine, EngineContext, EngineExchange, ExchangePoint, RawHandle, RunArgs, TimestepHook,
    WarmupHook,
};
pub use mock::{MockConfig, MockEngine};
