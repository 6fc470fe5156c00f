use std::io;

use lockstep_template::Path;
use thiserror::Error;

use crate::hole::ActuatorSpec;

#[derive(Debug, Error)]
pub enum SimError {
    /// The engine rejected a sensor name during handle construction.
    #[error("unknown sensor \"{name}\" for key \"{key}\"")]
    InvalidSensor { name: String, key: String },

    /// The engine rejected a meter name during handle construction.
    #[error("unknown meter \"{name}\"")]
    InvalidMeter { name: String },

    /// The engine rejected an actuation point during handle construction.
    #[error("unknown actuator {0}")]
    InvalidActuator(ActuatorSpec),

    /// An operation was called in a lifecycle state that does not allow it.
    #[error("simulation is {got}, but this call requires {wanted}")]
    InvalidState {
        wanted: &'static str,
        got:    &'static str,
    },

    /// The engine terminated with a nonzero exit code.
    #[error("engine crashed: {0}")]
    Crashed(String),

    /// An action leaf addressed a path with no actuator handle behind it.
    #[error("no actuator at action path {path}")]
    UnknownActuatorPath { path: Path },

    #[error("i/o error: {0}")]
    Io(#[from] io::Error),
}

impl Clone for SimError {
    fn clone(&self) -> Self {
        match self {
            SimError::InvalidSensor { name, key } => SimError::InvalidSensor {
                name: name.clone(),
                key:  key.clone(),
            },
            SimError::InvalidMeter { name } => SimError::InvalidMeter { name: name.clone() },
            SimError::InvalidActuator(spec) => SimError::InvalidActuator(spec.clone()),
            SimError::InvalidState { wanted, got } => SimError::InvalidState { wanted, got },
            SimError::Crashed(msg) => SimError::Crashed(msg.clone()),
            SimError::UnknownActuatorPath { path } => {
                SimError::UnknownActuatorPath { path: path.clone() }
            }
            // io::Error is not Clone; keep the kind and message.
            SimError::Io(e) => SimError::Io(io::Error::new(e.kind(), e.to_string())),
        }
    }
}

pub type SimResult<T> = Result<T, SimError>;
