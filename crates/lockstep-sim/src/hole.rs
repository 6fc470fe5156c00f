//! Symbolic exchange points and their resolved counterparts.
//!
//! A [`Hole`] names something the engine can exchange — a sensor reading, a
//! cumulative meter, an actuation point, or a function of the live exchange
//! surface.  Holes are pure configuration: they carry no resolved identity
//! and are valid to build before any engine exists.  During the first good
//! timestep every hole is resolved into a [`Handle`], which is only valid
//! for that one engine run.

use std::fmt;
use std::sync::Arc;

use lockstep_engine::{EngineExchange, RawHandle};

/// A function-of-the-exchange leaf: invoked fresh each timestep with the live
/// exchange surface, bypassing numeric handle resolution entirely.
pub type ComputedFn = Arc<dyn Fn(&mut dyn EngineExchange) -> f64 + Send + Sync>;

/// The three names an actuation point is addressed by.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ActuatorSpec {
    pub component_type: String,
    pub control_type:   String,
    pub key:            String,
}

impl ActuatorSpec {
    pub fn new(component_type: &str, control_type: &str, key: &str) -> Self {
        ActuatorSpec {
            component_type: component_type.to_string(),
            control_type:   control_type.to_string(),
            key:            key.to_string(),
        }
    }
}

impl fmt::Display for ActuatorSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "\"{}\"/\"{}\" for key \"{}\"",
            self.component_type, self.control_type, self.key
        )
    }
}

/// One unresolved exchange point in an observation template.
#[derive(Clone)]
pub enum Hole {
    /// A per-timestep engine output, addressed by variable name and key.
    Sensor { name: String, key: String },
    /// A cumulative meter, addressed by name.
    Meter { name: String },
    /// An actuation point; observing one reads back its last written value.
    Actuator(ActuatorSpec),
    /// A caller-supplied function of the live exchange surface.
    Computed(ComputedFn),
}

impl Hole {
    pub fn sensor(name: &str, key: &str) -> Self {
        Hole::Sensor {
            name: name.to_string(),
            key:  key.to_string(),
        }
    }

    pub fn meter(name: &str) -> Self {
        Hole::Meter { name: name.to_string() }
    }

    pub fn actuator(component_type: &str, control_type: &str, key: &str) -> Self {
        Hole::Actuator(ActuatorSpec::new(component_type, control_type, key))
    }

    pub fn computed(f: impl Fn(&mut dyn EngineExchange) -> f64 + Send + Sync + 'static) -> Self {
        Hole::Computed(Arc::new(f))
    }
}

impl fmt::Debug for Hole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Hole::Sensor { name, key } => {
                f.debug_struct("Sensor").field("name", name).field("key", key).finish()
            }
            Hole::Meter { name } => f.debug_struct("Meter").field("name", name).finish(),
            Hole::Actuator(spec) => f.debug_tuple("Actuator").field(spec).finish(),
            Hole::Computed(_) => f.write_str("Computed(..)"),
        }
    }
}

/// One resolved exchange point, produced from a [`Hole`] during the first
/// good timestep.  Numeric handles are engine-assigned and expire with the
/// run; computed leaves stay as functions.
#[derive(Clone)]
pub enum Handle {
    Sensor(RawHandle),
    Meter(RawHandle),
    Actuator(RawHandle),
    Computed(ComputedFn),
}

impl fmt::Debug for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Handle::Sensor(h) => write!(f, "Sensor({h})"),
            Handle::Meter(h) => write!(f, "Meter({h})"),
            Handle::Actuator(h) => write!(f, "Actuator({h})"),
            Handle::Computed(_) => f.write_str("Computed(..)"),
        }
    }
}
