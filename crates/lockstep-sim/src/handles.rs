//! Handle construction and the per-timestep exchange primitives.
//!
//! Everything here runs on the engine-driving thread, inside the timestep
//! callback, with the live exchange surface in hand.  Handle resolution is
//! name-based and only possible while the engine is running, which is why it
//! happens on the first good timestep rather than at construction.

use lockstep_engine::{EngineExchange, ExchangePoint, RawHandle};
use lockstep_template::Template;

use crate::error::{SimError, SimResult};
use crate::hole::{ActuatorSpec, Handle, Hole};
use crate::{Action, Observation};

/// A leaf mid-resolution: holes become handles one kind at a time.
#[derive(Clone)]
enum Binding {
    Hole(Hole),
    Handle(Handle),
}

/// Resolve every hole in an observation template.
///
/// Four selective passes in a fixed order — sensors, meters, actuators,
/// computed — so each pass sees only its own kind and the order of engine
/// lookups is deterministic.  The first invalid handle aborts the whole
/// construction; no partially resolved template escapes.
pub(crate) fn construct_handles(
    ex: &mut dyn EngineExchange,
    template: &Template<Hole>,
) -> SimResult<Template<Handle>> {
    let mut bound = template.map(&mut |hole| Binding::Hole(hole.clone()));

    bound = bound.try_replace(
        &|b| matches!(b, Binding::Hole(Hole::Sensor { .. })),
        &mut |b| {
            let Binding::Hole(Hole::Sensor { name, key }) = b else { unreachable!() };
            let raw = ex.resolve_sensor(name, key);
            if !raw.is_valid() {
                return Err(SimError::InvalidSensor {
                    name: name.clone(),
                    key:  key.clone(),
                });
            }
            Ok::<_, SimError>(Binding::Handle(Handle::Sensor(raw)))
        },
    )?;

    bound = bound.try_replace(
        &|b| matches!(b, Binding::Hole(Hole::Meter { .. })),
        &mut |b| {
            let Binding::Hole(Hole::Meter { name }) = b else { unreachable!() };
            let raw = ex.resolve_meter(name);
            if !raw.is_valid() {
                return Err(SimError::InvalidMeter { name: name.clone() });
            }
            Ok::<_, SimError>(Binding::Handle(Handle::Meter(raw)))
        },
    )?;

    bound = bound.try_replace(
        &|b| matches!(b, Binding::Hole(Hole::Actuator(_))),
        &mut |b| {
            let Binding::Hole(Hole::Actuator(spec)) = b else { unreachable!() };
            Ok::<_, SimError>(Binding::Handle(Handle::Actuator(resolve_actuator(ex, spec)?)))
        },
    )?;

    bound = bound.try_replace(
        &|b| matches!(b, Binding::Hole(Hole::Computed(_))),
        &mut |b| {
            let Binding::Hole(Hole::Computed(f)) = b else { unreachable!() };
            Ok::<_, SimError>(Binding::Handle(Handle::Computed(f.clone())))
        },
    )?;

    tracing::debug!(leaves = template.leaf_count(), "observation handles constructed");

    // Four passes cover all four hole kinds.
    Ok(bound.map(&mut |b| match b {
        Binding::Handle(h) => h.clone(),
        Binding::Hole(_) => unreachable!("hole survived all resolution passes"),
    }))
}

/// Resolve every actuation point in the actuator template, keeping the spec
/// alongside the raw handle so action errors can name it.
pub(crate) fn construct_actuator_handles(
    ex: &mut dyn EngineExchange,
    template: &Template<ActuatorSpec>,
) -> SimResult<Template<(ActuatorSpec, RawHandle)>> {
    let resolved = template.try_map(&mut |spec| {
        Ok::<_, SimError>((spec.clone(), resolve_actuator(ex, spec)?))
    })?;
    tracing::debug!(leaves = template.leaf_count(), "actuator handles constructed");
    Ok(resolved)
}

fn resolve_actuator(ex: &mut dyn EngineExchange, spec: &ActuatorSpec) -> SimResult<RawHandle> {
    let raw = ex.resolve_actuator(&spec.component_type, &spec.control_type, &spec.key);
    if !raw.is_valid() {
        return Err(SimError::InvalidActuator(spec.clone()));
    }
    Ok(raw)
}

/// Read one value per resolved handle.  Computed leaves run against the live
/// exchange, so they see the same timestep as every numeric read.
pub(crate) fn read_observation(
    ex: &mut dyn EngineExchange,
    handles: &Template<Handle>,
) -> Observation {
    handles.map(&mut |handle| match handle {
        Handle::Sensor(h) => ex.sensor_value(*h),
        Handle::Meter(h) => ex.meter_value(*h),
        Handle::Actuator(h) => ex.actuator_value(*h),
        Handle::Computed(f) => f(&mut *ex),
    })
}

/// Write every leaf of an action to its actuator.
///
/// The action may be any sub-shape of the actuator template: each leaf is
/// paired with the handle at the same path.  A leaf whose path has no handle
/// leaf behind it fails the whole step before anything is written.
pub(crate) fn apply_action(
    ex: &mut dyn EngineExchange,
    actuators: &Template<(ActuatorSpec, RawHandle)>,
    action: &Action,
) -> SimResult<()> {
    let leaves = action.flatten();

    // Validate every path first so a bad action writes nothing at all.
    let mut writes = Vec::with_capacity(leaves.len());
    for (path, value) in leaves {
        match actuators.at(&path).and_then(Template::as_leaf) {
            Some((_, raw)) => writes.push((*raw, *value)),
            None => return Err(SimError::UnknownActuatorPath { path }),
        }
    }
    for (raw, value) in writes {
        ex.set_actuator_value(raw, value);
    }
    Ok(())
}

/// Snapshot the running engine's exchange surface as holes, dropping the
/// internal variables that cannot take part in the exchange.
pub(crate) fn endpoint_holes(ex: &dyn EngineExchange) -> Vec<Hole> {
    ex.exchange_points()
        .into_iter()
        .filter_map(|point| match point {
            ExchangePoint::Sensor { name, key } => Some(Hole::Sensor { name, key }),
            ExchangePoint::Meter { name } => Some(Hole::Meter { name }),
            ExchangePoint::Actuator { component_type, control_type, key } => {
                Some(Hole::Actuator(ActuatorSpec { component_type, control_type, key }))
            }
            ExchangePoint::Internal { .. } => None,
        })
        .collect()
}
