//! Event surface between the barrier layer and the host: approach signals
//! in, effects and rejections out.

use bevy::prelude::*;

use crate::error::DoorActionError;
use utils::sim_id::SimId;

/// Host-originated: an occupant is stepping up to a door's footprint.
#[derive(Event, Clone, Copy, Debug)]
pub struct ApproachEvent {
    pub occupant: Entity,
    pub door: Entity,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DoorEffectKind {
    Opened,
    Closed,
}

/// Rendering/audio collaborators subscribe to these; the stable id rides
/// along for log correlation.
#[derive(Event, Clone, Debug)]
pub struct DoorEffectEvent {
    pub door: Entity,
    pub door_id: SimId,
    pub kind: DoorEffectKind,
}

/// Climate collaborator hook, fired on the equalization cadence. The
/// exchange math happens host-side.
#[derive(Event, Clone, Copy, Debug)]
pub struct EnvironmentMixEvent {
    pub door: Entity,
    pub open: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DoorCommandAction {
    ToggleHoldOpen,
    /// Remote variant only.
    SetSecured(bool),
    /// Diagnostics override: open regardless of timers.
    DebugForceOpen,
    /// Diagnostics override: close regardless of occupants and grace.
    DebugForceClose,
}

/// Operator command surface.
#[derive(Event, Clone, Copy, Debug)]
pub struct DoorCommand {
    pub door: Entity,
    pub action: DoorCommandAction,
}

/// Parameterless push signal from a control entity; identifies only the
/// sender.
#[derive(Event, Clone, Copy, Debug)]
pub struct ButtonPushEvent {
    pub button: Entity,
}

/// User-facing rejection of a command, for the host's message surface.
#[derive(Event, Clone, Copy, Debug)]
pub struct CommandRejected {
    pub door: Entity,
    pub error: DoorActionError,
}
