//! spangate: a multi-cell barrier layer for grid-based simulation hosts.
//!
//! A logical door spans several cells of a host grid whose passability
//! registry only understands one edifice per cell. This workspace splits
//! the problem the usual way: `map` carries the host-facing spatial state
//! (registries, reachability regions), `door` carries the barrier state
//! machine, proxies, remote locks and persistence, and `utils` carries the
//! tick counter, stable ids and logging bootstrap shared by both.

use bevy::prelude::*;

pub use door::{
    despawn_logical_door, spawn_logical_door, spawn_remote_button, DoorSimPlugin, DoorSpawnConfig,
};

/// Everything a host needs to embed the barrier layer.
pub mod prelude {
    pub use door::{
        capture_save, connect_button, despawn_logical_door, disconnect_button, restore_save,
        spawn_logical_door, spawn_remote_button, ApproachEvent, ButtonPushEvent, CellPosition,
        CommandRejected, DoorActionError, DoorCommand, DoorCommandAction, DoorEffectEvent,
        DoorEffectKind, DoorFaction, DoorKind, DoorProxies, DoorSimPlugin, DoorSimSet,
        DoorSpawnConfig, DoorState, DoorTiming, DoorTuning, DoorView, EnvironmentMixEvent,
        FactionRelations, LockState, MovePace, NeedsLockResume, Occupant, OccupancyGrid, Powered,
        ProxyBarrier, ProxyState, RemoteButton, RemoteLock, SaveEnvelope,
    };
    pub use map::edifice::{BuildingGrid, EdificeGrid};
    pub use map::grid::{CellRect, GridPos};
    pub use map::reachability::ReachabilityCache;
    pub use map::GridWorldPlugin;
    pub use utils::frame::FrameCount;
    pub use utils::sim_id::{SimId, SimIdFactory};

    pub use crate::SpanGatePlugin;
}

/// The whole subsystem in one plugin: spatial registries, the barrier
/// layer, and a frame counter advanced ahead of it. Hosts that run their
/// own tick counter add [`door::DoorSimPlugin`] directly instead.
pub struct SpanGatePlugin;

impl Plugin for SpanGatePlugin {
    fn build(&self, app: &mut App) {
        app.add_plugins((map::GridWorldPlugin, door::DoorSimPlugin));
        app.add_systems(
            Update,
            utils::frame::advance_frame_system.before(door::DoorSimSet::Occupancy),
        );
    }
}
