//! Multi-cell door layer for a one-edifice-per-cell host engine.
//!
//! # Overview
//!
//! A logical door spans several grid cells but the host's passability
//! registry only understands one edifice per cell, so every door owns one
//! invisible single-cell proxy per footprint cell and drives them all:
//! open flags, forbidden flags and countdowns flow strictly downward.
//!
//! # Door flow
//!
//! ```text
//! Closed ──RequestOpen──▶ Open ──countdown/Tick──▶ RequestClose ──▶ Closed
//!    ▲                      │ occupants, hold-open and friendly
//!    └──────────────────────┘ grace all refuse the close
//! ```
//!
//! Remote doors layer a tri-state lock (`Free` / `ForcedOpen` /
//! `ForcedClose`) on top, driven by linked control buttons.
//!
//! # Usage
//!
//! ```rust,ignore
//! app.add_plugins(DoorSimPlugin);
//! let door = spawn_logical_door(&mut commands, ..., DoorSpawnConfig::new(kind, rect));
//! ```

pub mod config;
pub mod create;
pub mod error;
pub mod events;
pub mod kind;
pub mod occupant;
pub mod persist;
pub mod proxy;
pub mod remote;
pub mod state;
pub mod system_set;
pub mod systems;

use bevy::prelude::*;

pub use config::{DoorTuning, INDEFINITE_OPEN_TICKS};
pub use create::{
    despawn_logical_door, spawn_logical_door, spawn_remote_button, DoorSpawnConfig,
};
pub use error::DoorActionError;
pub use events::{
    ApproachEvent, ButtonPushEvent, CommandRejected, DoorCommand, DoorCommandAction,
    DoorEffectEvent, DoorEffectKind, EnvironmentMixEvent,
};
pub use kind::{DoorKind, DoorTiming};
pub use occupant::{CellPosition, FactionId, FactionRelations, MovePace, Occupant, OccupancyGrid};
pub use persist::{capture_save, restore_save, NeedsLockResume, SaveEnvelope};
pub use proxy::{ProxyBarrier, ProxyState};
pub use remote::{connect_button, disconnect_button, LockState, RemoteButton, RemoteLock};
pub use state::{DoorFaction, DoorProxies, DoorState, DoorView, Powered};
pub use system_set::DoorSimSet;

/// Installs the whole barrier layer: resources, events and the ordered
/// per-tick system chain.
pub struct DoorSimPlugin;

impl Plugin for DoorSimPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<config::DoorTuning>()
            .init_resource::<occupant::OccupancyGrid>()
            .init_resource::<occupant::FactionRelations>()
            .init_resource::<utils::frame::FrameCount>()
            .init_resource::<utils::sim_id::SimIdFactory>()
            .init_resource::<map::edifice::EdificeGrid>()
            .init_resource::<map::edifice::BuildingGrid>()
            .init_resource::<map::reachability::ReachabilityCache>();

        app.add_event::<ApproachEvent>()
            .add_event::<DoorEffectEvent>()
            .add_event::<EnvironmentMixEvent>()
            .add_event::<DoorCommand>()
            .add_event::<ButtonPushEvent>()
            .add_event::<CommandRejected>();

        app.register_type::<DoorKind>().register_type::<LockState>();

        app.configure_sets(
            Update,
            (
                DoorSimSet::Occupancy,
                DoorSimSet::Approach,
                DoorSimSet::Commands,
                DoorSimSet::DoorTick,
                DoorSimSet::Reachability,
            )
                .chain(),
        );

        app.add_systems(
            Update,
            occupant::sync_occupancy_system.in_set(DoorSimSet::Occupancy),
        );
        app.add_systems(
            Update,
            (
                systems::approach_detection_system,
                systems::approach_event_system,
            )
                .chain()
                .in_set(DoorSimSet::Approach),
        );
        app.add_systems(
            Update,
            (
                remote::lock_resume_system,
                systems::door_command_system,
                remote::push_button_system,
            )
                .chain()
                .in_set(DoorSimSet::Commands),
        );
        app.add_systems(
            Update,
            systems::door_tick_system.in_set(DoorSimSet::DoorTick),
        );
        app.add_systems(
            Update,
            (
                map::reachability::rebuild_reachability_system,
                occupant::settle_positions_system,
            )
                .chain()
                .in_set(DoorSimSet::Reachability),
        );
    }
}
