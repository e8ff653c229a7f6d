//! Placement and removal of logical doors and control buttons.

use bevy::prelude::*;

use map::edifice::{BuildingGrid, EdificeGrid};
use map::grid::CellRect;
use map::reachability::ReachabilityCache;
use utils::sim_id::SimIdFactory;

use crate::kind::{DoorKind, DoorTiming};
use crate::occupant::{FactionId, OccupancyGrid};
use crate::proxy::{despawn_proxies, spawn_proxies};
use crate::remote::{RemoteButton, RemoteLock};
use crate::state::{DoorFaction, DoorProxies, DoorState, Powered};

pub struct DoorSpawnConfig {
    pub name: String,
    pub kind: DoorKind,
    pub footprint: CellRect,
    pub faction: Option<FactionId>,
    /// `None` derives timing from the footprint's longest side.
    pub timing: Option<DoorTiming>,
}

impl DoorSpawnConfig {
    pub fn new(kind: DoorKind, footprint: CellRect) -> Self {
        Self {
            name: "door".to_owned(),
            kind,
            footprint,
            faction: None,
            timing: None,
        }
    }

    pub fn with_faction(mut self, faction: FactionId) -> Self {
        self.faction = Some(faction);
        self
    }
}

/// Place a logical door: the owner entity, its per-cell proxies, and both
/// registry entries, all in one go.
pub fn spawn_logical_door(
    commands: &mut Commands,
    edifice: &mut EdificeGrid,
    buildings: &mut BuildingGrid,
    reach: &mut ReachabilityCache,
    occupancy: &OccupancyGrid,
    ids: &mut SimIdFactory,
    config: DoorSpawnConfig,
) -> Entity {
    let door_id = ids.next(&config.name);
    let timing = config
        .timing
        .unwrap_or_else(|| DoorTiming::sized(config.footprint.longest_side()));
    let mut state = DoorState::default();
    let mut proxies = DoorProxies::default();
    let entity = commands.spawn_empty().id();

    spawn_proxies(
        commands,
        edifice,
        reach,
        occupancy,
        ids,
        entity,
        &door_id,
        config.kind,
        &config.footprint,
        config.faction,
        &mut state,
        &mut proxies,
    );

    // The owner registers its whole rectangle, co-resident with the
    // per-cell proxies in the edifice layer.
    buildings.register(entity, config.footprint);
    info!(
        "spawned door {} over {} cells",
        door_id,
        config.footprint.cell_count()
    );

    let mut entity_commands = commands.entity(entity);
    entity_commands.insert((
        door_id,
        config.kind,
        timing,
        config.footprint,
        state,
        proxies,
        Powered::default(),
    ));
    if let Some(faction) = config.faction {
        entity_commands.insert(DoorFaction(faction));
    }
    if config.kind == DoorKind::Remote {
        entity_commands.insert(RemoteLock::default());
    }
    entity
}

/// Remove a door: proxies vanish first, then the registrations, then the
/// owner itself.
pub fn despawn_logical_door(
    commands: &mut Commands,
    edifice: &mut EdificeGrid,
    buildings: &mut BuildingGrid,
    reach: &mut ReachabilityCache,
    entity: Entity,
    footprint: &CellRect,
    proxies: &mut DoorProxies,
) {
    despawn_proxies(commands, edifice, reach, footprint, proxies);
    buildings.unregister(entity);
    commands.entity(entity).despawn();
}

/// Place a control button. Linking to doors is a separate, explicit step.
pub fn spawn_remote_button(commands: &mut Commands, ids: &mut SimIdFactory) -> Entity {
    commands
        .spawn((
            ids.next("button"),
            RemoteButton::default(),
            Powered::default(),
        ))
        .id()
}
