//! Save and restore of doors and buttons.
//!
//! Proxies are deliberately not captured: a restored owner comes back with
//! an empty proxy list and the first tick rebuilds the set in place. That
//! gives functional equivalence (same cells, same mirrored flags), not
//! identity equivalence.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use map::edifice::BuildingGrid;
use map::grid::CellRect;
use utils::cid;
use utils::frame::FrameCount;
use utils::order_iter;
use utils::sim_id::{SimId, SimIdFactory, SimIdRaw};

use crate::kind::{DoorKind, DoorTiming};
use crate::occupant::FactionId;
use crate::remote::{LockState, RemoteButton, RemoteLock};
use crate::state::{DoorFaction, DoorProxies, DoorState, Powered};

/// Marker on a freshly restored remote door whose lock still has to be
/// re-asserted.
#[derive(Component, Clone, Copy, Debug, Default)]
pub struct NeedsLockResume;

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct RemoteLockSave {
    pub state: LockState,
    pub secured: bool,
    pub button: Option<SimIdRaw>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct DoorSaveData {
    pub id: SimIdRaw,
    pub name: String,
    pub kind: DoorKind,
    pub footprint: CellRect,
    pub faction: Option<FactionId>,
    pub timing: DoorTiming,
    pub open: bool,
    pub hold_open: bool,
    pub last_friendly_touch_tick: Option<u32>,
    pub crossing_occupants: Vec<SimIdRaw>,
    pub remote: Option<RemoteLockSave>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ButtonSaveData {
    pub id: SimIdRaw,
    pub name: String,
    pub linked: Vec<SimIdRaw>,
    pub needs_to_be_switched: bool,
    pub button_on: bool,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct SaveEnvelope {
    /// Random tag correlating this save with the log lines around it.
    pub session: String,
    pub frame: u32,
    pub doors: Vec<DoorSaveData>,
    pub buttons: Vec<ButtonSaveData>,
}

impl SaveEnvelope {
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }
}

/// Snapshot every door and button. Run it as a one-shot system; entity
/// references are flattened to stable ids, dangling ones are dropped.
pub fn capture_save(
    frame: Res<FrameCount>,
    doors: Query<(
        &SimId,
        &DoorKind,
        &DoorTiming,
        &CellRect,
        Option<&DoorFaction>,
        &DoorState,
        Option<&RemoteLock>,
    )>,
    buttons: Query<(&SimId, &RemoteButton)>,
    ids: Query<&SimId>,
) -> SaveEnvelope {
    let resolve = |entity: Entity| ids.get(entity).ok().map(|id| id.0);

    let mut doors_out = Vec::new();
    for (id, kind, timing, footprint, faction, state, lock) in order_iter!(doors) {
        doors_out.push(DoorSaveData {
            id: id.0,
            name: id.1.clone(),
            kind: *kind,
            footprint: *footprint,
            faction: faction.map(|f| f.0),
            timing: *timing,
            open: state.open,
            hold_open: state.hold_open,
            last_friendly_touch_tick: state.last_friendly_touch_tick,
            crossing_occupants: state
                .crossing_occupants
                .iter()
                .filter_map(|entity| resolve(*entity))
                .collect(),
            remote: lock.map(|lock| RemoteLockSave {
                state: lock.state,
                secured: lock.secured,
                button: lock.button.and_then(|button| resolve(button)),
            }),
        });
    }

    let mut buttons_out = Vec::new();
    for (id, button) in order_iter!(buttons) {
        buttons_out.push(ButtonSaveData {
            id: id.0,
            name: id.1.clone(),
            linked: button
                .linked
                .iter()
                .filter_map(|entity| resolve(*entity))
                .collect(),
            needs_to_be_switched: button.needs_to_be_switched,
            button_on: button.button_on,
        });
    }

    SaveEnvelope {
        session: cid::correlation_id(),
        frame: frame.frame,
        doors: doors_out,
        buttons: buttons_out,
    }
}

/// Rebuild doors and buttons from an envelope.
///
/// `known` maps stable ids of entities that already exist host-side
/// (movers referenced by crossing credits) to their current entities;
/// unresolvable references are dropped. Returns the id→entity map of
/// everything spawned here. Proxy lists come back empty and the first tick
/// rebuilds them; remote doors get a [`NeedsLockResume`] marker.
pub fn restore_save(
    commands: &mut Commands,
    buildings: &mut BuildingGrid,
    ids: &mut SimIdFactory,
    envelope: &SaveEnvelope,
    known: &BTreeMap<SimIdRaw, Entity>,
) -> BTreeMap<SimIdRaw, Entity> {
    let mut spawned: BTreeMap<SimIdRaw, Entity> = BTreeMap::new();
    let mut highest = 0;

    // Buttons get their entities first so door locks can point at them.
    for button in &envelope.buttons {
        let entity = commands.spawn_empty().id();
        spawned.insert(button.id, entity);
        highest = highest.max(button.id);
    }

    for door in &envelope.doors {
        let entity = commands.spawn_empty().id();
        spawned.insert(door.id, entity);
        highest = highest.max(door.id);

        let mut state = DoorState {
            open: door.open,
            hold_open: door.hold_open,
            last_friendly_touch_tick: door.last_friendly_touch_tick,
            ..Default::default()
        };
        state.crossing_occupants = door
            .crossing_occupants
            .iter()
            .filter_map(|raw| known.get(raw).copied())
            .collect();

        let mut entity_commands = commands.entity(entity);
        entity_commands.insert((
            SimId(door.id, door.name.clone()),
            door.kind,
            door.timing,
            door.footprint,
            state,
            DoorProxies::default(),
            Powered::default(),
        ));
        if let Some(faction) = door.faction {
            entity_commands.insert(DoorFaction(faction));
        }
        if let Some(remote) = &door.remote {
            entity_commands.insert((
                RemoteLock {
                    state: remote.state,
                    secured: remote.secured,
                    button: remote.button.and_then(|raw| spawned.get(&raw).copied()),
                },
                NeedsLockResume,
            ));
        }
        buildings.register(entity, door.footprint);
    }

    for button in &envelope.buttons {
        let Some(&entity) = spawned.get(&button.id) else {
            continue;
        };
        commands.entity(entity).insert((
            SimId(button.id, button.name.clone()),
            RemoteButton {
                linked: button
                    .linked
                    .iter()
                    .filter_map(|raw| spawned.get(raw).copied())
                    .collect(),
                needs_to_be_switched: button.needs_to_be_switched,
                button_on: button.button_on,
            },
            Powered::default(),
        ));
    }

    ids.bump_past(highest);
    info!(
        "restored {} doors and {} buttons (session {})",
        envelope.doors.len(),
        envelope.buttons.len(),
        envelope.session
    );
    spawned
}

#[cfg(test)]
mod tests {
    use super::*;
    use bevy::ecs::system::RunSystemOnce;
    use map::edifice::EdificeGrid;
    use map::grid::GridPos;
    use map::reachability::ReachabilityCache;

    use crate::create::{spawn_logical_door, spawn_remote_button, DoorSpawnConfig};
    use crate::occupant::OccupancyGrid;
    use crate::proxy::ProxyState;
    use crate::remote::connect_button;
    use crate::DoorSimPlugin;

    #[derive(Resource)]
    struct TheDoor(Entity);

    #[derive(Resource)]
    struct TheButton(Entity);

    #[derive(Resource)]
    struct PendingSave(SaveEnvelope);

    fn test_app() -> App {
        let mut app = App::new();
        app.add_plugins(DoorSimPlugin);
        app
    }

    fn spawn_secured_world(
        mut commands: Commands,
        mut edifice: ResMut<EdificeGrid>,
        mut buildings: ResMut<BuildingGrid>,
        mut reach: ResMut<ReachabilityCache>,
        occupancy: Res<OccupancyGrid>,
        mut ids: ResMut<SimIdFactory>,
    ) -> (Entity, Entity) {
        let door = spawn_logical_door(
            &mut commands,
            &mut edifice,
            &mut buildings,
            &mut reach,
            &occupancy,
            &mut ids,
            DoorSpawnConfig::new(DoorKind::Remote, CellRect::new(GridPos::new(4, 4), 2, 1))
                .with_faction(2),
        );
        let button = spawn_remote_button(&mut commands, &mut ids);
        (door, button)
    }

    fn link_and_secure(
        door: Res<TheDoor>,
        button: Res<TheButton>,
        mut doors: Query<(&SimId, &mut DoorState, &mut RemoteLock, &Powered, &DoorProxies)>,
        mut proxy_states: Query<&mut ProxyState>,
        mut buttons: Query<&mut RemoteButton>,
    ) {
        let (door_id, mut state, mut lock, powered, proxies) = doors.get_mut(door.0).unwrap();
        let door_id = door_id.clone();
        connect_button(door.0, &mut lock, button.0, &mut buttons);
        crate::remote::set_secured(
            true,
            &door_id,
            &mut state,
            &mut lock,
            powered.0,
            proxies,
            &mut proxy_states,
            &mut buttons,
        )
        .unwrap();
    }

    fn restore_from_pending(
        pending: Res<PendingSave>,
        mut commands: Commands,
        mut buildings: ResMut<BuildingGrid>,
        mut ids: ResMut<SimIdFactory>,
    ) {
        restore_save(
            &mut commands,
            &mut buildings,
            &mut ids,
            &pending.0,
            &BTreeMap::new(),
        );
    }

    #[test]
    fn secured_door_survives_a_save_load_cycle() {
        let mut app = test_app();
        let (door, button) = app.world_mut().run_system_once(spawn_secured_world).unwrap();
        app.insert_resource(TheDoor(door));
        app.insert_resource(TheButton(button));
        app.world_mut().run_system_once(link_and_secure).unwrap();

        let envelope = app.world_mut().run_system_once(capture_save).unwrap();
        assert_eq!(envelope.doors.len(), 1);
        assert_eq!(envelope.buttons.len(), 1);
        let saved_door = &envelope.doors[0];
        assert!(!saved_door.open);
        let remote = saved_door.remote.as_ref().unwrap();
        assert_eq!(remote.state, LockState::ForcedClose);
        assert!(remote.secured);
        assert_eq!(remote.button, Some(envelope.buttons[0].id));
        assert!(envelope.buttons[0].linked.contains(&saved_door.id));

        // Through the wire format and into a fresh world.
        let json = envelope.to_json().unwrap();
        let envelope = SaveEnvelope::from_json(&json).unwrap();

        let mut fresh = test_app();
        fresh.insert_resource(PendingSave(envelope));
        fresh.world_mut().run_system_once(restore_from_pending).unwrap();

        // First tick: lock resumes, proxies rebuild.
        fresh.update();

        let mut doors = fresh
            .world_mut()
            .query::<(Entity, &DoorState, &DoorProxies, &RemoteLock)>();
        let (restored, state, proxies, lock) = doors.iter(fresh.world()).next().unwrap();
        assert!(!state.open);
        assert!(state.forbidden);
        assert_eq!(proxies.0.len(), 2);
        assert_eq!(lock.state, LockState::ForcedClose);
        assert!(lock.secured);
        assert!(fresh.world().get::<NeedsLockResume>(restored).is_none());

        let mut proxy_query = fresh.world_mut().query::<&ProxyState>();
        let restored_proxies: Vec<_> = proxy_query.iter(fresh.world()).collect();
        assert_eq!(restored_proxies.len(), 2);
        assert!(restored_proxies.iter().all(|ps| !ps.open && ps.forbidden));

        let mut buttons = fresh.world_mut().query::<&RemoteButton>();
        let restored_button = buttons.iter(fresh.world()).next().unwrap();
        assert_eq!(restored_button.linked.len(), 1);
        assert!(restored_button.linked.contains(&restored));

        // Lock points at the restored button entity.
        let lock = fresh.world().get::<RemoteLock>(restored).unwrap();
        assert!(lock.button.is_some());
    }

    #[test]
    fn forced_open_door_resumes_pinned_open() {
        let mut app = test_app();
        let (door, button) = app.world_mut().run_system_once(spawn_secured_world).unwrap();
        app.insert_resource(TheDoor(door));
        app.insert_resource(TheButton(button));
        {
            let mut state = app.world_mut().get_mut::<DoorState>(door).unwrap();
            state.open = true;
            state.hold_open = true;
        }
        {
            let mut lock = app.world_mut().get_mut::<RemoteLock>(door).unwrap();
            lock.state = LockState::ForcedOpen;
        }

        let envelope = app.world_mut().run_system_once(capture_save).unwrap();
        let mut fresh = test_app();
        fresh.insert_resource(PendingSave(envelope));
        fresh.world_mut().run_system_once(restore_from_pending).unwrap();
        fresh.update();

        let mut doors = fresh.world_mut().query::<(&DoorState, &DoorProxies)>();
        let (state, proxies) = doors.iter(fresh.world()).next().unwrap();
        assert!(state.open);
        assert!(state.hold_open);
        assert_eq!(proxies.0.len(), 2);
        let mut proxy_query = fresh.world_mut().query::<&ProxyState>();
        assert!(proxy_query.iter(fresh.world()).all(|ps| ps.open));
    }

    #[test]
    fn restored_ids_do_not_collide_with_new_ones() {
        let mut app = test_app();
        let (door, button) = app.world_mut().run_system_once(spawn_secured_world).unwrap();
        app.insert_resource(TheDoor(door));
        app.insert_resource(TheButton(button));

        let envelope = app.world_mut().run_system_once(capture_save).unwrap();
        let highest = envelope
            .doors
            .iter()
            .map(|d| d.id)
            .chain(envelope.buttons.iter().map(|b| b.id))
            .max()
            .unwrap();

        let mut fresh = test_app();
        fresh.insert_resource(PendingSave(envelope));
        fresh.world_mut().run_system_once(restore_from_pending).unwrap();

        let next = fresh
            .world_mut()
            .resource_mut::<SimIdFactory>()
            .next("door");
        assert!(next.0 > highest);
    }
}
