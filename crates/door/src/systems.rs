//! The open/close state machine and its per-tick driver.
//!
//! Everything here mutates owner state first and pushes the result down to
//! the proxies in the same call; proxies never decide anything themselves.

use bevy::prelude::*;

use map::edifice::EdificeGrid;
use map::grid::CellRect;
use map::reachability::ReachabilityCache;
use utils::frame::FrameCount;
use utils::sim_id::{SimId, SimIdFactory};
use utils::{order_iter, order_iter_mut};

use crate::config::{DoorTuning, INDEFINITE_OPEN_TICKS};
use crate::error::DoorActionError;
use crate::events::{
    ApproachEvent, CommandRejected, DoorCommand, DoorCommandAction, DoorEffectEvent,
    DoorEffectKind, EnvironmentMixEvent,
};
use crate::kind::{DoorKind, DoorTiming};
use crate::occupant::{CellPosition, FactionId, FactionRelations, Occupant, OccupancyGrid};
use crate::proxy::{spawn_proxies, ProxyState};
use crate::remote::{LockState, RemoteButton, RemoteLock};
use crate::state::{DoorFaction, DoorProxies, DoorState, DoorView, Powered};

pub(crate) fn set_proxies_open(
    proxies: &DoorProxies,
    proxy_states: &mut Query<&mut ProxyState>,
    open: bool,
) {
    for proxy in &proxies.0 {
        if let Ok(mut ps) = proxy_states.get_mut(*proxy) {
            ps.open = open;
        }
    }
}

pub(crate) fn set_proxies_forbidden(
    state: &mut DoorState,
    proxies: &DoorProxies,
    proxy_states: &mut Query<&mut ProxyState>,
    forbidden: bool,
) {
    state.forbidden = forbidden;
    state.synced_forbidden = forbidden;
    for proxy in &proxies.0 {
        if let Ok(mut ps) = proxy_states.get_mut(*proxy) {
            ps.forbidden = forbidden;
        }
    }
}

/// Open the door (idempotent) and load the close countdown. Already-open
/// doors only get the countdown refreshed.
#[allow(clippy::too_many_arguments)]
pub fn request_open(
    door: Entity,
    door_id: &SimId,
    footprint: &CellRect,
    state: &mut DoorState,
    proxies: &DoorProxies,
    proxy_states: &mut Query<&mut ProxyState>,
    close_delay: u32,
    effects: &mut EventWriter<DoorEffectEvent>,
) {
    state.ticks_until_close = close_delay;
    if !state.open {
        state.open = true;
        info!("door {} opened", door_id);
        effects.write(DoorEffectEvent {
            door,
            door_id: door_id.clone(),
            kind: DoorEffectKind::Opened,
        });
    }
    // Far-side cells of a wide door must outlast an occupant still crossing.
    let inflated = close_delay.saturating_mul(footprint.longest_side().saturating_mul(2));
    for proxy in &proxies.0 {
        if let Ok(mut ps) = proxy_states.get_mut(*proxy) {
            ps.open = true;
            ps.ticks_until_close = inflated;
        }
    }
}

/// Best-effort close. Refusal is routine: the caller (usually the tick)
/// simply tries again later.
#[allow(clippy::too_many_arguments)]
pub fn request_close(
    door: Entity,
    door_id: &SimId,
    timing: &DoorTiming,
    footprint: &CellRect,
    state: &mut DoorState,
    proxies: &DoorProxies,
    proxy_states: &mut Query<&mut ProxyState>,
    occupancy: &OccupancyGrid,
    now: u32,
    tuning: &DoorTuning,
    effects: &mut EventWriter<DoorEffectEvent>,
) -> bool {
    if !state.open || state.hold_open {
        return false;
    }
    if occupancy.any_in(footprint.cells()) {
        return false;
    }
    if state.friendly_touch_active(now, tuning, timing) {
        return false;
    }
    state.open = false;
    info!("door {} closed", door_id);
    effects.write(DoorEffectEvent {
        door,
        door_id: door_id.clone(),
        kind: DoorEffectKind::Closed,
    });
    // Parent-initiated close: followers cannot veto it.
    set_proxies_open(proxies, proxy_states, false);
    true
}

/// An occupant announced itself at the footprint. Records the friendly
/// touch, credits the crossing, and swings kinds that never slow traffic.
#[allow(clippy::too_many_arguments)]
pub(crate) fn notify_approaching(
    door: Entity,
    door_id: &SimId,
    kind: DoorKind,
    timing: &DoorTiming,
    footprint: &CellRect,
    faction: Option<FactionId>,
    lock: Option<&RemoteLock>,
    state: &mut DoorState,
    proxies: &DoorProxies,
    proxy_states: &mut Query<&mut ProxyState>,
    occupant_entity: Entity,
    occupant: &Occupant,
    hostile: bool,
    now: u32,
    tuning: &DoorTuning,
    effects: &mut EventWriter<DoorEffectEvent>,
) {
    if let Some(lock) = lock {
        // Occupant events are ignored under a remote lockdown.
        if lock.secured && lock.state != LockState::ForcedOpen {
            return;
        }
    }
    if state.crossing_occupants.contains(&occupant_entity) {
        return;
    }
    if !hostile {
        state.last_friendly_touch_tick = Some(now);
        state.touch_grace_factor =
            1.0 + occupant.pace.urgency_bonus() + (1.0 - occupant.movement_capacity).max(0.0);
    }
    let can_open = DoorView {
        kind,
        timing,
        state: &*state,
        footprint,
        faction,
        lock,
    }
    .pawn_can_open(occupant);
    if can_open {
        state.crossing_occupants.insert(occupant_entity);
        if !kind.slows_occupants() {
            request_open(
                door,
                door_id,
                footprint,
                state,
                proxies,
                proxy_states,
                tuning.approach_open_ticks,
                effects,
            );
        }
    }
}

/// Translate host movement into approach notifications: any mover that
/// stepped onto a footprint or its rim this tick announces itself.
pub fn approach_detection_system(
    mut approaches: EventWriter<ApproachEvent>,
    occupants: Query<(&SimId, Entity, &CellPosition), With<Occupant>>,
    doors: Query<(&SimId, Entity, &CellRect), With<DoorState>>,
) {
    for (_, occupant, pos) in order_iter!(occupants) {
        if pos.cell == pos.prev {
            continue;
        }
        for (_, door, footprint) in order_iter!(doors) {
            if footprint.contains(pos.cell) || footprint.rim().contains(&pos.cell) {
                approaches.write(ApproachEvent { occupant, door });
            }
        }
    }
}

pub fn approach_event_system(
    frame: Res<FrameCount>,
    tuning: Res<DoorTuning>,
    relations: Res<FactionRelations>,
    mut approaches: EventReader<ApproachEvent>,
    mut doors: Query<(
        &SimId,
        &DoorKind,
        &DoorTiming,
        &CellRect,
        Option<&DoorFaction>,
        Option<&RemoteLock>,
        &mut DoorState,
        &DoorProxies,
    )>,
    occupants: Query<&Occupant>,
    mut proxy_states: Query<&mut ProxyState>,
    mut effects: EventWriter<DoorEffectEvent>,
) {
    for approach in approaches.read() {
        // Either side may have despawned since the event was queued.
        let Ok(occupant) = occupants.get(approach.occupant) else {
            continue;
        };
        let Ok((door_id, kind, timing, footprint, faction, lock, mut state, proxies)) =
            doors.get_mut(approach.door)
        else {
            continue;
        };
        let faction = faction.map(|f| f.0);
        let hostile = relations.hostile(occupant.faction, faction);
        notify_approaching(
            approach.door,
            door_id,
            *kind,
            timing,
            footprint,
            faction,
            lock,
            &mut state,
            proxies,
            &mut proxy_states,
            approach.occupant,
            occupant,
            hostile,
            frame.frame,
            &tuning,
            &mut effects,
        );
    }
}

/// Operator commands: hold-open, remote securing, diagnostics overrides.
#[allow(clippy::too_many_arguments)]
pub fn door_command_system(
    frame: Res<FrameCount>,
    mut commands_in: EventReader<DoorCommand>,
    mut doors: Query<(
        &SimId,
        &CellRect,
        &mut DoorState,
        &DoorProxies,
        Option<&mut RemoteLock>,
        Option<&Powered>,
    )>,
    mut buttons: Query<&mut RemoteButton>,
    mut proxy_states: Query<&mut ProxyState>,
    mut effects: EventWriter<DoorEffectEvent>,
    mut rejections: EventWriter<CommandRejected>,
) {
    let now = frame.frame;
    for command in commands_in.read() {
        let Ok((door_id, footprint, mut state, proxies, lock, powered)) =
            doors.get_mut(command.door)
        else {
            continue;
        };
        match command.action {
            DoorCommandAction::ToggleHoldOpen => {
                state.hold_open = !state.hold_open;
                info!("f={} door {} hold-open -> {}", now, door_id, state.hold_open);
            }
            DoorCommandAction::SetSecured(value) => {
                let Some(mut lock) = lock else {
                    rejections.write(CommandRejected {
                        door: command.door,
                        error: DoorActionError::NotRemote,
                    });
                    continue;
                };
                let powered = powered.is_some_and(|p| p.0);
                if let Err(error) = crate::remote::set_secured(
                    value,
                    door_id,
                    &mut state,
                    &mut lock,
                    powered,
                    proxies,
                    &mut proxy_states,
                    &mut buttons,
                ) {
                    warn!("f={} door {} secure toggle rejected: {}", now, door_id, error);
                    rejections.write(CommandRejected {
                        door: command.door,
                        error,
                    });
                }
            }
            DoorCommandAction::DebugForceOpen => {
                request_open(
                    command.door,
                    door_id,
                    footprint,
                    &mut state,
                    proxies,
                    &mut proxy_states,
                    INDEFINITE_OPEN_TICKS,
                    &mut effects,
                );
            }
            DoorCommandAction::DebugForceClose => {
                // Diagnostics bypass every close guard.
                state.hold_open = false;
                state.ticks_until_close = 0;
                if state.open {
                    state.open = false;
                    effects.write(DoorEffectEvent {
                        door: command.door,
                        door_id: door_id.clone(),
                        kind: DoorEffectKind::Closed,
                    });
                }
                set_proxies_open(proxies, &mut proxy_states, false);
            }
        }
    }
}

/// Connectivity invalidation policy: whenever the free-passage
/// classification flips against the captured baseline, re-mark the
/// footprint cells and invalidate them.
#[allow(clippy::too_many_arguments)]
pub(crate) fn sync_passability(
    kind: DoorKind,
    timing: &DoorTiming,
    footprint: &CellRect,
    faction: Option<FactionId>,
    lock: Option<&RemoteLock>,
    state: &mut DoorState,
    occupancy: &OccupancyGrid,
    relations: &FactionRelations,
    now: u32,
    tuning: &DoorTuning,
    reach: &mut ReachabilityCache,
) {
    let free = DoorView {
        kind,
        timing,
        state: &*state,
        footprint,
        faction,
        lock,
    }
    .free_passage(occupancy, relations, now, tuning);
    if state.passability_baseline == Some(free) {
        return;
    }
    for cell in footprint.cells() {
        reach.set_blocked(cell, !free);
    }
    reach.invalidate(footprint.cells());
    state.passability_baseline = Some(free);
}

fn equalize_due(now: u32, door_id: &SimId, interval: u32) -> bool {
    // Staggered by id so doors do not all exchange on the same tick.
    interval != 0 && now % interval == (door_id.0 % interval as u64) as u32
}

/// One simulation step for every logical door.
#[allow(clippy::too_many_arguments)]
pub fn door_tick_system(
    frame: Res<FrameCount>,
    tuning: Res<DoorTuning>,
    relations: Res<FactionRelations>,
    occupancy: Res<OccupancyGrid>,
    mut commands: Commands,
    mut ids: ResMut<SimIdFactory>,
    mut edifice: ResMut<EdificeGrid>,
    mut reach: ResMut<ReachabilityCache>,
    mut doors: Query<(
        &SimId,
        Entity,
        &DoorKind,
        &DoorTiming,
        &CellRect,
        Option<&DoorFaction>,
        Option<&RemoteLock>,
        &mut DoorState,
        &mut DoorProxies,
    )>,
    mut proxy_states: Query<&mut ProxyState>,
    mut effects: EventWriter<DoorEffectEvent>,
    mut mixes: EventWriter<EnvironmentMixEvent>,
) {
    let now = frame.frame;
    for (door_id, entity, kind, timing, footprint, faction, lock, mut state, mut proxies) in
        order_iter_mut!(doors)
    {
        let kind = *kind;
        let faction = faction.map(|f| f.0);

        // Missing proxy set (fresh load, or something host-side ate them):
        // rebuild on the spot, the same tick it is noticed.
        if proxies.0.is_empty() {
            warn!("f={} door {} has no proxies, rebuilding", now, door_id);
            spawn_proxies(
                &mut commands,
                &mut edifice,
                &mut reach,
                &occupancy,
                &mut ids,
                entity,
                door_id,
                kind,
                footprint,
                faction,
                &mut state,
                &mut proxies,
            );
        }

        // Forbidden is owner state; push it down when it changed.
        if state.forbidden != state.synced_forbidden {
            let forbidden = state.forbidden;
            for proxy in &proxies.0 {
                if let Ok(mut ps) = proxy_states.get_mut(*proxy) {
                    ps.forbidden = forbidden;
                }
            }
            state.synced_forbidden = forbidden;
        }

        // Re-validate crossing credits. When the last crosser has left the
        // footprint, close behind it without waiting out the timer.
        if tuning.occupant_prune_interval != 0
            && now % tuning.occupant_prune_interval == 0
            && !state.crossing_occupants.is_empty()
        {
            let cells = footprint.cells();
            let before = state.crossing_occupants.len();
            state
                .crossing_occupants
                .retain(|occupant| cells.iter().any(|cell| occupancy.contains(*cell, *occupant)));
            if state.crossing_occupants.len() < before && state.crossing_occupants.is_empty() {
                request_close(
                    entity,
                    door_id,
                    timing,
                    footprint,
                    &mut state,
                    &proxies,
                    &mut proxy_states,
                    &occupancy,
                    now,
                    &tuning,
                    &mut effects,
                );
            }
        }

        sync_passability(
            kind, timing, footprint, faction, lock, &mut state, &occupancy, &relations, now,
            &tuning, &mut reach,
        );

        if !state.open {
            state.visual_open_ticks = state.visual_open_ticks.saturating_sub(1);
            if equalize_due(now, door_id, tuning.equalize_closed_interval) {
                mixes.write(EnvironmentMixEvent {
                    door: entity,
                    open: false,
                });
            }
        } else {
            state.visual_open_ticks = (state.visual_open_ticks + 1).min(timing.base_open_ticks);
            if !state.hold_open {
                if occupancy.any_in(footprint.cells()) {
                    // Blocked this tick: keep every follower patient.
                    for proxy in &proxies.0 {
                        if let Ok(mut ps) = proxy_states.get_mut(*proxy) {
                            ps.ticks_until_close = tuning.occupied_refresh_ticks;
                        }
                    }
                } else {
                    if state.ticks_until_close > 0 {
                        state.ticks_until_close -= 1;
                    }
                    let eligible = DoorView {
                        kind,
                        timing,
                        state: &*state,
                        footprint,
                        faction,
                        lock,
                    }
                    .can_close_automatically(now, &tuning);
                    if state.ticks_until_close == 0 && eligible {
                        let closed = request_close(
                            entity,
                            door_id,
                            timing,
                            footprint,
                            &mut state,
                            &proxies,
                            &mut proxy_states,
                            &occupancy,
                            now,
                            &tuning,
                            &mut effects,
                        );
                        if closed {
                            // Secondary guarantee: no follower keeps a stale
                            // open flag past a completed close.
                            set_proxies_open(&proxies, &mut proxy_states, false);
                        }
                    }
                }
            }
            if equalize_due(now, door_id, tuning.equalize_open_interval) {
                mixes.write(EnvironmentMixEvent {
                    door: entity,
                    open: true,
                });
            }
        }

        // Follower countdowns are advisory; they tick down but never act.
        for proxy in &proxies.0 {
            if let Ok(mut ps) = proxy_states.get_mut(*proxy) {
                ps.ticks_until_close = ps.ticks_until_close.saturating_sub(1);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bevy::ecs::system::RunSystemOnce;
    use map::edifice::BuildingGrid;
    use map::grid::GridPos;

    use crate::create::{spawn_logical_door, DoorSpawnConfig};
    use crate::proxy::ProxyBarrier;
    use crate::DoorSimPlugin;

    #[derive(Resource)]
    struct TheDoor(Entity);

    fn test_app() -> App {
        let mut app = App::new();
        app.add_plugins(DoorSimPlugin);
        app
    }

    fn spawn_wide_door(
        mut commands: Commands,
        mut edifice: ResMut<EdificeGrid>,
        mut buildings: ResMut<BuildingGrid>,
        mut reach: ResMut<ReachabilityCache>,
        occupancy: Res<OccupancyGrid>,
        mut ids: ResMut<SimIdFactory>,
    ) -> Entity {
        spawn_logical_door(
            &mut commands,
            &mut edifice,
            &mut buildings,
            &mut reach,
            &occupancy,
            &mut ids,
            DoorSpawnConfig::new(
                DoorKind::Standard,
                CellRect::new(GridPos::new(1, 1), 3, 1),
            )
            .with_faction(1),
        )
    }

    fn spawn_unowned_swing_door(
        mut commands: Commands,
        mut edifice: ResMut<EdificeGrid>,
        mut buildings: ResMut<BuildingGrid>,
        mut reach: ResMut<ReachabilityCache>,
        occupancy: Res<OccupancyGrid>,
        mut ids: ResMut<SimIdFactory>,
    ) -> Entity {
        spawn_logical_door(
            &mut commands,
            &mut edifice,
            &mut buildings,
            &mut reach,
            &occupancy,
            &mut ids,
            DoorSpawnConfig::new(
                DoorKind::DoubleSwing,
                CellRect::new(GridPos::new(1, 1), 1, 1),
            ),
        )
    }

    fn open_with_60(
        door: Res<TheDoor>,
        mut doors: Query<(&SimId, &CellRect, &mut DoorState, &DoorProxies)>,
        mut proxy_states: Query<&mut ProxyState>,
        mut effects: EventWriter<DoorEffectEvent>,
    ) {
        let (door_id, footprint, mut state, proxies) = doors.get_mut(door.0).unwrap();
        let door_id = door_id.clone();
        let footprint = *footprint;
        request_open(
            door.0,
            &door_id,
            &footprint,
            &mut state,
            proxies,
            &mut proxy_states,
            60,
            &mut effects,
        );
    }

    fn try_close(
        door: Res<TheDoor>,
        frame: Res<FrameCount>,
        tuning: Res<DoorTuning>,
        occupancy: Res<OccupancyGrid>,
        mut doors: Query<(&SimId, &DoorTiming, &CellRect, &mut DoorState, &DoorProxies)>,
        mut proxy_states: Query<&mut ProxyState>,
        mut effects: EventWriter<DoorEffectEvent>,
    ) -> bool {
        let (door_id, timing, footprint, mut state, proxies) = doors.get_mut(door.0).unwrap();
        let door_id = door_id.clone();
        let footprint = *footprint;
        let timing = *timing;
        request_close(
            door.0,
            &door_id,
            &timing,
            &footprint,
            &mut state,
            proxies,
            &mut proxy_states,
            &occupancy,
            frame.frame,
            &tuning,
            &mut effects,
        )
    }

    fn proxy_countdowns(app: &mut App) -> Vec<u32> {
        let mut query = app.world_mut().query::<&ProxyState>();
        query.iter(app.world()).map(|ps| ps.ticks_until_close).collect()
    }

    #[test]
    fn open_mirrors_inflated_delay_to_proxies() {
        let mut app = test_app();
        let door = app.world_mut().run_system_once(spawn_wide_door).unwrap();
        app.insert_resource(TheDoor(door));

        app.world_mut().run_system_once(open_with_60).unwrap();

        let state = app.world().get::<DoorState>(door).unwrap();
        assert!(state.open);
        assert_eq!(state.ticks_until_close, 60);
        // 60 * max(3, 1) * 2
        assert_eq!(proxy_countdowns(&mut app), vec![360, 360, 360]);
    }

    #[test]
    fn close_refused_by_hold_open_and_occupants() {
        let mut app = test_app();
        let door = app.world_mut().run_system_once(spawn_wide_door).unwrap();
        app.insert_resource(TheDoor(door));
        app.world_mut().run_system_once(open_with_60).unwrap();

        app.world_mut().get_mut::<DoorState>(door).unwrap().hold_open = true;
        assert!(!app.world_mut().run_system_once(try_close).unwrap());
        assert!(app.world().get::<DoorState>(door).unwrap().open);

        app.world_mut().get_mut::<DoorState>(door).unwrap().hold_open = false;
        let mover = app.world_mut().spawn_empty().id();
        app.world_mut()
            .resource_mut::<OccupancyGrid>()
            .insert(GridPos::new(2, 1), mover, None);
        assert!(!app.world_mut().run_system_once(try_close).unwrap());
        assert!(app.world().get::<DoorState>(door).unwrap().open);

        let mut proxy_query = app.world_mut().query::<&ProxyState>();
        assert!(proxy_query.iter(app.world()).all(|ps| ps.open));
    }

    #[test]
    fn close_refused_during_friendly_grace() {
        let mut app = test_app();
        let door = app.world_mut().run_system_once(spawn_wide_door).unwrap();
        app.insert_resource(TheDoor(door));
        app.world_mut().run_system_once(open_with_60).unwrap();

        {
            let mut state = app.world_mut().get_mut::<DoorState>(door).unwrap();
            state.last_friendly_touch_tick = Some(0);
            state.touch_grace_factor = 1.0;
        }
        // grace window = 90 * 1.0 * 3.0 (grace multiplier of a 3-wide door)
        assert!(!app.world_mut().run_system_once(try_close).unwrap());

        app.world_mut().resource_mut::<FrameCount>().frame = 400;
        assert!(app.world_mut().run_system_once(try_close).unwrap());
        assert!(!app.world().get::<DoorState>(door).unwrap().open);
    }

    #[test]
    fn successful_close_propagates_to_every_proxy() {
        let mut app = test_app();
        let door = app.world_mut().run_system_once(spawn_wide_door).unwrap();
        app.insert_resource(TheDoor(door));
        app.world_mut().run_system_once(open_with_60).unwrap();

        assert!(app.world_mut().run_system_once(try_close).unwrap());
        assert!(!app.world().get::<DoorState>(door).unwrap().open);
        let mut proxy_query = app.world_mut().query::<&ProxyState>();
        assert!(proxy_query.iter(app.world()).all(|ps| !ps.open));
    }

    #[test]
    fn vacant_door_auto_closes_when_the_countdown_ends() {
        let mut app = test_app();
        let door = app.world_mut().run_system_once(spawn_wide_door).unwrap();
        app.insert_resource(TheDoor(door));
        app.world_mut().run_system_once(open_with_60).unwrap();

        for i in 0..60u32 {
            app.world_mut().resource_mut::<FrameCount>().frame = i + 1;
            app.update();
            if i < 59 {
                assert!(
                    app.world().get::<DoorState>(door).unwrap().open,
                    "closed early at tick {}",
                    i + 1
                );
            }
        }

        let state = app.world().get::<DoorState>(door).unwrap();
        assert!(!state.open);
        assert_eq!(state.ticks_until_close, 0);
        let mut proxy_query = app.world_mut().query::<&ProxyState>();
        assert!(proxy_query.iter(app.world()).all(|ps| !ps.open));
    }

    #[test]
    fn swing_door_opens_for_an_approaching_mover() {
        let mut app = test_app();
        let door = app
            .world_mut()
            .run_system_once(spawn_unowned_swing_door)
            .unwrap();

        let mover_id = app.world_mut().resource_mut::<SimIdFactory>().next("mover");
        let mover = app
            .world_mut()
            .spawn((
                mover_id,
                Occupant::default(),
                // stepped onto the rim this tick
                CellPosition {
                    cell: GridPos::new(1, 0),
                    prev: GridPos::new(5, 5),
                },
            ))
            .id();

        app.world_mut().resource_mut::<FrameCount>().frame = 1;
        app.update();

        let state = app.world().get::<DoorState>(door).unwrap();
        assert!(state.open);
        assert!(state.crossing_occupants.contains(&mover));
        assert_eq!(state.last_friendly_touch_tick, Some(1));
        // walk urgency 0.75, full movement capacity
        assert!((state.touch_grace_factor - 1.75).abs() < f32::EPSILON);
    }

    #[test]
    fn missing_proxies_are_rebuilt_on_the_same_tick() {
        let mut app = test_app();
        let door = app.world_mut().run_system_once(spawn_wide_door).unwrap();

        // Simulate a load: wipe the proxy set behind the owner's back.
        let stale: Vec<Entity> = app
            .world_mut()
            .get_mut::<DoorProxies>(door)
            .unwrap()
            .0
            .drain(..)
            .collect();
        for proxy in stale {
            app.world_mut()
                .resource_mut::<EdificeGrid>()
                .unregister_entity(proxy);
            app.world_mut().despawn(proxy);
        }

        app.update();

        assert_eq!(app.world().get::<DoorProxies>(door).unwrap().0.len(), 3);
        let mut proxy_query = app.world_mut().query::<&ProxyBarrier>();
        assert_eq!(proxy_query.iter(app.world()).count(), 3);
    }
}
