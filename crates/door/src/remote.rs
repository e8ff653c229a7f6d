//! Remote lock overlay and its control-button linkage.
//!
//! A remote door carries a tri-state lock on top of the normal timing
//! machine. Buttons hold many-to-one links back to their doors; links only
//! change through [`connect_button`] / [`disconnect_button`], never as a
//! side effect of entity destruction.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use map::grid::CellRect;
use utils::frame::FrameCount;
use utils::sim_id::SimId;

use crate::config::{DoorTuning, INDEFINITE_OPEN_TICKS};
use crate::error::DoorActionError;
use crate::events::{ButtonPushEvent, DoorEffectEvent};
use crate::kind::DoorTiming;
use crate::occupant::OccupancyGrid;
use crate::persist::NeedsLockResume;
use crate::proxy::ProxyState;
use crate::state::{DoorProxies, DoorState};
use crate::systems::{request_close, request_open, set_proxies_forbidden};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize, Reflect)]
pub enum LockState {
    #[default]
    Free,
    ForcedOpen,
    ForcedClose,
}

/// Lock overlay state on a remote door. `button` is non-owning; a stale
/// handle is tolerated and simply resolves to nothing.
#[derive(Component, Clone, Debug, Default)]
pub struct RemoteLock {
    pub state: LockState,
    pub secured: bool,
    pub button: Option<Entity>,
}

/// Control entity. Holds non-owning links to any number of remote doors.
#[derive(Component, Clone, Debug, Default)]
pub struct RemoteButton {
    pub linked: BTreeSet<Entity>,
    /// The host's job layer watches this: someone has to walk over and
    /// flip the switch for a pending lockdown to complete.
    pub needs_to_be_switched: bool,
    /// Cosmetic on/off toggle for rendering.
    pub button_on: bool,
}

/// Point a door at `button`, detaching it from any previous button first
/// so the reciprocal sets stay consistent.
pub fn connect_button(
    door: Entity,
    lock: &mut RemoteLock,
    button: Entity,
    buttons: &mut Query<&mut RemoteButton>,
) {
    if let Some(previous) = lock.button {
        if previous != button {
            if let Ok(mut prev) = buttons.get_mut(previous) {
                prev.linked.remove(&door);
            }
        }
    }
    lock.button = Some(button);
    if let Ok(mut next) = buttons.get_mut(button) {
        next.linked.insert(door);
    }
}

pub fn disconnect_button(
    door: Entity,
    lock: &mut RemoteLock,
    buttons: &mut Query<&mut RemoteButton>,
) {
    if let Some(previous) = lock.button {
        if let Ok(mut prev) = buttons.get_mut(previous) {
            prev.linked.remove(&door);
        }
    }
    lock.button = None;
}

/// Engage or release the remote securing. Engaging requires a live linked
/// button and power; anything less is rejected with no state change.
#[allow(clippy::too_many_arguments)]
pub fn set_secured(
    value: bool,
    door_id: &SimId,
    state: &mut DoorState,
    lock: &mut RemoteLock,
    powered: bool,
    proxies: &DoorProxies,
    proxy_states: &mut Query<&mut ProxyState>,
    buttons: &mut Query<&mut RemoteButton>,
) -> Result<(), DoorActionError> {
    if value {
        let button = lock.button.ok_or(DoorActionError::NoLinkedButton)?;
        if buttons.get_mut(button).is_err() {
            // A despawned button counts the same as no button.
            return Err(DoorActionError::NoLinkedButton);
        }
        if !powered {
            return Err(DoorActionError::Unpowered);
        }
        lock.secured = true;
        if lock.state == LockState::Free && !state.open {
            lock.state = LockState::ForcedClose;
            set_proxies_forbidden(state, proxies, proxy_states, true);
            info!("door {} secured shut", door_id);
        } else if state.open {
            // Still open: the lockdown completes on the next push.
            if let Ok(mut pending) = buttons.get_mut(button) {
                pending.needs_to_be_switched = true;
            }
        }
    } else {
        lock.secured = false;
        // Only the exact ForcedClose case resets. A forced-open door stays
        // pinned until its button releases it.
        if lock.state == LockState::ForcedClose {
            lock.state = LockState::Free;
            set_proxies_forbidden(state, proxies, proxy_states, false);
            info!("door {} released", door_id);
        }
    }
    Ok(())
}

/// One push signal arriving at one door.
#[allow(clippy::too_many_arguments)]
pub(crate) fn button_pushed(
    door: Entity,
    door_id: &SimId,
    timing: &DoorTiming,
    footprint: &CellRect,
    state: &mut DoorState,
    lock: &mut RemoteLock,
    proxies: &DoorProxies,
    proxy_states: &mut Query<&mut ProxyState>,
    occupancy: &OccupancyGrid,
    now: u32,
    tuning: &DoorTuning,
    effects: &mut EventWriter<DoorEffectEvent>,
) {
    if state.open {
        state.hold_open = false;
        // Best-effort; a refused close is retried by the tick.
        let _ = request_close(
            door,
            door_id,
            timing,
            footprint,
            state,
            proxies,
            proxy_states,
            occupancy,
            now,
            tuning,
            effects,
        );
        if lock.secured {
            lock.state = LockState::ForcedClose;
            set_proxies_forbidden(state, proxies, proxy_states, true);
        } else {
            lock.state = LockState::Free;
        }
    } else {
        request_open(
            door,
            door_id,
            footprint,
            state,
            proxies,
            proxy_states,
            INDEFINITE_OPEN_TICKS,
            effects,
        );
        state.hold_open = true;
        lock.state = LockState::ForcedOpen;
        set_proxies_forbidden(state, proxies, proxy_states, false);
    }
}

/// Fan a push signal out to every linked door, dropping links to doors
/// that despawned since. Order across doors is unspecified and nothing may
/// rely on it.
#[allow(clippy::too_many_arguments)]
pub fn push_button_system(
    frame: Res<FrameCount>,
    tuning: Res<DoorTuning>,
    occupancy: Res<OccupancyGrid>,
    mut pushes: EventReader<ButtonPushEvent>,
    mut buttons: Query<(&SimId, &mut RemoteButton)>,
    mut doors: Query<(
        &SimId,
        &DoorTiming,
        &CellRect,
        &mut DoorState,
        &mut RemoteLock,
        &DoorProxies,
    )>,
    mut proxy_states: Query<&mut ProxyState>,
    mut effects: EventWriter<DoorEffectEvent>,
) {
    for push in pushes.read() {
        let Ok((button_id, mut button)) = buttons.get_mut(push.button) else {
            continue;
        };
        button.button_on = !button.button_on;
        button.needs_to_be_switched = false;
        info!("f={} button {} pushed", frame.frame, button_id);

        let linked: Vec<Entity> = button.linked.iter().copied().collect();
        for door in linked {
            let Ok((door_id, timing, footprint, mut state, mut lock, proxies)) =
                doors.get_mut(door)
            else {
                button.linked.remove(&door);
                continue;
            };
            button_pushed(
                door,
                door_id,
                timing,
                footprint,
                &mut state,
                &mut lock,
                proxies,
                &mut proxy_states,
                &occupancy,
                frame.frame,
                &tuning,
                &mut effects,
            );
        }
    }
}

/// After a load, re-assert whatever the lock was enforcing before the save.
pub fn lock_resume_system(
    frame: Res<FrameCount>,
    tuning: Res<DoorTuning>,
    occupancy: Res<OccupancyGrid>,
    mut commands: Commands,
    mut doors: Query<
        (
            Entity,
            &SimId,
            &DoorTiming,
            &CellRect,
            &mut DoorState,
            &RemoteLock,
            &DoorProxies,
        ),
        With<NeedsLockResume>,
    >,
    mut proxy_states: Query<&mut ProxyState>,
    mut effects: EventWriter<DoorEffectEvent>,
) {
    for (entity, door_id, timing, footprint, mut state, lock, proxies) in &mut doors {
        match lock.state {
            LockState::ForcedClose if lock.secured => {
                let _ = request_close(
                    entity,
                    door_id,
                    timing,
                    footprint,
                    &mut state,
                    proxies,
                    &mut proxy_states,
                    &occupancy,
                    frame.frame,
                    &tuning,
                    &mut effects,
                );
                set_proxies_forbidden(&mut state, proxies, &mut proxy_states, true);
            }
            LockState::ForcedOpen => {
                request_open(
                    entity,
                    door_id,
                    footprint,
                    &mut state,
                    proxies,
                    &mut proxy_states,
                    INDEFINITE_OPEN_TICKS,
                    &mut effects,
                );
                state.hold_open = true;
            }
            _ => {}
        }
        debug!("door {} lock resumed as {:?}", door_id, lock.state);
        commands.entity(entity).remove::<NeedsLockResume>();
    }
}
