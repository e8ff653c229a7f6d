//! Per-cell proxy decomposition.
//!
//! The host's passability registry holds one edifice per cell, so a
//! multi-cell door spawns one invisible single-cell stand-in per footprint
//! cell and drives them all from the owner.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use map::edifice::EdificeGrid;
use map::grid::{CellRect, GridPos};
use map::reachability::ReachabilityCache;
use utils::sim_id::{SimId, SimIdFactory};

use crate::kind::DoorKind;
use crate::occupant::{FactionId, OccupancyGrid};
use crate::state::{DoorFaction, DoorProxies, DoorState};

/// Single-cell stand-in for one cell of a logical door's footprint.
/// The back-reference is set once at spawn and never reassigned.
#[derive(Component, Clone, Copy, Debug)]
pub struct ProxyBarrier {
    pub owner: Entity,
    pub cell: GridPos,
}

/// Follower state, fully owner-determined. A proxy never decides to close
/// on its own; its countdown only exists so the host can display and
/// query it per cell.
#[derive(Component, Clone, Copy, Debug, Serialize, Deserialize)]
pub struct ProxyState {
    pub open: bool,
    pub forbidden: bool,
    /// Always true: followers never run their own auto-close policy.
    pub hold_open: bool,
    pub ticks_until_close: u32,
}

/// Create one proxy per footprint cell and register each with the
/// one-edifice-per-cell layer. If something already stands inside the
/// footprint the door is forced open first, so a freshly placed door can
/// never trap it.
#[allow(clippy::too_many_arguments)]
pub fn spawn_proxies(
    commands: &mut Commands,
    edifice: &mut EdificeGrid,
    reach: &mut ReachabilityCache,
    occupancy: &OccupancyGrid,
    ids: &mut SimIdFactory,
    owner: Entity,
    owner_id: &SimId,
    kind: DoorKind,
    footprint: &CellRect,
    faction: Option<FactionId>,
    state: &mut DoorState,
    proxies: &mut DoorProxies,
) {
    if !state.open && occupancy.any_in(footprint.cells()) {
        debug!("door {} placed over an occupant, forcing open", owner_id);
        state.open = true;
    }

    for cell in footprint.cells() {
        let proxy_id = ids.next("proxy");
        let proxy = commands
            .spawn((
                proxy_id,
                ProxyBarrier { owner, cell },
                ProxyState {
                    open: state.open,
                    forbidden: state.forbidden,
                    hold_open: true,
                    ticks_until_close: 0,
                },
            ))
            .id();
        if let Some(faction) = faction {
            commands.entity(proxy).insert(DoorFaction(faction));
        }
        if let Err(err) = edifice.register(cell, proxy) {
            // Another edifice owns the cell; keep the proxy so the set
            // stays footprint-sized and let the host sort the overlap out.
            warn!("proxy of door {} not registered: {}", owner_id, err);
        }
        proxies.0.push(proxy);
    }
    state.synced_forbidden = state.forbidden;

    let passable = kind.always_passable() || state.open;
    for cell in footprint.cells() {
        reach.set_blocked(cell, !passable);
    }
    reach.invalidate(footprint.cells());
}

/// Destroy every proxy before the owner goes away. Vanish semantics: no
/// debris, no effects, just removal and cache cleanup.
pub fn despawn_proxies(
    commands: &mut Commands,
    edifice: &mut EdificeGrid,
    reach: &mut ReachabilityCache,
    footprint: &CellRect,
    proxies: &mut DoorProxies,
) {
    for proxy in proxies.0.drain(..) {
        edifice.unregister_entity(proxy);
        commands.entity(proxy).despawn();
    }
    for cell in footprint.cells() {
        reach.set_blocked(cell, false);
    }
    reach.invalidate(footprint.cells());
}
