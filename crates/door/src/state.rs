//! Barrier state and the pure predicates the host engine consumes.

use bevy::prelude::*;
use std::collections::BTreeSet;

use map::grid::CellRect;

use crate::config::DoorTuning;
use crate::kind::{DoorKind, DoorTiming};
use crate::occupant::{FactionId, FactionRelations, Occupant, OccupancyGrid};
use crate::remote::{LockState, RemoteLock};

/// Faction owning a door. Absent = unowned, anyone may operate it.
#[derive(Component, Clone, Copy, Debug, PartialEq, Eq, Reflect)]
pub struct DoorFaction(pub FactionId);

/// Host power feed. The host flips it; this layer only reads it.
#[derive(Component, Clone, Copy, Debug, Reflect)]
pub struct Powered(pub bool);

impl Default for Powered {
    fn default() -> Self {
        Powered(true)
    }
}

/// Exclusively owned list of proxy entities, one per footprint cell while
/// spawned. Created and destroyed together with the owner.
#[derive(Component, Clone, Debug, Default)]
pub struct DoorProxies(pub Vec<Entity>);

/// Mutable state of one logical door. Everything the proxies mirror is
/// pushed down from here; nothing flows back up.
#[derive(Component, Clone, Debug)]
pub struct DoorState {
    pub open: bool,
    pub hold_open: bool,
    pub ticks_until_close: u32,
    /// Tick of the last non-hostile touch; `None` until someone friendly
    /// has ever approached.
    pub last_friendly_touch_tick: Option<u32>,
    /// Grace scaling earned by the slowest recent friendly toucher.
    pub touch_grace_factor: f32,
    /// Movers currently credited with a crossing. Unique, order irrelevant.
    pub crossing_occupants: BTreeSet<Entity>,
    /// Pathing-avoidance flag, mirrored down to every proxy.
    pub forbidden: bool,
    /// Last forbidden value actually pushed to the proxies.
    pub synced_forbidden: bool,
    /// Free-passage value captured at the last connectivity invalidation.
    pub passability_baseline: Option<bool>,
    /// Leaf animation progress in ticks; the rendering collaborator reads
    /// it, nothing in this layer depends on it.
    pub visual_open_ticks: u32,
}

impl Default for DoorState {
    fn default() -> Self {
        Self {
            open: false,
            hold_open: false,
            ticks_until_close: 0,
            last_friendly_touch_tick: None,
            touch_grace_factor: 1.0,
            crossing_occupants: BTreeSet::new(),
            forbidden: false,
            synced_forbidden: false,
            passability_baseline: None,
            visual_open_ticks: 0,
        }
    }
}

impl DoorState {
    /// Whether a friendly touch still suppresses the automatic close.
    pub fn friendly_touch_active(&self, now: u32, tuning: &DoorTuning, timing: &DoorTiming) -> bool {
        let Some(last) = self.last_friendly_touch_tick else {
            return false;
        };
        let window =
            (tuning.friendly_grace_ticks as f32 * self.touch_grace_factor * timing.grace_multiplier)
                as u32;
        now < last.saturating_add(window)
    }
}

/// Borrowed view over one door's components plus the shared lookups the
/// passability predicates need. Systems assemble one per door and drop it
/// before mutating.
pub struct DoorView<'a> {
    pub kind: DoorKind,
    pub timing: &'a DoorTiming,
    pub state: &'a DoorState,
    pub footprint: &'a CellRect,
    pub faction: Option<FactionId>,
    pub lock: Option<&'a RemoteLock>,
}

impl DoorView<'_> {
    /// Capability check, no side effects.
    pub fn pawn_can_open(&self, occupant: &Occupant) -> bool {
        if self.kind.always_passable() {
            return true;
        }
        if let Some(lock) = self.lock {
            if lock.secured && lock.state != LockState::ForcedOpen {
                return false;
            }
        }
        occupant.can_open_any_door
            || occupant.escorted_guest
            || occupant.mechanical_exempt
            || self.faction.is_none()
    }

    pub fn blocks_pawn(&self, occupant: &Occupant) -> bool {
        if let Some(lock) = self.lock {
            if lock.secured && lock.state != LockState::ForcedOpen {
                return true;
            }
        }
        !self.kind.always_passable() && !self.state.open && !self.pawn_can_open(occupant)
    }

    /// Auto-close eligibility: nothing pins the door open and no friendly
    /// touch grace is running.
    pub fn can_close_automatically(&self, now: u32, tuning: &DoorTuning) -> bool {
        !self.state.hold_open && !self.state.friendly_touch_active(now, tuning, self.timing)
    }

    pub fn will_close_soon(
        &self,
        occupancy: &OccupancyGrid,
        relations: &FactionRelations,
        now: u32,
        tuning: &DoorTuning,
    ) -> bool {
        if !self.state.open {
            return true;
        }
        if self.state.hold_open {
            return false;
        }
        let ticks = self.state.ticks_until_close;
        if ticks > 0
            && ticks <= self.timing.close_delay_ticks
            && self.can_close_automatically(now, tuning)
        {
            return true;
        }
        // Non-hostile traffic inside or on the rim will trip the close
        // behind itself.
        let mut cells = self.footprint.cells();
        cells.extend(self.footprint.rim());
        for cell in cells {
            for (_, faction) in occupancy.at(cell) {
                if !relations.hostile(*faction, self.faction) {
                    return true;
                }
            }
        }
        false
    }

    pub fn free_passage(
        &self,
        occupancy: &OccupancyGrid,
        relations: &FactionRelations,
        now: u32,
        tuning: &DoorTuning,
    ) -> bool {
        self.kind.always_passable()
            || (self.state.open
                && (self.state.hold_open
                    || !self.will_close_soon(occupancy, relations, now, tuning)))
    }

    /// The host's movement query: passable right now for this occupant.
    pub fn can_physically_pass(
        &self,
        occupant: &Occupant,
        hostile: bool,
        occupancy: &OccupancyGrid,
        relations: &FactionRelations,
        now: u32,
        tuning: &DoorTuning,
    ) -> bool {
        self.free_passage(occupancy, relations, now, tuning)
            || self.pawn_can_open(occupant)
            || (self.state.open && hostile)
    }
}
