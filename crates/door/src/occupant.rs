//! Minimal occupant model: enough of the host's mover side to answer the
//! questions the barrier layer asks (who stands where, who is hostile to
//! whom, how urgent is this mover).

use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use map::grid::GridPos;
use utils::order_iter;
use utils::sim_id::SimId;

pub type FactionId = usize;

/// Movement urgency classes; slower paces earn a longer close grace.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Default, Reflect)]
pub enum MovePace {
    Idle,
    Amble,
    #[default]
    Walk,
    Jog,
    Sprint,
}

impl MovePace {
    pub fn urgency_bonus(self) -> f32 {
        match self {
            MovePace::Idle | MovePace::Amble => 1.5,
            MovePace::Walk => 0.75,
            MovePace::Jog | MovePace::Sprint => 0.0,
        }
    }
}

/// A mover the host simulates. The barrier layer only reads this.
#[derive(Component, Clone, Debug, Serialize, Deserialize)]
pub struct Occupant {
    pub faction: Option<FactionId>,
    pub pace: MovePace,
    /// 1.0 = unimpaired. Below 1.0 the close grace window stretches.
    pub movement_capacity: f32,
    /// Member of a group explicitly permitted to open any door.
    pub can_open_any_door: bool,
    pub escorted_guest: bool,
    pub mechanical_exempt: bool,
}

impl Default for Occupant {
    fn default() -> Self {
        Self {
            faction: None,
            pace: MovePace::Walk,
            movement_capacity: 1.0,
            can_open_any_door: false,
            escorted_guest: false,
            mechanical_exempt: false,
        }
    }
}

/// Cell the occupant stands in, plus where it stood last tick. The host
/// moves `cell`; the settle system copies it into `prev` at end of tick.
#[derive(Component, Clone, Copy, Debug, Default)]
pub struct CellPosition {
    pub cell: GridPos,
    pub prev: GridPos,
}

impl CellPosition {
    pub fn at(cell: GridPos) -> Self {
        Self { cell, prev: cell }
    }
}

/// Pairwise hostility matrix indexed by faction id. Unlisted pairs and
/// factionless parties are never hostile.
#[derive(Resource, Clone)]
pub struct FactionRelations {
    pub matrix: [[bool; 8]; 8],
}

impl Default for FactionRelations {
    fn default() -> Self {
        Self {
            matrix: [[false; 8]; 8],
        }
    }
}

impl FactionRelations {
    pub fn set_hostile(&mut self, a: FactionId, b: FactionId) {
        self.matrix[a][b] = true;
        self.matrix[b][a] = true;
    }

    pub fn hostile(&self, a: Option<FactionId>, b: Option<FactionId>) -> bool {
        match (a, b) {
            (Some(a), Some(b)) => self
                .matrix
                .get(a)
                .and_then(|row| row.get(b))
                .copied()
                .unwrap_or(false),
            _ => false,
        }
    }
}

/// Per-cell occupant index, rebuilt from [`CellPosition`] every tick so
/// footprint checks are lookups instead of full scans.
#[derive(Resource, Default, Clone)]
pub struct OccupancyGrid {
    cells: BTreeMap<GridPos, Vec<(Entity, Option<FactionId>)>>,
}

impl OccupancyGrid {
    pub fn clear(&mut self) {
        self.cells.clear();
    }

    pub fn insert(&mut self, cell: GridPos, entity: Entity, faction: Option<FactionId>) {
        self.cells.entry(cell).or_default().push((entity, faction));
    }

    pub fn at(&self, cell: GridPos) -> impl Iterator<Item = &(Entity, Option<FactionId>)> {
        self.cells.get(&cell).into_iter().flatten()
    }

    pub fn any_at(&self, cell: GridPos) -> bool {
        self.cells.get(&cell).is_some_and(|v| !v.is_empty())
    }

    pub fn any_in(&self, cells: impl IntoIterator<Item = GridPos>) -> bool {
        cells.into_iter().any(|cell| self.any_at(cell))
    }

    pub fn contains(&self, cell: GridPos, entity: Entity) -> bool {
        self.at(cell).any(|(e, _)| *e == entity)
    }
}

pub fn sync_occupancy_system(
    mut grid: ResMut<OccupancyGrid>,
    occupants: Query<(&SimId, Entity, &Occupant, &CellPosition)>,
) {
    grid.clear();
    for (_, entity, occupant, pos) in order_iter!(occupants) {
        grid.insert(pos.cell, entity, occupant.faction);
    }
}

/// End-of-tick: remember where everyone stood so approach detection can
/// see movement next tick.
pub fn settle_positions_system(mut occupants: Query<&mut CellPosition>) {
    for mut pos in &mut occupants {
        pos.prev = pos.cell;
    }
}
