use bevy::prelude::*;
use std::collections::BTreeMap;
use thiserror::Error;

use crate::grid::{CellRect, GridPos};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("cell {cell:?} already holds an edifice")]
    CellOccupied { cell: GridPos },
}

/// The host's one-edifice-per-cell registry. Pathing and cover queries
/// resolve a cell to at most one structural entity through this layer;
/// anything spanning several cells registers one stand-in per cell.
#[derive(Resource, Default, Clone)]
pub struct EdificeGrid {
    cells: BTreeMap<GridPos, Entity>,
}

impl EdificeGrid {
    pub fn register(&mut self, cell: GridPos, entity: Entity) -> Result<(), RegistryError> {
        match self.cells.get(&cell) {
            Some(existing) if *existing != entity => Err(RegistryError::CellOccupied { cell }),
            _ => {
                self.cells.insert(cell, entity);
                Ok(())
            }
        }
    }

    /// Remove whatever cells map to `entity`. Safe against entities that
    /// were never registered.
    pub fn unregister_entity(&mut self, entity: Entity) {
        self.cells.retain(|_, e| *e != entity);
    }

    pub fn get(&self, cell: GridPos) -> Option<Entity> {
        self.cells.get(&cell).copied()
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

/// Multi-cell owners register their full rectangle here, co-resident with
/// the per-cell stand-ins in [`EdificeGrid`].
#[derive(Resource, Default, Clone)]
pub struct BuildingGrid {
    rects: BTreeMap<Entity, CellRect>,
}

impl BuildingGrid {
    pub fn register(&mut self, entity: Entity, rect: CellRect) {
        self.rects.insert(entity, rect);
    }

    pub fn unregister(&mut self, entity: Entity) {
        self.rects.remove(&entity);
    }

    pub fn rect_of(&self, entity: Entity) -> Option<CellRect> {
        self.rects.get(&entity).copied()
    }

    /// Owner standing on `cell`, if any.
    pub fn at(&self, cell: GridPos) -> Option<Entity> {
        self.rects
            .iter()
            .find(|(_, rect)| rect.contains(cell))
            .map(|(entity, _)| *entity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn double_registration_is_rejected() {
        let mut grid = EdificeGrid::default();
        let a = Entity::from_raw(1);
        let b = Entity::from_raw(2);
        let cell = GridPos::new(3, 3);

        assert!(grid.register(cell, a).is_ok());
        // Re-registering the same entity is idempotent.
        assert!(grid.register(cell, a).is_ok());
        assert_eq!(
            grid.register(cell, b),
            Err(RegistryError::CellOccupied { cell })
        );
    }

    #[test]
    fn unregister_entity_clears_all_cells() {
        let mut grid = EdificeGrid::default();
        let a = Entity::from_raw(1);
        grid.register(GridPos::new(0, 0), a).unwrap();
        grid.register(GridPos::new(1, 0), a).unwrap();
        grid.unregister_entity(a);
        assert!(grid.is_empty());
    }

    #[test]
    fn building_grid_resolves_cells_to_owner() {
        let mut grid = BuildingGrid::default();
        let owner = Entity::from_raw(7);
        grid.register(owner, CellRect::new(GridPos::new(2, 2), 3, 1));
        assert_eq!(grid.at(GridPos::new(4, 2)), Some(owner));
        assert_eq!(grid.at(GridPos::new(5, 2)), None);
        grid.unregister(owner);
        assert_eq!(grid.at(GridPos::new(4, 2)), None);
    }
}
