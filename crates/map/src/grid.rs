use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Grid cell coordinate.
/// Implements Ord for deterministic BTreeMap/BTreeSet ordering.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, Default, PartialOrd, Ord, Serialize, Deserialize, Reflect,
)]
pub struct GridPos {
    pub x: i32,
    pub y: i32,
}

impl GridPos {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Get 4-directional neighbors
    pub fn neighbors_4(&self) -> [GridPos; 4] {
        [
            GridPos::new(self.x + 1, self.y),
            GridPos::new(self.x - 1, self.y),
            GridPos::new(self.x, self.y + 1),
            GridPos::new(self.x, self.y - 1),
        ]
    }

    /// Manhattan distance to another grid position
    pub fn manhattan_distance(&self, other: &GridPos) -> i32 {
        (self.x - other.x).abs() + (self.y - other.y).abs()
    }
}

/// Axis-aligned rectangle of cells. Footprints of multi-cell structures,
/// world bounds, room extents.
#[derive(Component, Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Reflect)]
pub struct CellRect {
    pub min: GridPos,
    pub width: u32,
    pub height: u32,
}

impl CellRect {
    pub fn new(min: GridPos, width: u32, height: u32) -> Self {
        Self { min, width, height }
    }

    /// Single-cell rectangle.
    pub fn cell(at: GridPos) -> Self {
        Self::new(at, 1, 1)
    }

    /// Cells in row-major order. The order is part of the contract:
    /// consumers pair these with per-cell child lists.
    pub fn cells(&self) -> Vec<GridPos> {
        let mut cells = Vec::with_capacity((self.width * self.height) as usize);
        for dy in 0..self.height as i32 {
            for dx in 0..self.width as i32 {
                cells.push(GridPos::new(self.min.x + dx, self.min.y + dy));
            }
        }
        cells
    }

    pub fn contains(&self, p: GridPos) -> bool {
        p.x >= self.min.x
            && p.x < self.min.x + self.width as i32
            && p.y >= self.min.y
            && p.y < self.min.y + self.height as i32
    }

    pub fn longest_side(&self) -> u32 {
        self.width.max(self.height)
    }

    pub fn cell_count(&self) -> usize {
        (self.width * self.height) as usize
    }

    /// Cells outside the rectangle that share an edge with it.
    pub fn rim(&self) -> Vec<GridPos> {
        let mut rim = BTreeSet::new();
        for cell in self.cells() {
            for n in cell.neighbors_4() {
                if !self.contains(n) {
                    rim.insert(n);
                }
            }
        }
        rim.into_iter().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cells_are_row_major() {
        let rect = CellRect::new(GridPos::new(2, 5), 3, 1);
        let cells = rect.cells();
        assert_eq!(cells.len(), 3);
        assert_eq!(cells[0], GridPos::new(2, 5));
        assert_eq!(cells[2], GridPos::new(4, 5));
    }

    #[test]
    fn contains_is_half_open() {
        let rect = CellRect::new(GridPos::new(0, 0), 2, 2);
        assert!(rect.contains(GridPos::new(1, 1)));
        assert!(!rect.contains(GridPos::new(2, 0)));
        assert!(!rect.contains(GridPos::new(-1, 0)));
    }

    #[test]
    fn rim_excludes_interior() {
        let rect = CellRect::new(GridPos::new(0, 0), 1, 2);
        let rim = rect.rim();
        assert_eq!(rim.len(), 6);
        assert!(rim.iter().all(|c| !rect.contains(*c)));
        assert!(rim.contains(&GridPos::new(0, -1)));
        assert!(rim.contains(&GridPos::new(1, 1)));
    }
}
