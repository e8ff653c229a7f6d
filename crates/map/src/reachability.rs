//! Region map over passable cells.
//!
//! The connectivity consumers (hauling, traffic planning, "can anything get
//! there at all" checks) ask whether two cells share a region instead of
//! pathfinding between them. Barriers flip cells between blocked and open
//! and invalidate; the rebuild runs lazily, once per tick at most.

use bevy::prelude::*;
use pathfinding::directed::bfs::bfs_reach;
use std::collections::{BTreeMap, BTreeSet};

use crate::grid::{CellRect, GridPos};

#[derive(Resource, Clone)]
pub struct ReachabilityCache {
    /// World rectangle the region map covers.
    pub bounds: CellRect,
    blocked: BTreeSet<GridPos>,
    regions: BTreeMap<GridPos, u32>,
    dirty: BTreeSet<GridPos>,
    /// Rebuilds performed so far; diagnostics only.
    pub rebuild_count: u64,
}

impl Default for ReachabilityCache {
    fn default() -> Self {
        Self {
            bounds: CellRect::new(GridPos::new(0, 0), 64, 64),
            blocked: BTreeSet::new(),
            regions: BTreeMap::new(),
            dirty: BTreeSet::new(),
            rebuild_count: 0,
        }
    }
}

impl ReachabilityCache {
    pub fn with_bounds(bounds: CellRect) -> Self {
        Self {
            bounds,
            ..Default::default()
        }
    }

    /// Flip a cell between blocked and passable. Does not invalidate on its
    /// own; callers batch [`Self::invalidate`] after the flips.
    pub fn set_blocked(&mut self, cell: GridPos, blocked: bool) {
        if blocked {
            self.blocked.insert(cell);
        } else {
            self.blocked.remove(&cell);
        }
    }

    pub fn is_blocked(&self, cell: GridPos) -> bool {
        self.blocked.contains(&cell)
    }

    /// Mark cells whose passability classification changed. Region ids
    /// stay stale until the next rebuild.
    pub fn invalidate(&mut self, cells: impl IntoIterator<Item = GridPos>) {
        self.dirty.extend(cells);
    }

    pub fn is_dirty(&self) -> bool {
        !self.dirty.is_empty()
    }

    /// Region id of a passable cell; `None` for blocked or out-of-bounds.
    pub fn region(&self, cell: GridPos) -> Option<u32> {
        self.regions.get(&cell).copied()
    }

    pub fn same_region(&self, a: GridPos, b: GridPos) -> bool {
        match (self.region(a), self.region(b)) {
            (Some(ra), Some(rb)) => ra == rb,
            _ => false,
        }
    }

    /// Distinct region ids currently known.
    pub fn region_count(&self) -> usize {
        self.regions
            .values()
            .copied()
            .collect::<BTreeSet<_>>()
            .len()
    }

    /// Recompute every region inside the bounds. Region ids are assigned in
    /// row-major discovery order, so identical worlds yield identical maps.
    pub fn rebuild(&mut self) {
        self.regions.clear();
        let bounds = self.bounds;
        let blocked = &self.blocked;
        let regions = &mut self.regions;
        let mut next_region = 0u32;

        for cell in bounds.cells() {
            if blocked.contains(&cell) || regions.contains_key(&cell) {
                continue;
            }
            let id = next_region;
            next_region += 1;
            for reached in bfs_reach(cell, |p: &GridPos| {
                p.neighbors_4()
                    .into_iter()
                    .filter(|n| bounds.contains(*n) && !blocked.contains(n))
                    .collect::<Vec<_>>()
            }) {
                regions.insert(reached, id);
            }
        }

        self.dirty.clear();
        self.rebuild_count += 1;
    }
}

/// Rebuild the region map when anything invalidated it this tick.
pub fn rebuild_reachability_system(mut cache: ResMut<ReachabilityCache>) {
    if !cache.is_dirty() {
        return;
    }
    cache.rebuild();
    debug!(
        "reachability rebuilt ({} regions known, rebuild #{})",
        cache.region_count(),
        cache.rebuild_count
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wall_cache() -> ReachabilityCache {
        // 5x3 world split by a wall at x=2 with a doorway at (2, 1).
        let mut cache =
            ReachabilityCache::with_bounds(CellRect::new(GridPos::new(0, 0), 5, 3));
        for y in 0..3 {
            cache.set_blocked(GridPos::new(2, y), true);
        }
        cache
    }

    #[test]
    fn closed_gap_splits_regions() {
        let mut cache = wall_cache();
        cache.rebuild();
        assert_eq!(cache.region_count(), 2);
        assert!(!cache.same_region(GridPos::new(0, 1), GridPos::new(4, 1)));
        assert_eq!(cache.region(GridPos::new(2, 1)), None);
    }

    #[test]
    fn open_gap_merges_regions() {
        let mut cache = wall_cache();
        cache.set_blocked(GridPos::new(2, 1), false);
        cache.rebuild();
        assert_eq!(cache.region_count(), 1);
        assert!(cache.same_region(GridPos::new(0, 1), GridPos::new(4, 1)));
    }

    #[test]
    fn invalidate_marks_dirty_and_rebuild_clears_it() {
        let mut cache = wall_cache();
        assert!(!cache.is_dirty());
        cache.invalidate([GridPos::new(2, 1)]);
        assert!(cache.is_dirty());
        cache.rebuild();
        assert!(!cache.is_dirty());
        assert_eq!(cache.rebuild_count, 1);
    }
}
