//! Grid-world collaborators consumed by the barrier layer: integer cell
//! math, the one-edifice-per-cell registry, the multi-cell owner registry,
//! and the reachability region cache.

pub mod edifice;
pub mod grid;
pub mod reachability;

use bevy::prelude::*;

/// Installs the spatial registries and the region cache. The rebuild system
/// is scheduled by whoever owns the tick layout (the barrier plugin wires it
/// after its own tick), so this plugin only provides state.
pub struct GridWorldPlugin;

impl Plugin for GridWorldPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<edifice::EdificeGrid>()
            .init_resource::<edifice::BuildingGrid>()
            .init_resource::<reachability::ReachabilityCache>();
    }
}
