use bevy::prelude::SystemSet;

/// One pass of the barrier layer per host update, in this order.
#[derive(SystemSet, Debug, Hash, PartialEq, Eq, Clone, Copy)]
pub enum DoorSimSet {
    Occupancy,
    Approach,
    Commands,
    DoorTick,
    Reachability,
}
