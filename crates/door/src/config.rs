use bevy::prelude::*;
use serde::{Deserialize, Serialize};

/// Countdown value meaning "stay open until something else closes you".
pub const INDEFINITE_OPEN_TICKS: u32 = u32::MAX;

/// Global timing knobs for the barrier layer. Per-door numbers live in
/// [`crate::kind::DoorTiming`]; these are the shared cadences.
#[derive(Resource, Debug, Clone, Serialize, Deserialize)]
pub struct DoorTuning {
    /// Countdown used when an approach opens a door that does not slow
    /// its traffic.
    pub approach_open_ticks: u32,
    /// Base grace budget after a friendly touch, before the per-door
    /// grace factors scale it.
    pub friendly_grace_ticks: u32,
    /// How often crossing occupants are re-validated against the footprint.
    pub occupant_prune_interval: u32,
    /// Countdown pushed to every proxy while something stands in the
    /// footprint of an open door.
    pub occupied_refresh_ticks: u32,
    /// Environment-exchange cadence while closed (slow leak).
    pub equalize_closed_interval: u32,
    /// Environment-exchange cadence while open (fast mixing).
    pub equalize_open_interval: u32,
}

impl Default for DoorTuning {
    fn default() -> Self {
        Self {
            approach_open_ticks: 120,
            friendly_grace_ticks: 90,
            occupant_prune_interval: 30,
            occupied_refresh_ticks: 60,
            equalize_closed_interval: 375,
            equalize_open_interval: 34,
        }
    }
}
