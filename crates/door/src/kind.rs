use bevy::prelude::*;
use serde::{Deserialize, Serialize};

/// Barrier behavior variants. A tagged variant rather than a hierarchy:
/// the few policy differences hang off the methods below.
#[derive(Component, Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Reflect)]
pub enum DoorKind {
    /// Swings open for traffic and closes behind it.
    Standard,
    /// Curtain-class barrier: always physically passable, whatever the
    /// open flag happens to say.
    FreePassage,
    /// Swings both ways; opens as traffic approaches instead of slowing it.
    DoubleSwing,
    /// Accordion leaf stretched across the footprint; standard timing.
    Stretch,
    /// Lockable variant driven by linked control buttons.
    Remote,
}

impl DoorKind {
    /// Whether traffic has to wait on the leaf at all.
    pub fn slows_occupants(self) -> bool {
        !matches!(self, DoorKind::FreePassage | DoorKind::DoubleSwing)
    }

    /// FreePassage barriers never block, open flag notwithstanding.
    pub fn always_passable(self) -> bool {
        matches!(self, DoorKind::FreePassage)
    }
}

/// Per-door timing parameters, fixed at placement.
#[derive(Component, Clone, Copy, Debug, Serialize, Deserialize, Reflect)]
pub struct DoorTiming {
    /// Ticks for the leaf to travel fully open.
    pub base_open_ticks: u32,
    /// Close countdown loaded by a plain open request.
    pub close_delay_ticks: u32,
    /// Grace scaling on top of the occupant's touch factor; placement sets
    /// this from the footprint's longest side so wide doors linger longer.
    pub grace_multiplier: f32,
}

impl Default for DoorTiming {
    fn default() -> Self {
        Self {
            base_open_ticks: 45,
            close_delay_ticks: 110,
            grace_multiplier: 1.0,
        }
    }
}

impl DoorTiming {
    /// Timing for a door spanning `longest_side` cells.
    pub fn sized(longest_side: u32) -> Self {
        Self {
            grace_multiplier: longest_side.max(1) as f32,
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn passage_kinds_do_not_slow() {
        assert!(DoorKind::Standard.slows_occupants());
        assert!(DoorKind::Stretch.slows_occupants());
        assert!(DoorKind::Remote.slows_occupants());
        assert!(!DoorKind::FreePassage.slows_occupants());
        assert!(!DoorKind::DoubleSwing.slows_occupants());
        assert!(DoorKind::FreePassage.always_passable());
        assert!(!DoorKind::DoubleSwing.always_passable());
    }

    #[test]
    fn sized_timing_scales_grace() {
        assert_eq!(DoorTiming::sized(3).grace_multiplier, 3.0);
        assert_eq!(DoorTiming::sized(0).grace_multiplier, 1.0);
    }
}
