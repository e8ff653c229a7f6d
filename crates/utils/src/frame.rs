use bevy::prelude::*;

/// Simulation tick counter. One increment per host update.
#[derive(Resource, Default, Reflect, Hash, Clone, Copy)]
#[reflect(Hash)]
pub struct FrameCount {
    pub frame: u32,
}

impl std::fmt::Display for FrameCount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "t{}", self.frame)
    }
}

pub fn advance_frame_system(mut frame: ResMut<FrameCount>) {
    frame.frame += 1;
}
