use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;

pub type SimIdRaw = u64;

/// Stable identity for a simulation entity. The raw counter survives
/// save/load, unlike `Entity`, so persisted references go through it.
#[derive(Component, Reflect, Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Hash)]
pub struct SimId(pub SimIdRaw, pub String);

impl fmt::Display for SimId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.1, self.0)
    }
}

#[derive(Resource, Debug, Clone, Copy, Default)]
pub struct SimIdFactory {
    counter: SimIdRaw,
}

impl SimIdFactory {
    pub fn next(&mut self, name: &str) -> SimId {
        self.counter += 1;
        SimId(self.counter, name.to_owned())
    }

    /// Raise the counter past externally supplied ids (loading a save)
    /// so future ids cannot collide with them.
    pub fn bump_past(&mut self, floor: SimIdRaw) {
        self.counter = self.counter.max(floor);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn factory_counts_up() {
        let mut factory = SimIdFactory::default();
        let a = factory.next("door");
        let b = factory.next("proxy");
        assert_eq!(a.0, 1);
        assert_eq!(b.0, 2);
        assert_eq!(format!("{}", b), "proxy#2");
    }

    #[test]
    fn bump_past_prevents_collisions() {
        let mut factory = SimIdFactory::default();
        factory.bump_past(40);
        assert_eq!(factory.next("door").0, 41);
        factory.bump_past(10);
        assert_eq!(factory.next("door").0, 42);
    }
}
