//! Combat target capability
//!
//! The spell engine never touches a concrete entity type. Everything it can
//! affect is reached through [`CombatTarget`], and everything it needs from
//! the surrounding simulation (lookups, sphere queries, spawning bodies) goes
//! through [`CombatWorld`].

use bevy::prelude::*;

use super::mana::ManaPool;
use super::status::StatusEffect;
use crate::spell::body::ConjuredBody;

/// Anything a spell can damage, heal, push or afflict.
pub trait CombatTarget {
    /// Identity used to exclude already-hit targets.
    fn entity(&self) -> Entity;

    fn position(&self) -> Vec3;

    fn rotation(&self) -> Quat {
        Quat::IDENTITY
    }

    /// Direction the target is looking (unit length).
    fn forward(&self) -> Vec3 {
        self.rotation() * Vec3::NEG_Z
    }

    /// Returns the damage actually taken.
    fn take_damage(&mut self, amount: f32, source: Option<Entity>) -> f32;

    /// Returns the health actually restored.
    fn heal(&mut self, amount: f32) -> f32;

    fn apply_force(&mut self, direction: Vec3, magnitude: f32);

    fn apply_status(&mut self, status: StatusEffect);

    /// Mana pool, for targets that have one.
    fn mana_mut(&mut self) -> Option<&mut ManaPool> {
        None
    }
}

/// Position and facing of a target captured at one instant.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TargetSnapshot {
    pub entity: Entity,
    pub position: Vec3,
    pub rotation: Quat,
}

impl TargetSnapshot {
    pub fn of(target: &dyn CombatTarget) -> Self {
        Self {
            entity: target.entity(),
            position: target.position(),
            rotation: target.rotation(),
        }
    }

    pub fn forward(&self) -> Vec3 {
        self.rotation * Vec3::NEG_Z
    }
}

/// The simulation surrounding a cast.
pub trait CombatWorld {
    fn target(&self, entity: Entity) -> Option<&dyn CombatTarget>;

    fn target_mut(&mut self, entity: Entity) -> Option<&mut dyn CombatTarget>;

    /// All targets whose position lies within `radius` of `center`.
    fn targets_within(&self, center: Vec3, radius: f32) -> Vec<Entity>;

    /// Hand a freshly conjured body to the host for spawning.
    fn spawn_body(&mut self, body: ConjuredBody);

    fn snapshot(&self, entity: Entity) -> Option<TargetSnapshot> {
        self.target(entity).map(TargetSnapshot::of)
    }

    fn position_of(&self, entity: Entity) -> Option<Vec3> {
        self.target(entity).map(|t| t.position())
    }
}
