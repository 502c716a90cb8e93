//! Combat components
//!
//! ECS-side state for everything spells can touch, and the adapter that
//! presents a set of combatants to the spell engine as a [`CombatWorld`].

use bevy::prelude::*;

use super::mana::ManaPool;
use super::status::{StatusEffect, StatusEffects};
use super::target::{CombatTarget, CombatWorld};
use crate::spell::body::ConjuredBody;
use crate::spell::crafting::ComposedSpell;
use crate::spell::resolution::CastStateMachine;

/// Fraction of knockback velocity kept after one second.
pub const VELOCITY_RETENTION_PER_SECOND: f32 = 0.05;

/// Core combatant state.
#[derive(Component, Clone, Debug)]
pub struct Combatant {
    pub name: String,
    pub health: f32,
    pub max_health: f32,
    pub mana: ManaPool,
    pub statuses: StatusEffects,
    /// Knockback velocity, integrated and damped every frame
    pub velocity: Vec3,
    /// Total damage taken this match
    pub damage_taken: f32,
    /// Total healing received this match
    pub healing_received: f32,
}

impl Combatant {
    pub fn new(name: impl Into<String>, max_health: f32, mana: ManaPool) -> Self {
        Self {
            name: name.into(),
            health: max_health,
            max_health,
            mana,
            statuses: StatusEffects::new(),
            velocity: Vec3::ZERO,
            damage_taken: 0.0,
            healing_received: 0.0,
        }
    }

    pub fn is_alive(&self) -> bool {
        self.health > 0.0
    }

    /// Apply damage amplified by Weakened; returns the damage actually taken.
    pub fn take_damage(&mut self, amount: f32) -> f32 {
        let amplified = amount.max(0.0) * self.statuses.damage_taken_multiplier();
        let dealt = amplified.min(self.health);
        self.health -= dealt;
        self.damage_taken += dealt;
        dealt
    }

    /// Returns the health actually restored.
    pub fn heal(&mut self, amount: f32) -> f32 {
        if !self.is_alive() {
            return 0.0;
        }
        let healed = amount.max(0.0).min(self.max_health - self.health);
        self.health += healed;
        self.healing_received += healed;
        healed
    }

    /// Move by the current knockback velocity (slowed by Slowed) and damp it.
    pub fn integrate_velocity(&mut self, dt: f32) -> Vec3 {
        let displacement = self.velocity * self.statuses.movement_multiplier() * dt;
        self.velocity *= VELOCITY_RETENTION_PER_SECOND.powf(dt);
        if self.velocity.length_squared() < 1e-6 {
            self.velocity = Vec3::ZERO;
        }
        displacement
    }
}

/// Equipped spell and its input state.
#[derive(Component, Clone, Debug)]
pub struct SpellCaster {
    pub spell: ComposedSpell,
    pub machine: CastStateMachine,
}

impl SpellCaster {
    pub fn new(spell: ComposedSpell) -> Self {
        Self {
            spell,
            machine: CastStateMachine::default(),
        }
    }
}

/// Marker for combatants whose death has already been recorded.
#[derive(Component)]
pub struct Defeated;

// ============================================================================
// CombatWorld adapter
// ============================================================================

/// Mutable view of one combatant for the duration of a system run.
pub struct CombatantView<'a> {
    pub entity: Entity,
    pub transform: Mut<'a, Transform>,
    pub combatant: Mut<'a, Combatant>,
}

impl CombatTarget for CombatantView<'_> {
    fn entity(&self) -> Entity {
        self.entity
    }

    fn position(&self) -> Vec3 {
        self.transform.translation
    }

    fn rotation(&self) -> Quat {
        self.transform.rotation
    }

    fn take_damage(&mut self, amount: f32, _source: Option<Entity>) -> f32 {
        self.combatant.take_damage(amount)
    }

    fn heal(&mut self, amount: f32) -> f32 {
        self.combatant.heal(amount)
    }

    fn apply_force(&mut self, direction: Vec3, magnitude: f32) {
        self.combatant.velocity += direction * magnitude;
    }

    fn apply_status(&mut self, status: StatusEffect) {
        self.combatant.statuses.apply(status);
    }

    fn mana_mut(&mut self) -> Option<&mut ManaPool> {
        Some(&mut self.combatant.mana)
    }
}

/// [`CombatWorld`] over a snapshot of queried combatants.
///
/// Bodies conjured through it are collected and spawned by the calling
/// system once resolution is over.
pub struct CombatantWorld<'a> {
    views: Vec<CombatantView<'a>>,
    conjured: Vec<ConjuredBody>,
}

impl<'a> CombatantWorld<'a> {
    pub fn new(views: impl IntoIterator<Item = CombatantView<'a>>) -> Self {
        Self {
            views: views.into_iter().collect(),
            conjured: Vec::new(),
        }
    }

    /// Bodies conjured since the last call.
    pub fn take_conjured(&mut self) -> Vec<ConjuredBody> {
        std::mem::take(&mut self.conjured)
    }

    pub fn is_stunned(&self, entity: Entity) -> bool {
        self.views
            .iter()
            .any(|v| v.entity == entity && v.combatant.statuses.is_stunned())
    }

    pub fn is_alive(&self, entity: Entity) -> bool {
        self.views
            .iter()
            .any(|v| v.entity == entity && v.combatant.is_alive())
    }

    pub fn name_of(&self, entity: Entity) -> String {
        self.views
            .iter()
            .find(|v| v.entity == entity)
            .map_or_else(|| format!("{:?}", entity), |v| v.combatant.name.clone())
    }
}

impl CombatWorld for CombatantWorld<'_> {
    fn target(&self, entity: Entity) -> Option<&dyn CombatTarget> {
        self.views
            .iter()
            .find(|v| v.entity == entity)
            .map(|v| v as &dyn CombatTarget)
    }

    fn target_mut(&mut self, entity: Entity) -> Option<&mut dyn CombatTarget> {
        self.views
            .iter_mut()
            .find(|v| v.entity == entity)
            .map(|v| v as &mut dyn CombatTarget)
    }

    fn targets_within(&self, center: Vec3, radius: f32) -> Vec<Entity> {
        let radius_squared = radius * radius;
        self.views
            .iter()
            .filter(|v| {
                v.combatant.is_alive()
                    && v.transform.translation.distance_squared(center) <= radius_squared
            })
            .map(|v| v.entity)
            .collect()
    }

    fn spawn_body(&mut self, body: ConjuredBody) {
        self.conjured.push(body);
    }
}
