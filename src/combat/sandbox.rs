//! In-memory combat world
//!
//! [`Sandbox`] implements [`CombatWorld`] over a plain list of [`Dummy`]
//! targets, without an ECS. It records everything done to each dummy, which
//! makes it the natural harness for exercising spells from tests or tools.

use bevy::prelude::*;

use super::mana::ManaPool;
use super::status::{StatusEffect, StatusEffects};
use super::target::{CombatTarget, CombatWorld};
use crate::spell::augments::AugmentReport;
use crate::spell::body::ConjuredBody;
use crate::spell::rng::SpellRng;

/// A recording combat target.
#[derive(Clone, Debug)]
pub struct Dummy {
    pub entity: Entity,
    pub position: Vec3,
    pub rotation: Quat,
    pub health: f32,
    pub max_health: f32,
    pub mana: Option<ManaPool>,
    pub statuses: StatusEffects,
    /// Every force received, as (direction, magnitude)
    pub forces: Vec<(Vec3, f32)>,
    pub damage_taken: f32,
    pub healing_received: f32,
    /// Number of mutating calls received
    pub calls: usize,
}

impl Dummy {
    pub fn new(health: f32) -> Self {
        Self {
            entity: Entity::PLACEHOLDER,
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            health,
            max_health: health,
            mana: None,
            statuses: StatusEffects::new(),
            forces: Vec::new(),
            damage_taken: 0.0,
            healing_received: 0.0,
            calls: 0,
        }
    }

    pub fn at(mut self, position: Vec3) -> Self {
        self.position = position;
        self
    }

    /// Face `direction` (rotating from the default -Z forward).
    pub fn facing(mut self, direction: Vec3) -> Self {
        let direction = direction.normalize_or_zero();
        if direction != Vec3::ZERO {
            self.rotation = Quat::from_rotation_arc(Vec3::NEG_Z, direction);
        }
        self
    }

    pub fn with_mana(mut self, mana: ManaPool) -> Self {
        self.mana = Some(mana);
        self
    }

    pub fn is_alive(&self) -> bool {
        self.health > 0.0
    }
}

impl CombatTarget for Dummy {
    fn entity(&self) -> Entity {
        self.entity
    }

    fn position(&self) -> Vec3 {
        self.position
    }

    fn rotation(&self) -> Quat {
        self.rotation
    }

    fn take_damage(&mut self, amount: f32, _source: Option<Entity>) -> f32 {
        self.calls += 1;
        let amplified = amount.max(0.0) * self.statuses.damage_taken_multiplier();
        let dealt = amplified.min(self.health);
        self.health -= dealt;
        self.damage_taken += dealt;
        dealt
    }

    fn heal(&mut self, amount: f32) -> f32 {
        self.calls += 1;
        let healed = amount.max(0.0).min(self.max_health - self.health);
        self.health += healed;
        self.healing_received += healed;
        healed
    }

    fn apply_force(&mut self, direction: Vec3, magnitude: f32) {
        self.calls += 1;
        self.forces.push((direction, magnitude));
    }

    fn apply_status(&mut self, status: StatusEffect) {
        self.calls += 1;
        self.statuses.apply(status);
    }

    fn mana_mut(&mut self) -> Option<&mut ManaPool> {
        self.mana.as_mut()
    }
}

/// A [`CombatWorld`] of dummies and the bodies conjured among them.
#[derive(Debug, Default)]
pub struct Sandbox {
    dummies: Vec<Dummy>,
    bodies: Vec<ConjuredBody>,
    next_index: u32,
}

impl Sandbox {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a dummy and return its assigned identity.
    pub fn add(&mut self, mut dummy: Dummy) -> Entity {
        let entity = Entity::from_raw(self.next_index);
        self.next_index += 1;
        dummy.entity = entity;
        self.dummies.push(dummy);
        entity
    }

    pub fn dummy(&self, entity: Entity) -> Option<&Dummy> {
        self.dummies.iter().find(|d| d.entity == entity)
    }

    pub fn dummy_mut(&mut self, entity: Entity) -> Option<&mut Dummy> {
        self.dummies.iter_mut().find(|d| d.entity == entity)
    }

    pub fn dummies(&self) -> &[Dummy] {
        &self.dummies
    }

    pub fn bodies(&self) -> &[ConjuredBody] {
        &self.bodies
    }

    pub fn bodies_mut(&mut self) -> &mut [ConjuredBody] {
        &mut self.bodies
    }

    /// Advance statuses, mana and conjured bodies by `dt`.
    ///
    /// Returns every spell delivery made by a body during the step.
    pub fn step(&mut self, dt: f32, rng: &mut SpellRng) -> Vec<(Entity, AugmentReport)> {
        for dummy in &mut self.dummies {
            let tick = dummy.statuses.tick(dt);
            if tick.damage > 0.0 {
                let dealt = tick.damage.min(dummy.health);
                dummy.health -= dealt;
                dummy.damage_taken += dealt;
            }
            if let Some(mana) = dummy.mana.as_mut() {
                mana.tick(dt);
            }
        }

        let mut bodies = std::mem::take(&mut self.bodies);
        let mut delivered = Vec::new();
        for body in &mut bodies {
            let dummies = &self.dummies;
            body.tick(dt, |entity| {
                dummies
                    .iter()
                    .find(|d| d.entity == entity)
                    .map(|d| (d.position, d.rotation))
            });
            if !body.is_finished() {
                delivered.extend(body.resolve_collisions(self, rng));
            }
        }
        bodies.retain(|b| !b.is_finished());

        // Bodies conjured during the step were pushed onto the empty list
        bodies.append(&mut self.bodies);
        self.bodies = bodies;
        delivered
    }
}

impl CombatWorld for Sandbox {
    fn target(&self, entity: Entity) -> Option<&dyn CombatTarget> {
        self.dummy(entity).map(|d| d as &dyn CombatTarget)
    }

    fn target_mut(&mut self, entity: Entity) -> Option<&mut dyn CombatTarget> {
        self.dummy_mut(entity).map(|d| d as &mut dyn CombatTarget)
    }

    fn targets_within(&self, center: Vec3, radius: f32) -> Vec<Entity> {
        let radius_squared = radius * radius;
        self.dummies
            .iter()
            .filter(|d| d.is_alive() && d.position.distance_squared(center) <= radius_squared)
            .map(|d| d.entity)
            .collect()
    }

    fn spawn_body(&mut self, body: ConjuredBody) {
        self.bodies.push(body);
    }
}
