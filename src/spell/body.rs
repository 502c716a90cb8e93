//! Conjured Bodies
//!
//! A conjured body is the physical carrier of a Conjure-form spell. It owns
//! clones of the spell's effects and augment, is moved by its motion behavior
//! every tick, and delivers the spell when it overlaps a combat target.
//!
//! ## Lifecycle
//! 1. [`ConjuredBody::conjure`] places it in front of the caster
//! 2. [`ConjuredBody::tick`] advances lifetime and motion (or follows the
//!    entity it is stuck to)
//! 3. [`ConjuredBody::resolve_collisions`] delivers the spell to overlapping
//!    targets and runs the impact behavior
//! 4. The host despawns it once [`ConjuredBody::is_finished`] is true
//!
//! The caster is never struck by its own body.

use bevy::prelude::*;
use smallvec::SmallVec;

use super::augments::{AugmentReport, AugmentStrategy};
use super::composition::GeometricBody;
use super::crafting::ComposedSpell;
use super::domain::Domain;
use super::effects::SpellEffect;
use super::impact::{CollisionInfo, ImpactBehavior};
use super::motion::{BodyState, MotionBehavior, Tracking};
use super::rng::SpellRng;
use crate::combat::target::{CombatWorld, TargetSnapshot};

/// Collision radius assumed for combat targets.
pub const TARGET_RADIUS: f32 = 0.5;

#[derive(Component, Clone, Debug)]
pub struct ConjuredBody {
    pub source: Entity,
    pub target: Option<Entity>,
    pub label: String,
    pub geometric: GeometricBody,
    pub state: BodyState,
    pub effects: Vec<Box<dyn SpellEffect>>,
    pub augment: Box<dyn AugmentStrategy>,
    pub domains: SmallVec<[Domain; 4]>,
    pub motion: Box<dyn MotionBehavior>,
    pub impact: Box<dyn ImpactBehavior>,
    pub lifetime_remaining: f32,
    struck: Vec<Entity>,
}

impl ConjuredBody {
    /// Build a body for `spell`, or `None` if the spell is not a Conjure spell.
    pub fn conjure(
        spell: &ComposedSpell,
        source: &TargetSnapshot,
        target: Option<&TargetSnapshot>,
        spawn_offset: f32,
    ) -> Option<Self> {
        let conjure = spell.conjure.as_ref()?;

        let mut state = BodyState::at(
            source.position + source.forward() * spawn_offset,
            source.rotation,
        );
        let mut motion = conjure.motion.clone();
        motion.initialize(&mut state, source, target);

        Some(Self {
            source: source.entity,
            target: target.map(|t| t.entity),
            label: spell.label.clone(),
            geometric: conjure.geometric.clone(),
            state,
            effects: spell.effects.clone(),
            augment: spell.augment.clone(),
            domains: spell.domains.clone(),
            motion,
            impact: conjure.impact.clone(),
            lifetime_remaining: conjure.lifetime,
            struck: Vec::new(),
        })
    }

    pub fn position(&self) -> Vec3 {
        self.state.position
    }

    pub fn radius(&self) -> f32 {
        self.geometric.radius
    }

    /// Targets this body has already delivered its spell to.
    pub fn struck(&self) -> &[Entity] {
        &self.struck
    }

    pub fn is_finished(&self) -> bool {
        self.state.despawn_requested || self.lifetime_remaining <= 0.0
    }

    /// Advance lifetime and motion by `dt`.
    ///
    /// `pose_of` resolves the live pose of any entity the body tracks
    /// (caster, target, or the entity it is stuck to).
    pub fn tick(&mut self, dt: f32, pose_of: impl Fn(Entity) -> Option<(Vec3, Quat)>) {
        if self.is_finished() {
            return;
        }
        self.lifetime_remaining -= dt;

        if let Some(attachment) = self.state.attachment {
            match pose_of(attachment.entity) {
                Some((position, rotation)) => {
                    let (position, rotation) = attachment.world_pose(position, rotation);
                    self.state.position = position;
                    self.state.rotation = rotation;
                }
                // Whatever we were stuck to is gone
                None => self.state.despawn_requested = true,
            }
            return;
        }
        if self.state.frozen {
            return;
        }

        let tracking = Tracking {
            source: pose_of(self.source).map(|(p, _)| p),
            target: self.target.and_then(|t| pose_of(t)).map(|(p, _)| p),
        };
        self.motion.update_movement(&mut self.state, &tracking, dt);
    }

    pub fn can_strike(&self, entity: Entity) -> bool {
        entity != self.source
            && self.state.delivers_effects
            && !self.state.despawn_requested
            && !self.struck.contains(&entity)
    }

    /// Targets currently overlapping the body, nearest first.
    pub fn collision_candidates(&self, world: &dyn CombatWorld) -> Vec<CollisionInfo> {
        let reach = self.radius() + TARGET_RADIUS;
        let mut hits: Vec<CollisionInfo> = world
            .targets_within(self.state.position, reach)
            .into_iter()
            .filter(|&e| self.can_strike(e))
            .filter_map(|e| world.snapshot(e))
            .map(|snapshot| CollisionInfo {
                entity: snapshot.entity,
                entity_position: snapshot.position,
                entity_rotation: snapshot.rotation,
                point: self.state.position,
            })
            .collect();

        let origin = self.state.position;
        hits.sort_by(|a, b| {
            a.entity_position
                .distance_squared(origin)
                .total_cmp(&b.entity_position.distance_squared(origin))
                .then(a.entity.cmp(&b.entity))
        });
        hits
    }

    /// Deliver the spell to `hit` and run the impact behavior.
    ///
    /// Returns `None` when the body may not strike that entity.
    pub fn strike(
        &mut self,
        hit: &CollisionInfo,
        world: &mut dyn CombatWorld,
        rng: &mut SpellRng,
    ) -> Option<AugmentReport> {
        if !self.can_strike(hit.entity) {
            return None;
        }
        self.struck.push(hit.entity);

        let report = self.augment.apply(
            &self.effects,
            &self.domains,
            self.source,
            Some(hit.entity),
            Some(hit.point),
            world,
            rng,
        );
        self.impact.on_collision(&mut self.state, hit);
        Some(report)
    }

    /// Strike every overlapping target until the impact behavior stops the body.
    pub fn resolve_collisions(
        &mut self,
        world: &mut dyn CombatWorld,
        rng: &mut SpellRng,
    ) -> Vec<(Entity, AugmentReport)> {
        let mut delivered = Vec::new();
        for hit in self.collision_candidates(world) {
            if let Some(report) = self.strike(&hit, world, rng) {
                delivered.push((hit.entity, report));
            }
        }
        delivered
    }
}
