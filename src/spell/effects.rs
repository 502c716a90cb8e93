//! Spell Effects
//!
//! The atomic actions a spell performs on a resolved target. Effect values
//! stored in a composed spell are already scaled by the cast method's
//! strength multiplier; augments that need a different strength for an
//! extra target scale a fresh clone, never the stored instance.

use std::fmt;

use bevy::prelude::*;

use crate::combat::target::{CombatTarget, CombatWorld};

/// An action applied to a single target.
pub trait SpellEffect: Send + Sync + fmt::Debug {
    /// Registry key of this variant.
    fn type_key(&self) -> &'static str;

    /// Scale the effect's magnitude. Repeated calls compound.
    fn apply_strength_multiplier(&mut self, multiplier: f32);

    /// Primary magnitude (damage, healing, force or mana burned).
    fn magnitude(&self) -> f32;

    /// Perform the effect. A missing or despawned target makes this a no-op.
    fn apply(&self, source: Entity, target: Option<Entity>, world: &mut dyn CombatWorld);

    fn description(&self) -> String;

    fn clone_box(&self) -> Box<dyn SpellEffect>;
}

impl Clone for Box<dyn SpellEffect> {
    fn clone(&self) -> Self {
        self.clone_box()
    }
}

/// Clone `effect` and scale the copy.
pub fn scaled(effect: &dyn SpellEffect, multiplier: f32) -> Box<dyn SpellEffect> {
    let mut copy = effect.clone_box();
    copy.apply_strength_multiplier(multiplier);
    copy
}

/// Unit direction from `source` to `target`, tilted upward by `vertical_influence`.
///
/// Falls back to the source's facing when both share a position (self-cast).
fn push_direction(
    world: &dyn CombatWorld,
    source: Entity,
    target: Entity,
    vertical_influence: f32,
) -> Option<Vec3> {
    let source = world.snapshot(source)?;
    let target_pos = world.position_of(target)?;

    let mut flat = (target_pos - source.position).normalize_or_zero();
    if flat == Vec3::ZERO {
        flat = source.forward();
    }
    let direction = (flat + Vec3::Y * vertical_influence).normalize_or_zero();
    (direction != Vec3::ZERO).then_some(direction)
}

fn resolve_target(world: &mut dyn CombatWorld, target: Option<Entity>) -> Option<&mut dyn CombatTarget> {
    world.target_mut(target?)
}

// ============================================================================
// Damage
// ============================================================================

#[derive(Clone, Debug, PartialEq)]
pub struct DamageEffect {
    pub amount: f32,
}

impl Default for DamageEffect {
    fn default() -> Self {
        Self { amount: 15.0 }
    }
}

impl SpellEffect for DamageEffect {
    fn type_key(&self) -> &'static str {
        "damage"
    }

    fn apply_strength_multiplier(&mut self, multiplier: f32) {
        self.amount *= multiplier;
    }

    fn magnitude(&self) -> f32 {
        self.amount
    }

    fn apply(&self, source: Entity, target: Option<Entity>, world: &mut dyn CombatWorld) {
        let Some(target) = resolve_target(world, target) else {
            return;
        };
        let dealt = target.take_damage(self.amount, Some(source));
        debug!("Damage: {:.1} to {:?}", dealt, target.entity());
    }

    fn description(&self) -> String {
        format!("Deals {:.0} damage", self.amount)
    }

    fn clone_box(&self) -> Box<dyn SpellEffect> {
        Box::new(self.clone())
    }
}

// ============================================================================
// Heal
// ============================================================================

#[derive(Clone, Debug, PartialEq)]
pub struct HealEffect {
    pub amount: f32,
}

impl Default for HealEffect {
    fn default() -> Self {
        Self { amount: 15.0 }
    }
}

impl SpellEffect for HealEffect {
    fn type_key(&self) -> &'static str {
        "heal"
    }

    fn apply_strength_multiplier(&mut self, multiplier: f32) {
        self.amount *= multiplier;
    }

    fn magnitude(&self) -> f32 {
        self.amount
    }

    fn apply(&self, _source: Entity, target: Option<Entity>, world: &mut dyn CombatWorld) {
        let Some(target) = resolve_target(world, target) else {
            return;
        };
        let restored = target.heal(self.amount);
        debug!("Heal: {:.1} on {:?}", restored, target.entity());
    }

    fn description(&self) -> String {
        format!("Restores {:.0} health", self.amount)
    }

    fn clone_box(&self) -> Box<dyn SpellEffect> {
        Box::new(self.clone())
    }
}

// ============================================================================
// Push / Pull
// ============================================================================

#[derive(Clone, Debug, PartialEq)]
pub struct PushEffect {
    pub force: f32,
    /// Upward tilt added to the push direction before normalizing
    pub vertical_influence: f32,
}

impl Default for PushEffect {
    fn default() -> Self {
        Self {
            force: 10.0,
            vertical_influence: 0.2,
        }
    }
}

impl SpellEffect for PushEffect {
    fn type_key(&self) -> &'static str {
        "push"
    }

    fn apply_strength_multiplier(&mut self, multiplier: f32) {
        self.force *= multiplier;
    }

    fn magnitude(&self) -> f32 {
        self.force
    }

    fn apply(&self, source: Entity, target: Option<Entity>, world: &mut dyn CombatWorld) {
        let Some(target) = target else {
            return;
        };
        let Some(direction) = push_direction(world, source, target, self.vertical_influence) else {
            return;
        };
        if let Some(target) = world.target_mut(target) {
            target.apply_force(direction, self.force);
        }
    }

    fn description(&self) -> String {
        format!("Pushes the target away with {:.0} force", self.force)
    }

    fn clone_box(&self) -> Box<dyn SpellEffect> {
        Box::new(self.clone())
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct PullEffect {
    pub force: f32,
    pub vertical_influence: f32,
}

impl Default for PullEffect {
    fn default() -> Self {
        Self {
            force: 10.0,
            vertical_influence: 0.1,
        }
    }
}

impl SpellEffect for PullEffect {
    fn type_key(&self) -> &'static str {
        "pull"
    }

    fn apply_strength_multiplier(&mut self, multiplier: f32) {
        self.force *= multiplier;
    }

    fn magnitude(&self) -> f32 {
        self.force
    }

    fn apply(&self, source: Entity, target: Option<Entity>, world: &mut dyn CombatWorld) {
        let Some(target) = target else {
            return;
        };
        let Some(away) = push_direction(world, source, target, 0.0) else {
            return;
        };
        let direction = (-away + Vec3::Y * self.vertical_influence).normalize_or_zero();
        if let Some(target) = world.target_mut(target) {
            target.apply_force(direction, self.force);
        }
    }

    fn description(&self) -> String {
        format!("Pulls the target in with {:.0} force", self.force)
    }

    fn clone_box(&self) -> Box<dyn SpellEffect> {
        Box::new(self.clone())
    }
}

// ============================================================================
// Leech
// ============================================================================

/// Damages the target and heals the caster for part of the damage dealt.
#[derive(Clone, Debug, PartialEq)]
pub struct LeechEffect {
    pub damage: f32,
    /// Fraction of dealt damage returned to the caster (0.5 = 50%)
    pub lifesteal_percent: f32,
}

impl Default for LeechEffect {
    fn default() -> Self {
        Self {
            damage: 10.0,
            lifesteal_percent: 0.5,
        }
    }
}

impl SpellEffect for LeechEffect {
    fn type_key(&self) -> &'static str {
        "leech"
    }

    fn apply_strength_multiplier(&mut self, multiplier: f32) {
        self.damage *= multiplier;
    }

    fn magnitude(&self) -> f32 {
        self.damage
    }

    fn apply(&self, source: Entity, target: Option<Entity>, world: &mut dyn CombatWorld) {
        let Some(target) = resolve_target(world, target) else {
            return;
        };
        let dealt = target.take_damage(self.damage, Some(source));

        let stolen = dealt * self.lifesteal_percent;
        if stolen > 0.0 {
            if let Some(caster) = world.target_mut(source) {
                caster.heal(stolen);
            }
        }
    }

    fn description(&self) -> String {
        format!(
            "Drains {:.0} health, returning {:.0}% to the caster",
            self.damage,
            self.lifesteal_percent * 100.0
        )
    }

    fn clone_box(&self) -> Box<dyn SpellEffect> {
        Box::new(self.clone())
    }
}

// ============================================================================
// Burn Mana
// ============================================================================

#[derive(Clone, Debug, PartialEq)]
pub struct BurnManaEffect {
    pub amount: f32,
}

impl Default for BurnManaEffect {
    fn default() -> Self {
        Self { amount: 20.0 }
    }
}

impl SpellEffect for BurnManaEffect {
    fn type_key(&self) -> &'static str {
        "burn_mana"
    }

    fn apply_strength_multiplier(&mut self, multiplier: f32) {
        self.amount *= multiplier;
    }

    fn magnitude(&self) -> f32 {
        self.amount
    }

    fn apply(&self, _source: Entity, target: Option<Entity>, world: &mut dyn CombatWorld) {
        let Some(target) = resolve_target(world, target) else {
            return;
        };
        if let Some(mana) = target.mana_mut() {
            mana.drain(self.amount);
        }
    }

    fn description(&self) -> String {
        format!("Burns {:.0} mana", self.amount)
    }

    fn clone_box(&self) -> Box<dyn SpellEffect> {
        Box::new(self.clone())
    }
}
