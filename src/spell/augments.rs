//! Augment Strategies
//!
//! An augment decides *who* a spell's effects reach once the primary target
//! is known:
//! - **None**: the primary target only
//! - **Chain**: the primary target, then hops to the nearest unvisited
//!   target, weaker on every hop
//! - **Area of effect**: the primary target at full strength, plus everyone
//!   around the impact point with linear edge falloff
//!
//! Every target reached also rolls the spell's domain statuses.

use std::fmt;

use bevy::prelude::*;

use super::composition::SpellForm;
use super::domain::{apply_domain_effects, Domain};
use super::effects::{scaled, SpellEffect};
use super::rng::SpellRng;
use crate::combat::target::CombatWorld;

/// One target reached by an augment.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TargetHit {
    pub entity: Entity,
    pub strength: f32,
    /// Domain statuses that procced on this target
    pub statuses: usize,
}

/// Everything an augment application reached, in application order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct AugmentReport {
    pub hits: Vec<TargetHit>,
}

impl AugmentReport {
    pub fn targets(&self) -> impl Iterator<Item = Entity> + '_ {
        self.hits.iter().map(|h| h.entity)
    }

    pub fn strength_for(&self, entity: Entity) -> Option<f32> {
        self.hits.iter().find(|h| h.entity == entity).map(|h| h.strength)
    }

    pub fn is_empty(&self) -> bool {
        self.hits.is_empty()
    }
}

pub trait AugmentStrategy: Send + Sync + fmt::Debug {
    fn type_key(&self) -> &'static str;

    /// Forms this augment may be combined with.
    fn compatible_forms(&self) -> &'static [SpellForm];

    #[allow(clippy::too_many_arguments)]
    fn apply(
        &self,
        effects: &[Box<dyn SpellEffect>],
        domains: &[Domain],
        source: Entity,
        primary: Option<Entity>,
        impact_point: Option<Vec3>,
        world: &mut dyn CombatWorld,
        rng: &mut SpellRng,
    ) -> AugmentReport;

    fn description(&self) -> String;

    fn clone_box(&self) -> Box<dyn AugmentStrategy>;
}

impl Clone for Box<dyn AugmentStrategy> {
    fn clone(&self) -> Self {
        self.clone_box()
    }
}

/// Apply every effect to `target` at `strength`, then roll domain statuses.
///
/// Effects at full strength are applied as-is; anything else is applied
/// through a scaled copy so the spell's own effects are never mutated.
pub fn apply_to_target(
    effects: &[Box<dyn SpellEffect>],
    domains: &[Domain],
    source: Entity,
    target: Entity,
    strength: f32,
    world: &mut dyn CombatWorld,
    rng: &mut SpellRng,
) -> Option<TargetHit> {
    world.target(target)?;

    for effect in effects {
        if strength == 1.0 {
            effect.apply(source, Some(target), world);
        } else {
            scaled(effect.as_ref(), strength).apply(source, Some(target), world);
        }
    }
    let statuses = apply_domain_effects(domains, source, target, world, rng);

    Some(TargetHit {
        entity: target,
        strength,
        statuses,
    })
}

// ============================================================================
// None
// ============================================================================

#[derive(Clone, Debug, Default, PartialEq)]
pub struct NoAugment;

impl AugmentStrategy for NoAugment {
    fn type_key(&self) -> &'static str {
        "none"
    }

    fn compatible_forms(&self) -> &'static [SpellForm] {
        &SpellForm::ALL
    }

    fn apply(
        &self,
        effects: &[Box<dyn SpellEffect>],
        domains: &[Domain],
        source: Entity,
        primary: Option<Entity>,
        _impact_point: Option<Vec3>,
        world: &mut dyn CombatWorld,
        rng: &mut SpellRng,
    ) -> AugmentReport {
        let mut report = AugmentReport::default();
        if let Some(primary) = primary {
            report
                .hits
                .extend(apply_to_target(effects, domains, source, primary, 1.0, world, rng));
        }
        report
    }

    fn description(&self) -> String {
        "Single target".to_string()
    }

    fn clone_box(&self) -> Box<dyn AugmentStrategy> {
        Box::new(self.clone())
    }
}

// ============================================================================
// Chain
// ============================================================================

#[derive(Clone, Debug, PartialEq)]
pub struct ChainAugment {
    /// Hops after the primary target
    pub chain_count: u32,
    pub chain_range: f32,
    /// Fraction of strength lost on every hop
    pub damage_reduction_per_chain: f32,
}

impl Default for ChainAugment {
    fn default() -> Self {
        Self {
            chain_count: 3,
            chain_range: 8.0,
            damage_reduction_per_chain: 0.3,
        }
    }
}

impl ChainAugment {
    /// Strength multiplier at hop `hop` (the primary target is hop 0).
    pub fn strength_at(&self, hop: u32) -> f32 {
        (1.0 - self.damage_reduction_per_chain).powi(hop as i32)
    }
}

impl AugmentStrategy for ChainAugment {
    fn type_key(&self) -> &'static str {
        "chain"
    }

    fn compatible_forms(&self) -> &'static [SpellForm] {
        &[SpellForm::Invoke, SpellForm::Conjure]
    }

    fn apply(
        &self,
        effects: &[Box<dyn SpellEffect>],
        domains: &[Domain],
        source: Entity,
        primary: Option<Entity>,
        _impact_point: Option<Vec3>,
        world: &mut dyn CombatWorld,
        rng: &mut SpellRng,
    ) -> AugmentReport {
        let mut report = AugmentReport::default();
        let Some(primary) = primary else {
            return report;
        };
        let Some(hit) = apply_to_target(effects, domains, source, primary, 1.0, world, rng) else {
            return report;
        };
        report.hits.push(hit);

        let mut visited = vec![source, primary];
        let mut current = primary;

        for hop in 1..=self.chain_count {
            let Some(from) = world.position_of(current) else {
                break;
            };

            // Nearest unvisited target; ties go to the lower entity id
            let next = world
                .targets_within(from, self.chain_range)
                .into_iter()
                .filter(|e| !visited.contains(e))
                .filter_map(|e| world.position_of(e).map(|p| (e, p.distance_squared(from))))
                .min_by(|a, b| a.1.total_cmp(&b.1).then(a.0.cmp(&b.0)));
            let Some((next, _)) = next else {
                break;
            };

            let strength = self.strength_at(hop);
            debug!("Chain hop {:?} -> {:?} at {:.2} strength", current, next, strength);
            visited.push(next);
            report
                .hits
                .extend(apply_to_target(effects, domains, source, next, strength, world, rng));
            current = next;
        }

        report
    }

    fn description(&self) -> String {
        format!(
            "Chains to {} more targets within {:.0}m, losing {:.0}% per jump",
            self.chain_count,
            self.chain_range,
            self.damage_reduction_per_chain * 100.0
        )
    }

    fn clone_box(&self) -> Box<dyn AugmentStrategy> {
        Box::new(self.clone())
    }
}

// ============================================================================
// Area of effect
// ============================================================================

#[derive(Clone, Debug, PartialEq)]
pub struct AreaOfEffectAugment {
    pub radius: f32,
    /// Strength lost at the very edge of the radius
    pub edge_falloff: f32,
}

impl Default for AreaOfEffectAugment {
    fn default() -> Self {
        Self {
            radius: 5.0,
            edge_falloff: 0.5,
        }
    }
}

impl AreaOfEffectAugment {
    /// Linear falloff from 1 at the center to `1 - edge_falloff` at the radius.
    pub fn falloff_multiplier(&self, distance: f32) -> f32 {
        let t = if self.radius <= 0.0 {
            1.0
        } else {
            (distance / self.radius).clamp(0.0, 1.0)
        };
        1.0 - self.edge_falloff * t
    }
}

impl AugmentStrategy for AreaOfEffectAugment {
    fn type_key(&self) -> &'static str {
        "aoe"
    }

    fn compatible_forms(&self) -> &'static [SpellForm] {
        &[SpellForm::Invoke, SpellForm::Conjure]
    }

    fn apply(
        &self,
        effects: &[Box<dyn SpellEffect>],
        domains: &[Domain],
        source: Entity,
        primary: Option<Entity>,
        impact_point: Option<Vec3>,
        world: &mut dyn CombatWorld,
        rng: &mut SpellRng,
    ) -> AugmentReport {
        let mut report = AugmentReport::default();
        let Some(center) = impact_point else {
            return report;
        };

        if let Some(primary) = primary {
            report
                .hits
                .extend(apply_to_target(effects, domains, source, primary, 1.0, world, rng));
        }

        let mut splashed: Vec<(Entity, f32)> = world
            .targets_within(center, self.radius)
            .into_iter()
            .filter(|&e| e != source && Some(e) != primary)
            .filter_map(|e| world.position_of(e).map(|p| (e, p.distance(center))))
            .filter(|&(_, distance)| distance <= self.radius)
            .collect();
        splashed.sort_by_key(|&(e, _)| e);

        for (entity, distance) in splashed {
            let strength = self.falloff_multiplier(distance);
            debug!("Splash on {:?} at {:.1}m, {:.2} strength", entity, distance, strength);
            report
                .hits
                .extend(apply_to_target(effects, domains, source, entity, strength, world, rng));
        }

        report
    }

    fn description(&self) -> String {
        format!(
            "Bursts in a {:.0}m radius ({:.0}% weaker at the edge)",
            self.radius,
            self.edge_falloff * 100.0
        )
    }

    fn clone_box(&self) -> Box<dyn AugmentStrategy> {
        Box::new(self.clone())
    }
}
