//! Spell Resolution
//!
//! Executes composed spells against a [`CombatWorld`].
//!
//! ## Flow
//! 1. [`attempt_cast`] gates on the caster's mana; an unaffordable cast
//!    changes nothing
//! 2. [`cast`] resolves the primary target from the spell's form
//! 3. Hitscan spells run the augment immediately; Conjure spells hand a
//!    [`ConjuredBody`] to the world and resolve on contact
//!
//! [`CastStateMachine`] layers the cast methods on top: Instant resolves on
//! press, Charge on a sufficiently late release, Channel on every pulse while
//! held.

use bevy::prelude::*;

use super::augments::AugmentReport;
use super::body::ConjuredBody;
use super::composition::{CastMethod, Delivery, Targeting};
use super::crafting::ComposedSpell;
use super::rng::SpellRng;
use crate::combat::target::CombatWorld;
use crate::config::CastingConfig;

#[derive(Clone, Debug, PartialEq)]
pub enum CastOutcome {
    /// Hitscan delivery finished
    Resolved(AugmentReport),
    /// A conjured body was handed to the world
    Spawned { position: Vec3 },
    /// The caster could not pay; nothing was changed
    InsufficientMana { required: f32, available: f32 },
    /// The caster is not part of the world
    MissingCaster,
}

impl CastOutcome {
    /// Whether the cast went off (mana was spent).
    pub fn succeeded(&self) -> bool {
        matches!(self, CastOutcome::Resolved(_) | CastOutcome::Spawned { .. })
    }
}

/// Resolve `spell` without checking or spending mana.
pub fn cast(
    spell: &ComposedSpell,
    source: Entity,
    target: Option<Entity>,
    world: &mut dyn CombatWorld,
    rng: &mut SpellRng,
    casting: &CastingConfig,
) -> CastOutcome {
    let primary = match spell.targeting() {
        Targeting::Caster => Some(source),
        Targeting::Other => target,
    };

    match spell.delivery() {
        Delivery::Hitscan => {
            let impact_point = primary.and_then(|p| world.position_of(p));
            let report = spell.augment.apply(
                &spell.effects,
                &spell.domains,
                source,
                primary,
                impact_point,
                world,
                rng,
            );
            debug!("'{}' reached {} target(s)", spell.label, report.hits.len());
            CastOutcome::Resolved(report)
        }
        Delivery::SpawnedBody => {
            let Some(source_snapshot) = world.snapshot(source) else {
                return CastOutcome::MissingCaster;
            };
            let target_snapshot = primary.and_then(|p| world.snapshot(p));
            match ConjuredBody::conjure(
                spell,
                &source_snapshot,
                target_snapshot.as_ref(),
                casting.body_spawn_offset,
            ) {
                Some(body) => {
                    let position = body.position();
                    world.spawn_body(body);
                    CastOutcome::Spawned { position }
                }
                // A Conjure spell is never built without its body selections
                None => CastOutcome::Resolved(AugmentReport::default()),
            }
        }
    }
}

/// Spend the spell's mana, then [`cast`] it.
///
/// Casters without a mana pool cannot pay for anything.
pub fn attempt_cast(
    spell: &ComposedSpell,
    source: Entity,
    target: Option<Entity>,
    world: &mut dyn CombatWorld,
    rng: &mut SpellRng,
    casting: &CastingConfig,
) -> CastOutcome {
    let Some(caster) = world.target_mut(source) else {
        return CastOutcome::MissingCaster;
    };
    let paid = match caster.mana_mut() {
        Some(mana) => {
            if mana.try_consume(spell.mana_cost) {
                Ok(())
            } else {
                Err(mana.current)
            }
        }
        None => Err(0.0),
    };
    if let Err(available) = paid {
        debug!(
            "'{}' needs {:.1} mana, caster has {:.1}",
            spell.label, spell.mana_cost, available
        );
        return CastOutcome::InsufficientMana {
            required: spell.mana_cost,
            available,
        };
    }

    cast(spell, source, target, world, rng, casting)
}

// ============================================================================
// Cast state machine
// ============================================================================

#[derive(Clone, Debug, Default, PartialEq)]
pub enum CastState {
    #[default]
    Idle,
    Charging { elapsed: f32, target: Option<Entity> },
    Channeling { timer: f32, target: Option<Entity> },
}

/// Everything a state transition may need to resolve a spell.
pub struct CastContext<'a> {
    pub spell: &'a ComposedSpell,
    pub source: Entity,
    pub world: &'a mut dyn CombatWorld,
    pub rng: &'a mut SpellRng,
    pub casting: &'a CastingConfig,
}

impl CastContext<'_> {
    fn attempt(&mut self, target: Option<Entity>) -> CastOutcome {
        attempt_cast(self.spell, self.source, target, self.world, self.rng, self.casting)
    }
}

/// Per-caster input state for charge and channel casting.
#[derive(Clone, Debug, Default)]
pub struct CastStateMachine {
    state: CastState,
}

impl CastStateMachine {
    pub fn state(&self) -> &CastState {
        &self.state
    }

    pub fn is_idle(&self) -> bool {
        self.state == CastState::Idle
    }

    /// Cast button pressed.
    pub fn press(&mut self, target: Option<Entity>, ctx: &mut CastContext) -> Option<CastOutcome> {
        if !self.is_idle() {
            return None;
        }
        match ctx.spell.cast_method {
            CastMethod::Instant => Some(ctx.attempt(target)),
            CastMethod::Charge => {
                self.state = CastState::Charging { elapsed: 0.0, target };
                None
            }
            CastMethod::Channel => {
                self.state = CastState::Channeling { timer: 0.0, target };
                None
            }
        }
    }

    /// Advance charge or channel timers by `dt`.
    pub fn tick(&mut self, dt: f32, ctx: &mut CastContext) -> Option<CastOutcome> {
        match &mut self.state {
            CastState::Idle => None,
            CastState::Charging { elapsed, .. } => {
                *elapsed += dt;
                None
            }
            CastState::Channeling { timer, target } => {
                *timer += dt;
                if *timer < ctx.casting.channel_rate {
                    return None;
                }
                *timer = 0.0;
                let target = *target;

                let outcome = ctx.attempt(target);
                if !outcome.succeeded() {
                    self.state = CastState::Idle;
                }
                Some(outcome)
            }
        }
    }

    /// Cast button released.
    pub fn release(&mut self, ctx: &mut CastContext) -> Option<CastOutcome> {
        match std::mem::take(&mut self.state) {
            CastState::Charging { elapsed, target } if elapsed >= ctx.casting.charge_time => {
                Some(ctx.attempt(target))
            }
            _ => None,
        }
    }

    /// Abandon any charge or channel in progress.
    pub fn cancel(&mut self) {
        self.state = CastState::Idle;
    }

    /// Charge completion in `0..=1`; zero unless charging.
    pub fn charge_progress(&self, charge_time: f32) -> f32 {
        match self.state {
            CastState::Charging { elapsed, .. } if charge_time > 0.0 => (elapsed / charge_time).clamp(0.0, 1.0),
            CastState::Charging { .. } => 1.0,
            _ => 0.0,
        }
    }
}
