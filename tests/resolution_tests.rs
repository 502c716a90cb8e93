//! Integration tests for spell resolution
//!
//! These tests cast crafted spells into a [`Sandbox`] and verify that:
//! - Mana gating blocks unaffordable casts without touching anyone
//! - Augments fan out with the documented strength rules
//! - Conjured bodies deliver on contact according to their impact behavior
//! - The cast state machine implements Instant, Charge and Channel

use bevy::prelude::*;

use spellforge::combat::mana::ManaPool;
use spellforge::combat::sandbox::{Dummy, Sandbox};
use spellforge::combat::status::StatusEffect;
use spellforge::combat::target::{CombatTarget, CombatWorld};
use spellforge::config::SpellcraftConfig;
use spellforge::spell::augments::{AreaOfEffectAugment, AugmentStrategy, ChainAugment};
use spellforge::spell::composition::{CastMethod, SpellCraftingComposition, SpellForm};
use spellforge::spell::crafting::{create_spell, ComposedSpell};
use spellforge::spell::domain::Domain;
use spellforge::spell::effects::{DamageEffect, SpellEffect};
use spellforge::spell::registry::ComponentRegistry;
use spellforge::spell::resolution::{attempt_cast, CastContext, CastOutcome, CastState, CastStateMachine};
use spellforge::spell::rng::SpellRng;

const EPSILON: f32 = 1e-4;

fn craft(composition: SpellCraftingComposition) -> ComposedSpell {
    let config = SpellcraftConfig::default();
    create_spell(&composition, ComponentRegistry::builtin(), &config.crafting).unwrap()
}

fn arcane_damage(method: CastMethod, augment: &str) -> ComposedSpell {
    craft(
        SpellCraftingComposition::new(method, SpellForm::Invoke)
            .with_domain(Domain::Arcane)
            .with_effect("damage")
            .with_augment(augment),
    )
}

fn conjured_damage(motion: &str, impact: &str) -> ComposedSpell {
    let config = SpellcraftConfig::default();
    craft(
        SpellCraftingComposition::new(CastMethod::Instant, SpellForm::Conjure)
            .with_domain(Domain::Arcane)
            .with_effect("damage")
            .with_geometric(config.geometrics[0].clone())
            .with_motion(motion)
            .with_impact(impact),
    )
}

fn damage(amount: f32) -> Vec<Box<dyn SpellEffect>> {
    vec![Box::new(DamageEffect { amount })]
}

fn health(sandbox: &Sandbox, entity: Entity) -> f32 {
    sandbox.dummy(entity).unwrap().health
}

/// A caster at the origin facing -Z with a full mana pool.
fn sandbox_with_caster() -> (Sandbox, Entity) {
    let mut sandbox = Sandbox::new();
    let caster = sandbox.add(Dummy::new(100.0).with_mana(ManaPool::default()));
    (sandbox, caster)
}

// =============================================================================
// Instant Cast Tests
// =============================================================================

#[test]
fn test_instant_damage_scenario() {
    let (mut sandbox, caster) = sandbox_with_caster();
    let target = sandbox.add(Dummy::new(100.0).at(Vec3::new(0.0, 0.0, -5.0)));
    let spell = arcane_damage(CastMethod::Instant, "none");
    let config = SpellcraftConfig::default();
    let mut rng = SpellRng::from_seed(1);

    let outcome = attempt_cast(&spell, caster, Some(target), &mut sandbox, &mut rng, &config.casting);

    assert!(outcome.succeeded());
    assert!((health(&sandbox, target) - 85.0).abs() < EPSILON);
    assert!((sandbox.dummy(caster).unwrap().mana.as_ref().unwrap().current - 83.0).abs() < EPSILON);
}

#[test]
fn test_insufficient_mana_changes_nothing() {
    let mut sandbox = Sandbox::new();
    let caster = sandbox.add(Dummy::new(100.0).with_mana(ManaPool::new(100.0, 10.0, 2.0).with_current(10.0)));
    let target = sandbox.add(Dummy::new(100.0).at(Vec3::new(0.0, 0.0, -5.0)));
    let mut spell = arcane_damage(CastMethod::Instant, "none");
    spell.mana_cost = 15.0;
    let config = SpellcraftConfig::default();
    let mut rng = SpellRng::from_seed(1);

    let outcome = attempt_cast(&spell, caster, Some(target), &mut sandbox, &mut rng, &config.casting);

    assert_eq!(
        outcome,
        CastOutcome::InsufficientMana {
            required: 15.0,
            available: 10.0
        }
    );
    let mana = sandbox.dummy(caster).unwrap().mana.clone().unwrap();
    assert_eq!(mana.current, 10.0);
    assert_eq!(sandbox.dummy(target).unwrap().calls, 0);
    assert_eq!(sandbox.dummy(caster).unwrap().calls, 0);
}

#[test]
fn test_caster_without_mana_pool_cannot_cast() {
    let mut sandbox = Sandbox::new();
    let caster = sandbox.add(Dummy::new(100.0));
    let target = sandbox.add(Dummy::new(100.0).at(Vec3::new(0.0, 0.0, -5.0)));
    let spell = arcane_damage(CastMethod::Instant, "none");
    let config = SpellcraftConfig::default();
    let mut rng = SpellRng::from_seed(1);

    let outcome = attempt_cast(&spell, caster, Some(target), &mut sandbox, &mut rng, &config.casting);

    assert!(matches!(outcome, CastOutcome::InsufficientMana { available, .. } if available == 0.0));
    assert_eq!(health(&sandbox, target), 100.0);
}

#[test]
fn test_missing_target_still_spends_mana() {
    let (mut sandbox, caster) = sandbox_with_caster();
    let spell = arcane_damage(CastMethod::Instant, "none");
    let config = SpellcraftConfig::default();
    let mut rng = SpellRng::from_seed(1);

    let outcome = attempt_cast(&spell, caster, None, &mut sandbox, &mut rng, &config.casting);

    match outcome {
        CastOutcome::Resolved(report) => assert!(report.is_empty()),
        other => panic!("expected an empty resolution, got {:?}", other),
    }
    assert!((sandbox.dummy(caster).unwrap().mana.as_ref().unwrap().current - 83.0).abs() < EPSILON);
}

#[test]
fn test_imbue_targets_caster() {
    let mut sandbox = Sandbox::new();
    let caster = sandbox.add(Dummy::new(100.0).with_mana(ManaPool::default()));
    sandbox.dummy_mut(caster).unwrap().health = 50.0;
    let bystander = sandbox.add(Dummy::new(100.0).at(Vec3::new(0.0, 0.0, -2.0)));
    let spell = craft(
        SpellCraftingComposition::new(CastMethod::Instant, SpellForm::Imbue)
            .with_domain(Domain::Arcane)
            .with_effect("heal"),
    );
    let config = SpellcraftConfig::default();
    let mut rng = SpellRng::from_seed(1);

    let outcome = attempt_cast(&spell, caster, Some(bystander), &mut sandbox, &mut rng, &config.casting);

    assert!(outcome.succeeded());
    assert!(health(&sandbox, caster) > 50.0);
    assert_eq!(sandbox.dummy(bystander).unwrap().calls, 0);
}

// =============================================================================
// Augment Tests
// =============================================================================

#[test]
fn test_chain_never_revisits_targets() {
    let mut sandbox = Sandbox::new();
    let caster = sandbox.add(Dummy::new(100.0).at(Vec3::new(0.0, 0.0, 4.0)));
    let cluster: Vec<Entity> = (0..4)
        .map(|i| sandbox.add(Dummy::new(100.0).at(Vec3::new(i as f32 * 1.5, 0.0, 0.0))))
        .collect();
    let mut rng = SpellRng::from_seed(3);
    let chain = ChainAugment {
        chain_count: cluster.len() as u32 + 5,
        ..Default::default()
    };

    let report = chain.apply(&damage(10.0), &[], caster, Some(cluster[0]), None, &mut sandbox, &mut rng);

    let mut hit: Vec<Entity> = report.targets().collect();
    assert_eq!(hit.len(), cluster.len());
    hit.sort();
    hit.dedup();
    assert_eq!(hit.len(), cluster.len(), "a target was visited twice");
    assert!(!hit.contains(&caster));
    assert_eq!(health(&sandbox, caster), 100.0);
}

#[test]
fn test_chain_strength_compounds_per_hop() {
    let (mut sandbox, caster) = sandbox_with_caster();
    let first = sandbox.add(Dummy::new(100.0).at(Vec3::new(0.0, 0.0, -5.0)));
    let second = sandbox.add(Dummy::new(100.0).at(Vec3::new(0.0, 0.0, -10.0)));
    let third = sandbox.add(Dummy::new(100.0).at(Vec3::new(0.0, 0.0, -15.0)));
    let spell = arcane_damage(CastMethod::Instant, "chain");
    let config = SpellcraftConfig::default();
    let mut rng = SpellRng::from_seed(1);

    let outcome = attempt_cast(&spell, caster, Some(first), &mut sandbox, &mut rng, &config.casting);

    let CastOutcome::Resolved(report) = outcome else {
        panic!("chain cast did not resolve");
    };
    assert!((report.strength_for(third).unwrap() - 0.49).abs() < 1e-6);
    assert!((health(&sandbox, first) - 85.0).abs() < EPSILON);
    assert!((health(&sandbox, second) - 89.5).abs() < EPSILON);
    assert!((health(&sandbox, third) - 92.65).abs() < EPSILON);
    // The crafted spell's own effect is never rescaled
    assert_eq!(spell.effects[0].magnitude(), 15.0);
}

#[test]
fn test_aoe_falloff_boundaries() {
    let mut sandbox = Sandbox::new();
    let caster = sandbox.add(Dummy::new(100.0).at(Vec3::new(0.0, 0.0, 20.0)));
    let primary = sandbox.add(Dummy::new(100.0));
    let center = sandbox.add(Dummy::new(100.0));
    let edge = sandbox.add(Dummy::new(100.0).at(Vec3::new(5.0, 0.0, 0.0)));
    let outside = sandbox.add(Dummy::new(100.0).at(Vec3::new(5.01, 0.0, 0.0)));
    let mut rng = SpellRng::from_seed(5);
    let aoe = AreaOfEffectAugment::default();

    let report = aoe.apply(&damage(20.0), &[], caster, Some(primary), Some(Vec3::ZERO), &mut sandbox, &mut rng);

    assert_eq!(report.strength_for(primary), Some(1.0));
    assert!((report.strength_for(center).unwrap() - 1.0).abs() < 1e-6);
    assert!((report.strength_for(edge).unwrap() - 0.5).abs() < 1e-6);
    assert!(report.strength_for(outside).is_none());
    assert!((health(&sandbox, edge) - 90.0).abs() < EPSILON);
    assert_eq!(health(&sandbox, outside), 100.0);
}

#[test]
fn test_statuses_roll_for_every_target_hit() {
    let mut sandbox = Sandbox::new();
    let caster = sandbox.add(Dummy::new(100.0).at(Vec3::new(0.0, 0.0, 20.0)));
    let targets: Vec<Entity> = (0..40)
        .map(|i| sandbox.add(Dummy::new(1000.0).at(Vec3::new((i % 8) as f32 * 0.5, 0.0, (i / 8) as f32 * 0.5))))
        .collect();
    let mut rng = SpellRng::from_seed(11);
    let aoe = AreaOfEffectAugment {
        radius: 10.0,
        edge_falloff: 0.5,
    };

    let report = aoe.apply(
        &damage(1.0),
        &[Domain::Lightning],
        caster,
        Some(targets[0]),
        Some(Vec3::ZERO),
        &mut sandbox,
        &mut rng,
    );

    assert_eq!(report.hits.len(), targets.len());
    let stunned = targets
        .iter()
        .filter(|&&t| sandbox.dummy(t).unwrap().statuses.is_stunned())
        .count();
    // Single-domain chance is 0.6 per target; the roll is not a per-cast one-off
    assert!(stunned > 10 && stunned < 40, "stunned {} of 40", stunned);
    assert_eq!(report.hits.iter().map(|h| h.statuses).sum::<usize>(), stunned);
}

#[test]
fn test_air_knocks_targets_back() {
    let (mut sandbox, caster) = sandbox_with_caster();
    let target = sandbox.add(Dummy::new(100.0).at(Vec3::new(0.0, 0.0, -5.0)));
    let spell = craft(
        SpellCraftingComposition::new(CastMethod::Instant, SpellForm::Invoke)
            .with_domain(Domain::Air)
            .with_effect("damage"),
    );
    let config = SpellcraftConfig::default();
    let mut rng = SpellRng::from_seed(1);

    attempt_cast(&spell, caster, Some(target), &mut sandbox, &mut rng, &config.casting);

    let forces = &sandbox.dummy(target).unwrap().forces;
    assert_eq!(forces.len(), 1);
    assert!(forces[0].0.dot(Vec3::NEG_Z) > 0.99);
    assert_eq!(forces[0].1, 5.0);
}

#[test]
fn test_status_refresh_and_stack() {
    let mut sandbox = Sandbox::new();
    let target = sandbox.add(Dummy::new(100.0));

    let dummy = sandbox.target_mut(target).unwrap();
    dummy.apply_status(StatusEffect::stunned(1.0));
    dummy.apply_status(StatusEffect::stunned(0.5));
    dummy.apply_status(StatusEffect::burning(3.0, 5.0));
    dummy.apply_status(StatusEffect::burning(3.0, 5.0));

    let statuses = &sandbox.dummy(target).unwrap().statuses;
    assert_eq!(statuses.count("Stunned"), 1);
    assert_eq!(statuses.count("Burning"), 2);
    let stun = statuses.iter().find(|s| s.name() == "Stunned").unwrap();
    assert_eq!(stun.duration, 0.5);
}

// =============================================================================
// Conjured Body Tests
// =============================================================================

/// Step the sandbox at 20 Hz for `seconds`, collecting deliveries.
fn run(sandbox: &mut Sandbox, rng: &mut SpellRng, seconds: f32) -> Vec<Entity> {
    let steps = (seconds * 20.0).round() as usize;
    let mut struck = Vec::new();
    for _ in 0..steps {
        struck.extend(sandbox.step(0.05, rng).into_iter().map(|(entity, _)| entity));
    }
    struck
}

#[test]
fn test_conjure_spawns_body_in_front_of_caster() {
    let (mut sandbox, caster) = sandbox_with_caster();
    let spell = conjured_damage("straight", "destroy");
    let config = SpellcraftConfig::default();
    let mut rng = SpellRng::from_seed(1);

    let outcome = attempt_cast(&spell, caster, None, &mut sandbox, &mut rng, &config.casting);

    let CastOutcome::Spawned { position } = outcome else {
        panic!("expected a spawned body, got {:?}", outcome);
    };
    assert!(position.distance(Vec3::new(0.0, 0.0, -1.0)) < EPSILON);
    assert_eq!(sandbox.bodies().len(), 1);
    assert_eq!(sandbox.bodies()[0].lifetime_remaining, 5.0);
    // Cost is (10 * 1.0 + 10) for an Orb
    assert!((sandbox.dummy(caster).unwrap().mana.as_ref().unwrap().current - 80.0).abs() < EPSILON);
}

#[test]
fn test_destroy_body_hits_first_target_only() {
    let (mut sandbox, caster) = sandbox_with_caster();
    let near = sandbox.add(Dummy::new(100.0).at(Vec3::new(0.0, 0.0, -6.0)));
    let far = sandbox.add(Dummy::new(100.0).at(Vec3::new(0.0, 0.0, -12.0)));
    let spell = conjured_damage("straight", "destroy");
    let config = SpellcraftConfig::default();
    let mut rng = SpellRng::from_seed(1);

    attempt_cast(&spell, caster, Some(near), &mut sandbox, &mut rng, &config.casting);
    let struck = run(&mut sandbox, &mut rng, 2.0);

    assert_eq!(struck, vec![near]);
    assert!((health(&sandbox, near) - 85.0).abs() < EPSILON);
    assert_eq!(health(&sandbox, far), 100.0);
    assert!(sandbox.bodies().is_empty());
}

#[test]
fn test_pierce_body_hits_each_target_once() {
    let (mut sandbox, caster) = sandbox_with_caster();
    let near = sandbox.add(Dummy::new(100.0).at(Vec3::new(0.0, 0.0, -6.0)));
    let far = sandbox.add(Dummy::new(100.0).at(Vec3::new(0.0, 0.0, -12.0)));
    let spell = conjured_damage("straight", "pierce");
    let config = SpellcraftConfig::default();
    let mut rng = SpellRng::from_seed(1);

    attempt_cast(&spell, caster, None, &mut sandbox, &mut rng, &config.casting);
    let struck = run(&mut sandbox, &mut rng, 2.0);

    assert_eq!(struck, vec![near, far]);
    assert!((health(&sandbox, near) - 85.0).abs() < EPSILON);
    assert!((health(&sandbox, far) - 85.0).abs() < EPSILON);
    // Still flying until its lifetime runs out
    assert_eq!(sandbox.bodies().len(), 1);
    run(&mut sandbox, &mut rng, 3.5);
    assert!(sandbox.bodies().is_empty());
}

#[test]
fn test_stick_body_attaches_and_stops_delivering() {
    let (mut sandbox, caster) = sandbox_with_caster();
    let target = sandbox.add(Dummy::new(100.0).at(Vec3::new(0.0, 0.0, -6.0)));
    let spell = conjured_damage("straight", "stick");
    let config = SpellcraftConfig::default();
    let mut rng = SpellRng::from_seed(1);

    attempt_cast(&spell, caster, None, &mut sandbox, &mut rng, &config.casting);
    let struck = run(&mut sandbox, &mut rng, 1.0);
    assert_eq!(struck, vec![target]);

    let offset = sandbox.bodies()[0].position() - sandbox.dummy(target).unwrap().position;
    assert!(sandbox.bodies()[0].state.frozen);

    // The body rides along with whatever it stuck to
    sandbox.dummy_mut(target).unwrap().position += Vec3::new(3.0, 0.0, 0.0);
    let struck = run(&mut sandbox, &mut rng, 1.0);
    assert!(struck.is_empty());
    let moved_offset = sandbox.bodies()[0].position() - sandbox.dummy(target).unwrap().position;
    assert!(moved_offset.distance(offset) < EPSILON);
    assert!((health(&sandbox, target) - 85.0).abs() < EPSILON);
}

#[test]
fn test_stationary_body_expires_after_lifetime() {
    let (mut sandbox, caster) = sandbox_with_caster();
    let spell = conjured_damage("stationary", "destroy");
    let config = SpellcraftConfig::default();
    let mut rng = SpellRng::from_seed(1);

    attempt_cast(&spell, caster, None, &mut sandbox, &mut rng, &config.casting);
    run(&mut sandbox, &mut rng, 14.0);
    assert_eq!(sandbox.bodies().len(), 1);
    assert!(sandbox.bodies()[0].position().distance(Vec3::new(0.0, 0.0, -1.0)) < EPSILON);

    run(&mut sandbox, &mut rng, 1.5);
    assert!(sandbox.bodies().is_empty());
}

#[test]
fn test_body_never_strikes_its_caster() {
    let (mut sandbox, caster) = sandbox_with_caster();
    let spell = conjured_damage("boomerang", "pierce");
    let config = SpellcraftConfig::default();
    let mut rng = SpellRng::from_seed(1);

    attempt_cast(&spell, caster, None, &mut sandbox, &mut rng, &config.casting);
    let struck = run(&mut sandbox, &mut rng, 4.0);

    assert!(struck.is_empty());
    assert_eq!(health(&sandbox, caster), 100.0);
}

// =============================================================================
// Cast State Machine Tests
// =============================================================================

/// Drives one caster's state machine against a single target.
struct Harness {
    sandbox: Sandbox,
    caster: Entity,
    target: Entity,
    spell: ComposedSpell,
    machine: CastStateMachine,
    rng: SpellRng,
    config: SpellcraftConfig,
}

impl Harness {
    fn new(method: CastMethod) -> Self {
        let (mut sandbox, caster) = sandbox_with_caster();
        let target = sandbox.add(Dummy::new(100.0).at(Vec3::new(0.0, 0.0, -5.0)));
        Self {
            sandbox,
            caster,
            target,
            spell: arcane_damage(method, "none"),
            machine: CastStateMachine::default(),
            rng: SpellRng::from_seed(9),
            config: SpellcraftConfig::default(),
        }
    }

    fn context(&mut self) -> (&mut CastStateMachine, CastContext<'_>) {
        (
            &mut self.machine,
            CastContext {
                spell: &self.spell,
                source: self.caster,
                world: &mut self.sandbox,
                rng: &mut self.rng,
                casting: &self.config.casting,
            },
        )
    }

    fn press(&mut self) -> Option<CastOutcome> {
        let target = Some(self.target);
        let (machine, mut ctx) = self.context();
        machine.press(target, &mut ctx)
    }

    fn tick(&mut self, dt: f32) -> Option<CastOutcome> {
        let (machine, mut ctx) = self.context();
        machine.tick(dt, &mut ctx)
    }

    fn release(&mut self) -> Option<CastOutcome> {
        let (machine, mut ctx) = self.context();
        machine.release(&mut ctx)
    }

    fn target_health(&self) -> f32 {
        health(&self.sandbox, self.target)
    }

    fn caster_mana(&self) -> f32 {
        self.sandbox.dummy(self.caster).unwrap().mana.as_ref().unwrap().current
    }
}

#[test]
fn test_instant_resolves_on_press() {
    let mut harness = Harness::new(CastMethod::Instant);

    let outcome = harness.press();

    assert!(outcome.is_some_and(|o| o.succeeded()));
    assert!(harness.machine.is_idle());
    assert!((harness.target_health() - 85.0).abs() < EPSILON);
}

#[test]
fn test_charge_released_after_threshold_doubles_damage() {
    let mut harness = Harness::new(CastMethod::Charge);

    assert!(harness.press().is_none());
    assert!(matches!(harness.machine.state(), CastState::Charging { .. }));
    for _ in 0..4 {
        harness.tick(0.25);
    }
    assert_eq!(harness.machine.charge_progress(harness.config.casting.charge_time), 1.0);

    let outcome = harness.release();

    assert!(outcome.is_some_and(|o| o.succeeded()));
    assert!(harness.machine.is_idle());
    assert!((harness.target_health() - 70.0).abs() < EPSILON);
    // 17 * 0.75
    assert!((harness.caster_mana() - 87.25).abs() < EPSILON);
}

#[test]
fn test_early_charge_release_returns_to_idle_without_casting() {
    let mut harness = Harness::new(CastMethod::Charge);

    harness.press();
    harness.tick(0.5);
    assert!((harness.machine.charge_progress(harness.config.casting.charge_time) - 0.5).abs() < 1e-6);

    assert!(harness.release().is_none());
    assert!(harness.machine.is_idle());
    assert_eq!(harness.target_health(), 100.0);
    assert_eq!(harness.caster_mana(), 100.0);
    assert_eq!(harness.machine.charge_progress(1.0), 0.0);
}

#[test]
fn test_channel_pulses_until_mana_runs_out() {
    let mut harness = Harness::new(CastMethod::Channel);

    harness.press();
    let mut outcomes = Vec::new();
    for _ in 0..20 {
        if let Some(outcome) = harness.tick(0.25) {
            outcomes.push(outcome);
        }
        if harness.machine.is_idle() {
            break;
        }
    }

    // 21.25 mana per pulse from 100: four pulses, then a refusal
    assert_eq!(outcomes.iter().filter(|o| o.succeeded()).count(), 4);
    assert!(matches!(outcomes.last(), Some(CastOutcome::InsufficientMana { .. })));
    assert!(harness.machine.is_idle());
    assert!((harness.target_health() - (100.0 - 4.0 * 4.5)).abs() < EPSILON);
    assert!((harness.caster_mana() - 15.0).abs() < EPSILON);
}

#[test]
fn test_channel_stops_on_release() {
    let mut harness = Harness::new(CastMethod::Channel);

    harness.press();
    harness.tick(0.5);
    assert!(harness.release().is_none());
    assert!(harness.machine.is_idle());
    assert!(harness.tick(0.5).is_none());

    assert!((harness.target_health() - 95.5).abs() < EPSILON);
}

#[test]
fn test_press_while_busy_is_ignored() {
    let mut harness = Harness::new(CastMethod::Charge);

    harness.press();
    harness.tick(0.75);
    assert!(harness.press().is_none());
    match harness.machine.state() {
        CastState::Charging { elapsed, .. } => assert!((elapsed - 0.75).abs() < 1e-6),
        other => panic!("expected to still be charging, got {:?}", other),
    }

    harness.machine.cancel();
    assert!(harness.machine.is_idle());
}
