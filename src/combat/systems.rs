//! Combat systems
//!
//! ECS systems that drive casting, statuses, knockback and conjured bodies.

use bevy::prelude::*;

use super::components::*;
use super::events::*;
use super::log::{CombatLog, CombatLogEventType};
use crate::config::SpellcraftConfig;
use crate::spell::body::ConjuredBody;
use crate::spell::resolution::{CastContext, CastOutcome, CastState};
use crate::spell::rng::SpellRng;

type CombatantQuery<'w, 's> =
    Query<'w, 's, (Entity, &'static mut Transform, &'static mut Combatant), Without<ConjuredBody>>;

fn combatant_world<'a>(combatants: &'a mut CombatantQuery) -> CombatantWorld<'a> {
    CombatantWorld::new(
        combatants
            .iter_mut()
            .map(|(entity, transform, combatant)| CombatantView {
                entity,
                transform,
                combatant,
            }),
    )
}

/// Spawn bodies conjured during resolution
fn spawn_conjured_bodies(commands: &mut Commands, world: &mut CombatantWorld, log: &mut CombatLog) {
    for body in world.take_conjured() {
        log.log(
            CombatLogEventType::SpellCast,
            format!(
                "{} conjures a {} ({})",
                world.name_of(body.source),
                body.geometric.name,
                body.label
            ),
        );
        let transform = Transform::from_translation(body.position()).with_rotation(body.state.rotation);
        commands.spawn((Name::new(body.label.clone()), transform, body));
    }
}

/// Log a cast outcome and notify listeners of successful casts
fn report_cast(
    outcome: &CastOutcome,
    caster: Entity,
    spell_label: &str,
    world: &CombatantWorld,
    log: &mut CombatLog,
    cast_events: &mut EventWriter<SpellCastEvent>,
) {
    let name = world.name_of(caster);
    match outcome {
        CastOutcome::Resolved(report) => {
            let targets: Vec<Entity> = report.targets().collect();
            log.log(
                CombatLogEventType::SpellCast,
                format!("{} casts {} ({} target(s))", name, spell_label, targets.len()),
            );
            cast_events.send(SpellCastEvent {
                caster,
                spell_label: spell_label.to_string(),
                targets,
            });
        }
        // Logged when the body is spawned
        CastOutcome::Spawned { .. } => {
            cast_events.send(SpellCastEvent {
                caster,
                spell_label: spell_label.to_string(),
                targets: Vec::new(),
            });
        }
        CastOutcome::InsufficientMana { required, available } => {
            log.log(
                CombatLogEventType::CastFailed,
                format!(
                    "{} fails to cast {}: needs {:.1} mana, has {:.1}",
                    name, spell_label, required, available
                ),
            );
        }
        CastOutcome::MissingCaster => {
            warn!("Caster {:?} is not a combatant; cast of {} ignored", caster, spell_label);
        }
    }
}

/// Advance the combat log clock
pub fn advance_combat_log(time: Res<Time>, mut log: ResMut<CombatLog>) {
    log.match_time += time.delta_secs();
}

/// Feed cast button presses and releases into each caster's state machine
#[allow(clippy::too_many_arguments)]
pub fn process_cast_input(
    mut commands: Commands,
    mut input: EventReader<CastInputEvent>,
    mut casters: Query<&mut SpellCaster>,
    mut combatants: CombatantQuery,
    config: Res<SpellcraftConfig>,
    mut rng: ResMut<SpellRng>,
    mut log: ResMut<CombatLog>,
    mut cast_events: EventWriter<SpellCastEvent>,
) {
    let events: Vec<CastInputEvent> = input.read().cloned().collect();
    if events.is_empty() {
        return;
    }

    let mut world = combatant_world(&mut combatants);
    for event in events {
        let Ok(mut caster) = casters.get_mut(event.caster) else {
            warn!("Cast input for {:?}, which has no spell equipped", event.caster);
            continue;
        };
        if !world.is_alive(event.caster) {
            continue;
        }
        if event.phase == CastPhase::Pressed && world.is_stunned(event.caster) {
            debug!("{:?} is stunned; cast input ignored", event.caster);
            continue;
        }

        let SpellCaster { spell, machine } = &mut *caster;
        let spell = &*spell;
        let previous = machine.state().clone();
        let mut ctx = CastContext {
            spell,
            source: event.caster,
            world: &mut world,
            rng: &mut *rng,
            casting: &config.casting,
        };
        let outcome = match event.phase {
            CastPhase::Pressed => machine.press(event.target, &mut ctx),
            CastPhase::Released => machine.release(&mut ctx),
        };

        let name = world.name_of(event.caster);
        match (&previous, machine.state()) {
            (CastState::Idle, CastState::Charging { .. }) => {
                log.log(CombatLogEventType::CastStarted, format!("{} begins charging {}", name, spell.label));
            }
            (CastState::Idle, CastState::Channeling { .. }) => {
                log.log(CombatLogEventType::CastStarted, format!("{} begins channeling {}", name, spell.label));
            }
            (CastState::Charging { .. }, CastState::Idle) if outcome.is_none() => {
                log.log(
                    CombatLogEventType::CastInterrupted,
                    format!("{} releases {} before it is charged", name, spell.label),
                );
            }
            (CastState::Channeling { .. }, CastState::Idle) => {
                log.log(CombatLogEventType::CastInterrupted, format!("{} stops channeling {}", name, spell.label));
            }
            _ => {}
        }

        if let Some(outcome) = outcome {
            report_cast(&outcome, event.caster, &spell.label, &world, &mut log, &mut cast_events);
        }
    }

    spawn_conjured_bodies(&mut commands, &mut world, &mut log);
}

/// Advance charge and channel timers, cancelling casters that are stunned or dead
#[allow(clippy::too_many_arguments)]
pub fn tick_spell_casters(
    time: Res<Time>,
    mut commands: Commands,
    mut casters: Query<(Entity, &mut SpellCaster)>,
    mut combatants: CombatantQuery,
    config: Res<SpellcraftConfig>,
    mut rng: ResMut<SpellRng>,
    mut log: ResMut<CombatLog>,
    mut cast_events: EventWriter<SpellCastEvent>,
) {
    if casters.iter().all(|(_, c)| c.machine.is_idle()) {
        return;
    }

    let dt = time.delta_secs();
    let mut world = combatant_world(&mut combatants);
    for (entity, mut caster) in &mut casters {
        if caster.machine.is_idle() {
            continue;
        }
        let SpellCaster { spell, machine } = &mut *caster;
        let spell = &*spell;

        if !world.is_alive(entity) || world.is_stunned(entity) {
            machine.cancel();
            log.log(
                CombatLogEventType::CastInterrupted,
                format!("{}'s {} is interrupted", world.name_of(entity), spell.label),
            );
            continue;
        }

        let mut ctx = CastContext {
            spell,
            source: entity,
            world: &mut world,
            rng: &mut *rng,
            casting: &config.casting,
        };
        if let Some(outcome) = machine.tick(dt, &mut ctx) {
            report_cast(&outcome, entity, &spell.label, &world, &mut log, &mut cast_events);
        }
    }

    spawn_conjured_bodies(&mut commands, &mut world, &mut log);
}

/// Regenerate mana once the post-cast cooldown has elapsed
pub fn regenerate_mana(time: Res<Time>, mut combatants: Query<&mut Combatant>) {
    let dt = time.delta_secs();
    for mut combatant in &mut combatants {
        if combatant.is_alive() {
            combatant.mana.tick(dt);
        }
    }
}

/// Tick status durations and apply burning damage
pub fn tick_status_effects(
    time: Res<Time>,
    mut combatants: Query<&mut Combatant>,
    mut log: ResMut<CombatLog>,
) {
    let dt = time.delta_secs();
    for mut combatant in &mut combatants {
        if combatant.statuses.is_empty() || !combatant.is_alive() {
            continue;
        }

        let tick = combatant.statuses.tick(dt);
        if tick.damage > 0.0 {
            combatant.take_damage(tick.damage);
        }
        for expired in tick.expired {
            log.log(
                CombatLogEventType::StatusExpired,
                format!("{}'s {} wears off", combatant.name, expired),
            );
        }
    }
}

/// Move combatants by their knockback velocity
pub fn integrate_knockback(
    time: Res<Time>,
    mut combatants: Query<(&mut Transform, &mut Combatant), Without<ConjuredBody>>,
) {
    let dt = time.delta_secs();
    for (mut transform, mut combatant) in &mut combatants {
        if combatant.velocity == Vec3::ZERO {
            continue;
        }
        let displacement = combatant.integrate_velocity(dt);
        transform.translation += displacement;
    }
}

/// Run each conjured body's motion (or keep it attached to what it stuck to)
pub fn move_conjured_bodies(
    time: Res<Time>,
    mut bodies: Query<(&mut ConjuredBody, &mut Transform), Without<Combatant>>,
    combatants: Query<(Entity, &Transform), (With<Combatant>, Without<ConjuredBody>)>,
) {
    let dt = time.delta_secs();
    for (mut body, mut transform) in &mut bodies {
        body.tick(dt, |entity| {
            combatants
                .get(entity)
                .ok()
                .map(|(_, t)| (t.translation, t.rotation))
        });
        transform.translation = body.state.position;
        transform.rotation = body.state.rotation;
    }
}

/// Deliver conjured bodies' spells to the combatants they overlap
pub fn resolve_body_collisions(
    mut bodies: Query<(Entity, &mut ConjuredBody), Without<Combatant>>,
    mut combatants: CombatantQuery,
    mut rng: ResMut<SpellRng>,
    mut log: ResMut<CombatLog>,
    mut impact_events: EventWriter<BodyImpactEvent>,
) {
    if bodies.is_empty() {
        return;
    }

    let mut world = combatant_world(&mut combatants);
    for (entity, mut body) in &mut bodies {
        if body.is_finished() {
            continue;
        }
        for (struck, report) in body.resolve_collisions(&mut world, &mut rng) {
            log.log(
                CombatLogEventType::BodyImpact,
                format!(
                    "{} strikes {} ({} target(s))",
                    body.label,
                    world.name_of(struck),
                    report.hits.len()
                ),
            );
            impact_events.send(BodyImpactEvent {
                body: entity,
                caster: body.source,
                struck,
                targets: report.targets().collect(),
            });
        }
    }
}

/// Despawn bodies whose lifetime ran out or whose impact ended them
pub fn despawn_finished_bodies(
    mut commands: Commands,
    bodies: Query<(Entity, &ConjuredBody)>,
    mut log: ResMut<CombatLog>,
) {
    for (entity, body) in &bodies {
        if !body.is_finished() {
            continue;
        }
        let how = if body.state.despawn_requested {
            "shatters"
        } else {
            "fades away"
        };
        log.log(
            CombatLogEventType::BodyExpired,
            format!("{} {}", body.label, how),
        );
        commands.entity(entity).despawn_recursive();
    }
}

/// Record each combatant's death once
pub fn check_combatant_deaths(
    mut commands: Commands,
    combatants: Query<(Entity, &Combatant), Without<Defeated>>,
    mut casters: Query<&mut SpellCaster>,
    mut log: ResMut<CombatLog>,
    mut death_events: EventWriter<CombatantDeathEvent>,
) {
    for (entity, combatant) in &combatants {
        if combatant.is_alive() {
            continue;
        }
        if let Ok(mut caster) = casters.get_mut(entity) {
            caster.machine.cancel();
        }
        commands.entity(entity).insert(Defeated);
        log.log(
            CombatLogEventType::Death,
            format!("{} has been defeated", combatant.name),
        );
        death_events.send(CombatantDeathEvent {
            entity,
            name: combatant.name.clone(),
        });
    }
}
