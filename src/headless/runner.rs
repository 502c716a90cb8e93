//! Headless scenario execution
//!
//! Runs a scripted scenario on a fixed timestep without any graphical
//! output, suitable for automated testing and balance checks.

use bevy::log::LogPlugin;
use bevy::prelude::*;
use bevy::time::TimeUpdateStrategy;
use serde::Serialize;
use std::time::Duration;

use crate::combat::components::{Combatant, SpellCaster};
use crate::combat::events::CastInputEvent;
use crate::combat::log::{CombatLog, CombatLogEventType};
use crate::combat::mana::ManaPool;
use crate::combat::systems::{check_combatant_deaths, process_cast_input};
use crate::combat::CombatPlugin;
use crate::config::SpellcraftConfig;
use crate::spell::crafting::create_spell;
use crate::spell::registry::ComponentRegistry;
use crate::spell::rng::SpellRng;

use super::config::{ScenarioConfig, TimelineAction, TimelineStep};

/// Result of a completed headless scenario
#[derive(Debug, Clone, Serialize)]
pub struct ScenarioResult {
    pub spell_label: String,
    pub mana_cost: f32,
    /// Simulated seconds
    pub elapsed: f32,
    /// Casts that went off (mana spent)
    pub casts: usize,
    /// Casts refused for lack of mana
    pub failed_casts: usize,
    /// Deliveries made by conjured bodies
    pub body_impacts: usize,
    pub random_seed: Option<u64>,
    pub caster: CombatantResult,
    /// In scenario order
    pub targets: Vec<CombatantResult>,
}

/// State of a single combatant at the end of a scenario
#[derive(Debug, Clone, Serialize)]
pub struct CombatantResult {
    pub name: String,
    pub max_health: f32,
    pub final_health: f32,
    pub survived: bool,
    pub damage_taken: f32,
    pub healing_received: f32,
    pub final_mana: f32,
    pub final_position: [f32; 3],
    /// Names of statuses still active
    pub statuses: Vec<String>,
}

impl CombatantResult {
    fn from_combatant(combatant: &Combatant, transform: &Transform) -> Self {
        Self {
            name: combatant.name.clone(),
            max_health: combatant.max_health,
            final_health: combatant.health,
            survived: combatant.is_alive(),
            damage_taken: combatant.damage_taken,
            healing_received: combatant.healing_received,
            final_mana: combatant.mana.current,
            final_position: transform.translation.to_array(),
            statuses: combatant.statuses.iter().map(|s| s.name().to_string()).collect(),
        }
    }
}

/// Resource to track headless scenario state
#[derive(Resource)]
pub struct ScenarioState {
    pub caster: Entity,
    pub targets: Vec<Entity>,
    timeline: Vec<TimelineStep>,
    next_step: usize,
    /// Elapsed simulation time
    pub elapsed: f32,
    pub duration: f32,
    pub complete: bool,
}

/// Send every timeline step that is due
fn headless_drive_timeline(mut state: ResMut<ScenarioState>, mut input: EventWriter<CastInputEvent>) {
    // Half a microsecond of slack so steps land on the frame they name
    let now = state.elapsed + 5e-7;
    while state.next_step < state.timeline.len() {
        let step = state.timeline[state.next_step].clone();
        if step.at > now {
            break;
        }
        state.next_step += 1;

        let event = match step.action {
            TimelineAction::Press => {
                CastInputEvent::pressed(state.caster, step.target.and_then(|i| state.targets.get(i).copied()))
            }
            TimelineAction::Release => CastInputEvent::released(state.caster),
        };
        input.send(event);
    }
}

/// Advance scenario time and mark completion
fn headless_track_time(time: Res<Time>, mut state: ResMut<ScenarioState>, mut log: ResMut<CombatLog>) {
    if state.complete {
        return;
    }
    state.elapsed += time.delta_secs();
    if state.elapsed + 5e-7 >= state.duration {
        state.complete = true;
        log.log(
            CombatLogEventType::MatchEvent,
            format!("Scenario finished after {:.2}s", state.elapsed),
        );
    }
}

fn facing_rotation(facing: [f32; 3]) -> Quat {
    let direction = Vec3::from_array(facing).normalize_or_zero();
    if direction == Vec3::ZERO {
        Quat::IDENTITY
    } else {
        Quat::from_rotation_arc(Vec3::NEG_Z, direction)
    }
}

/// Build an app that runs `config`, without stepping it
pub fn build_scenario_app(
    config: &ScenarioConfig,
    spellcraft: SpellcraftConfig,
    enable_logging: bool,
) -> Result<App, String> {
    config.validate().map_err(|e| e.to_string())?;

    let registry = ComponentRegistry::with_builtins();
    let composition = config.to_composition(&spellcraft).map_err(|e| e.to_string())?;
    let spell = create_spell(&composition, &registry, &spellcraft.crafting)
        .map_err(|e| format!("Invalid spell: {}", e))?;

    let rng = match config.random_seed {
        Some(seed) => {
            info!("Using deterministic RNG with seed: {}", seed);
            SpellRng::from_seed(seed)
        }
        None => {
            info!("Using non-deterministic RNG (no seed provided)");
            SpellRng::from_entropy()
        }
    };

    let mut app = App::new();
    // Minimal plugins - no window, no rendering
    app.add_plugins(MinimalPlugins);
    if enable_logging {
        app.add_plugins(LogPlugin::default());
    }
    app.insert_resource(TimeUpdateStrategy::ManualDuration(Duration::from_secs_f32(
        config.timestep(),
    )))
    .insert_resource(registry)
    .insert_resource(rng);

    let mut caster_mana = ManaPool::from_config(&spellcraft.mana);
    if let Some(mana) = config.caster.mana {
        caster_mana = caster_mana.with_current(mana);
    }
    app.insert_resource(spellcraft);
    app.add_plugins(CombatPlugin);

    let world = app.world_mut();
    let caster = world
        .spawn((
            Name::new(config.caster.name.clone()),
            Transform::from_translation(Vec3::from_array(config.caster.position))
                .with_rotation(facing_rotation(config.caster.facing)),
            Combatant::new(config.caster.name.clone(), config.caster.health, caster_mana),
            SpellCaster::new(spell.clone()),
        ))
        .id();

    let targets = config
        .targets
        .iter()
        .map(|target| {
            world
                .spawn((
                    Name::new(target.name.clone()),
                    Transform::from_translation(Vec3::from_array(target.position))
                        .with_rotation(facing_rotation(target.facing)),
                    // Targets carry an empty mana pool so mana burn has something to drain
                    Combatant::new(target.name.clone(), target.health, ManaPool::new(0.0, 0.0, 0.0)),
                ))
                .id()
        })
        .collect();

    let mut log = world.resource_mut::<CombatLog>();
    log.clear();
    log.log(
        CombatLogEventType::MatchEvent,
        format!("Scenario started: {} ({:.1} mana)", spell.label, spell.mana_cost),
    );

    world.insert_resource(ScenarioState {
        caster,
        targets,
        timeline: config.sorted_timeline(),
        next_step: 0,
        elapsed: 0.0,
        duration: config.duration_secs,
        complete: false,
    });

    app.add_systems(
        Update,
        (
            headless_drive_timeline.before(process_cast_input),
            headless_track_time.after(check_combatant_deaths),
        ),
    );

    Ok(app)
}

/// Step `app` until its scenario completes and collect the result
pub fn run_scenario_app(app: &mut App, random_seed: Option<u64>) -> Result<ScenarioResult, String> {
    let (duration, timestep) = {
        let state = app.world().resource::<ScenarioState>();
        let time = app.world().resource::<TimeUpdateStrategy>();
        let step = match time {
            TimeUpdateStrategy::ManualDuration(d) => d.as_secs_f32(),
            _ => 1.0 / 60.0,
        };
        (state.duration, step)
    };

    // One extra frame: the first update only primes the clock
    let max_frames = (duration / timestep).ceil() as usize + 2;
    for _ in 0..max_frames {
        app.update();
        if app.world().resource::<ScenarioState>().complete {
            break;
        }
    }

    collect_result(app, random_seed)
}

fn collect_result(app: &mut App, random_seed: Option<u64>) -> Result<ScenarioResult, String> {
    let world = app.world();
    let state = world.resource::<ScenarioState>();
    let log = world.resource::<CombatLog>();

    let snapshot = |entity: Entity| -> Result<CombatantResult, String> {
        let combatant = world
            .get::<Combatant>(entity)
            .ok_or_else(|| format!("Combatant {:?} disappeared", entity))?;
        let transform = world
            .get::<Transform>(entity)
            .ok_or_else(|| format!("Combatant {:?} lost its transform", entity))?;
        Ok(CombatantResult::from_combatant(combatant, transform))
    };

    let spell = world
        .get::<SpellCaster>(state.caster)
        .map(|c| &c.spell)
        .ok_or("Caster lost its spell")?;

    Ok(ScenarioResult {
        spell_label: spell.label.clone(),
        mana_cost: spell.mana_cost,
        elapsed: state.elapsed,
        casts: log.count(CombatLogEventType::SpellCast),
        failed_casts: log.count(CombatLogEventType::CastFailed),
        body_impacts: log.count(CombatLogEventType::BodyImpact),
        random_seed,
        caster: snapshot(state.caster)?,
        targets: state
            .targets
            .iter()
            .map(|&e| snapshot(e))
            .collect::<Result<Vec<_>, _>>()?,
    })
}

#[derive(Serialize)]
struct ScenarioReport<'a> {
    result: &'a ScenarioResult,
    log: Vec<String>,
}

/// Save the result and combat log as JSON
pub fn save_scenario_log(result: &ScenarioResult, log: &CombatLog, path: &str) -> Result<(), String> {
    let report = ScenarioReport {
        result,
        log: log.to_text().lines().map(str::to_string).collect(),
    };
    let contents = serde_json::to_string_pretty(&report).map_err(|e| e.to_string())?;
    std::fs::write(path, contents).map_err(|e| format!("Failed to write {}: {}", path, e))
}

/// Run a headless scenario with the given configuration
pub fn run_headless_scenario(
    config: &ScenarioConfig,
    spellcraft: SpellcraftConfig,
    enable_logging: bool,
) -> Result<ScenarioResult, String> {
    println!("Starting headless scenario...");
    println!("  Caster: {}", config.caster.name);
    println!("  Targets: {}", config.targets.len());
    println!("  Duration: {:.1}s at {} ticks/s", config.duration_secs, config.tick_rate);

    let mut app = build_scenario_app(config, spellcraft, enable_logging)?;
    let result = run_scenario_app(&mut app, config.random_seed)?;

    if let Some(path) = &config.output_path {
        let log = app.world().resource::<CombatLog>();
        save_scenario_log(&result, log, path)?;
        println!("Scenario complete. Log saved to: {}", path);
    }

    Ok(result)
}
