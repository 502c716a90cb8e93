//! Combat system
//!
//! Everything spells act upon:
//! - The target capability traits the spell engine is written against
//! - Combatant health, mana and status effects
//! - An in-memory world for tests and tools, and the ECS host for the app
//! - Combat logging

use bevy::prelude::*;

pub mod components;
pub mod events;
pub mod log;
pub mod mana;
pub mod sandbox;
pub mod status;
pub mod systems;
pub mod target;

use crate::config::SpellcraftConfig;
use crate::spell::registry::ComponentRegistry;
use crate::spell::rng::SpellRng;
use events::*;
use systems::*;

/// Plugin for the combat system
///
/// Resources that are already present (a seeded [`SpellRng`], a
/// scenario-specific [`SpellcraftConfig`]) are left untouched.
pub struct CombatPlugin;

impl Plugin for CombatPlugin {
    fn build(&self, app: &mut App) {
        if !app.world().contains_resource::<SpellcraftConfig>() {
            app.insert_resource(SpellcraftConfig::load_or_default());
        }

        app
            // Combat events
            .add_event::<CastInputEvent>()
            .add_event::<SpellCastEvent>()
            .add_event::<BodyImpactEvent>()
            .add_event::<CombatantDeathEvent>()
            // Resources
            .init_resource::<ComponentRegistry>()
            .init_resource::<SpellRng>()
            .init_resource::<log::CombatLog>()
            // Systems
            .add_systems(Update, (
                advance_combat_log,
                process_cast_input,
                tick_spell_casters,
                regenerate_mana,
                tick_status_effects,
                integrate_knockback,
                move_conjured_bodies,
                resolve_body_collisions,
                despawn_finished_bodies,
                check_combatant_deaths,
            ).chain());
    }
}
