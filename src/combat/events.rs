//! Combat events
//!
//! Input into the cast state machines, and notifications of what spells did.

use bevy::prelude::*;

/// Which edge of the cast button an input event reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CastPhase {
    Pressed,
    Released,
}

/// Player (or script) input for a caster's equipped spell
#[derive(Event, Debug, Clone)]
pub struct CastInputEvent {
    pub caster: Entity,
    pub phase: CastPhase,
    /// Entity under the caster's aim, if any
    pub target: Option<Entity>,
}

impl CastInputEvent {
    pub fn pressed(caster: Entity, target: Option<Entity>) -> Self {
        Self {
            caster,
            phase: CastPhase::Pressed,
            target,
        }
    }

    pub fn released(caster: Entity) -> Self {
        Self {
            caster,
            phase: CastPhase::Released,
            target: None,
        }
    }
}

/// Event fired when a spell goes off (mana was spent)
#[derive(Event, Debug, Clone)]
pub struct SpellCastEvent {
    pub caster: Entity,
    /// Label of the spell that was cast
    pub spell_label: String,
    /// Targets reached immediately (empty for conjured bodies)
    pub targets: Vec<Entity>,
}

/// Event fired when a conjured body delivers its spell
#[derive(Event, Debug, Clone)]
pub struct BodyImpactEvent {
    pub body: Entity,
    pub caster: Entity,
    /// Entity the body struck
    pub struck: Entity,
    /// Every target the delivery reached, including the struck one
    pub targets: Vec<Entity>,
}

/// Event fired when a combatant dies
#[derive(Event, Debug, Clone)]
pub struct CombatantDeathEvent {
    pub entity: Entity,
    pub name: String,
}
