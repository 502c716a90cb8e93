//! Spell engine
//!
//! Composition, crafting and resolution of player-built spells:
//! - A composition of cast method, form, domains, effects and augment is
//!   validated and priced against the [`registry::ComponentRegistry`]
//! - Crafting produces an immutable [`crafting::ComposedSpell`]
//! - Resolution applies the spell through the target capability traits,
//!   either instantly or through a conjured body

pub mod augments;
pub mod body;
pub mod composition;
pub mod crafting;
pub mod domain;
pub mod effects;
pub mod impact;
pub mod motion;
pub mod registry;
pub mod resolution;
pub mod rng;

pub use composition::{CastMethod, GeometricBody, SpellCraftingComposition, SpellForm};
pub use crafting::{calculate_mana_cost, create_spell, ComposedSpell};
pub use domain::Domain;
pub use registry::ComponentRegistry;
pub use resolution::{attempt_cast, cast, CastOutcome, CastStateMachine};
