//! Spellforge - Spellcrafting Composition and Resolution Engine
//!
//! Players compose spells from orthogonal choices (form, cast method,
//! elemental domains, effects, augment and, for conjured spells, a body with
//! motion and impact behaviors). The engine prices the composition, crafts
//! an immutable spell and resolves it against combat targets.
//!
//! This library exposes the engine, a Bevy combat host and a headless
//! scenario runner for testing and reuse.

pub mod cli;
pub mod combat;
pub mod config;
pub mod error;
pub mod headless;
pub mod spell;

// Re-export commonly used types
pub use combat::log::{CombatLog, CombatLogEventType};
pub use combat::sandbox::{Dummy, Sandbox};
pub use config::SpellcraftConfig;
pub use error::{ConfigError, CraftError, RegistryError};
pub use headless::ScenarioConfig;
pub use spell::{ComponentRegistry, ComposedSpell, SpellCraftingComposition};
