//! JSON configuration parsing for headless mode
//!
//! A scenario places one caster and any number of targets, equips the caster
//! with a composed spell, and scripts when the cast button is pressed and
//! released.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::config::SpellcraftConfig;
use crate::error::ConfigError;
use crate::spell::composition::{CastMethod, SpellCraftingComposition, SpellForm};
use crate::spell::domain::Domain;

/// Headless scenario configuration loaded from JSON
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioConfig {
    pub caster: CasterConfig,
    #[serde(default)]
    pub targets: Vec<TargetConfig>,
    pub spell: SpellConfig,
    /// Scripted cast input, in any order
    #[serde(default)]
    pub timeline: Vec<TimelineStep>,
    /// Simulated seconds to run (default: 10)
    #[serde(default = "default_duration")]
    pub duration_secs: f32,
    /// Simulation steps per second (default: 60)
    #[serde(default = "default_tick_rate")]
    pub tick_rate: u32,
    /// Random seed for deterministic status rolls
    #[serde(default)]
    pub random_seed: Option<u64>,
    /// Custom output path for the scenario log (optional)
    #[serde(default)]
    pub output_path: Option<String>,
}

fn default_duration() -> f32 {
    10.0
}

fn default_tick_rate() -> u32 {
    60
}

fn default_health() -> f32 {
    100.0
}

fn default_forward() -> [f32; 3] {
    [0.0, 0.0, -1.0]
}

fn default_augment() -> String {
    "none".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CasterConfig {
    #[serde(default = "default_caster_name")]
    pub name: String,
    #[serde(default)]
    pub position: [f32; 3],
    /// Look direction (default: -Z)
    #[serde(default = "default_forward")]
    pub facing: [f32; 3],
    #[serde(default = "default_health")]
    pub health: f32,
    /// Starting mana (default: the configured maximum)
    #[serde(default)]
    pub mana: Option<f32>,
}

fn default_caster_name() -> String {
    "Caster".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TargetConfig {
    pub name: String,
    pub position: [f32; 3],
    #[serde(default = "default_forward")]
    pub facing: [f32; 3],
    #[serde(default = "default_health")]
    pub health: f32,
}

/// Spell selections, with the geometric body referenced by name.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpellConfig {
    pub cast_method: CastMethod,
    pub form: SpellForm,
    pub domains: Vec<Domain>,
    pub effects: Vec<String>,
    #[serde(default = "default_augment")]
    pub augment: String,
    #[serde(default)]
    pub geometric: Option<String>,
    #[serde(default)]
    pub motion: Option<String>,
    #[serde(default)]
    pub impact: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TimelineAction {
    Press,
    Release,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimelineStep {
    /// Seconds after the scenario starts
    pub at: f32,
    pub action: TimelineAction,
    /// Index into `targets` to aim at when pressing
    #[serde(default)]
    pub target: Option<usize>,
}

impl ScenarioConfig {
    /// Load configuration from a JSON file
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;

        let config: ScenarioConfig = serde_json::from_str(&contents).map_err(|source| ConfigError::Json {
            path: path.display().to_string(),
            source,
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.duration_secs <= 0.0 {
            return Err(ConfigError::Invalid("duration_secs must be positive".to_string()));
        }
        if self.tick_rate == 0 {
            return Err(ConfigError::Invalid("tick_rate must be positive".to_string()));
        }
        if self.caster.health <= 0.0 {
            return Err(ConfigError::Invalid("caster health must be positive".to_string()));
        }
        for target in &self.targets {
            if target.health <= 0.0 {
                return Err(ConfigError::Invalid(format!(
                    "target '{}' must have positive health",
                    target.name
                )));
            }
        }

        for step in &self.timeline {
            if step.at < 0.0 {
                return Err(ConfigError::Invalid(format!(
                    "timeline step at {:.2}s is negative",
                    step.at
                )));
            }
            if let Some(index) = step.target {
                if index >= self.targets.len() {
                    return Err(ConfigError::Invalid(format!(
                        "timeline target {} is out of range ({} targets)",
                        index,
                        self.targets.len()
                    )));
                }
            }
        }

        Ok(())
    }

    /// Fixed simulation step in seconds
    pub fn timestep(&self) -> f32 {
        1.0 / self.tick_rate as f32
    }

    /// Timeline sorted by time (stable for equal times)
    pub fn sorted_timeline(&self) -> Vec<TimelineStep> {
        let mut timeline = self.timeline.clone();
        timeline.sort_by(|a, b| a.at.total_cmp(&b.at));
        timeline
    }

    /// Build the composition, resolving the geometric body by name
    pub fn to_composition(&self, spellcraft: &SpellcraftConfig) -> Result<SpellCraftingComposition, ConfigError> {
        let spell = &self.spell;
        let geometric = match &spell.geometric {
            Some(name) => Some(
                spellcraft
                    .geometric(name)
                    .cloned()
                    .ok_or_else(|| ConfigError::Invalid(format!("unknown geometric body '{}'", name)))?,
            ),
            None => None,
        };

        Ok(SpellCraftingComposition {
            cast_method: spell.cast_method,
            form: spell.form,
            domains: spell.domains.clone(),
            effects: spell.effects.clone(),
            augment: spell.augment.clone(),
            geometric,
            motion: spell.motion.clone(),
            impact: spell.impact.clone(),
        })
    }
}
