//! Spellcraft balance configuration
//!
//! Loaded from `assets/config/spellcraft.ron`. Every field has a default,
//! so a partial file only overrides what it names and a missing file falls
//! back to the built-in balance.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::error::ConfigError;
use crate::spell::composition::{CastMethod, GeometricBody, SpellForm};

#[derive(Resource, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpellcraftConfig {
    pub crafting: CraftingConfig,
    pub casting: CastingConfig,
    pub mana: ManaConfig,
    pub geometrics: Vec<GeometricBody>,
}

impl Default for SpellcraftConfig {
    fn default() -> Self {
        Self {
            crafting: CraftingConfig::default(),
            casting: CastingConfig::default(),
            mana: ManaConfig::default(),
            geometrics: vec![
                GeometricBody::new("Orb", 1.0, 0.3, "scenes/orb.glb"),
                GeometricBody::new("Shard", 1.2, 0.2, "scenes/shard.glb"),
                GeometricBody::new("Boulder", 1.5, 0.8, "scenes/boulder.glb"),
            ],
        }
    }
}

impl SpellcraftConfig {
    pub const DEFAULT_PATH: &'static str = "assets/config/spellcraft.ron";

    /// Load and validate a config file.
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let config: Self = ron::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Load from [`Self::DEFAULT_PATH`], or return defaults if the file is
    /// missing or invalid.
    pub fn load_or_default() -> Self {
        Self::load_or_default_from(Self::DEFAULT_PATH)
    }

    pub fn load_or_default_from(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        if !path.exists() {
            info!("No spellcraft config at {:?}, using defaults", path);
            return Self::default();
        }
        match Self::load_from_file(path) {
            Ok(config) => {
                info!("Loaded spellcraft config from {:?}", path);
                config
            }
            Err(e) => {
                warn!("{}; using defaults", e);
                Self::default()
            }
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let crafting = &self.crafting;
        if crafting.max_domains == 0 {
            return Err(ConfigError::Invalid("max_domains must be at least 1".to_string()));
        }
        if crafting.max_effects == 0 {
            return Err(ConfigError::Invalid("max_effects must be at least 1".to_string()));
        }
        for form in SpellForm::ALL {
            if crafting.form_costs.get(form) < 0.0 {
                return Err(ConfigError::Invalid(format!("{} form cost is negative", form.name())));
            }
        }
        for method in CastMethod::ALL {
            if crafting.method_cost_multipliers.get(method) < 0.0 {
                return Err(ConfigError::Invalid(format!(
                    "{} cost multiplier is negative",
                    method.name()
                )));
            }
            if crafting.method_strength_multipliers.get(method) < 0.0 {
                return Err(ConfigError::Invalid(format!(
                    "{} strength multiplier is negative",
                    method.name()
                )));
            }
        }

        if self.casting.charge_time <= 0.0 {
            return Err(ConfigError::Invalid("charge_time must be positive".to_string()));
        }
        if self.casting.channel_rate <= 0.0 {
            return Err(ConfigError::Invalid("channel_rate must be positive".to_string()));
        }

        if self.mana.max <= 0.0 {
            return Err(ConfigError::Invalid("mana max must be positive".to_string()));
        }
        if self.mana.regen_rate < 0.0 || self.mana.regen_cooldown < 0.0 {
            return Err(ConfigError::Invalid("mana regeneration values must not be negative".to_string()));
        }

        for (i, geometric) in self.geometrics.iter().enumerate() {
            if geometric.cost_multiplier < 0.0 {
                return Err(ConfigError::Invalid(format!(
                    "geometric '{}' has a negative cost multiplier",
                    geometric.name
                )));
            }
            if geometric.radius <= 0.0 {
                return Err(ConfigError::Invalid(format!(
                    "geometric '{}' must have a positive radius",
                    geometric.name
                )));
            }
            if self.geometrics[..i].iter().any(|g| g.name == geometric.name) {
                return Err(ConfigError::Invalid(format!(
                    "duplicate geometric '{}'",
                    geometric.name
                )));
            }
        }

        Ok(())
    }

    /// Look up a geometric body by name (case-insensitive).
    pub fn geometric(&self, name: &str) -> Option<&GeometricBody> {
        self.geometrics.iter().find(|g| g.name.eq_ignore_ascii_case(name))
    }
}

/// Limits and cost tables used when crafting.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CraftingConfig {
    pub max_domains: usize,
    pub max_effects: usize,
    pub form_costs: FormTable,
    pub method_cost_multipliers: MethodTable,
    pub method_strength_multipliers: MethodTable,
}

impl Default for CraftingConfig {
    fn default() -> Self {
        Self {
            max_domains: 3,
            max_effects: 3,
            form_costs: FormTable {
                imbue: 5.0,
                invoke: 7.0,
                conjure: 10.0,
            },
            method_cost_multipliers: MethodTable {
                instant: 1.0,
                charge: 0.75,
                channel: 1.25,
            },
            method_strength_multipliers: MethodTable {
                instant: 1.0,
                charge: 2.0,
                channel: 0.3,
            },
        }
    }
}

/// One value per [`SpellForm`].
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct FormTable {
    pub imbue: f32,
    pub invoke: f32,
    pub conjure: f32,
}

impl FormTable {
    pub fn get(&self, form: SpellForm) -> f32 {
        match form {
            SpellForm::Imbue => self.imbue,
            SpellForm::Invoke => self.invoke,
            SpellForm::Conjure => self.conjure,
        }
    }
}

/// One value per [`CastMethod`].
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct MethodTable {
    pub instant: f32,
    pub charge: f32,
    pub channel: f32,
}

impl MethodTable {
    pub fn get(&self, method: CastMethod) -> f32 {
        match method {
            CastMethod::Instant => self.instant,
            CastMethod::Charge => self.charge,
            CastMethod::Channel => self.channel,
        }
    }
}

/// Cast timing.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CastingConfig {
    /// Seconds a charge must be held before release resolves it
    pub charge_time: f32,
    /// Seconds between channel pulses
    pub channel_rate: f32,
    /// Distance in front of the caster where conjured bodies appear
    pub body_spawn_offset: f32,
}

impl Default for CastingConfig {
    fn default() -> Self {
        Self {
            charge_time: 1.0,
            channel_rate: 0.5,
            body_spawn_offset: 1.0,
        }
    }
}

/// Default mana pool for new casters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ManaConfig {
    pub max: f32,
    /// Mana regenerated per second
    pub regen_rate: f32,
    /// Seconds after spending before regeneration resumes
    pub regen_cooldown: f32,
}

impl Default for ManaConfig {
    fn default() -> Self {
        Self {
            max: 100.0,
            regen_rate: 10.0,
            regen_cooldown: 2.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        assert!(SpellcraftConfig::default().validate().is_ok());
    }

    #[test]
    fn test_partial_ron_keeps_defaults() {
        let config: SpellcraftConfig = ron::from_str("(casting: (charge_time: 2.5))").unwrap();
        assert_eq!(config.casting.charge_time, 2.5);
        assert_eq!(config.casting.channel_rate, 0.5);
        assert_eq!(config.crafting.form_costs.get(SpellForm::Invoke), 7.0);
        assert_eq!(config.geometrics.len(), 3);
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = SpellcraftConfig::default();
        config.casting.channel_rate = 0.0;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

        let mut config = SpellcraftConfig::default();
        config.crafting.max_effects = 0;
        assert!(config.validate().is_err());

        let mut config = SpellcraftConfig::default();
        config.geometrics.push(GeometricBody::new("Orb", 2.0, 0.5, "scenes/big_orb.glb"));
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_geometric_lookup() {
        let config = SpellcraftConfig::default();
        assert_eq!(config.geometric("boulder").map(|g| g.cost_multiplier), Some(1.5));
        assert!(config.geometric("Pyramid").is_none());
    }

    #[test]
    fn test_missing_file_falls_back() {
        let config = SpellcraftConfig::load_or_default_from("does/not/exist.ron");
        assert_eq!(config, SpellcraftConfig::default());
        assert!(matches!(
            SpellcraftConfig::load_from_file("does/not/exist.ron"),
            Err(ConfigError::Io { .. })
        ));
    }

    #[test]
    fn test_shipped_config_matches_defaults() {
        let config: SpellcraftConfig = ron::from_str(include_str!("../assets/config/spellcraft.ron")).unwrap();
        assert_eq!(config, SpellcraftConfig::default());
    }
}
