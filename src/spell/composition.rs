//! Spell composition: the player's selections before a spell is crafted.

use serde::{Deserialize, Serialize};

use super::domain::Domain;
use super::registry::ComponentRegistry;
use crate::config::CraftingConfig;
use crate::error::{ComponentKind, CraftError};

/// How the player triggers a spell.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CastMethod {
    #[default]
    Instant,
    Charge,
    Channel,
}

impl CastMethod {
    pub const ALL: [CastMethod; 3] = [CastMethod::Instant, CastMethod::Charge, CastMethod::Channel];

    pub fn name(&self) -> &'static str {
        match self {
            CastMethod::Instant => "Instant",
            CastMethod::Charge => "Charge",
            CastMethod::Channel => "Channel",
        }
    }

    /// Adjective used in spell labels.
    pub fn adjective(&self) -> &'static str {
        match self {
            CastMethod::Instant => "Instant",
            CastMethod::Charge => "Charged",
            CastMethod::Channel => "Channeled",
        }
    }
}

/// How a spell reaches its target.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SpellForm {
    /// Applied to the caster
    Imbue,
    /// Hitscan on the targeted entity
    #[default]
    Invoke,
    /// Spawns a physical body that carries the spell
    Conjure,
}

impl SpellForm {
    pub const ALL: [SpellForm; 3] = [SpellForm::Imbue, SpellForm::Invoke, SpellForm::Conjure];

    pub fn name(&self) -> &'static str {
        match self {
            SpellForm::Imbue => "Imbue",
            SpellForm::Invoke => "Invoke",
            SpellForm::Conjure => "Conjure",
        }
    }

    /// Participle used in spell labels.
    pub fn participle(&self) -> &'static str {
        match self {
            SpellForm::Imbue => "Imbued",
            SpellForm::Invoke => "Invoked",
            SpellForm::Conjure => "Conjured",
        }
    }

    pub fn targeting(&self) -> Targeting {
        match self {
            SpellForm::Imbue => Targeting::Caster,
            SpellForm::Invoke | SpellForm::Conjure => Targeting::Other,
        }
    }

    pub fn delivery(&self) -> Delivery {
        match self {
            SpellForm::Imbue | SpellForm::Invoke => Delivery::Hitscan,
            SpellForm::Conjure => Delivery::SpawnedBody,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Targeting {
    /// The caster is the primary target
    Caster,
    /// The entity under the caster's aim
    Other,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Delivery {
    Hitscan,
    SpawnedBody,
}

/// Shape asset for conjured bodies.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GeometricBody {
    pub name: String,
    /// Multiplier on the Conjure form cost
    pub cost_multiplier: f32,
    /// Collision radius in meters
    pub radius: f32,
    /// Scene asset the host instantiates for the body
    pub prototype: Option<String>,
}

impl GeometricBody {
    pub fn new(name: impl Into<String>, cost_multiplier: f32, radius: f32, prototype: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            cost_multiplier,
            radius,
            prototype: Some(prototype.into()),
        }
    }
}

/// Player selections that a spell is crafted from.
///
/// Domains and effects behave as sets: duplicates are dropped when they are
/// added through the builder and ignored when the composition is read.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpellCraftingComposition {
    pub cast_method: CastMethod,
    pub form: SpellForm,
    pub domains: Vec<Domain>,
    pub effects: Vec<String>,
    pub augment: String,
    pub geometric: Option<GeometricBody>,
    pub motion: Option<String>,
    pub impact: Option<String>,
}

impl Default for SpellCraftingComposition {
    fn default() -> Self {
        Self {
            cast_method: CastMethod::default(),
            form: SpellForm::default(),
            domains: Vec::new(),
            effects: Vec::new(),
            augment: "none".to_string(),
            geometric: None,
            motion: None,
            impact: None,
        }
    }
}

impl SpellCraftingComposition {
    pub fn new(cast_method: CastMethod, form: SpellForm) -> Self {
        Self {
            cast_method,
            form,
            ..Default::default()
        }
    }

    pub fn with_domain(mut self, domain: Domain) -> Self {
        if !self.domains.contains(&domain) {
            self.domains.push(domain);
        }
        self
    }

    pub fn with_effect(mut self, effect: impl Into<String>) -> Self {
        let effect = effect.into();
        if !self.effects.contains(&effect) {
            self.effects.push(effect);
        }
        self
    }

    pub fn with_augment(mut self, augment: impl Into<String>) -> Self {
        self.augment = augment.into();
        self
    }

    pub fn with_geometric(mut self, geometric: GeometricBody) -> Self {
        self.geometric = Some(geometric);
        self
    }

    pub fn with_motion(mut self, motion: impl Into<String>) -> Self {
        self.motion = Some(motion.into());
        self
    }

    pub fn with_impact(mut self, impact: impl Into<String>) -> Self {
        self.impact = Some(impact.into());
        self
    }

    /// Domains with duplicates removed, in selection order.
    pub fn unique_domains(&self) -> Vec<Domain> {
        let mut unique = Vec::with_capacity(self.domains.len());
        for &domain in &self.domains {
            if !unique.contains(&domain) {
                unique.push(domain);
            }
        }
        unique
    }

    /// Effect type ids with duplicates removed, in selection order.
    pub fn unique_effects(&self) -> Vec<&str> {
        let mut unique: Vec<&str> = Vec::with_capacity(self.effects.len());
        for effect in &self.effects {
            if !unique.contains(&effect.as_str()) {
                unique.push(effect);
            }
        }
        unique
    }

    /// Check the composition against the crafting rules.
    ///
    /// Conjure-specific selections are checked first, then the general rules
    /// in order: domain count, effect count, unknown ids, effect/domain
    /// availability, augment/form compatibility.
    pub fn validate(&self, registry: &ComponentRegistry, config: &CraftingConfig) -> Result<(), CraftError> {
        if self.form == SpellForm::Conjure {
            let geometric = self.geometric.as_ref().ok_or(CraftError::MissingGeometric)?;
            if geometric.prototype.as_deref().map_or(true, str::is_empty) {
                return Err(CraftError::MissingPrototype {
                    name: geometric.name.clone(),
                });
            }
            let motion = self.motion.as_deref().ok_or(CraftError::MissingConjureSelection {
                what: ComponentKind::Motion,
            })?;
            if registry.motions.get(motion).is_none() {
                return Err(CraftError::UnknownType {
                    kind: ComponentKind::Motion,
                    type_id: motion.to_string(),
                });
            }
            let impact = self.impact.as_deref().ok_or(CraftError::MissingConjureSelection {
                what: ComponentKind::Impact,
            })?;
            if registry.impacts.get(impact).is_none() {
                return Err(CraftError::UnknownType {
                    kind: ComponentKind::Impact,
                    type_id: impact.to_string(),
                });
            }
        }

        let domains = self.unique_domains();
        if domains.is_empty() {
            return Err(CraftError::NoDomains);
        }
        if domains.len() > config.max_domains {
            return Err(CraftError::TooManyDomains {
                max: config.max_domains,
                got: domains.len(),
            });
        }

        let effects = self.unique_effects();
        if effects.is_empty() {
            return Err(CraftError::NoEffects);
        }
        if effects.len() > config.max_effects {
            return Err(CraftError::TooManyEffects {
                max: config.max_effects,
                got: effects.len(),
            });
        }

        for effect in &effects {
            let entry = registry.effects.get(effect).ok_or_else(|| CraftError::UnknownType {
                kind: ComponentKind::Effect,
                type_id: effect.to_string(),
            })?;
            if !entry.available_for(&domains) {
                return Err(CraftError::EffectUnavailable {
                    effect: effect.to_string(),
                });
            }
        }

        let augment = registry
            .create_augment(&self.augment)
            .ok_or_else(|| CraftError::UnknownType {
                kind: ComponentKind::Augment,
                type_id: self.augment.clone(),
            })?;
        if !augment.compatible_forms().contains(&self.form) {
            return Err(CraftError::IncompatibleAugment {
                augment: self.augment.clone(),
                form: self.form,
            });
        }

        Ok(())
    }
}
