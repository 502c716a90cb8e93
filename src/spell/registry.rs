//! Component Registry
//!
//! Catalog of every pluggable spell component: effects, augments, motion
//! behaviors and impact behaviors. Each entry pairs a stable type id with UI
//! metadata (display name, mana cost, domain availability) and a factory that
//! builds a fresh, default-configured instance.
//!
//! ## Usage
//! ```ignore
//! let registry = ComponentRegistry::builtin();
//! let damage = registry.create_effect("damage").unwrap();
//! assert_eq!(registry.display_name(ComponentKind::Effect, "damage"), "Damage");
//! ```
//!
//! Listing functions return type ids sorted alphabetically by display name
//! (type id breaks ties), so the order is independent of registration order.
//! An entry registered without domains is offered for every domain.

use std::sync::OnceLock;

use bevy::prelude::*;
use smallvec::SmallVec;

use super::augments::{AreaOfEffectAugment, AugmentStrategy, ChainAugment, NoAugment};
use super::composition::SpellForm;
use super::domain::Domain;
use super::effects::{
    BurnManaEffect, DamageEffect, HealEffect, LeechEffect, PullEffect, PushEffect, SpellEffect,
};
use super::impact::{DestroyImpact, ImpactBehavior, PierceImpact, StickImpact};
use super::motion::{
    BoomerangMotion, HomingMotion, MotionBehavior, PrimedMotion, StationaryMotion, StraightMotion,
};
use crate::error::{ComponentKind, RegistryError};

/// Stable type key of a registered component instance.
pub trait Keyed {
    fn key(&self) -> &'static str;
}

impl Keyed for dyn SpellEffect {
    fn key(&self) -> &'static str {
        self.type_key()
    }
}

impl Keyed for dyn AugmentStrategy {
    fn key(&self) -> &'static str {
        self.type_key()
    }
}

impl Keyed for dyn MotionBehavior {
    fn key(&self) -> &'static str {
        self.type_key()
    }
}

impl Keyed for dyn ImpactBehavior {
    fn key(&self) -> &'static str {
        self.type_key()
    }
}

/// One registered component type.
pub struct CatalogEntry<T: ?Sized> {
    pub type_id: &'static str,
    pub display_name: &'static str,
    pub mana_cost: f32,
    /// Domains the component is offered for; empty means every domain
    pub domains: SmallVec<[Domain; 6]>,
    factory: fn() -> Box<T>,
}

impl<T: ?Sized> CatalogEntry<T> {
    pub fn new(type_id: &'static str, display_name: &'static str, factory: fn() -> Box<T>) -> Self {
        Self {
            type_id,
            display_name,
            mana_cost: 0.0,
            domains: SmallVec::new(),
            factory,
        }
    }

    pub fn with_cost(mut self, mana_cost: f32) -> Self {
        self.mana_cost = mana_cost;
        self
    }

    pub fn with_domains(mut self, domains: &[Domain]) -> Self {
        self.domains = domains.iter().copied().collect();
        self
    }

    pub fn create(&self) -> Box<T> {
        (self.factory)()
    }

    /// Whether the entry may be used with at least one of `domains`.
    pub fn available_for(&self, domains: &[Domain]) -> bool {
        self.domains.is_empty() || self.domains.iter().any(|d| domains.contains(d))
    }
}

pub type EffectEntry = CatalogEntry<dyn SpellEffect>;
pub type AugmentEntry = CatalogEntry<dyn AugmentStrategy>;
pub type MotionEntry = CatalogEntry<dyn MotionBehavior>;
pub type ImpactEntry = CatalogEntry<dyn ImpactBehavior>;

/// Registered types of one component family.
pub struct Catalog<T: ?Sized> {
    kind: ComponentKind,
    entries: Vec<CatalogEntry<T>>,
}

impl<T: ?Sized + Keyed> Catalog<T> {
    pub fn new(kind: ComponentKind) -> Self {
        Self {
            kind,
            entries: Vec::new(),
        }
    }

    pub fn kind(&self) -> ComponentKind {
        self.kind
    }

    /// Add an entry after checking it is unique, named, and that its factory
    /// builds the type it claims to.
    pub fn register(&mut self, entry: CatalogEntry<T>) -> Result<(), RegistryError> {
        if self.get(entry.type_id).is_some() {
            return Err(RegistryError::Duplicate {
                kind: self.kind,
                type_id: entry.type_id.to_string(),
            });
        }
        if entry.display_name.trim().is_empty() {
            return Err(RegistryError::EmptyDisplayName {
                kind: self.kind,
                type_id: entry.type_id.to_string(),
            });
        }
        let produced = entry.create().key();
        if produced != entry.type_id {
            return Err(RegistryError::FactoryMismatch {
                kind: self.kind,
                type_id: entry.type_id.to_string(),
                produced: produced.to_string(),
            });
        }

        self.entries.push(entry);
        self.entries
            .sort_by(|a, b| a.display_name.cmp(b.display_name).then(a.type_id.cmp(b.type_id)));
        Ok(())
    }

    /// Register, logging and skipping entries that fail validation.
    fn register_or_warn(&mut self, entry: CatalogEntry<T>) {
        if let Err(e) = self.register(entry) {
            warn!("Skipping component registration: {}", e);
        }
    }

    pub fn get(&self, type_id: &str) -> Option<&CatalogEntry<T>> {
        self.entries.iter().find(|e| e.type_id == type_id)
    }

    pub fn create(&self, type_id: &str) -> Option<Box<T>> {
        self.get(type_id).map(CatalogEntry::create)
    }

    /// Registered type ids, ordered by display name.
    pub fn type_ids(&self) -> Vec<&'static str> {
        self.entries.iter().map(|e| e.type_id).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &CatalogEntry<T>> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[derive(Resource)]
pub struct ComponentRegistry {
    pub effects: Catalog<dyn SpellEffect>,
    pub augments: Catalog<dyn AugmentStrategy>,
    pub motions: Catalog<dyn MotionBehavior>,
    pub impacts: Catalog<dyn ImpactBehavior>,
}

impl Default for ComponentRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}

impl ComponentRegistry {
    /// A registry with nothing registered.
    pub fn empty() -> Self {
        Self {
            effects: Catalog::new(ComponentKind::Effect),
            augments: Catalog::new(ComponentKind::Augment),
            motions: Catalog::new(ComponentKind::Motion),
            impacts: Catalog::new(ComponentKind::Impact),
        }
    }

    /// A registry holding every built-in component.
    pub fn with_builtins() -> Self {
        let mut registry = Self::empty();
        register_builtin_effects(&mut registry.effects);
        register_builtin_augments(&mut registry.augments);
        register_builtin_motions(&mut registry.motions);
        register_builtin_impacts(&mut registry.impacts);
        info!(
            "Component registry populated: {} effects, {} augments, {} motions, {} impacts",
            registry.effects.len(),
            registry.augments.len(),
            registry.motions.len(),
            registry.impacts.len()
        );
        registry
    }

    /// Process-wide registry of built-ins, populated on first use.
    pub fn builtin() -> &'static ComponentRegistry {
        static BUILTIN: OnceLock<ComponentRegistry> = OnceLock::new();
        BUILTIN.get_or_init(ComponentRegistry::with_builtins)
    }

    pub fn list_effect_types(&self) -> Vec<&'static str> {
        self.effects.type_ids()
    }

    pub fn list_augment_types(&self) -> Vec<&'static str> {
        self.augments.type_ids()
    }

    pub fn list_motion_types(&self) -> Vec<&'static str> {
        self.motions.type_ids()
    }

    pub fn list_impact_types(&self) -> Vec<&'static str> {
        self.impacts.type_ids()
    }

    pub fn create_effect(&self, type_id: &str) -> Option<Box<dyn SpellEffect>> {
        self.effects.create(type_id)
    }

    pub fn create_augment(&self, type_id: &str) -> Option<Box<dyn AugmentStrategy>> {
        self.augments.create(type_id)
    }

    pub fn create_motion(&self, type_id: &str) -> Option<Box<dyn MotionBehavior>> {
        self.motions.create(type_id)
    }

    pub fn create_impact(&self, type_id: &str) -> Option<Box<dyn ImpactBehavior>> {
        self.impacts.create(type_id)
    }

    /// Display name for a type id, falling back to the id itself.
    pub fn display_name(&self, kind: ComponentKind, type_id: &str) -> String {
        let name = match kind {
            ComponentKind::Effect => self.effects.get(type_id).map(|e| e.display_name),
            ComponentKind::Augment => self.augments.get(type_id).map(|e| e.display_name),
            ComponentKind::Motion => self.motions.get(type_id).map(|e| e.display_name),
            ComponentKind::Impact => self.impacts.get(type_id).map(|e| e.display_name),
        };
        name.unwrap_or(type_id).to_string()
    }

    /// Mana cost metadata for an effect or augment type.
    pub fn mana_cost(&self, kind: ComponentKind, type_id: &str) -> Option<f32> {
        match kind {
            ComponentKind::Effect => self.effects.get(type_id).map(|e| e.mana_cost),
            ComponentKind::Augment => self.augments.get(type_id).map(|e| e.mana_cost),
            ComponentKind::Motion => self.motions.get(type_id).map(|e| e.mana_cost),
            ComponentKind::Impact => self.impacts.get(type_id).map(|e| e.mana_cost),
        }
    }

    /// Domains an effect is offered for; empty for unknown ids.
    pub fn effect_domains(&self, type_id: &str) -> &[Domain] {
        self.effects
            .get(type_id)
            .map(|e| e.domains.as_slice())
            .unwrap_or(&[])
    }

    /// Effect types available for at least one of `domains`, ordered by display name.
    pub fn effects_for_domains(&self, domains: &[Domain]) -> Vec<&'static str> {
        self.effects
            .iter()
            .filter(|e| e.available_for(domains))
            .map(|e| e.type_id)
            .collect()
    }

    /// Augment types compatible with `form`, ordered by display name.
    pub fn augments_for_form(&self, form: SpellForm) -> Vec<&'static str> {
        self.augments
            .iter()
            .filter(|e| e.create().compatible_forms().contains(&form))
            .map(|e| e.type_id)
            .collect()
    }
}

// ============================================================================
// Built-in catalog
// ============================================================================

fn register_builtin_effects(catalog: &mut Catalog<dyn SpellEffect>) {
    catalog.register_or_warn(
        EffectEntry::new("damage", "Damage", || Box::new(DamageEffect::default()))
            .with_cost(10.0)
            .with_domains(&Domain::ALL),
    );
    catalog.register_or_warn(
        EffectEntry::new("heal", "Heal", || Box::new(HealEffect::default()))
            .with_cost(10.0)
            .with_domains(&[Domain::Water, Domain::Earth, Domain::Arcane]),
    );
    catalog.register_or_warn(
        EffectEntry::new("push", "Push", || Box::new(PushEffect::default()))
            .with_cost(5.0)
            .with_domains(&[Domain::Air, Domain::Earth, Domain::Arcane]),
    );
    catalog.register_or_warn(
        EffectEntry::new("pull", "Pull", || Box::new(PullEffect::default()))
            .with_cost(5.0)
            .with_domains(&[Domain::Air, Domain::Water, Domain::Arcane]),
    );
    catalog.register_or_warn(
        EffectEntry::new("leech", "Leech", || Box::new(LeechEffect::default()))
            .with_cost(15.0)
            .with_domains(&[Domain::Arcane, Domain::Water]),
    );
    catalog.register_or_warn(
        EffectEntry::new("burn_mana", "Burn Mana", || Box::new(BurnManaEffect::default()))
            .with_cost(8.0)
            .with_domains(&[Domain::Arcane, Domain::Lightning]),
    );
}

fn register_builtin_augments(catalog: &mut Catalog<dyn AugmentStrategy>) {
    catalog.register_or_warn(AugmentEntry::new("none", "None", || Box::new(NoAugment)));
    catalog.register_or_warn(
        AugmentEntry::new("chain", "Chain", || Box::new(ChainAugment::default())).with_cost(12.0),
    );
    catalog.register_or_warn(
        AugmentEntry::new("aoe", "Area of Effect", || Box::new(AreaOfEffectAugment::default()))
            .with_cost(15.0),
    );
}

fn register_builtin_motions(catalog: &mut Catalog<dyn MotionBehavior>) {
    catalog.register_or_warn(MotionEntry::new("stationary", "Stationary", || {
        Box::new(StationaryMotion::default())
    }));
    catalog.register_or_warn(MotionEntry::new("straight", "Straight", || {
        Box::new(StraightMotion::default())
    }));
    catalog.register_or_warn(MotionEntry::new("homing", "Homing", || {
        Box::new(HomingMotion::default())
    }));
    catalog.register_or_warn(MotionEntry::new("boomerang", "Boomerang", || {
        Box::new(BoomerangMotion::default())
    }));
    catalog.register_or_warn(MotionEntry::new("primed", "Primed", || {
        Box::new(PrimedMotion::default())
    }));
}

fn register_builtin_impacts(catalog: &mut Catalog<dyn ImpactBehavior>) {
    catalog.register_or_warn(ImpactEntry::new("destroy", "Destroy", || Box::new(DestroyImpact)));
    catalog.register_or_warn(ImpactEntry::new("pierce", "Pierce", || Box::new(PierceImpact)));
    catalog.register_or_warn(ImpactEntry::new("stick", "Stick", || Box::new(StickImpact)));
}
