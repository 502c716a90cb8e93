//! Spell crafting
//!
//! Turns a [`SpellCraftingComposition`] into a castable [`ComposedSpell`]:
//! validation, mana cost, strength scaling and the generated label.
//!
//! Mana cost is
//! `(form cost [x geometric multiplier for Conjure] + sum(effect costs) + augment cost) x method multiplier`.

use bevy::prelude::*;
use smallvec::SmallVec;

use super::augments::AugmentStrategy;
use super::composition::{CastMethod, Delivery, GeometricBody, SpellCraftingComposition, SpellForm, Targeting};
use super::domain::Domain;
use super::effects::SpellEffect;
use super::impact::ImpactBehavior;
use super::motion::MotionBehavior;
use super::registry::ComponentRegistry;
use crate::config::CraftingConfig;
use crate::error::{ComponentKind, CraftError};

/// Body selections of a Conjure spell.
#[derive(Clone, Debug)]
pub struct ConjureSpec {
    pub geometric: GeometricBody,
    pub motion: Box<dyn MotionBehavior>,
    pub impact: Box<dyn ImpactBehavior>,
    /// Seconds the body lives before despawning
    pub lifetime: f32,
}

/// A fully-built, castable spell.
#[derive(Clone, Debug)]
pub struct ComposedSpell {
    pub label: String,
    pub description: String,
    pub mana_cost: f32,
    pub cast_method: CastMethod,
    pub form: SpellForm,
    pub domains: SmallVec<[Domain; 4]>,
    /// Effects with the cast method's strength multiplier already applied
    pub effects: Vec<Box<dyn SpellEffect>>,
    pub augment: Box<dyn AugmentStrategy>,
    pub conjure: Option<ConjureSpec>,
}

impl ComposedSpell {
    pub fn targeting(&self) -> Targeting {
        self.form.targeting()
    }

    pub fn delivery(&self) -> Delivery {
        self.form.delivery()
    }
}

/// Mana cost of a composition.
///
/// Unknown effect or augment ids contribute nothing (with a warning), so a
/// crafting UI can show a live cost while the selection is still incomplete.
pub fn calculate_mana_cost(
    composition: &SpellCraftingComposition,
    registry: &ComponentRegistry,
    config: &CraftingConfig,
) -> f32 {
    let mut cost = config.form_costs.get(composition.form);
    if composition.form == SpellForm::Conjure {
        cost *= composition
            .geometric
            .as_ref()
            .map_or(1.0, |g| g.cost_multiplier);
    }

    for effect in composition.unique_effects() {
        cost += component_cost(registry, ComponentKind::Effect, effect);
    }
    cost += component_cost(registry, ComponentKind::Augment, &composition.augment);

    cost * config.method_cost_multipliers.get(composition.cast_method)
}

fn component_cost(registry: &ComponentRegistry, kind: ComponentKind, type_id: &str) -> f32 {
    registry.mana_cost(kind, type_id).unwrap_or_else(|| {
        warn!("Unknown {} type '{}' contributes no mana cost", kind, type_id);
        0.0
    })
}

/// Lifetime of the conjured body, or `None` for non-Conjure compositions
/// and unknown motion ids.
pub fn calculate_conjure_duration(
    composition: &SpellCraftingComposition,
    registry: &ComponentRegistry,
) -> Option<f32> {
    if composition.form != SpellForm::Conjure {
        return None;
    }
    let motion = registry.create_motion(composition.motion.as_deref()?)?;
    Some(motion.duration())
}

/// Label such as "Charged Conjured Damage & Push Spell".
pub fn spell_label(composition: &SpellCraftingComposition, registry: &ComponentRegistry) -> String {
    let effects: Vec<String> = composition
        .unique_effects()
        .into_iter()
        .map(|e| registry.display_name(ComponentKind::Effect, e))
        .collect();
    format!(
        "{} {} {} Spell",
        composition.cast_method.adjective(),
        composition.form.participle(),
        effects.join(" & ")
    )
}

/// Validate `composition` and build the spell it describes.
pub fn create_spell(
    composition: &SpellCraftingComposition,
    registry: &ComponentRegistry,
    config: &CraftingConfig,
) -> Result<ComposedSpell, CraftError> {
    if let Err(e) = composition.validate(registry, config) {
        warn!("Rejected spell composition: {}", e);
        return Err(e);
    }

    let strength = config.method_strength_multipliers.get(composition.cast_method);
    let mut effects = Vec::new();
    for type_id in composition.unique_effects() {
        let mut effect = registry.create_effect(type_id).ok_or_else(|| CraftError::UnknownType {
            kind: ComponentKind::Effect,
            type_id: type_id.to_string(),
        })?;
        effect.apply_strength_multiplier(strength);
        effects.push(effect);
    }

    let augment = registry
        .create_augment(&composition.augment)
        .ok_or_else(|| CraftError::UnknownType {
            kind: ComponentKind::Augment,
            type_id: composition.augment.clone(),
        })?;

    let conjure = if composition.form == SpellForm::Conjure {
        Some(build_conjure_spec(composition, registry)?)
    } else {
        None
    };

    let label = spell_label(composition, registry);
    let mana_cost = calculate_mana_cost(composition, registry, config);
    let domains: SmallVec<[Domain; 4]> = composition.unique_domains().into_iter().collect();
    let description = describe(&effects, augment.as_ref(), conjure.as_ref(), &domains, mana_cost);

    info!("Crafted '{}' ({:.1} mana)", label, mana_cost);

    Ok(ComposedSpell {
        label,
        description,
        mana_cost,
        cast_method: composition.cast_method,
        form: composition.form,
        domains,
        effects,
        augment,
        conjure,
    })
}

fn build_conjure_spec(
    composition: &SpellCraftingComposition,
    registry: &ComponentRegistry,
) -> Result<ConjureSpec, CraftError> {
    let geometric = composition.geometric.clone().ok_or(CraftError::MissingGeometric)?;
    let motion_id = composition.motion.as_deref().ok_or(CraftError::MissingConjureSelection {
        what: ComponentKind::Motion,
    })?;
    let impact_id = composition.impact.as_deref().ok_or(CraftError::MissingConjureSelection {
        what: ComponentKind::Impact,
    })?;

    let motion = registry.create_motion(motion_id).ok_or_else(|| CraftError::UnknownType {
        kind: ComponentKind::Motion,
        type_id: motion_id.to_string(),
    })?;
    let impact = registry.create_impact(impact_id).ok_or_else(|| CraftError::UnknownType {
        kind: ComponentKind::Impact,
        type_id: impact_id.to_string(),
    })?;

    Ok(ConjureSpec {
        geometric,
        lifetime: motion.duration(),
        motion,
        impact,
    })
}

fn describe(
    effects: &[Box<dyn SpellEffect>],
    augment: &dyn AugmentStrategy,
    conjure: Option<&ConjureSpec>,
    domains: &[Domain],
    mana_cost: f32,
) -> String {
    let mut lines: Vec<String> = effects.iter().map(|e| e.description()).collect();
    lines.push(augment.description());
    if let Some(conjure) = conjure {
        lines.push(format!(
            "{} body: {}, {}, lasts {:.0}s",
            conjure.geometric.name,
            conjure.motion.description(),
            conjure.impact.description().to_lowercase(),
            conjure.lifetime
        ));
    }
    let domain_names: Vec<&str> = domains.iter().map(|d| d.name()).collect();
    lines.push(format!("Domains: {}", domain_names.join(", ")));
    lines.push(format!("Costs {:.1} mana", mana_cost));
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn orb() -> GeometricBody {
        GeometricBody::new("Orb", 1.0, 0.3, "scenes/orb.glb")
    }

    #[test]
    fn test_cost_unknown_ids_contribute_nothing() {
        let composition = SpellCraftingComposition::new(CastMethod::Instant, SpellForm::Invoke)
            .with_domain(Domain::Fire)
            .with_effect("damage")
            .with_effect("petrify")
            .with_augment("bogus");
        let cost = calculate_mana_cost(&composition, ComponentRegistry::builtin(), &CraftingConfig::default());
        assert_eq!(cost, 17.0);
    }

    #[test]
    fn test_conjure_cost_uses_geometric_multiplier() {
        let composition = SpellCraftingComposition::new(CastMethod::Instant, SpellForm::Conjure)
            .with_domain(Domain::Earth)
            .with_effect("damage")
            .with_geometric(GeometricBody::new("Boulder", 1.5, 0.8, "scenes/boulder.glb"))
            .with_motion("straight")
            .with_impact("destroy");
        let cost = calculate_mana_cost(&composition, ComponentRegistry::builtin(), &CraftingConfig::default());
        assert_eq!(cost, 25.0);
    }

    #[test]
    fn test_conjure_duration() {
        let registry = ComponentRegistry::builtin();
        let composition = SpellCraftingComposition::new(CastMethod::Instant, SpellForm::Conjure)
            .with_geometric(orb())
            .with_motion("homing");
        assert_eq!(calculate_conjure_duration(&composition, registry), Some(8.0));

        let invoke = SpellCraftingComposition::new(CastMethod::Instant, SpellForm::Invoke).with_motion("homing");
        assert_eq!(calculate_conjure_duration(&invoke, registry), None);

        let unknown = composition.with_motion("teleport");
        assert_eq!(calculate_conjure_duration(&unknown, registry), None);
    }

    #[test]
    fn test_label_lists_effects_in_order() {
        let composition = SpellCraftingComposition::new(CastMethod::Charge, SpellForm::Conjure)
            .with_domain(Domain::Air)
            .with_effect("damage")
            .with_effect("push");
        assert_eq!(
            spell_label(&composition, ComponentRegistry::builtin()),
            "Charged Conjured Damage & Push Spell"
        );
    }

    #[test]
    fn test_create_spell_builds_conjure_spec() {
        let composition = SpellCraftingComposition::new(CastMethod::Instant, SpellForm::Conjure)
            .with_domain(Domain::Earth)
            .with_effect("damage")
            .with_geometric(orb())
            .with_motion("boomerang")
            .with_impact("pierce");
        let spell = create_spell(&composition, ComponentRegistry::builtin(), &CraftingConfig::default()).unwrap();

        let conjure = spell.conjure.as_ref().unwrap();
        assert_eq!(conjure.lifetime, 4.0);
        assert_eq!(conjure.motion.type_key(), "boomerang");
        assert_eq!(conjure.impact.type_key(), "pierce");
        assert_eq!(spell.delivery(), Delivery::SpawnedBody);
        assert!(spell.description.contains("Orb body"));
    }

    #[test]
    fn test_channel_weakens_effects() {
        let composition = SpellCraftingComposition::new(CastMethod::Channel, SpellForm::Invoke)
            .with_domain(Domain::Fire)
            .with_effect("damage");
        let spell = create_spell(&composition, ComponentRegistry::builtin(), &CraftingConfig::default()).unwrap();
        assert!((spell.effects[0].magnitude() - 4.5).abs() < 1e-5);
        assert!((spell.mana_cost - 21.25).abs() < 1e-5);
    }
}
