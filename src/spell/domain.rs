//! Elemental Domains
//!
//! Every spell carries one or more domains. A domain may proc a status on
//! each target hit, and Air additionally knocks the target back.
//!
//! The chance table is a diminishing-returns curve: the more domains a spell
//! has, the less likely each one is to proc on its own. Rolls are made per
//! (domain, target hit) pair, so an area spell with three domains rolls three
//! times for every target it reaches.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::combat::status::StatusEffect;
use crate::combat::target::CombatWorld;

use super::rng::SpellRng;

/// Fixed push applied by Air domain spells.
pub const AIR_KNOCKBACK_FORCE: f32 = 5.0;

/// Elemental domain tag.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Domain {
    Arcane,
    Fire,
    Water,
    Air,
    Earth,
    Lightning,
}

impl Domain {
    pub const ALL: [Domain; 6] = [
        Domain::Arcane,
        Domain::Fire,
        Domain::Water,
        Domain::Air,
        Domain::Earth,
        Domain::Lightning,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Domain::Arcane => "Arcane",
            Domain::Fire => "Fire",
            Domain::Water => "Water",
            Domain::Air => "Air",
            Domain::Earth => "Earth",
            Domain::Lightning => "Lightning",
        }
    }

    pub fn from_name(name: &str) -> Option<Domain> {
        Domain::ALL
            .into_iter()
            .find(|d| d.name().eq_ignore_ascii_case(name))
    }

    /// A fresh status template for this domain, if it has one.
    pub fn status_effect(&self) -> Option<StatusEffect> {
        match self {
            Domain::Fire => Some(StatusEffect::burning(3.0, 5.0)),
            Domain::Lightning => Some(StatusEffect::stunned(1.0)),
            Domain::Water => Some(StatusEffect::slowed(4.0, 0.4)),
            Domain::Earth => Some(StatusEffect::weakened(5.0, 0.3)),
            Domain::Air | Domain::Arcane => None,
        }
    }
}

/// Per-domain chance to proc a status, by how many domains the spell has.
pub fn status_chance(domain_count: usize) -> f32 {
    match domain_count {
        1 => 0.6,
        2 => 0.3,
        3 => 0.15,
        4 => 0.1,
        _ => 0.1,
    }
}

/// Air pushes the target away from the source; every other domain does nothing.
pub fn apply_domain_knockback(
    domain: Domain,
    source: Entity,
    target: Entity,
    world: &mut dyn CombatWorld,
) {
    if domain != Domain::Air || source == target {
        return;
    }
    let Some(source_pos) = world.position_of(source) else {
        return;
    };
    let Some(target) = world.target_mut(target) else {
        return;
    };

    let direction = (target.position() - source_pos).normalize_or_zero();
    if direction != Vec3::ZERO {
        target.apply_force(direction, AIR_KNOCKBACK_FORCE);
    }
}

/// Roll every domain's status against `target` and apply domain knockback.
///
/// Returns how many statuses were applied.
pub fn apply_domain_effects(
    domains: &[Domain],
    source: Entity,
    target: Entity,
    world: &mut dyn CombatWorld,
    rng: &mut SpellRng,
) -> usize {
    let chance = status_chance(domains.len());
    let mut applied = 0;

    for &domain in domains {
        if let Some(status) = domain.status_effect() {
            if rng.roll(chance) {
                if let Some(target) = world.target_mut(target) {
                    debug!("{} procs {} on {:?}", domain.name(), status.name(), target.entity());
                    target.apply_status(status);
                    applied += 1;
                }
            }
        }
        apply_domain_knockback(domain, source, target, world);
    }

    applied
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::combat::sandbox::{Dummy, Sandbox};
    use crate::combat::status::StatusKind;

    #[test]
    fn test_status_chance_table() {
        assert_eq!(status_chance(1), 0.6);
        assert_eq!(status_chance(2), 0.3);
        assert_eq!(status_chance(3), 0.15);
        assert_eq!(status_chance(4), 0.1);
        assert_eq!(status_chance(10), 0.1);
    }

    #[test]
    fn test_status_templates() {
        assert_eq!(
            Domain::Fire.status_effect(),
            Some(StatusEffect::burning(3.0, 5.0))
        );
        assert_eq!(
            Domain::Lightning.status_effect().map(|s| s.kind),
            Some(StatusKind::Stunned)
        );
        assert_eq!(
            Domain::Water.status_effect(),
            Some(StatusEffect::slowed(4.0, 0.4))
        );
        assert_eq!(
            Domain::Earth.status_effect(),
            Some(StatusEffect::weakened(5.0, 0.3))
        );
        assert!(Domain::Air.status_effect().is_none());
        assert!(Domain::Arcane.status_effect().is_none());
    }

    #[test]
    fn test_air_knockback_pushes_away_from_source() {
        let mut sandbox = Sandbox::new();
        let source = sandbox.add(Dummy::new(100.0).at(Vec3::ZERO));
        let target = sandbox.add(Dummy::new(100.0).at(Vec3::new(3.0, 0.0, 0.0)));

        apply_domain_knockback(Domain::Air, source, target, &mut sandbox);
        apply_domain_knockback(Domain::Fire, source, target, &mut sandbox);

        let dummy = sandbox.dummy(target).unwrap();
        assert_eq!(dummy.forces.len(), 1);
        let (direction, magnitude) = dummy.forces[0];
        assert_eq!(magnitude, AIR_KNOCKBACK_FORCE);
        assert!((direction - Vec3::X).length() < 1e-6);
    }

    #[test]
    fn test_proc_rate_tracks_chance_table() {
        let mut sandbox = Sandbox::new();
        let source = sandbox.add(Dummy::new(100.0));
        let target = sandbox.add(Dummy::new(100.0).at(Vec3::new(0.0, 0.0, -2.0)));
        let mut rng = SpellRng::from_seed(42);

        let rolls = 4000;
        let mut procs = 0;
        for _ in 0..rolls {
            procs += apply_domain_effects(&[Domain::Fire], source, target, &mut sandbox, &mut rng);
        }

        let rate = procs as f32 / rolls as f32;
        assert!((rate - 0.6).abs() < 0.05, "proc rate {} should be near 0.6", rate);
    }

    #[test]
    fn test_domain_names_round_trip() {
        for domain in Domain::ALL {
            assert_eq!(Domain::from_name(domain.name()), Some(domain));
        }
        assert_eq!(Domain::from_name("fire"), Some(Domain::Fire));
        assert_eq!(Domain::from_name("Shadow"), None);
    }
}
