//! Status Effects
//!
//! Timed conditions that sit on a combatant after a spell lands: burning,
//! stunned, slowed and weakened. The container is owned by the host entity
//! and ticked once per frame; spells only ever add to it through
//! [`super::target::CombatTarget::apply_status`].

use serde::{Deserialize, Serialize};

/// What a status does while it is active.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub enum StatusKind {
    /// Deals damage every tick for as long as it lasts
    Burning { damage_per_second: f32 },
    /// Cannot cast; in-progress charges and channels are cancelled
    Stunned,
    /// Movement is reduced by `percent` (0.4 = 40% slower)
    Slowed { percent: f32 },
    /// Incoming damage is increased by `percent` (0.3 = 30% more)
    Weakened { percent: f32 },
}

impl StatusKind {
    pub fn name(&self) -> &'static str {
        match self {
            StatusKind::Burning { .. } => "Burning",
            StatusKind::Stunned => "Stunned",
            StatusKind::Slowed { .. } => "Slowed",
            StatusKind::Weakened { .. } => "Weakened",
        }
    }

    fn same_variant(&self, other: &StatusKind) -> bool {
        std::mem::discriminant(self) == std::mem::discriminant(other)
    }
}

/// A single active (or template) status.
///
/// Templates handed out by the domain table are fresh values, so applying
/// one never aliases another target's instance.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StatusEffect {
    pub kind: StatusKind,
    /// Seconds remaining
    pub duration: f32,
    /// Stacking statuses add an independent instance on every application;
    /// non-stacking ones refresh the existing instance instead.
    pub can_stack: bool,
}

impl StatusEffect {
    pub fn burning(duration: f32, damage_per_second: f32) -> Self {
        Self {
            kind: StatusKind::Burning { damage_per_second },
            duration,
            can_stack: true,
        }
    }

    pub fn stunned(duration: f32) -> Self {
        Self {
            kind: StatusKind::Stunned,
            duration,
            can_stack: false,
        }
    }

    pub fn slowed(duration: f32, percent: f32) -> Self {
        Self {
            kind: StatusKind::Slowed { percent },
            duration,
            can_stack: false,
        }
    }

    pub fn weakened(duration: f32, percent: f32) -> Self {
        Self {
            kind: StatusKind::Weakened { percent },
            duration,
            can_stack: false,
        }
    }

    pub fn name(&self) -> &'static str {
        self.kind.name()
    }
}

/// Result of adding a status to a container.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StatusApplication {
    Added,
    Refreshed,
}

/// What happened during one tick of a status container.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct StatusTick {
    /// Burning damage accrued this tick (to be applied by the host)
    pub damage: f32,
    /// Names of statuses that ran out this tick
    pub expired: Vec<&'static str>,
}

/// All statuses currently active on one entity.
#[derive(Clone, Debug, Default)]
pub struct StatusEffects {
    active: Vec<StatusEffect>,
}

impl StatusEffects {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a status, refreshing an existing non-stacking instance of the same kind.
    pub fn apply(&mut self, status: StatusEffect) -> StatusApplication {
        if !status.can_stack {
            if let Some(existing) = self
                .active
                .iter_mut()
                .find(|s| s.kind.same_variant(&status.kind))
            {
                existing.duration = status.duration;
                existing.kind = status.kind;
                return StatusApplication::Refreshed;
            }
        }

        self.active.push(status);
        StatusApplication::Added
    }

    /// Advance every status by `dt` seconds and drop the ones that ran out.
    pub fn tick(&mut self, dt: f32) -> StatusTick {
        let mut result = StatusTick::default();

        for status in self.active.iter_mut() {
            if let StatusKind::Burning { damage_per_second } = status.kind {
                // Never burn for longer than the status had left
                result.damage += damage_per_second * dt.min(status.duration.max(0.0));
            }
            status.duration -= dt;
        }

        self.active.retain(|status| {
            if status.duration <= 0.0 {
                result.expired.push(status.name());
                false
            } else {
                true
            }
        });

        result
    }

    pub fn iter(&self) -> impl Iterator<Item = &StatusEffect> {
        self.active.iter()
    }

    pub fn len(&self) -> usize {
        self.active.len()
    }

    pub fn is_empty(&self) -> bool {
        self.active.is_empty()
    }

    pub fn clear(&mut self) {
        self.active.clear();
    }

    /// Number of active instances with the given name.
    pub fn count(&self, name: &str) -> usize {
        self.active.iter().filter(|s| s.name() == name).count()
    }

    pub fn is_stunned(&self) -> bool {
        self.active
            .iter()
            .any(|s| matches!(s.kind, StatusKind::Stunned))
    }

    /// Multiplier applied to movement (1.0 = unaffected).
    pub fn movement_multiplier(&self) -> f32 {
        self.active.iter().fold(1.0, |mult, s| match s.kind {
            StatusKind::Slowed { percent } => mult * (1.0 - percent).max(0.0),
            _ => mult,
        })
    }

    /// Multiplier applied to incoming damage (1.0 = unaffected).
    pub fn damage_taken_multiplier(&self) -> f32 {
        self.active.iter().fold(1.0, |mult, s| match s.kind {
            StatusKind::Weakened { percent } => mult * (1.0 + percent),
            _ => mult,
        })
    }
}
