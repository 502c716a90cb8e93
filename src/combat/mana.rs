//! Mana pool
//!
//! Casting spends mana and pauses regeneration; regeneration resumes once
//! the cooldown has elapsed without further spending.

use serde::{Deserialize, Serialize};

use crate::config::ManaConfig;

/// A caster's mana resource.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ManaPool {
    pub current: f32,
    pub max: f32,
    /// Mana restored per second once regeneration is active
    pub regen_rate: f32,
    /// Seconds without spending before regeneration resumes
    pub regen_cooldown: f32,
    /// Seconds left until regeneration resumes
    cooldown_remaining: f32,
}

impl ManaPool {
    /// A full pool.
    pub fn new(max: f32, regen_rate: f32, regen_cooldown: f32) -> Self {
        Self {
            current: max,
            max,
            regen_rate,
            regen_cooldown,
            cooldown_remaining: 0.0,
        }
    }

    pub fn from_config(config: &ManaConfig) -> Self {
        Self::new(config.max, config.regen_rate, config.regen_cooldown)
    }

    /// Start with `current` mana instead of a full pool.
    pub fn with_current(mut self, current: f32) -> Self {
        self.current = current.clamp(0.0, self.max);
        self
    }

    pub fn can_afford(&self, cost: f32) -> bool {
        self.current >= cost
    }

    /// Spend `cost` if affordable. Returns false (and changes nothing) otherwise.
    pub fn try_consume(&mut self, cost: f32) -> bool {
        if !self.can_afford(cost) {
            return false;
        }
        self.current -= cost;
        self.cooldown_remaining = self.regen_cooldown;
        true
    }

    /// Remove up to `amount` mana without touching the regen cooldown.
    /// Returns how much was actually removed.
    pub fn drain(&mut self, amount: f32) -> f32 {
        let drained = amount.max(0.0).min(self.current);
        self.current -= drained;
        drained
    }

    /// Advance regeneration by `dt` seconds.
    pub fn tick(&mut self, dt: f32) {
        if self.cooldown_remaining > 0.0 {
            self.cooldown_remaining -= dt;
            return;
        }
        if self.current < self.max {
            self.current = (self.current + self.regen_rate * dt).min(self.max);
        }
    }

    pub fn is_regenerating(&self) -> bool {
        self.cooldown_remaining <= 0.0 && self.current < self.max
    }

    pub fn fraction(&self) -> f32 {
        if self.max <= 0.0 {
            0.0
        } else {
            self.current / self.max
        }
    }
}

impl Default for ManaPool {
    fn default() -> Self {
        Self::from_config(&ManaConfig::default())
    }
}
