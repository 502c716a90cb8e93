//! Seeded random number generator for status rolls.

use bevy::prelude::*;
use rand::prelude::*;
use rand::rngs::StdRng;

/// Dice for domain status procs.
///
/// Every (domain, target hit) pair draws once, in hit order, so a seeded
/// scenario replays the same procs on the same targets.
#[derive(Resource)]
pub struct SpellRng {
    rng: StdRng,
    /// Seed of a replayable roll sequence
    pub seed: Option<u64>,
}

impl SpellRng {
    pub fn from_seed(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            seed: Some(seed),
        }
    }

    /// Rolls differ from run to run.
    pub fn from_entropy() -> Self {
        Self {
            rng: StdRng::from_entropy(),
            seed: None,
        }
    }

    /// Uniform draw in `[0, 1)`.
    pub fn random_f32(&mut self) -> f32 {
        self.rng.gen()
    }

    /// Whether a status with proc chance `chance` lands. Certain and
    /// impossible chances consume no draw.
    pub fn roll(&mut self, chance: f32) -> bool {
        if chance <= 0.0 {
            return false;
        }
        if chance >= 1.0 {
            return true;
        }
        self.random_f32() < chance
    }
}

impl Default for SpellRng {
    fn default() -> Self {
        Self::from_entropy()
    }
}
