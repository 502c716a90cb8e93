//! Headless mode for scripted spell scenarios
//!
//! Runs a caster, its targets and a scripted cast timeline without any
//! graphical output, suitable for automated testing and balance checks.
//!
//! ## Usage
//!
//! ```bash
//! cargo run --release -- --scenario scenarios/chain_lightning.json
//! ```
//!
//! ## JSON Configuration
//!
//! ```json
//! {
//!   "caster": { "name": "Apprentice", "position": [0, 0, 0] },
//!   "targets": [{ "name": "Dummy", "position": [0, 0, -6] }],
//!   "spell": {
//!     "cast_method": "Instant",
//!     "form": "Invoke",
//!     "domains": ["Lightning"],
//!     "effects": ["damage"],
//!     "augment": "chain"
//!   },
//!   "timeline": [{ "at": 0.0, "action": "Press", "target": 0 }],
//!   "duration_secs": 3.0,
//!   "random_seed": 7
//! }
//! ```

pub mod config;
pub mod runner;

pub use config::ScenarioConfig;
pub use runner::{run_headless_scenario, CombatantResult, ScenarioResult};
