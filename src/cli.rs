//! Command-line interface for Spellforge
//!
//! Runs headless spell scenarios or prints the component catalogs.

use clap::Parser;
use std::path::PathBuf;

/// Spellcrafting composition and resolution engine
#[derive(Parser, Debug)]
#[command(name = "spellforge")]
#[command(about = "Spellcrafting composition and resolution engine")]
#[command(version)]
pub struct Args {
    /// Run the headless scenario in the specified JSON file
    #[arg(long, value_name = "SCENARIO_FILE")]
    pub scenario: Option<PathBuf>,

    /// Output path for the scenario log (overrides the scenario's own)
    #[arg(long, value_name = "OUTPUT_PATH")]
    pub output: Option<PathBuf>,

    /// Spellcraft balance config (RON)
    #[arg(long, value_name = "CONFIG_FILE", default_value = "assets/config/spellcraft.ron")]
    pub config: PathBuf,

    /// Print the registered effects, augments, motions and impacts
    #[arg(long)]
    pub list: bool,
}

pub fn parse_args() -> Args {
    Args::parse()
}
