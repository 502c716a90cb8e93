//! Spellforge - Spellcrafting Composition and Resolution Engine
//!
//! Runs a headless spell scenario, or lists the component catalogs.

use clap::CommandFactory;
use std::process::ExitCode;

use spellforge::cli::{parse_args, Args};
use spellforge::error::ComponentKind;
use spellforge::headless::{run_headless_scenario, ScenarioConfig, ScenarioResult};
use spellforge::{ComponentRegistry, SpellcraftConfig};

fn print_catalogs(registry: &ComponentRegistry) {
    println!("Effects:");
    for entry in registry.effects.iter() {
        let domains: Vec<&str> = entry.domains.iter().map(|d| d.name()).collect();
        println!(
            "  {:<12} {:<16} {:>5.1} mana  [{}]",
            entry.type_id,
            entry.display_name,
            entry.mana_cost,
            domains.join(", ")
        );
    }

    println!("Augments:");
    for entry in registry.augments.iter() {
        let forms: Vec<&str> = entry.create().compatible_forms().iter().map(|f| f.name()).collect();
        println!(
            "  {:<12} {:<16} {:>5.1} mana  [{}]",
            entry.type_id,
            entry.display_name,
            entry.mana_cost,
            forms.join(", ")
        );
    }

    for (heading, kind, types) in [
        ("Motions", ComponentKind::Motion, registry.list_motion_types()),
        ("Impacts", ComponentKind::Impact, registry.list_impact_types()),
    ] {
        println!("{}:", heading);
        for type_id in types {
            println!("  {:<12} {}", type_id, registry.display_name(kind, type_id));
        }
    }
}

fn print_summary(result: &ScenarioResult) {
    println!("\n=== Scenario Summary ===");
    println!("Spell: {} ({:.1} mana)", result.spell_label, result.mana_cost);
    println!("Elapsed: {:.2}s", result.elapsed);
    println!(
        "Casts: {} (failed: {}), body impacts: {}",
        result.casts, result.failed_casts, result.body_impacts
    );
    for combatant in std::iter::once(&result.caster).chain(&result.targets) {
        let status = if combatant.survived { "ALIVE" } else { "DEAD" };
        println!(
            "  {:<12} {:>6.1}/{:<6.1} mana {:>5.1} [{}] {}",
            combatant.name,
            combatant.final_health,
            combatant.max_health,
            combatant.final_mana,
            combatant.statuses.join(", "),
            status
        );
    }
}

fn main() -> ExitCode {
    let args: Args = parse_args();

    if args.list {
        print_catalogs(ComponentRegistry::builtin());
        return ExitCode::SUCCESS;
    }

    let Some(scenario_path) = &args.scenario else {
        if let Err(e) = Args::command().print_help() {
            eprintln!("Failed to print help: {}", e);
        }
        return ExitCode::FAILURE;
    };

    let mut scenario = match ScenarioConfig::load_from_file(scenario_path) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error loading scenario: {}", e);
            return ExitCode::FAILURE;
        }
    };
    if let Some(output) = &args.output {
        scenario.output_path = Some(output.display().to_string());
    }

    let spellcraft = SpellcraftConfig::load_or_default_from(&args.config);
    match run_headless_scenario(&scenario, spellcraft, true) {
        Ok(result) => {
            print_summary(&result);
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Scenario failed: {}", e);
            ExitCode::FAILURE
        }
    }
}
