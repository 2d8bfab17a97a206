//! `roundtable personas` — list the roster and the seating order.

use std::path::Path;

use anyhow::Result;
use roundtable_config::AppConfig;
use roundtable_context::{CharRatioEstimator, TokenEstimator};

pub fn run(config_path: &Path) -> Result<()> {
    let config = AppConfig::load(config_path)?;
    let estimator = CharRatioEstimator::new(config.context.chars_per_token);
    let table = config.round_table()?;

    println!("Roster:");
    for persona in config.personas() {
        println!(
            "  {:<18} role={:<18} prompt≈{} tokens",
            persona.name,
            persona.identifier(),
            estimator.estimate(&persona.system_prompt)
        );
    }

    println!("\nSeating order:");
    for (i, persona) in table.members().iter().enumerate() {
        let marker = if i == 0 { "→" } else { " " };
        println!("  {marker} {}", persona.name);
    }

    Ok(())
}
