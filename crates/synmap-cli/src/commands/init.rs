//! Initialize a new synmap project.

use anyhow::{Context, Result};
use colored::Colorize;
use std::path::PathBuf;

use crate::config::{config_path, Config};

pub fn run(path: Option<PathBuf>) -> Result<()> {
    let base_path = match path {
        Some(p) => p,
        None => std::env::current_dir().context("Cannot determine current directory")?,
    };

    println!("{} Initializing synmap project...", "→".blue());

    let config_file = config_path(&base_path);
    let config = if config_file.exists() {
        println!("  {} {} already exists", "•".yellow(), config_file.display());
        Config::load(Some(config_file.as_path()))?
    } else {
        std::fs::create_dir_all(&base_path)
            .with_context(|| format!("Failed to create {}", base_path.display()))?;
        let config = Config::default();
        config.save(&config_file)?;
        println!("  {} Created {}", "✓".green(), config_file.display());
        Config::load(Some(config_file.as_path()))?
    };

    let catalog_dir = config.catalog().root().to_path_buf();
    std::fs::create_dir_all(&catalog_dir)
        .with_context(|| format!("Failed to create {}", catalog_dir.display()))?;
    println!("  {} Created {}", "✓".green(), catalog_dir.display());

    println!();
    println!("{} synmap project initialized!", "✓".green().bold());
    println!();
    println!("Next steps:");
    println!("  {} synmap import <dataset.json>", "1.".blue());
    println!("  {} synmap classify", "2.".blue());
    println!("  {} synmap matrix", "3.".blue());

    Ok(())
}
