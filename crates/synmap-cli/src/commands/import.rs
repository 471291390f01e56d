//! Import a JSON dataset into the catalog.

use anyhow::{bail, Context, Result};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::Path;
use synmap::prelude::*;

use crate::config::Config;

pub fn run(
    config: &Config,
    input: &Path,
    name: Option<String>,
    version: Option<String>,
    force: bool,
) -> Result<()> {
    if !input.exists() {
        bail!("Dataset file does not exist: {}", input.display());
    }

    println!("{} Reading {}...", "→".blue(), input.display());
    let dataset = load_dataset(input)
        .with_context(|| format!("Failed to load dataset: {}", input.display()))?;
    dataset
        .validate()
        .with_context(|| format!("Invalid dataset: {}", input.display()))?;

    let reference = DatasetRef::new(
        name.unwrap_or_else(|| dataset.metadata.name.clone()),
        version.unwrap_or_else(|| dataset.metadata.version.clone()),
    );
    let catalog = config.catalog();
    if catalog.contains(&reference) && !force {
        bail!(
            "{} already exists. Re-run with {} to replace it.",
            reference.to_string().cyan(),
            "--force".cyan()
        );
    }

    println!(
        "{} Importing {} pairs into {}...",
        "→".blue(),
        dataset.pairs.len().to_string().cyan(),
        reference.to_string().cyan()
    );

    let pb = ProgressBar::new(dataset.pairs.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} pairs")
            .context("Invalid progress template")?
            .progress_chars("#>-"),
    );
    let stats = catalog.import(&reference, &dataset, force, |_| pb.inc(1))?;
    pb.finish_and_clear();

    println!("  {} Experiments: {}", "✓".green(), stats.experiments.to_string().cyan());
    println!("  {} Cells:       {}", "✓".green(), stats.cells.to_string().cyan());
    println!("  {} Pairs:       {}", "✓".green(), stats.pairs.to_string().cyan());
    println!("  {} Dynamics:    {}", "✓".green(), stats.dynamics.to_string().cyan());
    println!();
    println!(
        "{} Stored at {}",
        "✓".green().bold(),
        catalog.path_for(&reference)?.display()
    );

    if reference != config.dataset_ref() {
        println!(
            "  {} Set [dataset] name = \"{}\", version = \"{}\" in synmap.toml to use it.",
            "•".yellow(),
            reference.name,
            reference.version
        );
    }

    Ok(())
}
