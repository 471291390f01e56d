//! Show how the selected cells distribute over the configured classes.

use anyhow::Result;
use colored::Colorize;
use synmap::prelude::*;

use super::open_source;
use crate::config::Config;

pub fn run(config: &Config) -> Result<()> {
    let scheme = config.scheme()?;
    let source = open_source(config)?;
    let pairs = source.query_pairs(&config.pair_query())?;

    let classification = assign_classes(&scheme, &pairs);
    let summary = classification.summary(&scheme);

    println!("{}", "Cell Classes".white().bold());
    println!("{}", "═".repeat(40).dimmed());
    println!();
    println!(
        "  {} cells from {} pairs",
        summary.cells.to_string().cyan(),
        pairs.len().to_string().cyan()
    );
    println!();

    println!("{}", "Classes".blue().bold());
    for name in scheme.names() {
        let count = summary.by_label.get(name).copied().unwrap_or(0);
        println!("  {:<18} {}", name, count.to_string().cyan());
    }
    println!();

    let ambiguous: Vec<_> = summary
        .by_label
        .iter()
        .filter(|(label, _)| label.contains(','))
        .collect();
    if !ambiguous.is_empty() {
        println!("{}", "Multiple Classes".yellow().bold());
        for (label, count) in ambiguous {
            println!("  {:<18} {}", label, count.to_string().yellow());
        }
        println!();
    }

    println!("{}", "Totals".blue().bold());
    println!(
        "  Single class:      {}",
        summary.singly_classified().to_string().green()
    );
    println!(
        "  Multiple classes:  {}",
        summary.multiclass.to_string().yellow()
    );
    println!(
        "  Unclassified:      {}",
        summary.unclassified.to_string().dimmed()
    );
    println!();
    println!("{}", "═".repeat(40).dimmed());

    Ok(())
}
