//! Show store statistics.

use anyhow::Result;
use colored::Colorize;

use super::open_source;
use crate::config::Config;

pub fn run(config: &Config) -> Result<()> {
    let source = open_source(config)?;
    let summary = source.summary()?;
    let selected = source.query_pairs(&config.pair_query())?;

    println!("{}", "synmap Store Statistics".white().bold());
    println!("{}", "═".repeat(40).dimmed());
    println!();

    println!("{}", "Records".blue().bold());
    println!("  Experiments:       {}", summary.experiments.to_string().cyan());
    println!("  Cells:             {}", summary.cells.to_string().cyan());
    println!("  Pairs:             {}", summary.pairs.to_string().cyan());
    println!();

    println!("{}", "Connectivity".blue().bold());
    println!(
        "  Synapses:          {} ({:.1}%)",
        summary.synapses.to_string().green(),
        percent(summary.synapses, summary.pairs)
    );
    println!(
        "  With dynamics:     {} ({:.1}%)",
        summary.with_dynamics.to_string().green(),
        percent(summary.with_dynamics, summary.pairs)
    );
    println!();

    println!("{}", "Projects".blue().bold());
    if summary.projects.is_empty() {
        println!("  {}", "(none)".dimmed());
    }
    for project in &summary.projects {
        println!("  {}", project);
    }
    println!();

    println!("{}", "Current Query".blue().bold());
    println!("  Selected pairs:    {}", selected.len().to_string().cyan());
    println!();
    println!("{}", "═".repeat(40).dimmed());

    Ok(())
}

fn percent(part: usize, whole: usize) -> f64 {
    if whole > 0 {
        part as f64 / whole as f64 * 100.0
    } else {
        0.0
    }
}
