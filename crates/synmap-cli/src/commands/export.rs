//! Export the matrix as a heatmap payload or CSV.

use anyhow::{bail, Context, Result};
use colored::Colorize;
use std::path::Path;
use synmap::prelude::*;

use super::cross_tabulate;
use crate::config::Config;

pub fn run(config: &Config, output: &Path, format: &str, metric: Option<&str>) -> Result<()> {
    if !matches!(format, "json" | "csv") {
        bail!("Unknown format: {}. Use 'json' or 'csv'.", format);
    }

    let scheme = config.scheme()?;
    let metric = config.metric(metric)?;
    let scale = config.color_scale()?;

    println!("{} Building {} matrix...", "→".blue(), metric.to_string().cyan());
    let result = cross_tabulate(config, &scheme, metric, &config.order)?;

    let content = render(config, &result.matrix, metric, scale, format)?;
    std::fs::write(output, content)
        .with_context(|| format!("Failed to write {}", output.display()))?;

    println!(
        "{} Exported {} classes ({} of {} pairs) to {}",
        "✓".green(),
        result.matrix.size().to_string().cyan(),
        result.report.retained.to_string().cyan(),
        result.report.total.to_string().cyan(),
        output.display()
    );

    Ok(())
}

fn render(
    config: &Config,
    matrix: &AggregateMatrix,
    metric: Metric,
    scale: ColorScale,
    format: &str,
) -> Result<String> {
    match format {
        "json" => {
            let title = config
                .heatmap
                .title
                .clone()
                .unwrap_or_else(|| format!("{} by cell class", metric));
            let spec = HeatmapSpec::from_matrix(title, metric, matrix, scale)?;
            Ok(spec.to_json_pretty()?)
        }
        "csv" => Ok(matrix.to_csv()),
        other => bail!("Unknown format: {}", other),
    }
}
