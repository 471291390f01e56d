//! Print the class-by-class matrix for one metric.

use anyhow::Result;
use colored::{ColoredString, Colorize};
use synmap::prelude::*;

use super::cross_tabulate;
use crate::config::Config;

const CELL_WIDTH: usize = 15;

pub fn run(config: &Config, metric: Option<&str>, order: Option<Vec<String>>) -> Result<()> {
    let scheme = config.scheme()?;
    let metric = config.metric(metric)?;
    let scale = config.color_scale()?;
    let order = order.unwrap_or_else(|| config.order.clone());

    let result = cross_tabulate(config, &scheme, metric, &order)?;

    println!(
        "{} {}",
        metric.to_string().white().bold(),
        "(rows: presynaptic, columns: postsynaptic)".dimmed()
    );
    println!("{}", "═".repeat(40).dimmed());
    println!();
    print_matrix(&result.matrix, &scale);
    println!();
    print_report(&result.report);
    println!("{}", "═".repeat(40).dimmed());

    Ok(())
}

fn print_matrix(matrix: &AggregateMatrix, scale: &ColorScale) {
    let label_width = matrix
        .classes()
        .iter()
        .map(|c| c.len())
        .max()
        .unwrap_or(0)
        .max(8);

    let mut header = format!("{:<width$}", "pre \\ post", width = label_width);
    for class in matrix.classes() {
        header.push_str(&format!("{:>width$}", class, width = CELL_WIDTH));
    }
    println!("{}", header.bold());

    for (row, pre) in matrix.classes().iter().enumerate() {
        print!("{}", format!("{:<width$}", pre, width = label_width).bold());
        for col in 0..matrix.size() {
            let text = format!("{:>width$}", cell_text(matrix.at(row, col)), width = CELL_WIDTH);
            print!("{}", shade(&text, matrix.at(row, col).map(|c| c.mean), scale));
        }
        println!();
    }
}

fn cell_text(cell: Option<&MatrixCell>) -> String {
    match cell {
        Some(c) => format!("{:+.3} (n={})", c.mean, c.count),
        None => "·".to_string(),
    }
}

/// Blue below the middle of the color domain, red above.
fn shade(text: &str, mean: Option<f64>, scale: &ColorScale) -> ColoredString {
    let Some(mean) = mean else {
        return text.dimmed();
    };
    let position = scale.normalize(mean);
    let colored = if position < 0.45 {
        text.blue()
    } else if position > 0.55 {
        text.red()
    } else {
        text.white()
    };
    if (position - 0.5).abs() > 0.25 {
        colored.bold()
    } else {
        colored
    }
}

fn print_report(report: &FilterReport) {
    println!("{}", "Pairs".blue().bold());
    println!("  Queried:           {}", report.total.to_string().cyan());
    println!("  Retained:          {}", report.retained.to_string().green());
    if report.pre_unclassified + report.post_unclassified > 0 {
        println!(
            "  Unclassified:      {} pre, {} post",
            report.pre_unclassified, report.post_unclassified
        );
    }
    if report.dropped_ambiguous() > 0 {
        println!(
            "  Multiple classes:  {} pre, {} post",
            report.pre_multiclass.to_string().yellow(),
            report.post_multiclass.to_string().yellow()
        );
    }
    if report.missing_metric > 0 {
        println!("  Missing metric:    {}", report.missing_metric);
    }
    println!();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cell_text_shows_signed_mean_and_count() {
        let cell = MatrixCell { mean: -0.125, count: 7 };
        assert_eq!(cell_text(Some(&cell)), "-0.125 (n=7)");
        assert_eq!(cell_text(None), "·");
    }
}
