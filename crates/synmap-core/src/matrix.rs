//! Square pre/post class matrix of aggregated metric values.
//!
//! Rows are presynaptic classes and columns postsynaptic classes, both in
//! the same order. Entries without data are `None`, never zero.

use crate::error::{ConfigurationError, Result};
use serde::Serialize;
use std::collections::HashSet;

/// Aggregate over all qualifying pairs sharing one (pre, post) key.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MatrixCell {
    pub mean: f64,
    pub count: usize,
}

/// Mean metric value indexed by (presynaptic class, postsynaptic class).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregateMatrix {
    classes: Vec<String>,
    cells: Vec<Vec<Option<MatrixCell>>>,
}

impl AggregateMatrix {
    /// A matrix over `classes` with every entry undefined.
    pub fn undefined(classes: Vec<String>) -> Self {
        let n = classes.len();
        Self {
            classes,
            cells: vec![vec![None; n]; n],
        }
    }

    /// Build from per-entry sums and counts; zero-count entries stay undefined.
    pub(crate) fn from_sums(classes: Vec<String>, sums: &[Vec<f64>], counts: &[Vec<usize>]) -> Self {
        let mut matrix = Self::undefined(classes);
        for (i, row) in matrix.cells.iter_mut().enumerate() {
            for (j, cell) in row.iter_mut().enumerate() {
                let count = counts[i][j];
                if count > 0 {
                    *cell = Some(MatrixCell {
                        mean: sums[i][j] / count as f64,
                        count,
                    });
                }
            }
        }
        matrix
    }

    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    /// Number of classes along each axis.
    pub fn size(&self) -> usize {
        self.classes.len()
    }

    pub fn at(&self, row: usize, col: usize) -> Option<&MatrixCell> {
        self.cells.get(row)?.get(col)?.as_ref()
    }

    pub fn get(&self, pre: &str, post: &str) -> Option<&MatrixCell> {
        let row = self.position(pre)?;
        let col = self.position(post)?;
        self.at(row, col)
    }

    pub fn mean(&self, pre: &str, post: &str) -> Option<f64> {
        self.get(pre, post).map(|c| c.mean)
    }

    /// True when no entry holds data.
    pub fn is_undefined(&self) -> bool {
        self.populated().next().is_none()
    }

    /// Defined entries as `(pre, post, cell)` in row-major order.
    pub fn populated(&self) -> impl Iterator<Item = (&str, &str, &MatrixCell)> + '_ {
        self.cells.iter().enumerate().flat_map(move |(i, row)| {
            row.iter().enumerate().filter_map(move |(j, cell)| {
                cell.as_ref()
                    .map(|c| (self.classes[i].as_str(), self.classes[j].as_str(), c))
            })
        })
    }

    /// Row-major means, `None` for undefined entries.
    pub fn means(&self) -> Vec<Vec<Option<f64>>> {
        self.cells
            .iter()
            .map(|row| row.iter().map(|c| c.map(|c| c.mean)).collect())
            .collect()
    }

    /// Row-major sample counts, zero for undefined entries.
    pub fn counts(&self) -> Vec<Vec<usize>> {
        self.cells
            .iter()
            .map(|row| row.iter().map(|c| c.map_or(0, |c| c.count)).collect())
            .collect()
    }

    /// Reorder rows and columns to `order`, which must be a permutation
    /// of this matrix's classes.
    pub fn reindex<S: AsRef<str>>(&self, order: &[S]) -> Result<AggregateMatrix> {
        let positions = order_positions(&self.classes, order)?;
        let classes = positions.iter().map(|&p| self.classes[p].clone()).collect();
        let cells = positions
            .iter()
            .map(|&r| positions.iter().map(|&c| self.cells[r][c]).collect())
            .collect();
        Ok(AggregateMatrix { classes, cells })
    }

    /// Render as CSV: header of postsynaptic classes, one row per
    /// presynaptic class, empty fields for undefined entries.
    pub fn to_csv(&self) -> String {
        let mut out = String::from("pre\\post");
        for class in &self.classes {
            out.push(',');
            out.push_str(&csv_field(class));
        }
        out.push('\n');
        for (class, row) in self.classes.iter().zip(&self.cells) {
            out.push_str(&csv_field(class));
            for cell in row {
                out.push(',');
                if let Some(c) = cell {
                    out.push_str(&c.mean.to_string());
                }
            }
            out.push('\n');
        }
        out
    }

    fn position(&self, class: &str) -> Option<usize> {
        self.classes.iter().position(|c| c == class)
    }
}

/// Map an ordering onto indices of `classes`, checking it is a permutation.
pub fn order_positions<S: AsRef<str>>(classes: &[String], order: &[S]) -> Result<Vec<usize>> {
    let mut seen = HashSet::new();
    let mut positions = Vec::with_capacity(order.len());
    for name in order {
        let name = name.as_ref();
        let pos = classes
            .iter()
            .position(|c| c == name)
            .ok_or_else(|| ConfigurationError::UnknownClass(name.to_string()))?;
        if !seen.insert(pos) {
            return Err(ConfigurationError::DuplicateInOrder(name.to_string()).into());
        }
        positions.push(pos);
    }
    if let Some(missing) = (0..classes.len()).find(|i| !seen.contains(i)) {
        return Err(ConfigurationError::MissingFromOrder(classes[missing].clone()).into());
    }
    Ok(positions)
}

fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}
