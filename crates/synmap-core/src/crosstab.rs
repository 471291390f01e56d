//! Pre/post class cross-tabulation of a per-pair metric.
//!
//! The pipeline runs once over a fully materialized pair collection:
//!
//! 1. enumerate the distinct cells and classify each ([`assign_classes`])
//! 2. build one row per pair with both memberships and the metric
//! 3. keep rows whose endpoints each belong to exactly one class and
//!    whose metric is present
//! 4. average the metric per (pre, post) class
//! 5. reorder the matrix to the requested class order
//!
//! Dropped rows are counted in a [`FilterReport`] rather than substituted.

use crate::classify::{assign_classes, CellClassification, ClassMembership, ClassScheme, LabelSummary};
use crate::error::{EmptyInputError, Result};
use crate::matrix::{order_positions, AggregateMatrix};
use crate::types::{Dynamics, Metric, PairId, PairRecord};
use serde::Serialize;
use tracing::{debug, warn};

/// One pair with its endpoint memberships and (possibly absent) metric.
#[derive(Debug, Clone, PartialEq)]
pub struct CrossTabRow {
    pub pair_id: PairId,
    pub pre: ClassMembership,
    pub post: ClassMembership,
    pub value: Option<f64>,
}

/// Why rows were removed before aggregation.
///
/// Each dropped row is counted once, under the first check it fails:
/// presynaptic membership, then postsynaptic membership, then metric.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct FilterReport {
    pub total: usize,
    pub retained: usize,
    pub pre_unclassified: usize,
    pub pre_multiclass: usize,
    pub post_unclassified: usize,
    pub post_multiclass: usize,
    pub missing_metric: usize,
}

impl FilterReport {
    pub fn dropped(&self) -> usize {
        self.dropped_ambiguous() + self.missing_metric
    }

    /// Rows dropped because an endpoint had zero or several classes.
    pub fn dropped_ambiguous(&self) -> usize {
        self.pre_unclassified + self.pre_multiclass + self.post_unclassified + self.post_multiclass
    }
}

/// Build one row per pair from cached memberships.
///
/// `accessor` reads the metric from a pair's dynamics; pairs without
/// dynamics, and non-finite readings, get no value.
pub fn build_rows<F>(classification: &CellClassification, pairs: &[PairRecord], accessor: F) -> Vec<CrossTabRow>
where
    F: Fn(&Dynamics) -> Option<f64>,
{
    pairs
        .iter()
        .map(|pair| CrossTabRow {
            pair_id: pair.id,
            pre: classification.membership(pair.pre.id).cloned().unwrap_or_default(),
            post: classification.membership(pair.post.id).cloned().unwrap_or_default(),
            value: pair
                .dynamics
                .as_ref()
                .and_then(&accessor)
                .filter(|v| v.is_finite()),
        })
        .collect()
}

/// Keep rows with singleton memberships at both ends and a present metric.
///
/// This is a projection: filtering its own output drops nothing more.
pub fn filter_rows<I>(rows: I) -> (Vec<CrossTabRow>, FilterReport)
where
    I: IntoIterator<Item = CrossTabRow>,
{
    let mut report = FilterReport::default();
    let mut kept = Vec::new();

    for row in rows {
        report.total += 1;
        match (row.pre.len(), row.post.len(), row.value) {
            (0, _, _) => report.pre_unclassified += 1,
            (n, _, _) if n > 1 => report.pre_multiclass += 1,
            (_, 0, _) => report.post_unclassified += 1,
            (_, n, _) if n > 1 => report.post_multiclass += 1,
            (_, _, None) => report.missing_metric += 1,
            (_, _, Some(_)) => kept.push(row),
        }
    }

    report.retained = kept.len();
    (kept, report)
}

/// Mean metric per (pre, post) class, in scheme definition order.
///
/// Rows whose endpoints are not singleton memberships or that carry no
/// value are ignored; run [`filter_rows`] first to have them counted.
pub fn aggregate(scheme: &ClassScheme, rows: &[CrossTabRow]) -> AggregateMatrix {
    let n = scheme.len();
    let mut sums = vec![vec![0.0; n]; n];
    let mut counts = vec![vec![0usize; n]; n];

    for row in rows {
        if let (Some(i), Some(j), Some(v)) = (row.pre.single(), row.post.single(), row.value) {
            if i < n && j < n {
                sums[i][j] += v;
                counts[i][j] += 1;
            }
        }
    }

    AggregateMatrix::from_sums(scheme.names().map(String::from).collect(), &sums, &counts)
}

/// Output of a full cross-tabulation run.
#[derive(Debug, Clone)]
pub struct CrossTabResult {
    pub matrix: AggregateMatrix,
    pub report: FilterReport,
    pub labels: LabelSummary,
}

/// Cross-tabulation over a class scheme with an optional display order.
#[derive(Debug)]
pub struct CrossTab<'a> {
    scheme: &'a ClassScheme,
    order: Option<Vec<String>>,
}

impl<'a> CrossTab<'a> {
    pub fn new(scheme: &'a ClassScheme) -> Self {
        Self { scheme, order: None }
    }

    /// Reorder the output to `order`, a permutation of the scheme's names.
    pub fn with_order<I, S>(mut self, order: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.order = Some(order.into_iter().map(Into::into).collect());
        self
    }

    /// Run the pipeline with a named dynamics metric.
    pub fn run_metric(&self, pairs: &[PairRecord], metric: Metric) -> Result<CrossTabResult> {
        self.run(pairs, |d| metric.value(d))
    }

    /// Run the pipeline with an arbitrary dynamics accessor.
    pub fn run<F>(&self, pairs: &[PairRecord], accessor: F) -> Result<CrossTabResult>
    where
        F: Fn(&Dynamics) -> Option<f64>,
    {
        let names: Vec<String> = self.scheme.names().map(String::from).collect();
        if let Some(order) = &self.order {
            order_positions(&names, order)?;
        }

        if pairs.is_empty() {
            return Err(EmptyInputError::NoPairs.into());
        }

        let classification = assign_classes(self.scheme, pairs);
        let labels = classification.summary(self.scheme);

        let rows = build_rows(&classification, pairs, accessor);
        let (rows, report) = filter_rows(rows);
        debug!(
            total = report.total,
            retained = report.retained,
            missing_metric = report.missing_metric,
            "filtered cross-tab rows"
        );
        if report.dropped_ambiguous() > 0 {
            warn!(
                dropped = report.dropped_ambiguous(),
                unclassified_cells = labels.unclassified,
                multiclass_cells = labels.multiclass,
                "dropped pairs whose endpoints lack a unique class"
            );
        }

        if rows.is_empty() {
            return Err(EmptyInputError::NothingSurvivedFilter { report }.into());
        }

        let mut matrix = aggregate(self.scheme, &rows);
        if let Some(order) = &self.order {
            matrix = matrix.reindex(order)?;
        }

        Ok(CrossTabResult {
            matrix,
            report,
            labels,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Cell;

    fn row(id: i64, pre: &[usize], post: &[usize], value: Option<f64>) -> CrossTabRow {
        CrossTabRow {
            pair_id: PairId(id),
            pre: pre.iter().copied().collect(),
            post: post.iter().copied().collect(),
            value,
        }
    }

    #[test]
    fn filter_counts_first_failing_check() {
        let rows = vec![
            row(1, &[0], &[1], Some(0.5)),
            row(2, &[], &[1], Some(0.5)),
            row(3, &[0, 1], &[], None),
            row(4, &[0], &[], Some(0.1)),
            row(5, &[1], &[0, 1], Some(0.1)),
            row(6, &[1], &[0], None),
        ];
        let (kept, report) = filter_rows(rows);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].pair_id, PairId(1));
        assert_eq!(
            report,
            FilterReport {
                total: 6,
                retained: 1,
                pre_unclassified: 1,
                pre_multiclass: 1,
                post_unclassified: 1,
                post_multiclass: 1,
                missing_metric: 1,
            }
        );
        assert_eq!(report.dropped(), 5);
    }

    #[test]
    fn filter_is_idempotent() {
        let rows = vec![
            row(1, &[0], &[1], Some(0.5)),
            row(2, &[1], &[1], Some(-0.2)),
            row(3, &[0, 1], &[1], Some(0.3)),
            row(4, &[0], &[0], None),
        ];
        let (once, _) = filter_rows(rows);
        let (twice, report) = filter_rows(once.clone());
        assert_eq!(once, twice);
        assert_eq!(report.dropped(), 0);
        assert_eq!(report.retained, once.len());
    }

    #[test]
    fn aggregate_means_per_class_pair() {
        let scheme = ClassScheme::new()
            .with_class("a", |_: &Cell| false)
            .unwrap()
            .with_class("b", |_: &Cell| false)
            .unwrap();
        let rows = vec![
            row(1, &[0], &[1], Some(0.5)),
            row(2, &[0], &[1], Some(0.25)),
            row(3, &[1], &[1], Some(-0.5)),
        ];
        let matrix = aggregate(&scheme, &rows);
        assert_eq!(matrix.mean("a", "b"), Some(0.375));
        assert_eq!(matrix.get("a", "b").map(|c| c.count), Some(2));
        assert_eq!(matrix.mean("b", "b"), Some(-0.5));
        assert_eq!(matrix.get("a", "a"), None);
        assert_eq!(matrix.get("b", "a"), None);
    }

    #[test]
    fn non_finite_readings_count_as_missing() {
        let scheme = ClassScheme::new().with_class("any", |_: &Cell| true).unwrap();
        let pairs = vec![
            PairRecord::new(1, Cell::new(1, 1), Cell::new(2, 1))
                .with_dynamics(Dynamics::with_induction(f64::NAN)),
            PairRecord::new(2, Cell::new(2, 1), Cell::new(1, 1))
                .with_dynamics(Dynamics::with_induction(0.2)),
        ];
        let classification = assign_classes(&scheme, &pairs);
        let rows = build_rows(&classification, &pairs, |d| d.stp_induction_50hz);
        assert_eq!(rows[0].value, None);
        assert_eq!(rows[1].value, Some(0.2));

        let (_, report) = filter_rows(rows);
        assert_eq!(report.missing_metric, 1);
    }
}
