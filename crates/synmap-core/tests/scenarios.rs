//! Cross-tabulation scenarios
//!
//! End-to-end runs of the class assignment and cross-tabulation pipeline:
//! 1. Two cleanly classified cells produce a sparse 2x2 matrix
//! 2. Multi-class cells are dropped regardless of their partner
//! 3. Pairs without dynamics are dropped
//! 4. Reordering only permutes entries
//! 5. Degenerate inputs fail instead of returning an empty matrix

use synmap_core::prelude::*;

fn marker(id: i64, label: &str) -> Cell {
    Cell::new(id, 1).with_cre_type(label)
}

/// `{A: marker == "one", B: marker == "two"}`
fn two_class_scheme() -> ClassScheme {
    ClassScheme::new()
        .with_class("A", |c: &Cell| c.cre_type.as_deref() == Some("one"))
        .unwrap()
        .with_class("B", |c: &Cell| c.cre_type.as_deref() == Some("two"))
        .unwrap()
}

fn scenario_one_pairs() -> Vec<PairRecord> {
    let c1 = marker(1, "one");
    let c2 = marker(2, "two");
    vec![
        PairRecord::new(1, c1.clone(), c2.clone()).with_dynamics(Dynamics::with_induction(0.5)),
        PairRecord::new(2, c2, c1).with_dynamics(Dynamics::with_induction(0.3)),
    ]
}

#[test]
fn two_classes_fill_off_diagonal_entries() {
    let scheme = two_class_scheme();
    let result = CrossTab::new(&scheme)
        .with_order(["A", "B"])
        .run_metric(&scenario_one_pairs(), Metric::StpInduction50Hz)
        .unwrap();

    let m = &result.matrix;
    assert_eq!(m.classes(), &["A", "B"]);
    assert_eq!(m.mean("A", "B"), Some(0.5));
    assert_eq!(m.mean("B", "A"), Some(0.3));
    assert_eq!(m.mean("A", "A"), None);
    assert_eq!(m.mean("B", "B"), None);
    assert_eq!(result.report.retained, 2);
    assert_eq!(result.report.dropped(), 0);
    assert_eq!(result.labels.cells, 2);
}

#[test]
fn multiclass_cell_contributes_nothing() {
    let scheme = ClassScheme::new()
        .with_class("A", |c: &Cell| c.cre_type.as_deref() != Some("two"))
        .unwrap()
        .with_class("B", |c: &Cell| {
            matches!(c.cre_type.as_deref(), Some("two") | Some("both"))
        })
        .unwrap();

    let a = marker(1, "one");
    let b = marker(2, "two");
    let ambiguous = marker(3, "both");
    let pairs = vec![
        PairRecord::new(1, a.clone(), b.clone()).with_dynamics(Dynamics::with_induction(0.5)),
        PairRecord::new(2, ambiguous.clone(), a.clone()).with_dynamics(Dynamics::with_induction(-0.9)),
        PairRecord::new(3, b.clone(), ambiguous.clone()).with_dynamics(Dynamics::with_induction(-0.9)),
        PairRecord::new(4, ambiguous.clone(), b).with_dynamics(Dynamics::with_induction(-0.9)),
    ];

    let result = CrossTab::new(&scheme)
        .run_metric(&pairs, Metric::StpInduction50Hz)
        .unwrap();

    assert_eq!(result.report.retained, 1);
    assert_eq!(result.report.pre_multiclass, 2);
    assert_eq!(result.report.post_multiclass, 1);
    assert_eq!(result.labels.multiclass, 1);
    assert_eq!(result.matrix.mean("A", "B"), Some(0.5));
    assert_eq!(result.matrix.populated().count(), 1);
}

#[test]
fn unclassified_cell_contributes_nothing() {
    let scheme = two_class_scheme();
    let stray = marker(9, "vip");
    let mut pairs = scenario_one_pairs();
    pairs.push(
        PairRecord::new(3, stray.clone(), marker(1, "one")).with_dynamics(Dynamics::with_induction(1.0)),
    );
    pairs.push(
        PairRecord::new(4, marker(2, "two"), stray).with_dynamics(Dynamics::with_induction(1.0)),
    );

    let result = CrossTab::new(&scheme)
        .run_metric(&pairs, Metric::StpInduction50Hz)
        .unwrap();
    assert_eq!(result.report.pre_unclassified, 1);
    assert_eq!(result.report.post_unclassified, 1);
    assert_eq!(result.labels.unclassified, 1);
    assert_eq!(result.matrix.mean("A", "B"), Some(0.5));
    assert_eq!(result.matrix.mean("B", "A"), Some(0.3));
}

#[test]
fn pair_without_dynamics_is_dropped() {
    let scheme = two_class_scheme();
    let mut pairs = scenario_one_pairs();
    pairs.push(PairRecord::new(3, marker(1, "one"), marker(4, "one")));
    pairs.push(
        PairRecord::new(4, marker(4, "one"), marker(1, "one")).with_dynamics(Dynamics::default()),
    );

    let result = CrossTab::new(&scheme)
        .run_metric(&pairs, Metric::StpInduction50Hz)
        .unwrap();
    assert_eq!(result.report.missing_metric, 2);
    assert_eq!(result.matrix.get("A", "A"), None);
}

#[test]
fn reordering_transposes_coordinates_only() {
    let scheme = two_class_scheme();
    let pairs = scenario_one_pairs();

    let ab = CrossTab::new(&scheme)
        .with_order(["A", "B"])
        .run_metric(&pairs, Metric::StpInduction50Hz)
        .unwrap()
        .matrix;
    let ba = CrossTab::new(&scheme)
        .with_order(["B", "A"])
        .run_metric(&pairs, Metric::StpInduction50Hz)
        .unwrap()
        .matrix;

    assert_eq!(ba.classes(), &["B", "A"]);
    for i in 0..2 {
        for j in 0..2 {
            assert_eq!(
                ab.at(i, j).map(|c| c.mean),
                ba.at(1 - i, 1 - j).map(|c| c.mean)
            );
        }
    }
    assert_eq!(ba.at(0, 1).map(|c| c.mean), Some(0.3));
    assert_eq!(ba.at(1, 0).map(|c| c.mean), Some(0.5));
}

#[test]
fn empty_pair_collection_is_an_error() {
    let scheme = two_class_scheme();
    let err = CrossTab::new(&scheme)
        .run_metric(&[], Metric::StpInduction50Hz)
        .unwrap_err();
    assert!(matches!(err, SynmapError::EmptyInput(EmptyInputError::NoPairs)));
}

#[test]
fn nothing_surviving_filter_is_an_error() {
    let scheme = two_class_scheme();
    let pairs = vec![PairRecord::new(1, marker(1, "one"), marker(2, "two"))];
    match CrossTab::new(&scheme).run_metric(&pairs, Metric::StpInduction50Hz) {
        Err(SynmapError::EmptyInput(EmptyInputError::NothingSurvivedFilter { report })) => {
            assert_eq!(report.total, 1);
            assert_eq!(report.missing_metric, 1);
        }
        other => panic!("expected empty input error, got {:?}", other),
    }
}

#[test]
fn ordering_with_unknown_class_is_a_configuration_error() {
    let scheme = two_class_scheme();
    let err = CrossTab::new(&scheme)
        .with_order(["A", "C"])
        .run_metric(&scenario_one_pairs(), Metric::StpInduction50Hz)
        .unwrap_err();
    assert!(matches!(
        err,
        SynmapError::Configuration(ConfigurationError::UnknownClass(ref name)) if name == "C"
    ));
}

#[test]
fn custom_accessor_selects_metric() {
    let scheme = two_class_scheme();
    let pairs = vec![PairRecord::new(1, marker(1, "one"), marker(2, "two")).with_dynamics(Dynamics {
        paired_pulse_ratio_50hz: Some(1.4),
        ..Dynamics::default()
    })];

    let result = CrossTab::new(&scheme)
        .run(&pairs, |d| d.paired_pulse_ratio_50hz)
        .unwrap();
    assert_eq!(result.matrix.mean("A", "B"), Some(1.4));
    assert!(CrossTab::new(&scheme)
        .run_metric(&pairs, Metric::StpInduction50Hz)
        .unwrap_err()
        .is_empty_input());
}
