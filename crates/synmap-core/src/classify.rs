//! Class schemes and per-cell class assignment.
//!
//! A scheme is an explicit, ordered list of `(name, predicate)` entries.
//! Each distinct cell is tested against every entry exactly once and the
//! result is kept as a [`ClassMembership`]: the set of entry indices the
//! cell satisfied. A cell may satisfy zero, one or several classes; only
//! singleton memberships take part in cross-tabulation.

use crate::error::{ConfigurationError, Result};
use crate::types::{Cell, CellCategory, CellId, PairRecord};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use tracing::debug;

/// A membership test over a cell's attributes.
pub trait ClassPredicate: Send + Sync {
    fn matches(&self, cell: &Cell) -> bool;
}

impl<F> ClassPredicate for F
where
    F: Fn(&Cell) -> bool + Send + Sync,
{
    fn matches(&self, cell: &Cell) -> bool {
        self(cell)
    }
}

/// One or more accepted values for a string attribute.
///
/// Deserializes from either a single string or a list of strings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AcceptedValues(Vec<String>);

impl AcceptedValues {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn values(&self) -> &[String] {
        &self.0
    }

    fn accepts(&self, value: Option<&str>) -> bool {
        match value {
            Some(v) => self.0.iter().any(|accepted| accepted == v),
            None => false,
        }
    }
}

impl<S: Into<String>> FromIterator<S> for AcceptedValues {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

impl Serialize for AcceptedValues {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self.0.as_slice() {
            [single] => serializer.serialize_str(single),
            many => many.serialize(serializer),
        }
    }
}

impl<'de> Deserialize<'de> for AcceptedValues {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            One(String),
            Many(Vec<String>),
        }

        Ok(match Raw::deserialize(deserializer)? {
            Raw::One(v) => AcceptedValues(vec![v]),
            Raw::Many(vs) => AcceptedValues(vs),
        })
    }
}

/// Attribute criteria describing one cell class.
///
/// A cell matches when every specified criterion matches. Unspecified
/// criteria are ignored; a definition must specify at least one.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClassDefinition {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cell_class: Option<CellCategory>,
    #[serde(default, skip_serializing_if = "AcceptedValues::is_empty")]
    pub cre_type: AcceptedValues,
    #[serde(default, skip_serializing_if = "AcceptedValues::is_empty")]
    pub target_layer: AcceptedValues,
}

impl ClassDefinition {
    /// Coarse categorical match on excitatory/inhibitory category.
    pub fn by_category(category: CellCategory) -> Self {
        Self {
            cell_class: Some(category),
            ..Self::default()
        }
    }

    /// Marker-label match on one or more cre types.
    pub fn by_cre_type<I, S>(cre_types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            cre_type: cre_types.into_iter().collect(),
            ..Self::default()
        }
    }

    /// Further restrict to cells targeted in one of the given layers.
    pub fn with_layer<I, S>(mut self, layers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.target_layer = layers.into_iter().collect();
        self
    }

    pub fn has_criteria(&self) -> bool {
        self.cell_class.is_some() || !self.cre_type.is_empty() || !self.target_layer.is_empty()
    }
}

impl ClassPredicate for ClassDefinition {
    fn matches(&self, cell: &Cell) -> bool {
        if let Some(category) = self.cell_class {
            if cell.cell_class != Some(category) {
                return false;
            }
        }
        if !self.cre_type.is_empty() && !self.cre_type.accepts(cell.cre_type.as_deref()) {
            return false;
        }
        if !self.target_layer.is_empty()
            && !self.target_layer.accepts(cell.target_layer.as_deref())
        {
            return false;
        }
        true
    }
}

struct ClassEntry {
    name: String,
    predicate: Box<dyn ClassPredicate>,
}

/// An ordered set of uniquely named class predicates.
#[derive(Default)]
pub struct ClassScheme {
    entries: Vec<ClassEntry>,
}

impl fmt::Debug for ClassScheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}

impl ClassScheme {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a scheme from attribute definitions, in iteration order.
    pub fn from_definitions<I, S>(definitions: I) -> Result<Self>
    where
        I: IntoIterator<Item = (S, ClassDefinition)>,
        S: Into<String>,
    {
        let mut scheme = Self::new();
        for (name, definition) in definitions {
            let name = name.into();
            if !definition.has_criteria() {
                return Err(ConfigurationError::EmptyDefinition(name).into());
            }
            scheme.push(name, definition)?;
        }
        Ok(scheme)
    }

    /// Append a class. Names must be non-empty and unique.
    pub fn push(&mut self, name: impl Into<String>, predicate: impl ClassPredicate + 'static) -> Result<()> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(ConfigurationError::EmptyClassName.into());
        }
        if self.index_of(&name).is_some() {
            return Err(ConfigurationError::DuplicateClass(name).into());
        }
        self.entries.push(ClassEntry {
            name,
            predicate: Box::new(predicate),
        });
        Ok(())
    }

    /// Builder form of [`push`](Self::push).
    pub fn with_class(mut self, name: impl Into<String>, predicate: impl ClassPredicate + 'static) -> Result<Self> {
        self.push(name, predicate)?;
        Ok(self)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Class names in definition order.
    pub fn names(&self) -> impl Iterator<Item = &str> + '_ {
        self.entries.iter().map(|e| e.name.as_str())
    }

    pub fn name(&self, index: usize) -> Option<&str> {
        self.entries.get(index).map(|e| e.name.as_str())
    }

    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.entries.iter().position(|e| e.name == name)
    }

    /// Evaluate every predicate against one cell.
    pub fn classify(&self, cell: &Cell) -> ClassMembership {
        let indices = self
            .entries
            .iter()
            .enumerate()
            .filter(|(_, entry)| entry.predicate.matches(cell))
            .map(|(i, _)| i)
            .collect();
        ClassMembership { indices }
    }
}

/// The classes a single cell satisfies, as scheme indices in definition order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct ClassMembership {
    indices: Vec<usize>,
}

impl ClassMembership {
    /// Membership in exactly one class.
    pub fn singleton(index: usize) -> Self {
        Self { indices: vec![index] }
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn indices(&self) -> &[usize] {
        &self.indices
    }

    pub fn contains(&self, index: usize) -> bool {
        self.indices.contains(&index)
    }

    /// The class index when the cell belongs to exactly one class.
    pub fn single(&self) -> Option<usize> {
        match self.indices.as_slice() {
            [only] => Some(*only),
            _ => None,
        }
    }

    /// Comma-joined class names; empty when the cell matched nothing.
    pub fn label(&self, scheme: &ClassScheme) -> String {
        self.indices
            .iter()
            .filter_map(|&i| scheme.name(i))
            .collect::<Vec<_>>()
            .join(",")
    }
}

impl FromIterator<usize> for ClassMembership {
    fn from_iter<I: IntoIterator<Item = usize>>(iter: I) -> Self {
        let mut indices: Vec<usize> = iter.into_iter().collect();
        indices.sort_unstable();
        indices.dedup();
        Self { indices }
    }
}

/// Cached class memberships for every distinct cell of a pair collection.
#[derive(Debug, Clone, Default)]
pub struct CellClassification {
    memberships: HashMap<CellId, ClassMembership>,
    /// Distinct cells in first-seen order.
    cells: Vec<CellId>,
}

impl CellClassification {
    pub fn membership(&self, cell: CellId) -> Option<&ClassMembership> {
        self.memberships.get(&cell)
    }

    pub fn label(&self, cell: CellId, scheme: &ClassScheme) -> Option<String> {
        self.membership(cell).map(|m| m.label(scheme))
    }

    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }

    /// Distinct cells with their memberships, in first-seen order.
    pub fn iter(&self) -> impl Iterator<Item = (CellId, &ClassMembership)> + '_ {
        self.cells
            .iter()
            .filter_map(|id| self.memberships.get(id).map(|m| (*id, m)))
    }

    /// Tally of cells per label.
    pub fn summary(&self, scheme: &ClassScheme) -> LabelSummary {
        let mut summary = LabelSummary {
            cells: self.cells.len(),
            ..LabelSummary::default()
        };
        for (_, membership) in self.iter() {
            match membership.len() {
                0 => summary.unclassified += 1,
                1 => {}
                _ => summary.multiclass += 1,
            }
            *summary.by_label.entry(membership.label(scheme)).or_insert(0) += 1;
        }
        summary
    }
}

/// Distribution of class labels over distinct cells.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LabelSummary {
    pub cells: usize,
    /// Cells matching no class.
    pub unclassified: usize,
    /// Cells matching two or more classes.
    pub multiclass: usize,
    /// Cell count per comma-joined label ("" for unclassified).
    pub by_label: BTreeMap<String, usize>,
}

impl LabelSummary {
    pub fn singly_classified(&self) -> usize {
        self.cells - self.unclassified - self.multiclass
    }
}

/// Enumerate the distinct cells referenced by `pairs` and classify each once.
///
/// Cells are deduplicated by id across both pre and post positions; when
/// one id appears more than once the first occurrence is evaluated.
pub fn assign_classes(scheme: &ClassScheme, pairs: &[PairRecord]) -> CellClassification {
    let mut classification = CellClassification::default();

    for pair in pairs {
        for cell in [&pair.pre, &pair.post] {
            if classification.memberships.contains_key(&cell.id) {
                continue;
            }
            let membership = scheme.classify(cell);
            classification.memberships.insert(cell.id, membership);
            classification.cells.push(cell.id);
        }
    }

    debug!(
        pairs = pairs.len(),
        cells = classification.cells.len(),
        classes = scheme.len(),
        "assigned cell classes"
    );
    classification
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pvalb(id: i64) -> Cell {
        Cell::new(id, 1)
            .with_class(CellCategory::Inhibitory)
            .with_cre_type("pvalb")
            .with_layer("2/3")
    }

    #[test]
    fn definition_requires_every_criterion() {
        let def = ClassDefinition::by_cre_type(["pvalb", "sst"]).with_layer(["2/3"]);
        assert!(def.matches(&pvalb(1)));
        assert!(!def.matches(&pvalb(1).with_layer("5")));
        assert!(!def.matches(&Cell::new(2, 1).with_layer("2/3")));

        let ex = ClassDefinition::by_category(CellCategory::Excitatory);
        assert!(!ex.matches(&pvalb(1)));
        assert!(ex.matches(&Cell::new(3, 1).with_class(CellCategory::Excitatory)));
    }

    #[test]
    fn scheme_rejects_duplicate_and_empty_names() {
        let scheme = ClassScheme::new()
            .with_class("ex", ClassDefinition::by_category(CellCategory::Excitatory))
            .unwrap();
        let err = scheme
            .with_class("ex", ClassDefinition::by_cre_type(["tlx3"]))
            .unwrap_err();
        assert_eq!(err.to_string(), "Configuration error: duplicate class name: ex");

        let err = ClassScheme::new()
            .with_class("  ", |_: &Cell| true)
            .unwrap_err();
        assert!(err.is_configuration());
    }

    #[test]
    fn definitions_without_criteria_are_rejected() {
        let err = ClassScheme::from_definitions([("all", ClassDefinition::default())]).unwrap_err();
        assert_eq!(err.to_string(), "Configuration error: class 'all' has no criteria");
    }

    #[test]
    fn membership_label_follows_definition_order() {
        let scheme = ClassScheme::new()
            .with_class("layer23", ClassDefinition::default().with_layer(["2/3"]))
            .unwrap()
            .with_class("ex", ClassDefinition::by_category(CellCategory::Excitatory))
            .unwrap()
            .with_class("pvalb", ClassDefinition::by_cre_type(["pvalb"]))
            .unwrap();

        let membership = scheme.classify(&pvalb(1));
        assert_eq!(membership.indices(), &[0, 2]);
        assert_eq!(membership.label(&scheme), "layer23,pvalb");
        assert_eq!(membership.single(), None);

        let unclassified = scheme.classify(&Cell::new(2, 1));
        assert!(unclassified.is_empty());
        assert_eq!(unclassified.label(&scheme), "");
    }

    #[test]
    fn assignment_deduplicates_cells_across_positions() {
        let scheme = ClassScheme::new()
            .with_class("pvalb", ClassDefinition::by_cre_type(["pvalb"]))
            .unwrap();
        let a = pvalb(1);
        let b = Cell::new(2, 1).with_cre_type("sst");
        let pairs = vec![
            PairRecord::new(10, a.clone(), b.clone()),
            PairRecord::new(11, b.clone(), a.clone()),
        ];

        let classification = assign_classes(&scheme, &pairs);
        assert_eq!(classification.cell_count(), 2);
        assert_eq!(classification.membership(a.id).unwrap().single(), Some(0));
        assert_eq!(classification.label(b.id, &scheme).as_deref(), Some(""));

        let summary = classification.summary(&scheme);
        assert_eq!(summary.unclassified, 1);
        assert_eq!(summary.multiclass, 0);
        assert_eq!(summary.singly_classified(), 1);
        assert_eq!(summary.by_label.get("pvalb"), Some(&1));
    }

    #[test]
    fn classification_is_deterministic() {
        let scheme = ClassScheme::new()
            .with_class("in", ClassDefinition::by_category(CellCategory::Inhibitory))
            .unwrap()
            .with_class("pvalb", ClassDefinition::by_cre_type(["pvalb"]))
            .unwrap();
        let cell = pvalb(7);
        let first = scheme.classify(&cell).label(&scheme);
        for _ in 0..10 {
            assert_eq!(scheme.classify(&cell).label(&scheme), first);
        }
        assert_eq!(first, "in,pvalb");
    }

    #[test]
    fn accepted_values_read_string_or_list() {
        let one: ClassDefinition = serde_json::from_str(r#"{"cre_type": "vip"}"#).unwrap();
        assert_eq!(one.cre_type.values(), &["vip".to_string()]);

        let many: ClassDefinition =
            serde_json::from_str(r#"{"cre_type": ["sim1", "fam84b"], "cell_class": "ex"}"#).unwrap();
        assert_eq!(many.cre_type.values().len(), 2);
        assert_eq!(many.cell_class, Some(CellCategory::Excitatory));

        let json = serde_json::to_string(&one).unwrap();
        assert_eq!(json, r#"{"cre_type":"vip"}"#);
    }
}
