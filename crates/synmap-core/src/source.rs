//! Pair source: the contract every data store implements.
//!
//! This is a trait rather than a concrete type so that analyses can run
//! against SQLite databases, JSON dataset files or in-memory fixtures
//! alike. Store failures are passed through to the caller unchanged.

use crate::error::Result;
use crate::types::{ExperimentId, PairRecord};
use serde::{Deserialize, Serialize};

/// Selection of pairs from a store.
///
/// Empty `projects`/`experiments` lists place no restriction.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PairQuery {
    #[serde(default)]
    pub projects: Vec<String>,
    #[serde(default)]
    pub experiments: Vec<ExperimentId>,
    #[serde(default)]
    pub has_synapse: Option<bool>,
    /// Only pairs with a dynamics record.
    #[serde(default)]
    pub require_dynamics: bool,
}

impl PairQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn project(mut self, name: impl Into<String>) -> Self {
        self.projects.push(name.into());
        self
    }

    pub fn experiment(mut self, id: ExperimentId) -> Self {
        self.experiments.push(id);
        self
    }

    pub fn synapse(mut self, has_synapse: bool) -> Self {
        self.has_synapse = Some(has_synapse);
        self
    }

    pub fn with_dynamics(mut self) -> Self {
        self.require_dynamics = true;
        self
    }

    /// In-memory evaluation of the query.
    pub fn matches(&self, pair: &PairRecord) -> bool {
        (self.projects.is_empty() || self.projects.iter().any(|p| *p == pair.project_name))
            && (self.experiments.is_empty() || self.experiments.contains(&pair.experiment_id))
            && self.has_synapse.map_or(true, |s| s == pair.has_synapse)
            && (!self.require_dynamics || pair.dynamics.is_some())
    }
}

/// Record counts of a store.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StoreSummary {
    pub experiments: usize,
    pub cells: usize,
    pub pairs: usize,
    pub synapses: usize,
    pub with_dynamics: usize,
    /// Distinct project names, sorted.
    pub projects: Vec<String>,
}

/// A queryable collection of pair records.
pub trait PairSource {
    /// Pairs matching `query`, ordered by pair id.
    fn query_pairs(&self, query: &PairQuery) -> Result<Vec<PairRecord>>;

    /// Counts over the whole store.
    fn summary(&self) -> Result<StoreSummary>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Cell, Dynamics};

    #[test]
    fn empty_query_matches_everything() {
        let pair = PairRecord::new(1, Cell::new(1, 3), Cell::new(2, 3));
        assert!(PairQuery::new().matches(&pair));
    }

    #[test]
    fn query_criteria_combine() {
        let pair = PairRecord::new(1, Cell::new(1, 3), Cell::new(2, 3))
            .with_project("mouse V1 coarse matrix")
            .with_synapse(true)
            .with_dynamics(Dynamics::with_induction(0.1));

        assert!(PairQuery::new()
            .project("mouse V1 coarse matrix")
            .synapse(true)
            .with_dynamics()
            .matches(&pair));
        assert!(!PairQuery::new().project("human coarse matrix").matches(&pair));
        assert!(!PairQuery::new().experiment(ExperimentId(4)).matches(&pair));
        assert!(!PairQuery::new().synapse(false).matches(&pair));

        let bare = PairRecord::new(2, Cell::new(1, 3), Cell::new(2, 3));
        assert!(!PairQuery::new().with_dynamics().matches(&bare));
    }
}
