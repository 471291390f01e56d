//! In-memory pair store.
//!
//! Holds resolved records directly. Used for JSON datasets and tests.

use crate::dataset::DatasetFile;
use std::collections::BTreeSet;
use synmap_core::error::Result;
use synmap_core::source::{PairQuery, PairSource, StoreSummary};
use synmap_core::types::PairRecord;

/// Pair store backed by a `Vec` of resolved records.
#[derive(Debug, Clone, Default)]
pub struct MemoryPairStore {
    pairs: Vec<PairRecord>,
    experiment_count: usize,
    cell_count: usize,
}

impl MemoryPairStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate and resolve a dataset into memory.
    pub fn from_dataset(dataset: &DatasetFile) -> Result<Self> {
        let mut pairs = dataset.resolve()?;
        pairs.sort_by_key(|p| p.id);
        Ok(Self {
            pairs,
            experiment_count: dataset.experiments.len(),
            cell_count: dataset.cells.len(),
        })
    }

    /// Build from records; counts cover only what the pairs reference.
    pub fn from_pairs(mut pairs: Vec<PairRecord>) -> Self {
        pairs.sort_by_key(|p| p.id);
        let experiments: BTreeSet<_> = pairs
            .iter()
            .flat_map(|p| [p.experiment_id, p.pre.experiment_id, p.post.experiment_id])
            .collect();
        let cells: BTreeSet<_> = pairs.iter().flat_map(|p| [p.pre.id, p.post.id]).collect();
        Self {
            experiment_count: experiments.len(),
            cell_count: cells.len(),
            pairs,
        }
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}

impl PairSource for MemoryPairStore {
    fn query_pairs(&self, query: &PairQuery) -> Result<Vec<PairRecord>> {
        Ok(self
            .pairs
            .iter()
            .filter(|p| query.matches(p))
            .cloned()
            .collect())
    }

    fn summary(&self) -> Result<StoreSummary> {
        let projects: BTreeSet<&str> = self.pairs.iter().map(|p| p.project_name.as_str()).collect();
        Ok(StoreSummary {
            experiments: self.experiment_count,
            cells: self.cell_count,
            pairs: self.pairs.len(),
            synapses: self.pairs.iter().filter(|p| p.has_synapse).count(),
            with_dynamics: self.pairs.iter().filter(|p| p.dynamics.is_some()).count(),
            projects: projects.into_iter().map(String::from).collect(),
        })
    }
}
