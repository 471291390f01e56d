//! Dataset files: JSON snapshots of experiments, cells and pairs.
//!
//! Pairs reference cells by id; cells reference experiments by id. A
//! dataset is validated as a whole before any store accepts it.

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::path::Path;
use synmap_core::error::{Result, SynmapError};
use synmap_core::types::*;

/// Serializable snapshot of one dataset release.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatasetFile {
    pub metadata: DatasetMetadata,
    pub experiments: Vec<ExperimentRecord>,
    pub cells: Vec<Cell>,
    pub pairs: Vec<SerializedPair>,
}

/// Dataset name and release version.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetMetadata {
    pub name: String,
    pub version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// One slice recording session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExperimentRecord {
    pub id: ExperimentId,
    pub project_name: String,
    /// Acquisition time, seconds since the epoch.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub acq_timestamp: Option<f64>,
}

/// Serializable pair; endpoints are cell ids.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SerializedPair {
    pub id: PairId,
    pub pre_cell: CellId,
    pub post_cell: CellId,
    #[serde(default)]
    pub has_synapse: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dynamics: Option<Dynamics>,
}

impl DatasetFile {
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            metadata: DatasetMetadata {
                name: name.into(),
                version: version.into(),
                description: None,
            },
            experiments: Vec::new(),
            cells: Vec::new(),
            pairs: Vec::new(),
        }
    }

    /// Flatten resolved pair records back into a dataset.
    ///
    /// Experiments take their project from the first pair seen in them.
    pub fn from_pairs(metadata: DatasetMetadata, pairs: &[PairRecord]) -> Self {
        let mut dataset = Self {
            metadata,
            experiments: Vec::new(),
            cells: Vec::new(),
            pairs: Vec::new(),
        };
        let mut experiments = HashSet::new();
        let mut cells = HashSet::new();

        for pair in pairs {
            if experiments.insert(pair.experiment_id) {
                dataset.experiments.push(ExperimentRecord {
                    id: pair.experiment_id,
                    project_name: pair.project_name.clone(),
                    acq_timestamp: None,
                });
            }
            for cell in [&pair.pre, &pair.post] {
                if experiments.insert(cell.experiment_id) {
                    dataset.experiments.push(ExperimentRecord {
                        id: cell.experiment_id,
                        project_name: pair.project_name.clone(),
                        acq_timestamp: None,
                    });
                }
                if cells.insert(cell.id) {
                    dataset.cells.push(cell.clone());
                }
            }
            dataset.pairs.push(SerializedPair {
                id: pair.id,
                pre_cell: pair.pre.id,
                post_cell: pair.post.id,
                has_synapse: pair.has_synapse,
                dynamics: pair.dynamics,
            });
        }
        dataset
    }

    /// Check ids are unique and every reference resolves.
    pub fn validate(&self) -> Result<()> {
        let mut experiments = HashSet::new();
        for expt in &self.experiments {
            if !experiments.insert(expt.id) {
                return Err(SynmapError::invalid_dataset(format!(
                    "duplicate experiment id {}",
                    expt.id.0
                )));
            }
        }

        let mut cells = HashSet::new();
        for cell in &self.cells {
            if !cells.insert(cell.id) {
                return Err(SynmapError::invalid_dataset(format!("duplicate {}", cell.id)));
            }
            if !experiments.contains(&cell.experiment_id) {
                return Err(SynmapError::invalid_dataset(format!(
                    "{} references unknown experiment {}",
                    cell.id, cell.experiment_id.0
                )));
            }
        }

        let mut pairs = HashSet::new();
        for pair in &self.pairs {
            if !pairs.insert(pair.id) {
                return Err(SynmapError::invalid_dataset(format!("duplicate {}", pair.id)));
            }
            for cell in [pair.pre_cell, pair.post_cell] {
                if !cells.contains(&cell) {
                    return Err(SynmapError::invalid_dataset(format!(
                        "{} references unknown {}",
                        pair.id, cell
                    )));
                }
            }
        }
        Ok(())
    }

    /// Resolve every pair into a full record, in file order.
    pub fn resolve(&self) -> Result<Vec<PairRecord>> {
        self.validate()?;

        let projects: HashMap<ExperimentId, &str> = self
            .experiments
            .iter()
            .map(|e| (e.id, e.project_name.as_str()))
            .collect();
        let cells: HashMap<CellId, &Cell> = self.cells.iter().map(|c| (c.id, c)).collect();

        let mut records = Vec::with_capacity(self.pairs.len());
        for pair in &self.pairs {
            let (pre, post) = match (cells.get(&pair.pre_cell), cells.get(&pair.post_cell)) {
                (Some(pre), Some(post)) => (*pre, *post),
                _ => return Err(SynmapError::invalid_dataset(format!("{} is dangling", pair.id))),
            };
            records.push(PairRecord {
                id: pair.id,
                experiment_id: pre.experiment_id,
                project_name: projects
                    .get(&pre.experiment_id)
                    .map(|p| p.to_string())
                    .unwrap_or_default(),
                pre: pre.clone(),
                post: post.clone(),
                has_synapse: pair.has_synapse,
                dynamics: pair.dynamics,
            });
        }
        Ok(records)
    }
}

/// Read a dataset from a JSON file.
pub fn load_dataset(path: &Path) -> Result<DatasetFile> {
    let content = std::fs::read_to_string(path)?;
    let dataset: DatasetFile = serde_json::from_str(&content)?;
    Ok(dataset)
}

/// Write a dataset to a JSON file.
pub fn save_dataset(dataset: &DatasetFile, path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(dataset)?;
    std::fs::write(path, json)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small() -> DatasetFile {
        let mut ds = DatasetFile::new("synphys", "small");
        ds.experiments.push(ExperimentRecord {
            id: ExperimentId(1),
            project_name: "mouse V1 coarse matrix".into(),
            acq_timestamp: Some(1_500_000_000.0),
        });
        ds.cells.push(Cell::new(10, 1).with_class(CellCategory::Excitatory));
        ds.cells.push(Cell::new(11, 1).with_cre_type("sst"));
        ds.pairs.push(SerializedPair {
            id: PairId(100),
            pre_cell: CellId(10),
            post_cell: CellId(11),
            has_synapse: true,
            dynamics: Some(Dynamics::with_induction(0.05)),
        });
        ds
    }

    #[test]
    fn resolve_joins_cells_and_projects() {
        let records = small().resolve().unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].project_name, "mouse V1 coarse matrix");
        assert_eq!(records[0].post.cre_type.as_deref(), Some("sst"));
        assert_eq!(Metric::StpInduction50Hz.of_pair(&records[0]), Some(0.05));
    }

    #[test]
    fn dangling_cell_reference_names_the_pair() {
        let mut ds = small();
        ds.pairs[0].post_cell = CellId(99);
        let err = ds.resolve().unwrap_err();
        assert_eq!(
            err.to_string(),
            "Store error: invalid dataset: pair#100 references unknown cell#99"
        );
    }

    #[test]
    fn duplicate_ids_are_rejected() {
        let mut ds = small();
        ds.cells.push(Cell::new(10, 1));
        assert!(ds.validate().is_err());
    }

    #[test]
    fn from_pairs_round_trips_records() {
        let records = small().resolve().unwrap();
        let rebuilt = DatasetFile::from_pairs(small().metadata, &records);
        assert_eq!(rebuilt.cells.len(), 2);
        assert_eq!(rebuilt.experiments.len(), 1);
        assert_eq!(rebuilt.resolve().unwrap(), records);
    }

    #[test]
    fn json_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("small.json");
        save_dataset(&small(), &path).unwrap();
        let loaded = load_dataset(&path).unwrap();
        assert_eq!(loaded.metadata.version, "small");
        assert_eq!(loaded.pairs, small().pairs);
    }
}
