//! Dataset catalog: named, versioned SQLite datasets in one directory.
//!
//! The catalog is an explicit storage dependency: callers construct it
//! with a root directory and pass it where datasets are needed. It never
//! fetches anything remotely.

#![cfg(feature = "sqlite")]

use crate::dataset::DatasetFile;
use crate::sqlite::{ImportStats, SqlitePairStore};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use synmap_core::error::{Result, StoreError, SynmapError};
use tracing::{debug, info, warn};

const EXTENSION: &str = "sqlite";
const STAGING_SUFFIX: &str = ".importing";
const SIDECARS: [&str; 2] = ["-wal", "-shm"];

/// A dataset name plus release version, e.g. `synphys@small`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DatasetRef {
    pub name: String,
    pub version: String,
}

impl DatasetRef {
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
        }
    }

    fn validate(&self) -> Result<()> {
        let ok = |s: &str| {
            !s.is_empty()
                && s.chars()
                    .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-'))
        };
        if ok(&self.name) && ok(&self.version) {
            Ok(())
        } else {
            Err(SynmapError::invalid_dataset(format!(
                "dataset reference '{}' may only use letters, digits, '_', '.' and '-'",
                self
            )))
        }
    }

    fn file_name(&self) -> String {
        format!("{}@{}.{}", self.name, self.version, EXTENSION)
    }
}

impl fmt::Display for DatasetRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.name, self.version)
    }
}

impl FromStr for DatasetRef {
    type Err = SynmapError;

    fn from_str(s: &str) -> Result<Self> {
        let (name, version) = s.split_once('@').ok_or_else(|| {
            SynmapError::invalid_dataset(format!("expected <name>@<version>, got '{}'", s))
        })?;
        let dataset = DatasetRef::new(name, version);
        dataset.validate()?;
        Ok(dataset)
    }
}

/// Directory of SQLite datasets, one file per name and version.
#[derive(Debug, Clone)]
pub struct DatasetCatalog {
    root: PathBuf,
}

impl DatasetCatalog {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Location of a dataset, whether or not it exists.
    pub fn path_for(&self, dataset: &DatasetRef) -> Result<PathBuf> {
        dataset.validate()?;
        Ok(self.root.join(dataset.file_name()))
    }

    pub fn contains(&self, dataset: &DatasetRef) -> bool {
        self.path_for(dataset).map(|p| p.exists()).unwrap_or(false)
    }

    /// Datasets present in the catalog, sorted.
    pub fn list(&self) -> Result<Vec<DatasetRef>> {
        if !self.root.exists() {
            return Ok(Vec::new());
        }
        let mut found = Vec::new();
        for entry in std::fs::read_dir(&self.root)? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some(EXTENSION) {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                if let Ok(dataset) = stem.parse::<DatasetRef>() {
                    found.push(dataset);
                }
            }
        }
        found.sort();
        Ok(found)
    }

    /// Open an existing dataset.
    pub fn open(&self, dataset: &DatasetRef) -> Result<SqlitePairStore> {
        let path = self.path_for(dataset)?;
        if !path.is_file() {
            return Err(StoreError::DatasetNotFound(dataset.to_string()).into());
        }
        debug!(path = %path.display(), "opening dataset");
        SqlitePairStore::open_existing(&path)
    }

    /// Import `data` as `dataset`, replacing an existing one only if asked.
    ///
    /// The import is written to a staging file and renamed into place once
    /// it has committed. On failure the previous dataset is left as it was.
    pub fn import<F>(
        &self,
        dataset: &DatasetRef,
        data: &DatasetFile,
        replace: bool,
        on_pair: F,
    ) -> Result<ImportStats>
    where
        F: FnMut(usize),
    {
        let path = self.path_for(dataset)?;
        if path.exists() && !replace {
            return Err(SynmapError::invalid_dataset(format!(
                "{} already exists in {}",
                dataset,
                self.root.display()
            )));
        }
        std::fs::create_dir_all(&self.root)?;

        let staging = with_suffix(&path, STAGING_SUFFIX);
        remove_with_sidecars(&staging)?;
        let stats = match write_staging(&staging, data, on_pair) {
            Ok(stats) => stats,
            Err(e) => {
                if let Err(cleanup) = remove_with_sidecars(&staging) {
                    warn!(path = %staging.display(), error = %cleanup, "staging file left behind");
                }
                return Err(e);
            }
        };

        for suffix in SIDECARS {
            remove_if_present(&with_suffix(&path, suffix))?;
        }
        std::fs::rename(&staging, &path)?;
        info!(dataset = %dataset, pairs = stats.pairs, "dataset stored in catalog");
        Ok(stats)
    }
}

fn write_staging<F>(staging: &Path, data: &DatasetFile, on_pair: F) -> Result<ImportStats>
where
    F: FnMut(usize),
{
    let store = SqlitePairStore::open(staging)?;
    let stats = store.import_with_progress(data, on_pair)?;
    store.close()?;
    Ok(stats)
}

fn with_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(suffix);
    PathBuf::from(name)
}

fn remove_if_present(path: &Path) -> Result<()> {
    match std::fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e.into()),
    }
}

fn remove_with_sidecars(path: &Path) -> Result<()> {
    remove_if_present(path)?;
    for suffix in SIDECARS {
        remove_if_present(&with_suffix(path, suffix))?;
    }
    Ok(())
}
