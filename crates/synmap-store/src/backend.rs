//! Store configuration and factory.
//!
//! Provides a unified interface for selecting where pair records come from.

use crate::dataset::load_dataset;
use crate::memory::MemoryPairStore;
use std::path::{Path, PathBuf};
use synmap_core::error::Result;
use synmap_core::source::PairSource;

#[cfg(feature = "sqlite")]
use crate::catalog::{DatasetCatalog, DatasetRef};

/// Configuration for store selection.
#[derive(Debug, Clone)]
pub enum StoreConfig {
    /// JSON dataset file, loaded fully into memory.
    Json { path: PathBuf },

    /// SQLite database file.
    #[cfg(feature = "sqlite")]
    Sqlite { path: PathBuf },

    /// Named dataset inside a catalog directory.
    #[cfg(feature = "sqlite")]
    Catalog { root: PathBuf, dataset: DatasetRef },
}

impl StoreConfig {
    /// Pick a backend from the file extension: `.json` is a dataset file,
    /// anything else is treated as SQLite.
    #[cfg(feature = "sqlite")]
    pub fn from_path(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref().to_path_buf();
        if has_json_extension(&path) {
            StoreConfig::Json { path }
        } else {
            StoreConfig::Sqlite { path }
        }
    }

    /// Without SQLite support every path is read as a JSON dataset file.
    #[cfg(not(feature = "sqlite"))]
    pub fn from_path(path: impl AsRef<Path>) -> Self {
        StoreConfig::Json {
            path: path.as_ref().to_path_buf(),
        }
    }

    #[cfg(feature = "sqlite")]
    pub fn catalog(root: impl Into<PathBuf>, dataset: DatasetRef) -> Self {
        StoreConfig::Catalog {
            root: root.into(),
            dataset,
        }
    }
}

#[cfg_attr(not(feature = "sqlite"), allow(dead_code))]
fn has_json_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.eq_ignore_ascii_case("json"))
        .unwrap_or(false)
}

/// Trait object for stores.
pub type DynPairSource = Box<dyn PairSource + Send + Sync>;

/// Open a store from configuration.
///
/// # Errors
/// Returns the store's own error if the file cannot be read, parsed or
/// opened. A missing SQLite file or catalog dataset is `DatasetNotFound`;
/// opening never creates one.
pub fn open_store(config: &StoreConfig) -> Result<DynPairSource> {
    match config {
        StoreConfig::Json { path } => {
            let dataset = load_dataset(path)?;
            Ok(Box::new(MemoryPairStore::from_dataset(&dataset)?))
        }

        #[cfg(feature = "sqlite")]
        StoreConfig::Sqlite { path } => {
            use crate::sqlite::SqlitePairStore;
            Ok(Box::new(SqlitePairStore::open_existing(path)?))
        }

        #[cfg(feature = "sqlite")]
        StoreConfig::Catalog { root, dataset } => {
            Ok(Box::new(DatasetCatalog::new(root).open(dataset)?))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::{save_dataset, DatasetFile};
    use synmap_core::source::PairQuery;

    #[test]
    fn json_extension_selects_dataset_file() {
        assert!(has_json_extension(Path::new("data/synphys.JSON")));
        assert!(matches!(
            StoreConfig::from_path("data/synphys.json"),
            StoreConfig::Json { .. }
        ));
    }

    #[cfg(feature = "sqlite")]
    #[test]
    fn other_extensions_select_sqlite() {
        assert!(matches!(
            StoreConfig::from_path("data/synphys.sqlite"),
            StoreConfig::Sqlite { .. }
        ));
    }

    #[test]
    fn open_json_store() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.json");
        save_dataset(&DatasetFile::new("empty", "0"), &path).unwrap();

        let store = open_store(&StoreConfig::from_path(&path)).unwrap();
        assert!(store.query_pairs(&PairQuery::new()).unwrap().is_empty());
    }

    #[test]
    fn missing_json_file_is_an_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = open_store(&StoreConfig::Json {
            path: dir.path().join("absent.json"),
        })
        .err()
        .unwrap();
        assert!(err.to_string().starts_with("I/O error"));
    }

    #[cfg(feature = "sqlite")]
    #[test]
    fn missing_sqlite_file_is_not_created() {
        use synmap_core::error::{StoreError, SynmapError};

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("typo.sqlite");
        let err = open_store(&StoreConfig::from_path(&path)).err().unwrap();
        match err {
            SynmapError::Store(StoreError::DatasetNotFound(name)) => {
                assert!(name.ends_with("typo.sqlite"))
            }
            other => panic!("unexpected error: {}", other),
        }
        assert!(!path.exists());
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }
}
