//! synmap store prelude: convenient imports for common usage.
//!
//! ```rust
//! use synmap_store::prelude::*;
//! ```

pub use crate::dataset::{
    DatasetFile, DatasetMetadata, ExperimentRecord, SerializedPair,
    load_dataset, save_dataset,
};

pub use crate::memory::MemoryPairStore;

pub use crate::backend::{DynPairSource, StoreConfig, open_store};

#[cfg(feature = "sqlite")]
pub use crate::sqlite::{ImportStats, SqlitePairStore};

#[cfg(feature = "sqlite")]
pub use crate::catalog::{DatasetCatalog, DatasetRef};
