//! # synmap store
//!
//! Data stores that resolve a dataset into queryable pair records.
//!
//! Every store implements [`synmap_core::source::PairSource`]:
//!
//! - [`MemoryPairStore`](memory::MemoryPairStore) - resolved records in memory
//! - [`SqlitePairStore`](sqlite::SqlitePairStore) - SQLite tables queried with joins
//! - [`DatasetCatalog`](catalog::DatasetCatalog) - named, versioned SQLite files
//!
//! Datasets travel as JSON [`DatasetFile`](dataset::DatasetFile)s.

pub mod dataset;
pub mod memory;
pub mod backend;
#[cfg(feature = "sqlite")]
pub mod sqlite;
#[cfg(feature = "sqlite")]
pub mod catalog;
pub mod prelude;
