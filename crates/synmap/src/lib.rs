//! # Synmap
//!
//! Cell-class cross-tabulation of synaptic dynamics.
//!
//! Synmap assigns every recorded cell to user-defined classes, keeps the
//! pairs whose endpoints fall into exactly one class each, and averages a
//! short-term plasticity metric per (presynaptic, postsynaptic) class
//! combination. The result is a square matrix ready for heatmap display.
//!
//! ## Quick Start
//!
//! ```rust
//! use synmap::prelude::*;
//!
//! let pre = Cell::new(1, 1).with_class(CellCategory::Excitatory);
//! let post = Cell::new(2, 1).with_cre_type("sst");
//! let store = MemoryPairStore::from_pairs(vec![
//!     PairRecord::new(1, pre, post)
//!         .with_synapse(true)
//!         .with_dynamics(Dynamics::with_induction(0.25)),
//! ]);
//!
//! let scheme = ClassScheme::from_definitions([
//!     ("ex", ClassDefinition::by_category(CellCategory::Excitatory)),
//!     ("sst", ClassDefinition::by_cre_type(["sst"])),
//! ])?;
//!
//! let pairs = store.query_pairs(&PairQuery::new().synapse(true))?;
//! let result = CrossTab::new(&scheme).run_metric(&pairs, Metric::StpInduction50Hz)?;
//! assert_eq!(result.matrix.mean("ex", "sst"), Some(0.25));
//! assert_eq!(result.matrix.get("sst", "ex"), None);
//! # Ok::<(), SynmapError>(())
//! ```
//!
//! ## Architecture
//!
//! - [`synmap_core`] - Cell model, class schemes, cross-tabulation, matrix, heatmap spec
//! - [`synmap_store`] - Dataset files, in-memory and SQLite pair stores, dataset catalog
//!
//! ## Pipeline
//!
//! | Step | Operation | Output |
//! |------|-----------|--------|
//! | 1 | `PairSource::query_pairs` | Pair records |
//! | 2 | `assign_classes` | Class membership per cell |
//! | 3 | `build_rows` | Pre/post membership plus metric value |
//! | 4 | `filter_rows` | Unambiguous rows and a drop report |
//! | 5 | `aggregate` | Mean and count per class combination |
//! | 6 | `AggregateMatrix::reindex` | Matrix in display order |

pub use synmap_core as core;
pub use synmap_store as store;

/// Prelude module for convenient imports.
///
/// ```rust
/// use synmap::prelude::*;
/// ```
pub mod prelude {
    pub use synmap_core::prelude::*;
    pub use synmap_store::prelude::*;
}
