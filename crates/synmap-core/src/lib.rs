//! # synmap core
//!
//! Types and algorithms for cross-tabulating synaptic measurements by
//! cell class.
//!
//! - **types** - cells, pair records, dynamics metrics
//! - **classify** - class schemes and per-cell class membership
//! - **crosstab** - row construction, filtering, aggregation, reordering
//! - **matrix** - the square pre/post class matrix
//! - **heatmap** - matrix payload with a fixed color domain
//! - **source** - the `PairSource` trait implemented by data stores
//!
//! ## Quick Start
//!
//! ```rust
//! use synmap_core::prelude::*;
//!
//! let scheme = ClassScheme::new()
//!     .with_class("ex", ClassDefinition::by_category(CellCategory::Excitatory))?
//!     .with_class("pvalb", ClassDefinition::by_cre_type(["pvalb"]))?;
//!
//! let ex = Cell::new(1, 1).with_class(CellCategory::Excitatory);
//! let pv = Cell::new(2, 1).with_class(CellCategory::Inhibitory).with_cre_type("pvalb");
//! let pairs = vec![PairRecord::new(1, ex, pv).with_dynamics(Dynamics::with_induction(-0.2))];
//!
//! let result = CrossTab::new(&scheme).run_metric(&pairs, Metric::StpInduction50Hz)?;
//! assert_eq!(result.matrix.mean("ex", "pvalb"), Some(-0.2));
//! # Ok::<(), SynmapError>(())
//! ```

pub mod types;
pub mod classify;
pub mod crosstab;
pub mod matrix;
pub mod heatmap;
pub mod source;
pub mod error;
pub mod prelude;
