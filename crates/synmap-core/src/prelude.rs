//! synmap core prelude: convenient imports for common usage.
//!
//! ```rust
//! use synmap_core::prelude::*;
//! ```

pub use crate::types::{
    Cell, CellCategory, CellId,
    Dynamics, Metric,
    ExperimentId, PairId, PairRecord,
};

pub use crate::classify::{
    assign_classes, AcceptedValues, CellClassification, ClassDefinition,
    ClassMembership, ClassPredicate, ClassScheme, LabelSummary,
};

pub use crate::crosstab::{
    aggregate, build_rows, filter_rows,
    CrossTab, CrossTabResult, CrossTabRow, FilterReport,
};

pub use crate::matrix::{AggregateMatrix, MatrixCell};

pub use crate::heatmap::{ColorScale, HeatmapSpec};

pub use crate::source::{PairQuery, PairSource, StoreSummary};

pub use crate::error::{ConfigurationError, EmptyInputError, StoreError, SynmapError, Result};
