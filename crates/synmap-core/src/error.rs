//! Error types for synmap operations.
//!
//! Provides structured error handling instead of panics. Every failure
//! aborts the run; no partial matrix is ever returned alongside an error.

use crate::crosstab::FilterReport;
use thiserror::Error;

/// Result type for synmap operations.
pub type Result<T> = std::result::Result<T, SynmapError>;

/// Errors that can occur during synmap operations.
#[derive(Debug, Clone, Error)]
pub enum SynmapError {
    /// Inconsistent class scheme, ordering, or display settings.
    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigurationError),
    /// Nothing left to aggregate.
    #[error("Empty input: {0}")]
    EmptyInput(#[from] EmptyInputError),
    /// Pass-through failures from the data store.
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
    /// I/O errors (wrapped).
    #[error("I/O error: {0}")]
    Io(String),
    /// Serialization errors.
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<std::io::Error> for SynmapError {
    fn from(e: std::io::Error) -> Self {
        SynmapError::Io(e.to_string())
    }
}

impl From<serde_json::Error> for SynmapError {
    fn from(e: serde_json::Error) -> Self {
        SynmapError::Serialization(e.to_string())
    }
}

/// Class scheme and ordering errors.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigurationError {
    /// A class was registered with an empty name.
    #[error("class names must not be empty")]
    EmptyClassName,
    /// Two classes in one scheme share a name.
    #[error("duplicate class name: {0}")]
    DuplicateClass(String),
    /// A class definition without any criteria would match every cell.
    #[error("class '{0}' has no criteria")]
    EmptyDefinition(String),
    /// The ordering references a class the scheme does not define.
    #[error("ordering references unknown class: {0}")]
    UnknownClass(String),
    /// The ordering lists a class more than once.
    #[error("ordering lists class more than once: {0}")]
    DuplicateInOrder(String),
    /// The ordering leaves out a class the scheme defines.
    #[error("ordering is missing class: {0}")]
    MissingFromOrder(String),
    /// Color scale bounds are not increasing finite values.
    #[error("invalid color scale: vmin {vmin} must be below vmax {vmax}")]
    InvalidColorScale { vmin: f64, vmax: f64 },
    /// Metric name does not correspond to any dynamics field.
    #[error("unknown metric: {0}")]
    UnknownMetric(String),
}

/// Raised when no data reaches the aggregation step.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EmptyInputError {
    /// The pair collection itself was empty.
    #[error("no pair records were supplied")]
    NoPairs,
    /// Pairs were supplied but every row was dropped by the filter.
    #[error(
        "no rows survived filtering ({} pairs: {} with ambiguous class, {} missing metric)",
        .report.total,
        .report.dropped_ambiguous(),
        .report.missing_metric
    )]
    NothingSurvivedFilter { report: FilterReport },
}

/// Data store errors, carried through unmodified.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum StoreError {
    /// Backend failure (SQL, file access).
    #[error("{0}")]
    Backend(String),
    /// The requested dataset is not present in the catalog.
    #[error("dataset not found: {0}")]
    DatasetNotFound(String),
    /// Dataset contents are inconsistent.
    #[error("invalid dataset: {0}")]
    InvalidDataset(String),
}

// Convenience constructors
impl SynmapError {
    pub fn unknown_class(name: impl Into<String>) -> Self {
        SynmapError::Configuration(ConfigurationError::UnknownClass(name.into()))
    }

    pub fn duplicate_class(name: impl Into<String>) -> Self {
        SynmapError::Configuration(ConfigurationError::DuplicateClass(name.into()))
    }

    pub fn backend(msg: impl std::fmt::Display) -> Self {
        SynmapError::Store(StoreError::Backend(msg.to_string()))
    }

    pub fn invalid_dataset(msg: impl Into<String>) -> Self {
        SynmapError::Store(StoreError::InvalidDataset(msg.into()))
    }

    /// True for `ConfigurationError` variants.
    pub fn is_configuration(&self) -> bool {
        matches!(self, SynmapError::Configuration(_))
    }

    /// True for `EmptyInputError` variants.
    pub fn is_empty_input(&self) -> bool {
        matches!(self, SynmapError::EmptyInput(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_offending_class() {
        let err = SynmapError::unknown_class("chandelier");
        assert!(err.is_configuration());
        assert_eq!(
            err.to_string(),
            "Configuration error: ordering references unknown class: chandelier"
        );
    }

    #[test]
    fn empty_filter_message_reports_counts() {
        let report = FilterReport {
            total: 4,
            retained: 0,
            pre_unclassified: 1,
            pre_multiclass: 1,
            post_unclassified: 0,
            post_multiclass: 0,
            missing_metric: 2,
        };
        let err: SynmapError = EmptyInputError::NothingSurvivedFilter { report }.into();
        assert!(err.is_empty_input());
        assert_eq!(
            err.to_string(),
            "Empty input: no rows survived filtering (4 pairs: 2 with ambiguous class, 2 missing metric)"
        );
    }
}
