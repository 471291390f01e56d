//! Shared types used across all synmap crates.
//!
//! Records here are produced by a data store and treated as immutable for
//! the duration of an analysis run.

use crate::error::ConfigurationError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Identifier of a recorded cell. Cell identity is id equality.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CellId(pub i64);

/// Identifier of a pre/post pair record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PairId(pub i64);

/// Identifier of the experiment (slice recording session) a record came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ExperimentId(pub i64);

impl fmt::Display for CellId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "cell#{}", self.0)
    }
}

impl fmt::Display for PairId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "pair#{}", self.0)
    }
}

/// Broad excitatory/inhibitory category of a cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CellCategory {
    #[serde(rename = "ex")]
    Excitatory,
    #[serde(rename = "in")]
    Inhibitory,
}

impl CellCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            CellCategory::Excitatory => "ex",
            CellCategory::Inhibitory => "in",
        }
    }

    /// Parse the short database code. Unknown codes yield `None`.
    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "ex" => Some(CellCategory::Excitatory),
            "in" => Some(CellCategory::Inhibitory),
            _ => None,
        }
    }
}

/// One recorded neuron.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cell {
    pub id: CellId,
    pub experiment_id: ExperimentId,
    /// Broad category, when it could be determined.
    #[serde(default)]
    pub cell_class: Option<CellCategory>,
    /// Marker-gene (transgenic reporter) label, e.g. "pvalb".
    #[serde(default)]
    pub cre_type: Option<String>,
    /// Cortical layer targeted during recording, e.g. "2/3".
    #[serde(default)]
    pub target_layer: Option<String>,
}

impl Cell {
    pub fn new(id: i64, experiment_id: i64) -> Self {
        Self {
            id: CellId(id),
            experiment_id: ExperimentId(experiment_id),
            cell_class: None,
            cre_type: None,
            target_layer: None,
        }
    }

    pub fn with_class(mut self, category: CellCategory) -> Self {
        self.cell_class = Some(category);
        self
    }

    pub fn with_cre_type(mut self, cre_type: impl Into<String>) -> Self {
        self.cre_type = Some(cre_type.into());
        self
    }

    pub fn with_layer(mut self, layer: impl Into<String>) -> Self {
        self.target_layer = Some(layer.into());
        self
    }
}

/// Short-term plasticity metrics derived for one pair.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Dynamics {
    #[serde(default)]
    pub stp_initial_50hz: Option<f64>,
    #[serde(default)]
    pub stp_induction_50hz: Option<f64>,
    #[serde(default)]
    pub stp_recovery_250ms: Option<f64>,
    #[serde(default)]
    pub paired_pulse_ratio_50hz: Option<f64>,
}

impl Dynamics {
    /// Dynamics carrying only the 50 Hz induction metric.
    pub fn with_induction(value: f64) -> Self {
        Self {
            stp_induction_50hz: Some(value),
            ..Self::default()
        }
    }
}

/// Names one scalar field of [`Dynamics`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Metric {
    #[serde(rename = "stp_initial_50hz")]
    StpInitial50Hz,
    #[default]
    #[serde(rename = "stp_induction_50hz")]
    StpInduction50Hz,
    #[serde(rename = "stp_recovery_250ms")]
    StpRecovery250ms,
    #[serde(rename = "paired_pulse_ratio_50hz")]
    PairedPulseRatio50Hz,
}

impl Metric {
    pub const ALL: [Metric; 4] = [
        Metric::StpInitial50Hz,
        Metric::StpInduction50Hz,
        Metric::StpRecovery250ms,
        Metric::PairedPulseRatio50Hz,
    ];

    /// Column name used by stores and configuration.
    pub fn column(&self) -> &'static str {
        match self {
            Metric::StpInitial50Hz => "stp_initial_50hz",
            Metric::StpInduction50Hz => "stp_induction_50hz",
            Metric::StpRecovery250ms => "stp_recovery_250ms",
            Metric::PairedPulseRatio50Hz => "paired_pulse_ratio_50hz",
        }
    }

    /// Field accessor on a dynamics record.
    pub fn value(&self, dynamics: &Dynamics) -> Option<f64> {
        match self {
            Metric::StpInitial50Hz => dynamics.stp_initial_50hz,
            Metric::StpInduction50Hz => dynamics.stp_induction_50hz,
            Metric::StpRecovery250ms => dynamics.stp_recovery_250ms,
            Metric::PairedPulseRatio50Hz => dynamics.paired_pulse_ratio_50hz,
        }
    }

    /// Metric value for a pair, absent when the pair has no dynamics.
    pub fn of_pair(&self, pair: &PairRecord) -> Option<f64> {
        pair.dynamics.as_ref().and_then(|d| self.value(d))
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column())
    }
}

impl FromStr for Metric {
    type Err = ConfigurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Metric::ALL
            .into_iter()
            .find(|m| m.column() == s)
            .ok_or_else(|| ConfigurationError::UnknownMetric(s.to_string()))
    }
}

/// An ordered presynaptic/postsynaptic relationship.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PairRecord {
    pub id: PairId,
    pub experiment_id: ExperimentId,
    pub project_name: String,
    pub pre: Cell,
    pub post: Cell,
    #[serde(default)]
    pub has_synapse: bool,
    /// Present only when dynamics were measured for this pair.
    #[serde(default)]
    pub dynamics: Option<Dynamics>,
}

impl PairRecord {
    pub fn new(id: i64, pre: Cell, post: Cell) -> Self {
        Self {
            id: PairId(id),
            experiment_id: pre.experiment_id,
            project_name: String::new(),
            pre,
            post,
            has_synapse: false,
            dynamics: None,
        }
    }

    pub fn with_project(mut self, project: impl Into<String>) -> Self {
        self.project_name = project.into();
        self
    }

    pub fn with_synapse(mut self, has_synapse: bool) -> Self {
        self.has_synapse = has_synapse;
        self
    }

    pub fn with_dynamics(mut self, dynamics: Dynamics) -> Self {
        self.dynamics = Some(dynamics);
        self
    }
}
