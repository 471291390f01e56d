//! Heatmap payload handed to a plotting front end.
//!
//! Carries the labeled matrix, per-entry sample counts and a fixed color
//! domain. Undefined entries serialize as `null`.

use crate::error::{ConfigurationError, Result};
use crate::matrix::AggregateMatrix;
use crate::types::Metric;
use serde::{Deserialize, Serialize};

/// Fixed value domain mapped onto a diverging colormap.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColorScale {
    pub vmin: f64,
    pub vmax: f64,
    #[serde(default = "default_colormap")]
    pub colormap: String,
}

fn default_colormap() -> String {
    "bwr".to_string()
}

impl Default for ColorScale {
    fn default() -> Self {
        Self {
            vmin: -0.5,
            vmax: 0.5,
            colormap: default_colormap(),
        }
    }
}

impl ColorScale {
    pub fn new(vmin: f64, vmax: f64) -> Result<Self> {
        let scale = Self {
            vmin,
            vmax,
            colormap: default_colormap(),
        };
        scale.validate()?;
        Ok(scale)
    }

    pub fn with_colormap(mut self, colormap: impl Into<String>) -> Self {
        self.colormap = colormap.into();
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.vmin.is_finite() && self.vmax.is_finite() && self.vmin < self.vmax {
            Ok(())
        } else {
            Err(ConfigurationError::InvalidColorScale {
                vmin: self.vmin,
                vmax: self.vmax,
            }
            .into())
        }
    }

    /// Position of `value` within the domain, clamped to [0, 1].
    pub fn normalize(&self, value: f64) -> f64 {
        ((value - self.vmin) / (self.vmax - self.vmin)).clamp(0.0, 1.0)
    }
}

/// A square labeled matrix ready for a generic heatmap renderer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HeatmapSpec {
    pub title: String,
    pub metric: Metric,
    /// Presynaptic classes, top to bottom.
    pub rows: Vec<String>,
    /// Postsynaptic classes, left to right.
    pub columns: Vec<String>,
    pub values: Vec<Vec<Option<f64>>>,
    pub counts: Vec<Vec<usize>>,
    pub color_scale: ColorScale,
}

impl HeatmapSpec {
    pub fn from_matrix(
        title: impl Into<String>,
        metric: Metric,
        matrix: &AggregateMatrix,
        color_scale: ColorScale,
    ) -> Result<Self> {
        color_scale.validate()?;
        Ok(Self {
            title: title.into(),
            metric,
            rows: matrix.classes().to_vec(),
            columns: matrix.classes().to_vec(),
            values: matrix.means(),
            counts: matrix.counts(),
            color_scale,
        })
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
