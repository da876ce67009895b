//! Programmatic configuration of an assembly and solve pass.
use serde::{Deserialize, Serialize};

/// Options controlling a [`Pipeline`](crate::Pipeline).
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineOptions {
    /// Pivots of the Cholesky factor smaller than this tolerance, relative to the largest pivot,
    /// are treated as zero, and the system is reported as singular.
    pub pivot_tolerance: f64,
    /// Whether local matrices are checked for symmetry before they are scattered.
    pub check_symmetry: bool,
    /// Relative tolerance of the symmetry check.
    pub symmetry_tolerance: f64,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            pivot_tolerance: 1e-12,
            check_symmetry: false,
            symmetry_tolerance: 1e-10,
        }
    }
}

impl PipelineOptions {
    pub fn with_pivot_tolerance(self, pivot_tolerance: f64) -> Self {
        Self { pivot_tolerance, ..self }
    }

    pub fn with_symmetry_check(self, symmetry_tolerance: f64) -> Self {
        Self {
            check_symmetry: true,
            symmetry_tolerance,
            ..self
        }
    }

    pub fn without_symmetry_check(self) -> Self {
        Self {
            check_symmetry: false,
            ..self
        }
    }
}
