//! Errors raised while building, assembling or solving a global system.
use std::error::Error;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, AssemblyError>;

/// An error raised by one of the assembly components.
///
/// Every error is fatal for the pass in which it occurs: none of the components
/// expose partially built tables, graphs or matrices.
#[derive(Debug, Error)]
pub enum AssemblyError {
    /// The DOF count reported while sizing the element-DOF table disagrees with the number of
    /// DOFs produced while filling it.
    #[error("element {element} reported {expected} DOFs when sized, but produced {actual} DOFs when filled")]
    InconsistentIncidence {
        element: usize,
        expected: usize,
        actual: usize,
    },

    /// A matrix entry outside of the sparsity graph was accessed.
    #[error("matrix entry ({row}, {col}) is not part of the sparsity pattern{}", element_suffix(.element))]
    OutOfPatternAccess {
        row: usize,
        col: usize,
        element: Option<usize>,
    },

    #[error("DOF index {index} is out of bounds for {bound} DOFs{}", element_suffix(.element))]
    IndexOutOfRange {
        index: usize,
        bound: usize,
        element: Option<usize>,
    },

    #[error("element index {element} is out of bounds for {num_elements} elements")]
    ElementOutOfRange { element: usize, num_elements: usize },

    /// The system restricted to free DOFs could not be factorized.
    ///
    /// If the failure can be attributed to a single DOF, `pivot` holds its global index.
    #[error("system restricted to free DOFs is singular or not positive definite{}", pivot_suffix(.pivot))]
    SingularSystem { pivot: Option<usize> },

    /// The local matrix or vector of an element could not be computed.
    #[error("failed to evaluate the local contribution of element {element}")]
    EvaluatorFailure {
        element: usize,
        #[source]
        source: Box<dyn Error + Send + Sync>,
    },

    #[error("local block has shape {rows}x{cols}, but the element has {num_dofs} DOFs")]
    LocalBlockShapeMismatch { rows: usize, cols: usize, num_dofs: usize },

    #[error("expected a vector of length {expected}, but got length {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("free DOF mask has length {actual}, but the space has {expected} DOFs")]
    MaskLengthMismatch { expected: usize, actual: usize },

    /// A pipeline was stepped after it had already finished or failed.
    #[error("pipeline has already reached a terminal state and cannot be run again")]
    PipelineReused,
}

impl AssemblyError {
    /// The element associated with the error, if any.
    pub fn element(&self) -> Option<usize> {
        match self {
            Self::InconsistentIncidence { element, .. } => Some(*element),
            Self::OutOfPatternAccess { element, .. } => *element,
            Self::IndexOutOfRange { element, .. } => *element,
            Self::ElementOutOfRange { element, .. } => Some(*element),
            Self::EvaluatorFailure { element, .. } => Some(*element),
            _ => None,
        }
    }

    /// The DOF index associated with the error, if any.
    ///
    /// For out-of-pattern accesses this is the row of the offending entry.
    pub fn dof(&self) -> Option<usize> {
        match self {
            Self::OutOfPatternAccess { row, .. } => Some(*row),
            Self::IndexOutOfRange { index, .. } => Some(*index),
            Self::SingularSystem { pivot } => *pivot,
            _ => None,
        }
    }

    /// Attributes a scatter failure to the element whose contribution was being scattered.
    ///
    /// Errors that already name an element, or that never concern one, are returned unchanged.
    pub(crate) fn at_element(self, element_index: usize) -> Self {
        match self {
            Self::OutOfPatternAccess { row, col, element: None } => Self::OutOfPatternAccess {
                row,
                col,
                element: Some(element_index),
            },
            Self::IndexOutOfRange {
                index,
                bound,
                element: None,
            } => Self::IndexOutOfRange {
                index,
                bound,
                element: Some(element_index),
            },
            other => other,
        }
    }

    pub(crate) fn evaluator_failure(element: usize, report: eyre::Report) -> Self {
        Self::EvaluatorFailure {
            element,
            source: report.into(),
        }
    }
}

fn element_suffix(element: &Option<usize>) -> String {
    element
        .map(|element| format!(" (element {element})"))
        .unwrap_or_default()
}

fn pivot_suffix(pivot: &Option<usize>) -> String {
    pivot
        .map(|dof| format!(" (pivot at DOF {dof})"))
        .unwrap_or_default()
}
