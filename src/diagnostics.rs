//! Hooks for inspecting the intermediate results of a pipeline.
use crate::incidence::ElementDofTable;
use crate::matrix::SymmetricCsrMatrix;
use crate::sparsity::SparsityGraph;
use crate::Real;
use log::{log_enabled, trace, Level};
use nalgebra::DVector;

/// Receives the intermediate results of a pipeline as they are produced.
///
/// All methods default to doing nothing.
pub trait DiagnosticSink<T: Real> {
    fn element_dof_table(&mut self, _table: &ElementDofTable) {}

    fn sparsity_graph(&mut self, _graph: &SparsityGraph) {}

    fn assembled_system(&mut self, _matrix: &SymmetricCsrMatrix<T>, _rhs: &DVector<T>) {}

    fn solution(&mut self, _solution: &DVector<T>) {}
}

impl<T: Real, S: ?Sized + DiagnosticSink<T>> DiagnosticSink<T> for &mut S {
    fn element_dof_table(&mut self, table: &ElementDofTable) {
        (**self).element_dof_table(table)
    }

    fn sparsity_graph(&mut self, graph: &SparsityGraph) {
        (**self).sparsity_graph(graph)
    }

    fn assembled_system(&mut self, matrix: &SymmetricCsrMatrix<T>, rhs: &DVector<T>) {
        (**self).assembled_system(matrix, rhs)
    }

    fn solution(&mut self, solution: &DVector<T>) {
        (**self).solution(solution)
    }
}

#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct NoDiagnostics;

impl<T: Real> DiagnosticSink<T> for NoDiagnostics {}

/// Dumps intermediate results through the `log` facade at trace level.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct LogDiagnostics;

impl<T: Real> DiagnosticSink<T> for LogDiagnostics {
    fn element_dof_table(&mut self, table: &ElementDofTable) {
        if log_enabled!(Level::Trace) {
            for (element_index, dofs) in table.iter().enumerate() {
                trace!("Element {element_index}: DOFs {dofs:?}");
            }
        }
    }

    fn sparsity_graph(&mut self, graph: &SparsityGraph) {
        if log_enabled!(Level::Trace) {
            for row in 0..graph.num_dofs() {
                trace!("Graph row {row}: columns {:?}", graph.row_columns(row).unwrap_or_default());
            }
        }
    }

    fn assembled_system(&mut self, matrix: &SymmetricCsrMatrix<T>, rhs: &DVector<T>) {
        if log_enabled!(Level::Trace) {
            for (row, col, value) in matrix.triplet_iter() {
                trace!("A[({row}, {col})] = {value}");
            }
            for (row, value) in rhs.iter().enumerate() {
                trace!("b[{row}] = {value}");
            }
        }
    }

    fn solution(&mut self, solution: &DVector<T>) {
        if log_enabled!(Level::Trace) {
            for (dof, value) in solution.iter().enumerate() {
                trace!("u[{dof}] = {value}");
            }
        }
    }
}

/// Records copies of all intermediate results.
#[derive(Debug, Clone)]
pub struct RecordingDiagnostics<T: Real> {
    pub element_dof_table: Option<ElementDofTable>,
    pub sparsity_graph: Option<SparsityGraph>,
    pub matrix: Option<SymmetricCsrMatrix<T>>,
    pub rhs: Option<DVector<T>>,
    pub solution: Option<DVector<T>>,
}

impl<T: Real> Default for RecordingDiagnostics<T> {
    fn default() -> Self {
        Self {
            element_dof_table: None,
            sparsity_graph: None,
            matrix: None,
            rhs: None,
            solution: None,
        }
    }
}

impl<T: Real> DiagnosticSink<T> for RecordingDiagnostics<T> {
    fn element_dof_table(&mut self, table: &ElementDofTable) {
        self.element_dof_table = Some(table.clone());
    }

    fn sparsity_graph(&mut self, graph: &SparsityGraph) {
        self.sparsity_graph = Some(graph.clone());
    }

    fn assembled_system(&mut self, matrix: &SymmetricCsrMatrix<T>, rhs: &DVector<T>) {
        self.matrix = Some(matrix.clone());
        self.rhs = Some(rhs.clone());
    }

    fn solution(&mut self, solution: &DVector<T>) {
        self.solution = Some(solution.clone());
    }
}
